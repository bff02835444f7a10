//! In-process fake monitor and data node speaking RESP.
//!
//! One `FakeNode` can play a sentinel (PING + SENTINEL queries), a data node
//! (string/hash/list/script commands over a shared `Db`), or both. Nodes
//! sharing one `Db` behave like a master and its replicas after replication.
#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use centinela::core::Endpoint;
use centinela::lock::UNLOCK_SCRIPT;
use centinela::protocol::{RespEncoder, RespParser, RespValue};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
enum Value {
    Str(Vec<u8>),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Shared keyspace
#[derive(Debug, Default)]
pub struct Db {
    entries: HashMap<String, Entry>,
}

pub type SharedDb = Arc<Mutex<Db>>;

pub fn new_db() -> SharedDb {
    Arc::new(Mutex::new(Db::default()))
}

impl Db {
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let expired = matches!(
            self.entries.get(key),
            Some(Entry { expires_at: Some(at), .. }) if *at <= Instant::now()
        );
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    pub fn get_string(&mut self, key: &str) -> Option<String> {
        match self.live(key) {
            Some(Entry {
                value: Value::Str(data),
                ..
            }) => Some(String::from_utf8_lossy(data).into_owned()),
            _ => None,
        }
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.live(key).is_some()
    }
}

/// What a node answers to PING and SENTINEL queries
#[derive(Debug, Clone)]
pub struct Behavior {
    pub ping_reply: String,
    pub master_name: String,
    pub master: Option<Endpoint>,
    pub replicas: Vec<Vec<(String, String)>>,
    /// Reject SENTINEL REPLICAS like monitors that only know SLAVES
    pub legacy_sentinel: bool,
    /// Password required before any other command
    pub password: Option<String>,
    /// Answer every SENTINEL query with this error, while PING still works
    pub query_error: Option<String>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            ping_reply: "PONG".to_string(),
            master_name: "mymaster".to_string(),
            master: None,
            replicas: Vec::new(),
            legacy_sentinel: false,
            password: None,
            query_error: None,
        }
    }
}

impl Behavior {
    pub fn sentinel_for(master: Endpoint) -> Self {
        Self {
            master: Some(master),
            ..Default::default()
        }
    }

    pub fn with_replica(mut self, endpoint: &Endpoint, flags: &str) -> Self {
        self.replicas.push(vec![
            ("name".to_string(), endpoint.to_string()),
            ("ip".to_string(), endpoint.host.clone()),
            ("port".to_string(), endpoint.port.to_string()),
            ("flags".to_string(), flags.to_string()),
            ("master-link-status".to_string(), "ok".to_string()),
        ]);
        self
    }
}

pub struct FakeNode {
    pub endpoint: Endpoint,
    accepted: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeNode {
    pub async fn spawn(behavior: Behavior, db: SharedDb) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        Self::serve(listener, port, behavior, db)
    }

    /// Bind first so the port can be handed to other nodes' behaviors
    pub async fn reserve() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        (listener, Endpoint::new("127.0.0.1", port))
    }

    pub fn start(listener: TcpListener, behavior: Behavior, db: SharedDb) -> Self {
        let port = listener.local_addr().expect("addr").port();
        Self::serve(listener, port, behavior, db)
    }

    fn serve(listener: TcpListener, port: u16, behavior: Behavior, db: SharedDb) -> Self {
        let accepted = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(Mutex::new(Vec::new()));

        let accepted_task = accepted.clone();
        let commands_task = commands.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                accepted_task.fetch_add(1, Ordering::SeqCst);
                let behavior = behavior.clone();
                let db = db.clone();
                let commands = commands_task.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, behavior, db, commands).await;
                });
            }
        });

        Self {
            endpoint: Endpoint::new("127.0.0.1", port),
            accepted,
            commands,
        }
    }

    /// Number of TCP connections accepted so far
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Every command received, as text
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands().into_iter().map(|c| c[0].clone()).collect()
    }
}

/// An address nobody listens on
pub async fn dead_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    Endpoint::new("127.0.0.1", port)
}

async fn handle_connection(
    mut stream: TcpStream,
    behavior: Behavior,
    db: SharedDb,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
) -> std::io::Result<()> {
    let mut buf = BytesMut::new();
    let mut authenticated = behavior.password.is_none();

    loop {
        if stream.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
        let frames = match RespParser::parse_all(&mut buf) {
            Ok(frames) => frames,
            Err(_) => return Ok(()),
        };

        for frame in frames {
            let args = match frame {
                RespValue::Array(Some(items)) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        RespValue::BulkString(Some(data)) => Some(data.to_vec()),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
                _ => continue,
            };
            if args.is_empty() {
                continue;
            }
            commands.lock().unwrap().push(
                args.iter()
                    .map(|a| String::from_utf8_lossy(a).into_owned())
                    .collect(),
            );

            let reply = dispatch(&args, &behavior, &db, &mut authenticated);
            stream.write_all(&RespEncoder::encode(&reply)).await?;
        }
    }
}

fn text(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}

fn ok() -> RespValue {
    RespValue::simple("OK")
}

fn err(message: &str) -> RespValue {
    RespValue::Error(message.to_string())
}

fn bulk(s: &str) -> RespValue {
    RespValue::bulk(Bytes::copy_from_slice(s.as_bytes()))
}

fn nil() -> RespValue {
    RespValue::BulkString(None)
}

fn wrong_type() -> RespValue {
    err("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn int_arg(arg: &[u8]) -> Option<i64> {
    text(arg).parse().ok()
}

fn dispatch(args: &[Vec<u8>], behavior: &Behavior, db: &SharedDb, authenticated: &mut bool) -> RespValue {
    let name = text(&args[0]).to_ascii_uppercase();

    if name == "AUTH" {
        return match (&behavior.password, args.get(1)) {
            (Some(expected), Some(given)) if expected.as_bytes() == given.as_slice() => {
                *authenticated = true;
                ok()
            }
            (None, _) => err("ERR AUTH <password> called without any password configured"),
            _ => err("WRONGPASS invalid username-password pair"),
        };
    }
    if !*authenticated {
        return err("NOAUTH Authentication required.");
    }

    match name.as_str() {
        "PING" => RespValue::simple(behavior.ping_reply.clone()),
        "SELECT" => ok(),
        "CLIENT" => ok(),
        "SENTINEL" => sentinel(args, behavior),
        _ => {
            let mut db = db.lock().unwrap();
            data_command(&name, args, &mut db)
        }
    }
}

fn sentinel(args: &[Vec<u8>], behavior: &Behavior) -> RespValue {
    let sub = args.get(1).map(|a| text(a).to_ascii_uppercase()).unwrap_or_default();
    let name = args.get(2).map(|a| text(a)).unwrap_or_default();
    if let Some(message) = &behavior.query_error {
        return err(message);
    }

    match sub.as_str() {
        "GET-MASTER-ADDR-BY-NAME" => match &behavior.master {
            Some(master) if name == behavior.master_name => RespValue::Array(Some(vec![
                bulk(&master.host),
                bulk(&master.port.to_string()),
            ])),
            _ => RespValue::Array(None),
        },
        "REPLICAS" if behavior.legacy_sentinel => err("ERR Unknown sentinel subcommand 'replicas'"),
        "REPLICAS" | "SLAVES" => {
            if name != behavior.master_name {
                return err("ERR No such master with that name");
            }
            RespValue::Array(Some(
                behavior
                    .replicas
                    .iter()
                    .map(|fields| {
                        RespValue::Array(Some(
                            fields
                                .iter()
                                .flat_map(|(k, v)| [bulk(k), bulk(v)])
                                .collect(),
                        ))
                    })
                    .collect(),
            ))
        }
        _ => err("ERR Unknown sentinel subcommand"),
    }
}

fn data_command(name: &str, args: &[Vec<u8>], db: &mut Db) -> RespValue {
    let key = args.get(1).map(|a| text(a)).unwrap_or_default();

    match name {
        "GET" => match db.live(&key) {
            Some(Entry {
                value: Value::Str(data),
                ..
            }) => RespValue::bulk(Bytes::from(data.clone())),
            Some(_) => wrong_type(),
            None => nil(),
        },
        "SET" => set(&key, args, db),
        "SETEX" => {
            let Some(seconds) = args.get(2).and_then(|a| int_arg(a)) else {
                return err("ERR value is not an integer or out of range");
            };
            db.entries.insert(
                key,
                Entry {
                    value: Value::Str(args[3].clone()),
                    expires_at: Some(Instant::now() + Duration::from_secs(seconds as u64)),
                },
            );
            ok()
        }
        "STRLEN" => match db.live(&key) {
            Some(Entry {
                value: Value::Str(data),
                ..
            }) => RespValue::Integer(data.len() as i64),
            Some(_) => wrong_type(),
            None => RespValue::Integer(0),
        },
        "EXISTS" => RespValue::Integer(db.contains(&key) as i64),
        "DEL" => {
            let removed = args[1..]
                .iter()
                .filter(|k| {
                    let k = text(k);
                    db.live(&k).is_some() && db.entries.remove(&k).is_some()
                })
                .count();
            RespValue::Integer(removed as i64)
        }
        "INCR" => {
            let current = match db.live(&key) {
                Some(Entry {
                    value: Value::Str(data),
                    ..
                }) => match text(data).parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => return err("ERR value is not an integer or out of range"),
                },
                Some(_) => return wrong_type(),
                None => 0,
            };
            let next = current + 1;
            let expires_at = db.live(&key).and_then(|e| e.expires_at);
            db.entries.insert(
                key,
                Entry {
                    value: Value::Str(next.to_string().into_bytes()),
                    expires_at,
                },
            );
            RespValue::Integer(next)
        }
        "TTL" => match db.live(&key) {
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => RespValue::Integer(at.saturating_duration_since(Instant::now()).as_secs() as i64),
            Some(_) => RespValue::Integer(-1),
            None => RespValue::Integer(-2),
        },
        "PERSIST" => match db.live(&key) {
            Some(entry) if entry.expires_at.is_some() => {
                entry.expires_at = None;
                RespValue::Integer(1)
            }
            _ => RespValue::Integer(0),
        },
        "EXPIRE" => {
            let Some(seconds) = args.get(2).and_then(|a| int_arg(a)) else {
                return err("ERR value is not an integer or out of range");
            };
            match db.live(&key) {
                Some(entry) => {
                    entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds.max(0) as u64));
                    RespValue::Integer(1)
                }
                None => RespValue::Integer(0),
            }
        }
        "MGET" => RespValue::Array(Some(
            args[1..]
                .iter()
                .map(|k| match db.get_string(&text(k)) {
                    Some(v) => bulk(&v),
                    None => nil(),
                })
                .collect(),
        )),
        "SCAN" => scan(args, db),
        "HSET" | "HMSET" => {
            if args.len() < 4 || (args.len() - 2) % 2 != 0 {
                return err("ERR wrong number of arguments");
            }
            let entry = db.live(&key).is_some();
            if !entry {
                db.entries.insert(
                    key.clone(),
                    Entry {
                        value: Value::Hash(HashMap::new()),
                        expires_at: None,
                    },
                );
            }
            let Some(Entry {
                value: Value::Hash(hash),
                ..
            }) = db.live(&key)
            else {
                return wrong_type();
            };
            let mut added = 0;
            for pair in args[2..].chunks(2) {
                if hash.insert(text(&pair[0]), text(&pair[1])).is_none() {
                    added += 1;
                }
            }
            if name == "HMSET" {
                ok()
            } else {
                RespValue::Integer(added)
            }
        }
        "HGET" | "HDEL" | "HMGET" | "HLEN" | "HGETALL" => hash_read(name, &key, args, db),
        "LPUSH" | "RPUSH" => {
            if db.live(&key).is_none() {
                db.entries.insert(
                    key.clone(),
                    Entry {
                        value: Value::List(VecDeque::new()),
                        expires_at: None,
                    },
                );
            }
            let Some(Entry {
                value: Value::List(list),
                ..
            }) = db.live(&key)
            else {
                return wrong_type();
            };
            for value in &args[2..] {
                if name == "LPUSH" {
                    list.push_front(text(value));
                } else {
                    list.push_back(text(value));
                }
            }
            RespValue::Integer(list.len() as i64)
        }
        "LPOP" | "RPOP" | "LLEN" | "LINDEX" | "LRANGE" => list_command(name, &key, args, db),
        "EVAL" => eval(args, db),
        other => err(&format!("ERR unknown command '{}'", other)),
    }
}

fn set(key: &str, args: &[Vec<u8>], db: &mut Db) -> RespValue {
    let value = args[2].clone();
    let mut nx = false;
    let mut expires_at = None;
    let mut i = 3;
    while i < args.len() {
        match text(&args[i]).to_ascii_uppercase().as_str() {
            "NX" => nx = true,
            "PX" | "EX" => {
                let unit = text(&args[i]).to_ascii_uppercase();
                let Some(n) = args.get(i + 1).and_then(|a| int_arg(a)) else {
                    return err("ERR syntax error");
                };
                let ttl = if unit == "PX" {
                    Duration::from_millis(n as u64)
                } else {
                    Duration::from_secs(n as u64)
                };
                expires_at = Some(Instant::now() + ttl);
                i += 1;
            }
            _ => return err("ERR syntax error"),
        }
        i += 1;
    }

    if nx && db.live(key).is_some() {
        return nil();
    }
    db.entries.insert(
        key.to_string(),
        Entry {
            value: Value::Str(value),
            expires_at,
        },
    );
    ok()
}

fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], text) || (!text.is_empty() && glob_match(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p == t => glob_match(&pattern[1..], &text[1..]),
        _ => false,
    }
}

fn scan(args: &[Vec<u8>], db: &mut Db) -> RespValue {
    let Some(cursor) = args.get(1).and_then(|a| text(a).parse::<u64>().ok()) else {
        return err("ERR invalid cursor");
    };
    let mut pattern = b"*".to_vec();
    let mut i = 2;
    while i + 1 < args.len() {
        if text(&args[i]).eq_ignore_ascii_case("MATCH") {
            pattern = args[i + 1].clone();
        }
        i += 2;
    }

    // Everything fits in one page; any non-zero cursor is past the end
    let mut keys: Vec<String> = if cursor == 0 {
        let now = Instant::now();
        db.entries
            .iter()
            .filter(|(_, e)| e.expires_at.map_or(true, |at| at > now))
            .map(|(k, _)| k.clone())
            .filter(|k| glob_match(&pattern, k.as_bytes()))
            .collect()
    } else {
        Vec::new()
    };
    keys.sort();

    RespValue::Array(Some(vec![
        bulk("0"),
        RespValue::Array(Some(keys.iter().map(|k| bulk(k)).collect())),
    ]))
}

fn hash_read(name: &str, key: &str, args: &[Vec<u8>], db: &mut Db) -> RespValue {
    let hash = match db.live(key) {
        Some(Entry {
            value: Value::Hash(hash),
            ..
        }) => Some(hash),
        Some(_) => return wrong_type(),
        None => None,
    };

    match name {
        "HGET" => match hash.and_then(|h| h.get(&text(&args[2])).cloned()) {
            Some(v) => bulk(&v),
            None => nil(),
        },
        "HDEL" => {
            let removed = hash
                .map(|h| args[2..].iter().filter(|f| h.remove(&text(f)).is_some()).count())
                .unwrap_or(0);
            RespValue::Integer(removed as i64)
        }
        "HMGET" => {
            let hash = hash.cloned().unwrap_or_default();
            RespValue::Array(Some(
                args[2..]
                    .iter()
                    .map(|f| match hash.get(&text(f)) {
                        Some(v) => bulk(v),
                        None => nil(),
                    })
                    .collect(),
            ))
        }
        "HLEN" => RespValue::Integer(hash.map(|h| h.len()).unwrap_or(0) as i64),
        _ => {
            let mut pairs: Vec<(String, String)> = hash
                .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            pairs.sort();
            RespValue::Array(Some(
                pairs
                    .iter()
                    .flat_map(|(k, v)| [bulk(k), bulk(v)])
                    .collect(),
            ))
        }
    }
}

fn normalize(index: i64, len: usize) -> i64 {
    if index < 0 {
        len as i64 + index
    } else {
        index
    }
}

fn list_command(name: &str, key: &str, args: &[Vec<u8>], db: &mut Db) -> RespValue {
    let list = match db.live(key) {
        Some(Entry {
            value: Value::List(list),
            ..
        }) => Some(list),
        Some(_) => return wrong_type(),
        None => None,
    };

    match name {
        "LPOP" | "RPOP" => {
            let popped = list.and_then(|l| {
                if name == "LPOP" {
                    l.pop_front()
                } else {
                    l.pop_back()
                }
            });
            match popped {
                Some(v) => bulk(&v),
                None => nil(),
            }
        }
        "LLEN" => RespValue::Integer(list.map(|l| l.len()).unwrap_or(0) as i64),
        "LINDEX" => {
            let Some(index) = args.get(2).and_then(|a| int_arg(a)) else {
                return err("ERR value is not an integer or out of range");
            };
            let value = list.and_then(|l| {
                let i = normalize(index, l.len());
                if i < 0 {
                    None
                } else {
                    l.get(i as usize).cloned()
                }
            });
            match value {
                Some(v) => bulk(&v),
                None => nil(),
            }
        }
        _ => {
            let (Some(start), Some(end)) = (
                args.get(2).and_then(|a| int_arg(a)),
                args.get(3).and_then(|a| int_arg(a)),
            ) else {
                return err("ERR value is not an integer or out of range");
            };
            let items: Vec<RespValue> = match list {
                Some(l) if !l.is_empty() => {
                    let len = l.len();
                    let start = normalize(start, len).max(0);
                    let end = normalize(end, len).min(len as i64 - 1);
                    if start > end {
                        Vec::new()
                    } else {
                        l.iter()
                            .skip(start as usize)
                            .take((end - start + 1) as usize)
                            .map(|v| bulk(v))
                            .collect()
                    }
                }
                _ => Vec::new(),
            };
            RespValue::Array(Some(items))
        }
    }
}

fn eval(args: &[Vec<u8>], db: &mut Db) -> RespValue {
    if args.len() != 5 || text(&args[1]) != UNLOCK_SCRIPT || text(&args[2]) != "1" {
        return err("ERR fake node only knows the unlock script");
    }
    let key = text(&args[3]);
    let token = text(&args[4]);
    if db.get_string(&key).as_deref() == Some(token.as_str()) {
        db.entries.remove(&key);
        RespValue::Integer(1)
    } else {
        RespValue::Integer(0)
    }
}
