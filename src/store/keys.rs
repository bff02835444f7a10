//! String values, expiry, scan and counters

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::{ensure, ensure_key, logged, KeyTtl, ScanPage, Store};
use crate::codec;
use crate::core::Intent;
use crate::error::CentinelaResult;
use crate::protocol::{reply, Command};
use crate::sentinel::Topology;

impl<T: Topology> Store<T> {
    pub async fn exists(&self, key: &str) -> CentinelaResult<bool> {
        ensure_key("EXISTS", key)?;
        self.run(Intent::Read, Command::new("EXISTS").arg(key), key, reply::into_bool)
            .await
    }

    /// Length of the string stored at `key` (0 when missing)
    pub async fn strlen(&self, key: &str) -> CentinelaResult<i64> {
        ensure_key("STRLEN", key)?;
        self.run(Intent::Read, Command::new("STRLEN").arg(key), key, reply::into_integer)
            .await
    }

    pub async fn set(&self, key: &str, value: &str) -> CentinelaResult<()> {
        ensure_key("SET", key)?;
        let cmd = Command::new("SET").arg(key).arg(value);
        self.run(Intent::Write, cmd, key, reply::into_ok).await
    }

    /// Store a typed value in its encoded form
    pub async fn set_object<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> CentinelaResult<()> {
        ensure_key("SET", key)?;
        let data = logged("SET", key, codec::encode(value))?;
        let cmd = Command::new("SET").arg(key).arg_bytes(data);
        self.run(Intent::Write, cmd, key, reply::into_ok).await
    }

    /// SETEX; `expiry` is truncated to whole seconds and must be at least one
    pub async fn set_ex(&self, key: &str, value: &str, expiry: Duration) -> CentinelaResult<()> {
        ensure_key("SETEX", key)?;
        ensure("SETEX", key, expiry.as_secs() > 0, "expiry must be at least one second")?;
        let cmd = Command::new("SETEX")
            .arg(key)
            .arg_int(expiry.as_secs())
            .arg(value);
        self.run(Intent::Write, cmd, key, reply::into_ok).await
    }

    pub async fn set_object_ex<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        expiry: Duration,
    ) -> CentinelaResult<()> {
        ensure_key("SETEX", key)?;
        ensure("SETEX", key, expiry.as_secs() > 0, "expiry must be at least one second")?;
        let data = logged("SETEX", key, codec::encode(value))?;
        let cmd = Command::new("SETEX")
            .arg(key)
            .arg_int(expiry.as_secs())
            .arg_bytes(data);
        self.run(Intent::Write, cmd, key, reply::into_ok).await
    }

    pub async fn get(&self, key: &str) -> CentinelaResult<Option<String>> {
        ensure_key("GET", key)?;
        self.run(Intent::Read, Command::new("GET").arg(key), key, reply::into_string)
            .await
    }

    /// Read a typed value; decoding into the wrong type is an error, not `None`
    pub async fn get_object<V: DeserializeOwned>(&self, key: &str) -> CentinelaResult<Option<V>> {
        ensure_key("GET", key)?;
        self.run(Intent::Read, Command::new("GET").arg(key), key, |cmd, value| {
            match reply::into_bytes(cmd, value)? {
                Some(data) => codec::decode(&data).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// MGET; one entry per requested key, `None` where the key is missing
    pub async fn mget<K: AsRef<str>>(&self, keys: &[K]) -> CentinelaResult<Vec<Option<String>>> {
        let label = format!("{} keys", keys.len());
        ensure("MGET", &label, !keys.is_empty(), "at least one key is required")?;
        ensure(
            "MGET",
            &label,
            keys.iter().all(|k| !k.as_ref().is_empty()),
            "keys must not be empty",
        )?;
        let cmd = Command::new("MGET").args(keys.iter().map(|k| k.as_ref()));
        self.run(Intent::Read, cmd, &label, reply::into_optional_strings)
            .await
    }

    /// One SCAN step from `cursor` (0 starts a new iteration)
    pub async fn scan(&self, cursor: u64, pattern: &str) -> CentinelaResult<ScanPage> {
        ensure("SCAN", pattern, !pattern.is_empty(), "pattern must not be empty")?;
        let cmd = Command::new("SCAN")
            .arg_int(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg_int(self.scan_count);
        self.run(Intent::Read, cmd, pattern, |cmd, value| {
            let (cursor, keys) = reply::into_scan_page(cmd, value)?;
            Ok(ScanPage { cursor, keys })
        })
        .await
    }

    /// SCAN from the initial cursor
    pub async fn scan_match(&self, pattern: &str) -> CentinelaResult<ScanPage> {
        self.scan(0, pattern).await
    }

    pub async fn ttl(&self, key: &str) -> CentinelaResult<KeyTtl> {
        ensure_key("TTL", key)?;
        self.run(Intent::Read, Command::new("TTL").arg(key), key, |cmd, value| {
            reply::into_integer(cmd, value).map(KeyTtl::from_seconds)
        })
        .await
    }

    /// Remove the expiry; true when one was removed
    pub async fn persist(&self, key: &str) -> CentinelaResult<bool> {
        ensure_key("PERSIST", key)?;
        self.run(Intent::Write, Command::new("PERSIST").arg(key), key, reply::into_bool)
            .await
    }

    /// Set an expiry in whole seconds; true when the key exists
    pub async fn expire(&self, key: &str, expiry: Duration) -> CentinelaResult<bool> {
        ensure_key("EXPIRE", key)?;
        ensure("EXPIRE", key, expiry.as_secs() > 0, "expiry must be at least one second")?;
        let cmd = Command::new("EXPIRE").arg(key).arg_int(expiry.as_secs());
        self.run(Intent::Write, cmd, key, reply::into_bool).await
    }

    /// Number of keys removed
    pub async fn del(&self, key: &str) -> CentinelaResult<i64> {
        ensure_key("DEL", key)?;
        self.run(Intent::Write, Command::new("DEL").arg(key), key, reply::into_integer)
            .await
    }

    pub async fn incr(&self, key: &str) -> CentinelaResult<i64> {
        ensure_key("INCR", key)?;
        self.run(Intent::Write, Command::new("INCR").arg(key), key, reply::into_integer)
            .await
    }
}
