/// Core types shared by the monitor, routing and store layers
pub mod connection;

pub use connection::{Connection, ConnectionRouter, Handshake, Timeouts};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A `host:port` address: a monitor endpoint or a resolved replica
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected host:port, got {:?}", s))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(format!("missing host in {:?}", s));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("invalid port in {:?}", s))?;
        Ok(Endpoint::new(host, port))
    }
}

/// Which kind of replica an operation needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Any readable, non-monitor replica
    Read,
    /// The current writable replica (master)
    Write,
}

impl Intent {
    pub fn is_write(self) -> bool {
        matches!(self, Intent::Write)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Read => write!(f, "read"),
            Intent::Write => write!(f, "write"),
        }
    }
}

/// The writable replica of a logical dataset, as reported by one monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterInfo {
    pub name: String,
    pub endpoint: Endpoint,
}

/// One readable replica as reported by a monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaInfo {
    pub endpoint: Endpoint,
    /// Comma separated monitor flags, e.g. "slave" or "slave,s_down"
    pub flags: String,
    pub master_link_status: Option<String>,
    /// Every other field the monitor reported
    pub metadata: HashMap<String, String>,
}

impl ReplicaInfo {
    /// Build from one `SENTINEL REPLICAS` entry; `None` when ip/port are missing
    pub fn from_fields(mut fields: HashMap<String, String>) -> Option<Self> {
        let ip = fields.remove("ip")?;
        let port = fields.remove("port")?.parse::<u16>().ok()?;
        let flags = fields.remove("flags").unwrap_or_default();
        let master_link_status = fields.remove("master-link-status");
        Some(Self {
            endpoint: Endpoint::new(ip, port),
            flags,
            master_link_status,
            metadata: fields,
        })
    }

    /// Whether the monitor considers this replica down or unreachable
    pub fn is_down(&self) -> bool {
        self.flags
            .split(',')
            .any(|flag| matches!(flag.trim(), "s_down" | "o_down" | "disconnected"))
    }
}
