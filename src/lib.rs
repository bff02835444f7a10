pub mod codec;
pub mod config;
pub mod error;
/// Centinela - fault-tolerant access layer for Redis deployments guarded by Sentinel
///
/// Every operation asks the monitor quorum where to go before it runs:
/// 1. Writes go to the master named by the first monitor that answers PING.
/// 2. Reads go to a random replica reported by that monitor, never to an
///    address that is itself a configured monitor and never to a replica
///    flagged down.
///
/// There is no routing cache and no connection pool. Each call opens its own
/// connection, runs one command and closes it, so a failover is picked up
/// on the very next call.
pub mod core;
pub mod health;
pub mod lock;
pub mod protocol;
pub mod sentinel;
pub mod store;
pub mod utils;

pub use crate::config::{Config, ConfigError, SentinelConfig};
pub use crate::core::{ConnectionRouter, Endpoint, Handshake, Intent, MasterInfo, ReplicaInfo, Timeouts};
pub use crate::error::{CentinelaError, CentinelaResult, ErrorSeverity};
pub use crate::sentinel::{SentinelResolver, StaticTopology, Topology};
pub use crate::store::{KeyTtl, ScanPage, Store};
pub use crate::utils::generate_token;
