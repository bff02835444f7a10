/// Store facade: key-value, hash, list, expiry, scan and lock operations
///
/// Every operation follows the same template: validate the arguments
/// locally, resolve the target through the `Topology`, open a fresh
/// connection, run exactly one command, close the connection, convert the
/// reply. Errors are logged here, at the boundary, and returned.
mod hash;
mod keys;
mod list;

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, SentinelConfig};
use crate::core::{ConnectionRouter, Handshake, Intent, Timeouts};
use crate::error::{CentinelaError, CentinelaResult, ErrorSeverity};
use crate::protocol::{Command, RespValue};
use crate::sentinel::{SentinelResolver, Topology};

/// TTL state of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key is missing or already expired
    Missing,
    /// Key exists without expiration
    NoExpiry,
    /// Key expires after the provided duration
    ExpiresIn(Duration),
}

impl KeyTtl {
    pub(crate) fn from_seconds(value: i64) -> Self {
        match value {
            -2 => KeyTtl::Missing,
            v if v < 0 => KeyTtl::NoExpiry,
            v => KeyTtl::ExpiresIn(Duration::from_secs(v as u64)),
        }
    }
}

/// One page of a SCAN iteration; `cursor == 0` means the iteration is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: u64,
    pub keys: Vec<String>,
}

pub struct Store<T: Topology = SentinelResolver> {
    topology: T,
    router: ConnectionRouter,
    scan_count: u64,
}

impl Store<SentinelResolver> {
    /// Sentinel-backed store built from configuration
    pub fn from_config(config: &SentinelConfig) -> Result<Self, ConfigError> {
        let resolver = SentinelResolver::from_config(config)?;
        Ok(Store::with_config(resolver, config))
    }
}

impl<T: Topology> Store<T> {
    pub fn new(topology: T, router: ConnectionRouter) -> Self {
        Self {
            topology,
            router,
            scan_count: i32::MAX as u64,
        }
    }

    /// Store over any topology, with timeouts, handshake and SCAN COUNT
    /// taken from configuration
    pub fn with_config(topology: T, config: &SentinelConfig) -> Self {
        let router = ConnectionRouter::new(
            Timeouts {
                connect: config.connect_timeout(),
                read: config.read_timeout(),
            },
            Handshake {
                password: config.password.clone(),
                database: config.database,
                client_name: config.client_name.clone(),
            },
        );
        Store::new(topology, router).with_scan_count(config.scan_count)
    }

    pub fn with_scan_count(mut self, scan_count: u64) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Resolve, connect, run one command, close. The connection is closed on
    /// every path, and a close failure never replaces the command's result.
    async fn execute(&self, intent: Intent, command: &Command) -> CentinelaResult<RespValue> {
        let endpoint = self.topology.resolve(intent).await?;
        let mut conn = self.router.connect(&endpoint, intent).await?;
        debug!("{} on {} ({})", command.name(), endpoint, intent);

        let result = conn.exec(command).await;
        conn.close().await;
        result
    }

    /// `execute` plus reply conversion and boundary logging
    pub(crate) async fn run<R, F>(
        &self,
        intent: Intent,
        command: Command,
        key: &str,
        convert: F,
    ) -> CentinelaResult<R>
    where
        F: FnOnce(&str, RespValue) -> CentinelaResult<R>,
    {
        let name = command.name();
        let result = match self.execute(intent, &command).await {
            Ok(value) => convert(&name, value),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure(&name, key, e);
        }
        result
    }
}

/// Local argument check; failures are logged and nothing is sent
pub(crate) fn ensure(operation: &str, key: &str, ok: bool, message: &str) -> CentinelaResult<()> {
    if ok {
        return Ok(());
    }
    let err = CentinelaError::invalid_input(operation, message);
    log_failure(operation, key, &err);
    Err(err)
}

pub(crate) fn ensure_key(operation: &str, key: &str) -> CentinelaResult<()> {
    ensure(operation, key, !key.is_empty(), "key must not be empty")
}

/// Log a locally produced error (e.g. encoding) the same way as a failed command
pub(crate) fn logged<R>(operation: &str, key: &str, result: CentinelaResult<R>) -> CentinelaResult<R> {
    if let Err(e) = &result {
        log_failure(operation, key, e);
    }
    result
}

fn log_failure(operation: &str, key: &str, err: &CentinelaError) {
    match err.severity() {
        ErrorSeverity::Critical | ErrorSeverity::Error => {
            error!(operation = %operation, key = %key, "Store operation failed: {}", err)
        }
        ErrorSeverity::Warning => {
            warn!(operation = %operation, key = %key, "Store operation failed: {}", err)
        }
        ErrorSeverity::Info => {
            info!(operation = %operation, key = %key, "Store operation rejected: {}", err)
        }
    }
}
