/// Unified error handling for centinela
///
/// Every public operation returns `CentinelaResult<T>`. Absence of data is
/// expressed in the `Ok` value (`None`, empty collection); an `Err` always
/// means the operation did not complete.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::config::ConfigError;
use crate::protocol::RespParseError;

/// Main error type for centinela operations
#[derive(Debug, Error)]
pub enum CentinelaError {
    /// No monitor endpoint answered, or none could name a usable replica
    #[error("Topology unavailable: {message}")]
    TopologyUnavailable { message: String },

    /// Resolved address unreachable or connection handshake failed
    #[error("Connect error to {address}: {message}")]
    Connect { address: String, message: String },

    /// Caller-supplied arguments failed local validation
    #[error("Invalid input for {operation}: {message}")]
    InvalidInput { operation: String, message: String },

    /// Typed value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store rejected the command (e.g. WRONGTYPE)
    #[error("Store command error: {command} - {message}")]
    StoreCommand { command: String, message: String },

    /// RESP framing or unexpected reply shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Network-related errors on an established connection
    #[error("Network error: {0}")]
    Network(#[from] io::Error),

    /// Read timed out waiting for a reply
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for centinela operations
pub type CentinelaResult<T> = Result<T, CentinelaError>;

impl From<RespParseError> for CentinelaError {
    fn from(err: RespParseError) -> Self {
        CentinelaError::Protocol(err.to_string())
    }
}

impl CentinelaError {
    pub fn topology_unavailable<S: Into<String>>(message: S) -> Self {
        CentinelaError::TopologyUnavailable {
            message: message.into(),
        }
    }

    pub fn connect<A: fmt::Display, S: Into<String>>(address: A, message: S) -> Self {
        CentinelaError::Connect {
            address: address.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_input<S: Into<String>>(operation: &str, message: S) -> Self {
        CentinelaError::InvalidInput {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn store_command<S: Into<String>>(command: &str, message: S) -> Self {
        CentinelaError::StoreCommand {
            command: command.to_string(),
            message: message.into(),
        }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        CentinelaError::Protocol(message.into())
    }

    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        CentinelaError::Timeout {
            operation: operation.into(),
        }
    }

    /// Whether retrying the same call could succeed once topology settles
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CentinelaError::TopologyUnavailable { .. }
                | CentinelaError::Connect { .. }
                | CentinelaError::Network(_)
                | CentinelaError::Timeout { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CentinelaError::Config(_) => ErrorSeverity::Critical,
            CentinelaError::TopologyUnavailable { .. } => ErrorSeverity::Error,
            CentinelaError::Connect { .. } => ErrorSeverity::Warning,
            CentinelaError::Network(_) => ErrorSeverity::Warning,
            CentinelaError::Timeout { .. } => ErrorSeverity::Warning,
            CentinelaError::InvalidInput { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Misconfiguration; nothing will work until it is fixed
    Critical,
    /// The operation failed
    Error,
    /// Transient failure, likely to clear on retry
    Warning,
    /// Caller mistake, nothing was sent to the store
    Info,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Info => write!(f, "INFO"),
        }
    }
}
