/// Health probing of monitor endpoints
use std::fmt;

use crate::error::CentinelaError;
use crate::sentinel::MonitorClient;

/// Health status of a monitor endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy { reason: String },
    Timeout,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Unhealthy { reason } => write!(f, "Unhealthy: {}", reason),
            HealthStatus::Timeout => write!(f, "Timeout"),
            HealthStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl HealthStatus {
    /// Check if the status represents a healthy endpoint
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Status for a PING reply: healthy iff the monitor answered PONG
pub fn status_from_ping(result: Result<String, CentinelaError>) -> HealthStatus {
    match result {
        Ok(text) if text.eq_ignore_ascii_case("pong") => HealthStatus::Healthy,
        Ok(text) => HealthStatus::Unhealthy {
            reason: format!("Unexpected PING response: {}", text),
        },
        Err(CentinelaError::Timeout { .. }) => HealthStatus::Timeout,
        // Answered, but not with anything readable as a PING reply
        Err(CentinelaError::Protocol(_)) => HealthStatus::Unknown,
        Err(e) => HealthStatus::Unhealthy {
            reason: format!("PING failed: {}", e),
        },
    }
}

/// PING a monitor over an already open client and log the outcome
pub async fn probe_monitor(client: &mut MonitorClient) -> HealthStatus {
    let status = status_from_ping(client.ping().await);

    match &status {
        HealthStatus::Healthy => {
            tracing::debug!("Monitor {} is healthy", client.endpoint());
        }
        HealthStatus::Unhealthy { reason } => {
            tracing::warn!("Monitor {} is unhealthy: {}", client.endpoint(), reason);
        }
        HealthStatus::Timeout => {
            tracing::warn!("Health check timeout for monitor {}", client.endpoint());
        }
        HealthStatus::Unknown => {
            tracing::warn!("Unknown health status for monitor {}", client.endpoint());
        }
    }

    status
}
