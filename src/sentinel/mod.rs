/// Monitor quorum access and topology resolution
pub mod monitor;
pub mod resolver;

pub use monitor::MonitorClient;
pub use resolver::{select_replica, SentinelResolver};

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Endpoint, Intent};
use crate::error::CentinelaResult;

/// Source of the address an operation should talk to
#[async_trait]
pub trait Topology: Send + Sync {
    /// Resolve the target for one operation. Called on every operation;
    /// implementations must not hand out stale writable-replica information.
    async fn resolve(&self, intent: Intent) -> CentinelaResult<Endpoint>;
}

#[async_trait]
impl<T: Topology + ?Sized> Topology for Arc<T> {
    async fn resolve(&self, intent: Intent) -> CentinelaResult<Endpoint> {
        (**self).resolve(intent).await
    }
}

/// A single, fixed node serving both reads and writes (no monitors)
#[derive(Debug, Clone)]
pub struct StaticTopology {
    endpoint: Endpoint,
}

impl StaticTopology {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl Topology for StaticTopology {
    async fn resolve(&self, _intent: Intent) -> CentinelaResult<Endpoint> {
        Ok(self.endpoint.clone())
    }
}
