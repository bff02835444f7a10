/// Topology resolution through the monitor quorum
///
/// Monitors are consulted in configured order. The first one that answers
/// PING is authoritative for this resolution: it names the master for
/// writes, or the replica set for reads. Nothing is cached; every call
/// resolves again.
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{MonitorClient, Topology};
use crate::config::{ConfigError, SentinelConfig};
use crate::core::{Endpoint, Intent, MasterInfo, ReplicaInfo, Timeouts};
use crate::error::{CentinelaError, CentinelaResult};
use crate::health::probe_monitor;

/// Resolves the writable or a readable replica on every call
#[derive(Debug, Clone)]
pub struct SentinelResolver {
    master_name: String,
    monitors: Vec<Endpoint>,
    monitor_set: HashSet<Endpoint>,
    timeouts: Timeouts,
    sentinel_password: Option<String>,
}

impl SentinelResolver {
    pub fn new<S: Into<String>>(master_name: S, monitors: Vec<Endpoint>, timeouts: Timeouts) -> Self {
        let monitor_set = monitors.iter().cloned().collect();
        Self {
            master_name: master_name.into(),
            monitors,
            monitor_set,
            timeouts,
            sentinel_password: None,
        }
    }

    pub fn with_sentinel_password<S: Into<String>>(mut self, password: S) -> Self {
        self.sentinel_password = Some(password.into());
        self
    }

    pub fn from_config(config: &SentinelConfig) -> Result<Self, ConfigError> {
        let timeouts = Timeouts {
            connect: config.connect_timeout(),
            read: config.read_timeout(),
        };
        let resolver = Self::new(config.master_name.clone(), config.endpoints()?, timeouts);
        Ok(match &config.sentinel_password {
            Some(password) => resolver.with_sentinel_password(password.as_str()),
            None => resolver,
        })
    }

    pub fn master_name(&self) -> &str {
        &self.master_name
    }

    pub fn monitors(&self) -> &[Endpoint] {
        &self.monitors
    }

    /// Current writable replica, as named by the first responsive monitor
    pub async fn master(&self) -> CentinelaResult<MasterInfo> {
        self.with_first_responsive(|mut client, master_name| async move {
            let result = client.master_addr(&master_name).await;
            client.close().await;
            result
        })
        .await
    }

    /// A readable replica that is neither a monitor address nor flagged down
    pub async fn replica(&self) -> CentinelaResult<ReplicaInfo> {
        let replicas = self
            .with_first_responsive(|mut client, master_name| async move {
                let result = client.replicas(&master_name).await;
                client.close().await;
                result
            })
            .await?;

        let mut rng = rand::thread_rng();
        match select_replica(&replicas, &self.monitor_set, &mut rng) {
            Some(replica) => Ok(replica.clone()),
            None => Err(CentinelaError::topology_unavailable(format!(
                "no eligible replica for {} among {} reported",
                self.master_name,
                replicas.len()
            ))),
        }
    }

    /// Run `query` against the first monitor that answers PING.
    ///
    /// Transport or protocol failures during the query move on to the next
    /// monitor; a definitive `TopologyUnavailable` answer is returned as is.
    async fn with_first_responsive<T, F, Fut>(&self, query: F) -> CentinelaResult<T>
    where
        F: Fn(MonitorClient, String) -> Fut,
        Fut: std::future::Future<Output = CentinelaResult<T>>,
    {
        for endpoint in &self.monitors {
            let mut client = match MonitorClient::open(
                endpoint,
                self.timeouts,
                self.sentinel_password.as_deref(),
            )
            .await
            {
                Ok(client) => client,
                Err(e) => {
                    warn!("Monitor {} unreachable: {}", endpoint, e);
                    continue;
                }
            };

            if !probe_monitor(&mut client).await.is_healthy() {
                client.close().await;
                continue;
            }

            match query(client, self.master_name.clone()).await {
                Ok(value) => {
                    debug!("Monitor {} answered for {}", endpoint, self.master_name);
                    return Ok(value);
                }
                Err(e @ CentinelaError::TopologyUnavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!("Monitor {} failed topology query: {}", endpoint, e);
                }
            }
        }

        Err(CentinelaError::topology_unavailable(format!(
            "none of {} monitors responded for {}",
            self.monitors.len(),
            self.master_name
        )))
    }
}

#[async_trait]
impl Topology for SentinelResolver {
    async fn resolve(&self, intent: Intent) -> CentinelaResult<Endpoint> {
        let endpoint = match intent {
            Intent::Write => self.master().await?.endpoint,
            Intent::Read => self.replica().await?.endpoint,
        };
        debug!("Resolved {} target for {}: {}", intent, self.master_name, endpoint);
        Ok(endpoint)
    }
}

/// Pick uniformly among replicas that are not monitor addresses and not
/// flagged down. `None` when no replica qualifies.
pub fn select_replica<'a, R: Rng + ?Sized>(
    replicas: &'a [ReplicaInfo],
    monitors: &HashSet<Endpoint>,
    rng: &mut R,
) -> Option<&'a ReplicaInfo> {
    let candidates: Vec<&ReplicaInfo> = replicas
        .iter()
        .filter(|replica| !monitors.contains(&replica.endpoint))
        .filter(|replica| !replica.is_down())
        .collect();

    candidates.choose(rng).copied()
}
