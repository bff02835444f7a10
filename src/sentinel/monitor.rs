/// Short-lived connection to one monitor (sentinel) endpoint

use tracing::debug;

use crate::core::{Connection, Endpoint, MasterInfo, ReplicaInfo, Timeouts};
use crate::error::{CentinelaError, CentinelaResult};
use crate::protocol::{reply, Command};

pub struct MonitorClient {
    conn: Connection,
}

impl MonitorClient {
    /// Connect to a monitor, authenticating first when it requires a password
    pub async fn open(
        endpoint: &Endpoint,
        timeouts: Timeouts,
        password: Option<&str>,
    ) -> CentinelaResult<Self> {
        let mut conn = Connection::open(endpoint, timeouts).await?;

        if let Some(password) = password {
            let auth = match conn.exec(&Command::new("AUTH").arg(password)).await {
                Ok(value) => reply::into_ok("AUTH", value),
                Err(e) => Err(e),
            };
            if let Err(e) = auth {
                conn.close().await;
                return Err(CentinelaError::connect(
                    endpoint,
                    format!("monitor AUTH failed: {}", e),
                ));
            }
        }

        Ok(Self { conn })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.conn.endpoint()
    }

    /// Protocol-level PING; returns the reply text (normally "PONG")
    pub async fn ping(&mut self) -> CentinelaResult<String> {
        let value = self.conn.exec(&Command::new("PING")).await?;
        reply::into_string("PING", value)?
            .ok_or_else(|| CentinelaError::protocol("PING returned null"))
    }

    /// `SENTINEL GET-MASTER-ADDR-BY-NAME`
    pub async fn master_addr(&mut self, master_name: &str) -> CentinelaResult<MasterInfo> {
        let cmd = Command::new("SENTINEL")
            .arg("GET-MASTER-ADDR-BY-NAME")
            .arg(master_name);
        let value = self.conn.exec(&cmd).await?;

        if value.is_null() {
            return Err(CentinelaError::topology_unavailable(format!(
                "monitor {} does not know master {:?}",
                self.endpoint(),
                master_name
            )));
        }

        let parts = reply::into_strings("SENTINEL", value)?;
        let [host, port] = parts.as_slice() else {
            return Err(CentinelaError::protocol(format!(
                "GET-MASTER-ADDR-BY-NAME returned {} elements",
                parts.len()
            )));
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| CentinelaError::protocol(format!("invalid master port {:?}", port)))?;

        Ok(MasterInfo {
            name: master_name.to_string(),
            endpoint: Endpoint::new(host.clone(), port),
        })
    }

    /// `SENTINEL REPLICAS`, falling back to `SENTINEL SLAVES` on monitors
    /// that predate the newer name
    pub async fn replicas(&mut self, master_name: &str) -> CentinelaResult<Vec<ReplicaInfo>> {
        let cmd = Command::new("SENTINEL").arg("REPLICAS").arg(master_name);
        let value = self.conn.exec(&cmd).await?;
        let entries = match reply::into_string_maps("SENTINEL", value) {
            Err(CentinelaError::StoreCommand { message, .. })
                if message.to_ascii_lowercase().contains("unknown") =>
            {
                debug!(
                    "Monitor {} rejected SENTINEL REPLICAS ({}), retrying with SLAVES",
                    self.endpoint(),
                    message
                );
                let legacy = Command::new("SENTINEL").arg("SLAVES").arg(master_name);
                let value = self.conn.exec(&legacy).await?;
                self.unknown_master(master_name, reply::into_string_maps("SENTINEL", value))?
            }
            other => self.unknown_master(master_name, other)?,
        };

        let replicas: Vec<ReplicaInfo> = entries
            .into_iter()
            .filter_map(ReplicaInfo::from_fields)
            .collect();
        debug!(
            "Monitor {} reported {} replicas for {}",
            self.endpoint(),
            replicas.len(),
            master_name
        );
        Ok(replicas)
    }

    /// "No such master" is the monitor's answer, not a failure to ask it,
    /// so it is reported like a null GET-MASTER-ADDR-BY-NAME
    fn unknown_master<T>(&self, master_name: &str, result: CentinelaResult<T>) -> CentinelaResult<T> {
        match result {
            Err(CentinelaError::StoreCommand { message, .. })
                if message.to_ascii_lowercase().contains("no such master") =>
            {
                Err(CentinelaError::topology_unavailable(format!(
                    "monitor {} does not know master {:?}",
                    self.endpoint(),
                    master_name
                )))
            }
            other => other,
        }
    }

    pub async fn close(self) {
        self.conn.close().await;
    }
}
