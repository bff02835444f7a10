/// Data-plane and monitor connections
///
/// A `Connection` is one TCP session bound to one resolved address. It is
/// created for a single operation and consumed by `close()`; nothing in this
/// crate stores a connection beyond the call that opened it.
use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{Endpoint, Intent};
use crate::error::{CentinelaError, CentinelaResult};
use crate::protocol::{reply, Command, RespEncoder, RespParser, RespValue};

/// Connect/read timeouts inherited from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            read: Duration::from_secs(2),
        }
    }
}

/// Session setup run right after the TCP connect
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub password: Option<String>,
    pub database: u32,
    /// Applied on write-path connections only
    pub client_name: Option<String>,
}

/// Single TCP connection with its own read/write buffers
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    endpoint: Endpoint,
    read_timeout: Duration,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Connection {
    /// Open a raw TCP session; no commands are sent
    pub async fn open(endpoint: &Endpoint, timeouts: Timeouts) -> CentinelaResult<Self> {
        debug!("Connecting to {}", endpoint);

        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match timeout(timeouts.connect, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(CentinelaError::connect(endpoint, e.to_string())),
            Err(_) => {
                return Err(CentinelaError::connect(
                    endpoint,
                    format!("connect timed out after {}ms", timeouts.connect.as_millis()),
                ))
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on {}: {}", endpoint, e);
        }

        Ok(Self {
            stream,
            endpoint: endpoint.clone(),
            read_timeout: timeouts.read,
            read_buf: BytesMut::with_capacity(4096),
            write_buf: BytesMut::with_capacity(256),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one command and wait for its reply under the read timeout
    pub async fn exec(&mut self, command: &Command) -> CentinelaResult<RespValue> {
        self.write_buf.clear();
        RespEncoder::encode_command(command.as_args(), &mut self.write_buf);

        match timeout(self.read_timeout, self.round_trip()).await {
            Ok(result) => result,
            Err(_) => Err(CentinelaError::timeout(format!(
                "{} on {}",
                command.name(),
                self.endpoint
            ))),
        }
    }

    async fn round_trip(&mut self) -> CentinelaResult<RespValue> {
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;

        loop {
            if let Some(value) = RespParser::parse(&mut self.read_buf)? {
                return Ok(value);
            }
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(CentinelaError::Network(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("{} closed the connection", self.endpoint),
                )));
            }
        }
    }

    /// Shut the session down. Failures are logged, never returned, so they
    /// cannot mask the result of the operation that used the connection.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Error closing connection to {}: {}", self.endpoint, e);
        }
    }
}

/// Opens a fresh, handshaken data-plane connection per operation.
/// Never pools and never retries.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRouter {
    timeouts: Timeouts,
    handshake: Handshake,
}

impl ConnectionRouter {
    pub fn new(timeouts: Timeouts, handshake: Handshake) -> Self {
        Self { timeouts, handshake }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Connect to `endpoint` and run the handshake for `intent`
    pub async fn connect(&self, endpoint: &Endpoint, intent: Intent) -> CentinelaResult<Connection> {
        let mut conn = Connection::open(endpoint, self.timeouts).await?;

        match self.handshake(&mut conn, intent).await {
            Ok(()) => Ok(conn),
            Err(e) => {
                conn.close().await;
                Err(CentinelaError::connect(endpoint, format!("handshake failed: {}", e)))
            }
        }
    }

    async fn handshake(&self, conn: &mut Connection, intent: Intent) -> CentinelaResult<()> {
        if let Some(password) = &self.handshake.password {
            let reply = conn.exec(&Command::new("AUTH").arg(password)).await?;
            reply::into_ok("AUTH", reply)?;
        }

        if self.handshake.database != 0 {
            let cmd = Command::new("SELECT").arg_int(self.handshake.database);
            reply::into_ok("SELECT", conn.exec(&cmd).await?)?;
        }

        if intent.is_write() {
            if let Some(name) = &self.handshake.client_name {
                let cmd = Command::new("CLIENT").arg("SETNAME").arg(name);
                reply::into_ok("CLIENT", conn.exec(&cmd).await?)?;
            }
        }

        Ok(())
    }
}
