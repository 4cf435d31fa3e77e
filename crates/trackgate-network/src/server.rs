//! TCP server for telematics device connections.
//!
//! The server accepts long-lived connections from tracking units and
//! spawns one task per connection. Each task owns the full per-connection
//! state — reframer accumulator, outbound sequence counter, dispatcher —
//! so no protocol state is ever shared between devices. The only shared
//! resource is the event sink, which must tolerate concurrent calls.
//!
//! # Architecture
//!
//! ```text
//! Unit A ─┐
//!         │                 ┌─ task A: Framed<TcpStream, TrackerCodec> + Dispatcher
//! Unit B ─┼─> TrackerServer ┼─ task B: …
//!         │                 └─ task C: …
//! Unit C ─┘                        │
//!                                  └──> Arc<dyn EventSink>  (shared)
//! ```
//!
//! Within a connection, events reach the sink in wire order and
//! responses are written in the order their requests were parsed. Across
//! connections there is no ordering guarantee.
//!
//! # Failure policy
//!
//! Malformed frames never terminate a connection: they surface as
//! parse-error events and the read loop continues. A connection ends on
//! peer close, socket error or the idle timeout.

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};
use trackgate_core::constants::DEFAULT_REGISTER_TOKEN;
use trackgate_protocol::TrackerCodec;
use trackgate_session::{Dispatcher, EventSink};

/// Configuration for the device-facing TCP server.
#[derive(Debug, Clone)]
pub struct TcpServerConfig {
    /// Address to bind the listener to
    pub bind_addr: SocketAddr,

    /// Token echoed in registration/authentication responses
    pub register_token: String,

    /// Attach a hex dump of the offending frame to parse-error events
    pub log_hex: bool,

    /// Close a connection after this long without a complete frame
    pub idle_timeout: Duration,
}

impl Default for TcpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7700".parse().expect("static default address"),
            register_token: DEFAULT_REGISTER_TOKEN.to_string(),
            log_hex: false,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// Errors from server setup and the accept loop.
#[derive(Debug, Error)]
pub enum TcpServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Low-level I/O error on the listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device-facing TCP server.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use trackgate_network::{TcpServerConfig, TrackerServer};
/// use trackgate_session::{PrintMode, StdoutSink};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = Arc::new(StdoutSink::new(PrintMode::Line));
/// let server = TrackerServer::bind(TcpServerConfig::default(), sink).await?;
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct TrackerServer {
    listener: TcpListener,
    config: TcpServerConfig,
    sink: Arc<dyn EventSink>,
}

impl TrackerServer {
    /// Bind the listener.
    ///
    /// # Errors
    /// Returns `TcpServerError::BindFailed` if the address is in use or
    /// not permitted.
    pub async fn bind(
        config: TcpServerConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TcpServerError> {
        info!("Binding TCP server to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| TcpServerError::BindFailed(config.bind_addr))?;

        info!("TCP server listening on {}", config.bind_addr);

        Ok(Self {
            listener,
            config,
            sink,
        })
    }

    /// The bound address; useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpServerError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Accept connections until the listener fails, spawning one task
    /// per device.
    pub async fn run(self) -> Result<(), TcpServerError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!("Accepted new connection from {}", addr);

            // Low latency matters more than throughput for small acks
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            let dispatcher = Dispatcher::new(
                self.sink.clone(),
                self.config.register_token.clone(),
                self.config.log_hex,
                addr.to_string(),
            );
            let idle_timeout = self.config.idle_timeout;

            tokio::spawn(async move {
                handle_connection(stream, addr, dispatcher, idle_timeout).await;
            });
        }
    }
}

/// Read loop for one device connection. Owns every piece of
/// per-connection protocol state through the codec and dispatcher.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Dispatcher,
    idle_timeout: Duration,
) {
    let mut framed = Framed::new(stream, TrackerCodec::new());
    info!(peer = %addr, "device connected");

    loop {
        let next = match timeout(idle_timeout, framed.next()).await {
            Err(_) => {
                info!(peer = %addr, "idle timeout, closing connection");
                break;
            }
            Ok(next) => next,
        };

        let frame = match next {
            None => {
                info!(peer = %addr, "device disconnected");
                break;
            }
            Some(Err(err)) => {
                // Reframing is infallible by construction; anything here
                // is a transport-level failure.
                warn!(peer = %addr, error = %err, "read failed, closing connection");
                break;
            }
            Some(Ok(frame)) => frame,
        };

        for response in dispatcher.handle_frame(&frame) {
            if let Err(err) = framed.send(response).await {
                warn!(peer = %addr, error = %err, "write failed, closing connection");
                return;
            }
        }
    }
}
