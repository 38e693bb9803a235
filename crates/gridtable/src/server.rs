//! `GridtableServer` builder and accept loop.
//!
//! This is the entry point for running a Gridtable server. It ties
//! together all the layers: transport → protocol → session → room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridtable_protocol::{Codec, JsonCodec};
use gridtable_room::{HubHandle, HubStatus};
use gridtable_transport::{PendingConnection, Transport, WebSocketTransport};

use crate::GridtableError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) hub: HubHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Gridtable server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use gridtable::prelude::*;
///
/// # async fn start() -> Result<(), GridtableError> {
/// let server = GridtableServer::builder()
///     .bind("127.0.0.1:3000")
///     .gm_grace(Duration::from_secs(5))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GridtableServerBuilder {
    config: ServerConfig,
}

impl GridtableServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a session lingers after its GM disconnects.
    pub fn gm_grace(mut self, grace: Duration) -> Self {
        self.config.gm_grace = grace;
        self
    }

    /// Closes connections that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<GridtableServer<JsonCodec>, GridtableError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            hub: HubHandle::new(self.config.hub_config()),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(GridtableServer { transport, state })
    }
}

impl Default for GridtableServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gridtable server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct GridtableServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GridtableServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GridtableServerBuilder {
        GridtableServerBuilder::new()
    }
}

impl<C: Codec> GridtableServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the server's hub.
    pub fn hub(&self) -> HubHandle {
        self.state.hub.clone()
    }

    /// Returns a health snapshot of the hub.
    pub async fn status(&self) -> HubStatus {
        self.state.hub.status().await
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GridtableError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then drops every
    /// session and connection.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), GridtableError> {
        tokio::pin!(shutdown);
        tracing::info!("Gridtable server running");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let peer = pending.peer_addr();
                            let conn = match pending.upgrade().await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::warn!(%peer, error = %e, "WebSocket handshake failed");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        let dropped = self.state.hub.shutdown().await;
        tracing::info!(sessions = dropped, "Gridtable server stopped");
        Ok(())
    }
}
