//! Per-connection handler: register, read events, write events.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound queue with the hub
//!   2. Spawn a writer task that drains the queue onto the socket
//!   3. Loop: receive frames → decode `ClientEvent` → hand to the hub
//!   4. On close, error, or idle timeout: disconnect from the hub

use std::sync::Arc;
use std::time::Duration;

use gridtable_protocol::{ClientEvent, Codec, ConnectionId};
use gridtable_room::{ClientReceiver, HubHandle};
use gridtable_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GridtableError;
use crate::server::ServerState;

/// Drop guard that disconnects the connection from the hub when the
/// handler exits, even by panic. `Drop` is synchronous, so the async
/// cleanup is spawned.
struct ConnectionGuard {
    conn_id: ConnectionId,
    hub: HubHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let hub = self.hub.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                hub.disconnect(conn_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GridtableError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection accepted");

    let (tx, rx) = mpsc::unbounded_channel();
    state.hub.connect(conn_id, tx).await?;
    let _guard = ConnectionGuard {
        conn_id,
        hub: state.hub.clone(),
    };

    tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    let result = read_loop(&conn, &state).await;
    tracing::info!(%conn_id, "connection closed");

    // _guard drops here → hub disconnect fires → queue closes → writer exits.
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<(), GridtableError> {
    let conn_id = conn.id();

    loop {
        let Some(data) = next_frame(conn, state.idle_timeout).await? else {
            return Ok(());
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "dropping malformed frame");
                continue;
            }
        };

        state.hub.handle(conn_id, event).await?;
    }
}

/// Receives the next frame, treating a silent peer as closed once
/// `idle_timeout` elapses.
async fn next_frame(
    conn: &WebSocketConnection,
    idle_timeout: Option<Duration>,
) -> Result<Option<Vec<u8>>, GridtableError> {
    let Some(limit) = idle_timeout else {
        return Ok(conn.recv().await?);
    };
    match tokio::time::timeout(limit, conn.recv()).await {
        Ok(frame) => Ok(frame?),
        Err(_) => {
            tracing::info!(conn_id = %conn.id(), ?limit, "connection idle, closing");
            Ok(None)
        }
    }
}

/// Drains the connection's outbound queue onto the socket. Ends when the
/// hub drops the queue or the socket stops accepting writes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: ClientReceiver,
) {
    let conn_id = conn.id();

    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, writer stopping");
            return;
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after queue drained failed");
    }
}
