//! Shared, async handle to the hub, plus the GM-disconnect teardown timer.

use std::sync::{Arc, Weak};
use std::time::Duration;

use gridtable_protocol::{ClientEvent, ConnectionId, SessionId};
use tokio::sync::{Mutex, MutexGuard};

use crate::{ClientSender, Hub, HubConfig, HubStatus, RoomError};

/// Cheap-to-clone handle to the one [`Hub`] of a server.
///
/// Every call locks the hub for the duration of one action, so actions
/// are applied, and their events enqueued, one at a time.
#[derive(Clone)]
pub struct HubHandle {
    hub: Arc<Mutex<Hub>>,
}

impl HubHandle {
    pub fn new(config: HubConfig) -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub::new(config))),
        }
    }

    /// Registers a new connection's outbound queue.
    pub async fn connect(
        &self,
        connection: ConnectionId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        self.hub.lock().await.connect(connection, sender)
    }

    /// Processes one client event.
    pub async fn handle(
        &self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.hub.lock().await.handle(connection, event)
    }

    /// Removes a connection. If it was a session's GM, schedules the
    /// session's teardown after the configured grace delay.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut hub = self.hub.lock().await;
        let Some(session_id) = hub.disconnect(connection) else {
            return;
        };

        let grace = hub.config().gm_grace;
        let task = tokio::spawn(teardown(
            Arc::downgrade(&self.hub),
            session_id.clone(),
            grace,
        ));
        // Still under the lock: the task cannot reach the session before
        // its handle is attached.
        hub.set_teardown(&session_id, task.abort_handle());
        tracing::debug!(%session_id, ?grace, "teardown scheduled");
    }

    /// Returns a health snapshot.
    pub async fn status(&self) -> HubStatus {
        self.hub.lock().await.status()
    }

    /// Drops all sessions and connections, cancelling pending teardowns.
    pub async fn shutdown(&self) -> usize {
        self.hub.lock().await.shutdown()
    }

    /// Locks the hub for direct inspection.
    pub async fn lock(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().await
    }
}

impl Default for HubHandle {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

async fn teardown(hub: Weak<Mutex<Hub>>, session_id: SessionId, grace: Duration) {
    tokio::time::sleep(grace).await;
    let Some(hub) = hub.upgrade() else {
        return;
    };
    if hub.lock().await.expire(&session_id) {
        tracing::info!(%session_id, "closing session torn down");
    }
}
