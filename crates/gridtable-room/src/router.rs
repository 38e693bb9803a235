//! Broadcast router: per-connection outbound queues.
//!
//! Every connection owns an unbounded queue of [`ServerEvent`]s drained by
//! its writer task. The router only enqueues; it never touches a socket,
//! so it can run under the hub lock without blocking on slow clients.

use std::collections::HashMap;

use gridtable_protocol::{ConnectionId, Recipient, ServerEvent};
use tokio::sync::mpsc;

use crate::RoomError;

/// Channel sender for delivering events to one connection.
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Channel receiver a connection's writer task drains.
pub type ClientReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Maps connections to their outbound queues.
#[derive(Debug, Default)]
pub struct Router {
    senders: HashMap<ConnectionId, ClientSender>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the outbound queue for `connection`.
    ///
    /// # Errors
    /// Returns [`RoomError::AlreadyConnected`] if the connection already
    /// has a queue.
    pub fn register(
        &mut self,
        connection: ConnectionId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        if self.senders.contains_key(&connection) {
            return Err(RoomError::AlreadyConnected(connection));
        }
        self.senders.insert(connection, sender);
        Ok(())
    }

    /// Drops the queue for `connection`. Its writer task sees the channel
    /// close once everything already queued has been sent.
    pub fn unregister(&mut self, connection: ConnectionId) -> bool {
        self.senders.remove(&connection).is_some()
    }

    pub fn is_registered(&self, connection: ConnectionId) -> bool {
        self.senders.contains_key(&connection)
    }

    /// Enqueues `event` for one connection. Silently drops it if the
    /// connection is gone.
    pub fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        match self.senders.get(&connection) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    tracing::debug!(conn_id = %connection, "outbound queue closed, event dropped");
                }
            }
            None => {
                tracing::debug!(conn_id = %connection, event = event.name(), "no route, event dropped");
            }
        }
    }

    /// Delivers each event to the recipients it names.
    ///
    /// `room` is the current roster of the session the events belong to,
    /// used to resolve [`Recipient::Room`] and [`Recipient::RoomExcept`].
    /// Events are enqueued in order, so every recipient observes them in
    /// the order they were produced.
    pub fn dispatch(&self, room: &[ConnectionId], events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::Room => {
                    for &connection in room {
                        self.send_to(connection, event.clone());
                    }
                }
                Recipient::RoomExcept(excluded) => {
                    for &connection in room {
                        if connection != excluded {
                            self.send_to(connection, event.clone());
                        }
                    }
                }
                Recipient::Connection(connection) => {
                    self.send_to(connection, event);
                }
            }
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Drops every queue.
    pub fn clear(&mut self) {
        self.senders.clear();
    }
}
