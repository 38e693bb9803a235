//! Error types for the room layer.

use gridtable_protocol::ConnectionId;

/// Errors that can occur while routing actions through the hub.
///
/// Session-level failures (unknown session, permission denied, ...) are
/// answered with events to the acting client and never surface here.
/// What remains are misuses of the hub by the server itself.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection was never registered, or already disconnected.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    /// The connection was registered twice.
    #[error("connection {0} is already registered")]
    AlreadyConnected(ConnectionId),
}
