//! Unified error type for Gridtable.

use gridtable_protocol::ProtocolError;
use gridtable_room::RoomError;
use gridtable_transport::TransportError;

/// Top-level error that wraps the errors a running server can hit.
///
/// Session-level failures never appear here: the hub answers them with
/// events to the acting client.
///
/// The `#[from]` attribute on each variant generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridtableError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unregistered connection).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use gridtable_protocol::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Socket("reset by peer".into());
        let gridtable_err: GridtableError = err.into();
        assert!(matches!(gridtable_err, GridtableError::Transport(_)));
        assert!(gridtable_err.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_from_protocol_error() {
        let json_err = serde_json::from_str::<u8>("nope").unwrap_err();
        let gridtable_err: GridtableError = ProtocolError::Decode(json_err).into();
        assert!(matches!(gridtable_err, GridtableError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::UnknownConnection(ConnectionId::new(1));
        let gridtable_err: GridtableError = err.into();
        assert!(matches!(gridtable_err, GridtableError::Room(_)));
    }
}
