//! Error types for the session layer.
//!
//! The `Display` text of each variant is exactly the message clients see
//! in `session-error` / `permission-denied` events.

use gridtable_protocol::{ConnectionId, SessionId, TokenId};

use crate::{SessionState, TokenAction};

/// Errors that can occur while creating, joining, or mutating a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `create-session` named an id that is already registered
    /// (including a session that is still closing).
    #[error("Session already exists")]
    AlreadyExists(SessionId),

    /// No session is registered under the given id.
    #[error("Session not found")]
    NotFound(SessionId),

    /// The session's GM left and it is waiting to be torn down.
    #[error("Session is closing")]
    Closing(SessionId),

    /// `create-session` / `join-session` arrived with a blank id.
    #[error("Session ID is required")]
    MissingId,

    /// The connection already created or joined a session.
    #[error("Already in a session")]
    AlreadyBound(ConnectionId),

    /// The connection has not created or joined any session.
    #[error("Not in a session")]
    NotBound(ConnectionId),

    /// A non-GM connection attempted a GM-only token action.
    #[error("Only the GM can {0} tokens")]
    PermissionDenied(TokenAction),

    /// `add-token` reused an id already present in the session.
    #[error("Token {0} already exists")]
    DuplicateToken(TokenId),

    /// The lifecycle state machine refused a transition.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}
