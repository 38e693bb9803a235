//! Authorization gate for token mutations.
//!
//! The rule is simple: only the connection that created a session may
//! change its tokens. Identity is whatever connection the transport
//! assigned; display names play no part.

use std::fmt;

use gridtable_protocol::ConnectionId;

use crate::{Session, SessionError};

/// A GM-only action against a session's token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAction {
    Add,
    Move,
    Delete,
}

impl fmt::Display for TokenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Move => write!(f, "move"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Checks that `actor` may perform `action` on `session`.
///
/// # Errors
/// Returns [`SessionError::PermissionDenied`] unless `actor` is the
/// session's GM connection.
pub fn authorize(
    session: &Session,
    actor: ConnectionId,
    action: TokenAction,
) -> Result<(), SessionError> {
    if session.is_gm(actor) {
        Ok(())
    } else {
        tracing::warn!(
            session_id = %session.id(),
            conn_id = %actor,
            %action,
            "token action denied: not the GM"
        );
        Err(SessionError::PermissionDenied(action))
    }
}
