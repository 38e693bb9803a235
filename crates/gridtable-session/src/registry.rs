//! Connection registry: which session (and role) each connection is in.

use std::collections::HashMap;

use gridtable_protocol::{ConnectionId, SessionId};

use crate::{Role, SessionError};

/// Where a connection belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub session_id: SessionId,
    pub role: Role,
}

/// Maps connections to the session they created or joined.
///
/// A connection is bound at most once. Unbound connections may still
/// list sessions; everything else requires a binding.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: HashMap<ConnectionId, Binding>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `connection` to `session_id` with the given role.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyBound`] if the connection is already
    /// in a session. The existing binding is kept.
    pub fn bind(
        &mut self,
        connection: ConnectionId,
        session_id: SessionId,
        role: Role,
    ) -> Result<(), SessionError> {
        if self.bindings.contains_key(&connection) {
            return Err(SessionError::AlreadyBound(connection));
        }
        tracing::debug!(conn_id = %connection, %session_id, %role, "connection bound");
        self.bindings.insert(connection, Binding { session_id, role });
        Ok(())
    }

    /// Fails fast if `connection` is already bound.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyBound`].
    pub fn ensure_unbound(&self, connection: ConnectionId) -> Result<(), SessionError> {
        if self.bindings.contains_key(&connection) {
            Err(SessionError::AlreadyBound(connection))
        } else {
            Ok(())
        }
    }

    /// Returns the binding for `connection`.
    ///
    /// # Errors
    /// Returns [`SessionError::NotBound`] if the connection has not
    /// created or joined a session.
    pub fn lookup(&self, connection: ConnectionId) -> Result<&Binding, SessionError> {
        self.bindings
            .get(&connection)
            .ok_or(SessionError::NotBound(connection))
    }

    /// Removes and returns the binding for `connection`, if any.
    pub fn unbind(&mut self, connection: ConnectionId) -> Option<Binding> {
        self.bindings.remove(&connection)
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
