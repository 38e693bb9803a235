//! The session store: every session the server knows about.
//!
//! # Concurrency note
//!
//! `SessionStore` is not thread-safe by itself; it is a plain `HashMap`.
//! It is owned by the room layer's hub and accessed through a mutex at
//! that level, so every action sees and mutates a consistent store.

use std::collections::HashMap;

use gridtable_protocol::{ConnectionId, SessionId, SessionSummary};

use crate::{Session, SessionError};

/// In-memory map of session id to session record.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ [Active] ──(begin_closing)──→ [Closing] ──→ delete()
/// ```
///
/// Ids stay reserved until [`delete`](Self::delete); a closing session
/// still blocks `create` with the same id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session with `gm_connection` as its GM.
    ///
    /// # Errors
    /// - [`SessionError::MissingId`] if `id` is blank
    /// - [`SessionError::AlreadyExists`] if `id` is taken, in any state
    pub fn create(
        &mut self,
        id: SessionId,
        gm_connection: ConnectionId,
        gm_name: impl Into<String>,
    ) -> Result<&mut Session, SessionError> {
        if id.is_blank() {
            return Err(SessionError::MissingId);
        }
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyExists(id));
        }

        let session = Session::new(id.clone(), gm_connection, gm_name);
        tracing::info!(
            session_id = %id,
            gm = %gm_connection,
            gm_name = session.gm_name(),
            "session created"
        );
        Ok(self.sessions.entry(id).or_insert(session))
    }

    /// Looks up a session.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session has this id.
    pub fn get(&self, id: &SessionId) -> Result<&Session, SessionError> {
        self.sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Looks up a session for mutation.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session has this id.
    pub fn get_mut(&mut self, id: &SessionId) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Removes a session, marking it destroyed and cancelling any pending
    /// teardown. Returns the removed record, or `None` if it was already
    /// gone.
    pub fn delete(&mut self, id: &SessionId) -> Option<Session> {
        let mut session = self.sessions.remove(id)?;
        session.mark_destroyed();
        tracing::info!(session_id = %id, "session destroyed");
        Some(session)
    }

    /// Summaries of every active session, oldest first.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut list: Vec<_> = self
            .sessions
            .values()
            .filter(|s| s.is_active())
            .map(Session::summary)
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }

    /// Removes every session, cancelling pending teardowns.
    pub fn clear(&mut self) -> Vec<Session> {
        let mut drained: Vec<_> = self.sessions.drain().map(|(_, s)| s).collect();
        for session in &mut drained {
            session.mark_destroyed();
        }
        drained
    }

    /// Number of registered sessions (active or closing).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionState;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn sid(id: &str) -> SessionId {
        SessionId::new(id)
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[test]
    fn test_create_new_id_returns_active_session() {
        let mut store = SessionStore::new();

        let session = store.create(sid("abc"), conn(1), "GM").expect("should create");

        assert_eq!(session.id(), &sid("abc"));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.gm_connection(), conn(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_taken_id_returns_already_exists() {
        let mut store = SessionStore::new();
        store.create(sid("abc"), conn(1), "GM").unwrap();

        let result = store.create(sid("abc"), conn(2), "Other");

        assert!(matches!(result, Err(SessionError::AlreadyExists(id)) if id == sid("abc")));
        assert_eq!(store.get(&sid("abc")).unwrap().gm_connection(), conn(1));
    }

    #[test]
    fn test_create_is_case_sensitive() {
        let mut store = SessionStore::new();
        store.create(sid("abc"), conn(1), "GM").unwrap();

        assert!(store.create(sid("ABC"), conn(2), "GM").is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_blank_id_is_rejected() {
        let mut store = SessionStore::new();

        let result = store.create(sid("  "), conn(1), "GM");

        assert!(matches!(result, Err(SessionError::MissingId)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_closing_id_still_reserved() {
        let mut store = SessionStore::new();
        store.create(sid("abc"), conn(1), "GM").unwrap().begin_closing().unwrap();

        let result = store.create(sid("abc"), conn(2), "GM");

        assert!(matches!(result, Err(SessionError::AlreadyExists(_))));
    }

    // =====================================================================
    // get() / delete()
    // =====================================================================

    #[test]
    fn test_get_unknown_returns_not_found() {
        let store = SessionStore::new();

        let result = store.get(&sid("nope"));

        assert!(matches!(result, Err(SessionError::NotFound(id)) if id == sid("nope")));
    }

    #[test]
    fn test_delete_removes_and_marks_destroyed() {
        let mut store = SessionStore::new();
        store.create(sid("abc"), conn(1), "GM").unwrap();

        let removed = store.delete(&sid("abc")).expect("should remove");

        assert_eq!(removed.state(), SessionState::Destroyed);
        assert!(store.get(&sid("abc")).is_err());
        assert!(store.delete(&sid("abc")).is_none());
    }

    #[test]
    fn test_delete_frees_id_for_reuse() {
        let mut store = SessionStore::new();
        store.create(sid("abc"), conn(1), "GM").unwrap();
        store.delete(&sid("abc"));

        assert!(store.create(sid("abc"), conn(2), "GM").is_ok());
    }

    // =====================================================================
    // summaries() / clear()
    // =====================================================================

    #[test]
    fn test_summaries_lists_only_active_sessions() {
        let mut store = SessionStore::new();
        store.create(sid("open"), conn(1), "GM").unwrap();
        store.create(sid("closing"), conn(2), "GM").unwrap().begin_closing().unwrap();

        let list = store.summaries();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, sid("open"));
        assert_eq!(list[0].player_count, 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = SessionStore::new();
        store.create(sid("a"), conn(1), "GM").unwrap();
        store.create(sid("b"), conn(2), "GM").unwrap();

        let drained = store.clear();

        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|s| s.state() == SessionState::Destroyed));
        assert!(store.is_empty());
    }
}
