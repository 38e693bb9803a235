//! Session types: the record of one tabletop game.
//!
//! A session tracks:
//! - WHO runs it (the GM connection, fixed at creation)
//! - WHO is watching (the roster, in join order)
//! - WHAT is on the map (the token list, in add order)
//! - WHERE it is in its lifecycle (active, closing, destroyed)

use std::fmt;

use chrono::{DateTime, Utc};
use gridtable_protocol::{
    ConnectionId, PlayerEntry, SessionId, SessionSnapshot, SessionSummary, Token,
};
use tokio::task::AbortHandle;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Active ──(GM disconnects)──→ Closing ──(grace delay)──→ Destroyed
/// ```
///
/// - **Active**: accepting joins; the GM may mutate tokens.
/// - **Closing**: the GM is gone. The id stays reserved, joins are
///   refused, and a teardown timer is pending.
/// - **Destroyed**: removed from the store. Only ever observed on a
///   record that has just been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closing,
    Destroyed,
}

impl SessionState {
    /// Returns `true` if the session accepts joins and token actions.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the state that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Closing),
            Self::Closing => Some(Self::Destroyed),
            Self::Destroyed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Closing => write!(f, "Closing"),
            Self::Destroyed => write!(f, "Destroyed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Role / Member
// ---------------------------------------------------------------------------

/// What a connection is allowed to do inside its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The creator. Sole writer of the token list.
    GameMaster,
    /// Everyone else. Read-only viewer.
    Player,
}

impl Role {
    pub fn is_gm(self) -> bool {
        matches!(self, Self::GameMaster)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameMaster => write!(f, "gm"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection: ConnectionId,
    pub name: String,
    pub role: Role,
}

impl Member {
    /// The entry as clients see it in `players[]`.
    pub fn entry(&self) -> PlayerEntry {
        PlayerEntry {
            name: self.name.clone(),
            is_gm: self.role.is_gm(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One active tabletop game.
///
/// Created through [`SessionStore::create`](crate::SessionStore::create),
/// which guarantees the id is unique. While the session is
/// [`Active`](SessionState::Active) the roster holds exactly one
/// [`Role::GameMaster`] entry, keyed by [`gm_connection`](Self::gm_connection).
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    gm_connection: ConnectionId,
    gm_name: String,
    pub(crate) members: Vec<Member>,
    pub(crate) tokens: Vec<Token>,
    created_at: DateTime<Utc>,
    state: SessionState,
    teardown: Option<AbortHandle>,
}

impl Session {
    /// Creates an active session whose only member is its GM.
    pub fn new(id: SessionId, gm_connection: ConnectionId, gm_name: impl Into<String>) -> Self {
        let gm_name = gm_name.into();
        Self {
            members: vec![Member {
                connection: gm_connection,
                name: gm_name.clone(),
                role: Role::GameMaster,
            }],
            id,
            gm_connection,
            gm_name,
            tokens: Vec::new(),
            created_at: Utc::now(),
            state: SessionState::Active,
            teardown: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The connection that created the session. Never changes.
    pub fn gm_connection(&self) -> ConnectionId {
        self.gm_connection
    }

    pub fn gm_name(&self) -> &str {
        &self.gm_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Returns `true` if `connection` is this session's GM.
    pub fn is_gm(&self, connection: ConnectionId) -> bool {
        self.gm_connection == connection
    }

    /// Roster entries in join order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Looks up a roster entry by connection.
    pub fn member(&self, connection: ConnectionId) -> Option<&Member> {
        self.members.iter().find(|m| m.connection == connection)
    }

    /// Connection ids of every member, in join order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.iter().map(|m| m.connection)
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    /// The roster as clients see it.
    pub fn roster(&self) -> Vec<PlayerEntry> {
        self.members.iter().map(Member::entry).collect()
    }

    /// Tokens in add order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Adds a non-GM member.
    ///
    /// # Errors
    /// Returns [`SessionError::Closing`] unless the session is active.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        name: impl Into<String>,
    ) -> Result<&Member, SessionError> {
        if !self.is_active() {
            return Err(SessionError::Closing(self.id.clone()));
        }
        self.members.push(Member {
            connection,
            name: name.into(),
            role: Role::Player,
        });
        Ok(&self.members[self.members.len() - 1])
    }

    /// Removes `connection` from the roster and returns its entry.
    pub fn leave(&mut self, connection: ConnectionId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.connection == connection)?;
        Some(self.members.remove(index))
    }

    /// Full state as handed to `connection` on create or join.
    pub fn snapshot(&self, connection: ConnectionId) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            is_gm: self.is_gm(connection),
            players: self.roster(),
            tokens: self.tokens.clone(),
        }
    }

    /// Listing entry for `sessions-list`.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            gm_name: self.gm_name.clone(),
            player_count: self.player_count(),
            created_at: self.created_at,
        }
    }

    /// Moves the session from Active to Closing.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] if the session is not
    /// active.
    pub fn begin_closing(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Closing)
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.state = SessionState::Destroyed;
        self.cancel_teardown();
    }

    fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::info!(session_id = %self.id, from = %self.state, %to, "session state changed");
        self.state = to;
        Ok(())
    }

    /// Records the pending teardown task so it can be cancelled later.
    pub fn set_teardown(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.teardown.replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the pending teardown task, if any.
    pub fn cancel_teardown(&mut self) {
        if let Some(handle) = self.teardown.take() {
            handle.abort();
        }
    }

    /// Detaches the teardown handle without aborting it. Called by the
    /// teardown task itself before it deletes the session.
    pub fn take_teardown(&mut self) -> Option<AbortHandle> {
        self.teardown.take()
    }

    pub fn has_pending_teardown(&self) -> bool {
        self.teardown.is_some()
    }
}
