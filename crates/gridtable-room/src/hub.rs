//! The hub: session lifecycle and token actions, end to end.
//!
//! Every inbound [`ClientEvent`] is resolved here in one synchronous step:
//! look up the connection's binding, authorize, mutate the store, and
//! enqueue the resulting events on the router. The hub itself is not
//! thread-safe; [`HubHandle`](crate::HubHandle) puts it behind a mutex.

use chrono::{DateTime, Utc};
use gridtable_protocol::{
    ClientEvent, ConnectionId, Recipient, RosterUpdate, ServerEvent, SessionId,
    SessionSnapshot, Token, TokenId,
};
use gridtable_session::{
    ConnectionRegistry, Role, Session, SessionError, SessionState, SessionStore,
    TokenAction, authorize,
};
use serde::Serialize;
use tokio::task::AbortHandle;

use crate::{ClientSender, HubConfig, RoomError, Router};

/// Sent to the remaining members when the GM's connection drops.
pub const GM_DISCONNECTED_MESSAGE: &str = "Game Master has disconnected. Session will be closed.";

/// Display name used when `create-session` carries a blank `gmName`.
pub const DEFAULT_GM_NAME: &str = "Game Master";

/// Display name used when `join-session` carries a blank `playerName`.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

type Outbound = Vec<(Recipient, ServerEvent)>;

/// A point-in-time view of the hub, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub status: &'static str,
    /// Registered sessions, including those still closing.
    pub active_sessions: usize,
    /// Open connections, bound or not.
    pub connections: usize,
    pub timestamp: DateTime<Utc>,
}

/// Owns the session store, the connection registry, and the router.
#[derive(Debug, Default)]
pub struct Hub {
    config: HubConfig,
    store: SessionStore,
    registry: ConnectionRegistry,
    router: Router,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Looks up a session by id.
    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.store.get(id).ok()
    }

    /// Registers a new connection's outbound queue.
    ///
    /// # Errors
    /// Returns [`RoomError::AlreadyConnected`] if `connection` is already
    /// registered.
    pub fn connect(
        &mut self,
        connection: ConnectionId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        self.router.register(connection, sender)?;
        tracing::debug!(conn_id = %connection, connections = self.router.len(), "connection registered");
        Ok(())
    }

    /// Processes one client event to completion.
    ///
    /// Rejections (unknown session, permission denied, ...) are answered
    /// with events to `connection` and leave state untouched.
    ///
    /// # Errors
    /// Returns [`RoomError::UnknownConnection`] if `connection` was never
    /// registered or has already disconnected.
    pub fn handle(&mut self, connection: ConnectionId, event: ClientEvent) -> Result<(), RoomError> {
        if !self.router.is_registered(connection) {
            return Err(RoomError::UnknownConnection(connection));
        }
        tracing::debug!(conn_id = %connection, event = event.name(), "handling event");

        match event {
            ClientEvent::CreateSession {
                session_id,
                gm_name,
            } => self.create_session(connection, session_id, gm_name),
            ClientEvent::JoinSession {
                session_id,
                player_name,
            } => self.join_session(connection, session_id, player_name),
            ClientEvent::AddToken(token) => self.add_token(connection, token),
            ClientEvent::MoveToken { id, col, row } => self.move_token(connection, id, col, row),
            ClientEvent::DeleteToken { id } => self.delete_token(connection, id),
            ClientEvent::ListSessions(_) => self.list_sessions(connection),
        }
        Ok(())
    }

    // -- Lifecycle --------------------------------------------------------

    fn create_session(&mut self, connection: ConnectionId, session_id: SessionId, gm_name: String) {
        let gm_name = display_name(gm_name, DEFAULT_GM_NAME);
        match self.try_create(connection, session_id, gm_name) {
            Ok(snapshot) => self
                .router
                .send_to(connection, ServerEvent::SessionCreated(snapshot)),
            Err(err) => self.reject(connection, err),
        }
    }

    fn try_create(
        &mut self,
        connection: ConnectionId,
        session_id: SessionId,
        gm_name: String,
    ) -> Result<SessionSnapshot, SessionError> {
        self.registry.ensure_unbound(connection)?;
        let snapshot = self
            .store
            .create(session_id.clone(), connection, gm_name)?
            .snapshot(connection);
        self.registry.bind(connection, session_id, Role::GameMaster)?;
        Ok(snapshot)
    }

    fn join_session(&mut self, connection: ConnectionId, session_id: SessionId, player_name: String) {
        let player_name = display_name(player_name, DEFAULT_PLAYER_NAME);
        match self.try_join(connection, session_id, player_name) {
            Ok((room, outbound)) => self.router.dispatch(&room, outbound),
            Err(err) => self.reject(connection, err),
        }
    }

    fn try_join(
        &mut self,
        connection: ConnectionId,
        session_id: SessionId,
        player_name: String,
    ) -> Result<(Vec<ConnectionId>, Outbound), SessionError> {
        self.registry.ensure_unbound(connection)?;
        if session_id.is_blank() {
            return Err(SessionError::MissingId);
        }

        let session = self.store.get_mut(&session_id)?;
        session.join(connection, player_name.clone())?;
        tracing::info!(
            %session_id,
            conn_id = %connection,
            %player_name,
            players = session.player_count(),
            "player joined"
        );

        let room: Vec<_> = session.connections().collect();
        let outbound = vec![
            (
                Recipient::Connection(connection),
                ServerEvent::SessionJoined(session.snapshot(connection)),
            ),
            (
                Recipient::RoomExcept(connection),
                ServerEvent::PlayerJoined(RosterUpdate {
                    player_name,
                    players: session.roster(),
                }),
            ),
        ];
        self.registry.bind(connection, session_id, Role::Player)?;
        Ok((room, outbound))
    }

    /// Removes `connection` from the hub and from its session's roster.
    ///
    /// If the connection was a session's GM, the session moves to Closing
    /// and its id is returned so the caller can schedule the teardown.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<SessionId> {
        self.router.unregister(connection);
        let binding = self.registry.unbind(connection)?;
        let session = self.store.get_mut(&binding.session_id).ok()?;

        let member = session.leave(connection);
        let room: Vec<_> = session.connections().collect();

        if session.is_gm(connection) {
            if let Err(err) = session.begin_closing() {
                tracing::warn!(session_id = %binding.session_id, %err, "GM left a session that was not active");
                return None;
            }
            tracing::info!(
                session_id = %binding.session_id,
                remaining = room.len(),
                "GM disconnected, session closing"
            );
            self.router.dispatch(
                &room,
                vec![(
                    Recipient::Room,
                    ServerEvent::GmDisconnected {
                        message: GM_DISCONNECTED_MESSAGE.to_owned(),
                    },
                )],
            );
            Some(binding.session_id)
        } else {
            let player_name = member.map(|m| m.name).unwrap_or_default();
            tracing::info!(
                session_id = %binding.session_id,
                conn_id = %connection,
                %player_name,
                "player left"
            );
            let update = RosterUpdate {
                player_name,
                players: session.roster(),
            };
            self.router
                .dispatch(&room, vec![(Recipient::Room, ServerEvent::PlayerLeft(update))]);
            None
        }
    }

    /// Attaches the pending teardown task to a closing session.
    pub fn set_teardown(&mut self, id: &SessionId, handle: AbortHandle) -> bool {
        match self.store.get_mut(id) {
            Ok(session) => {
                session.set_teardown(handle);
                true
            }
            Err(_) => {
                handle.abort();
                false
            }
        }
    }

    /// Completes the grace delay of a closing session: removes it.
    ///
    /// Does nothing (and returns `false`) unless the session is Closing.
    pub fn expire(&mut self, id: &SessionId) -> bool {
        match self.store.get_mut(id) {
            Ok(session) if session.state() == SessionState::Closing => {
                session.take_teardown();
            }
            _ => return false,
        }
        self.destroy_session(id)
    }

    /// Removes a session and unbinds everyone still in it.
    pub fn destroy_session(&mut self, id: &SessionId) -> bool {
        let Some(session) = self.store.delete(id) else {
            return false;
        };
        for connection in session.connections() {
            if self
                .registry
                .lookup(connection)
                .is_ok_and(|binding| &binding.session_id == id)
            {
                self.registry.unbind(connection);
            }
        }
        true
    }

    // -- Token actions ----------------------------------------------------

    fn add_token(&mut self, connection: ConnectionId, token: Token) {
        self.mutate_tokens(connection, TokenAction::Add, |session| {
            let added = session.add_token(token)?.clone();
            tracing::debug!(session_id = %session.id(), token_id = added.id.0, "token added");
            Ok(vec![(Recipient::Room, ServerEvent::TokenAdded(added))])
        });
    }

    fn move_token(&mut self, connection: ConnectionId, id: TokenId, col: i64, row: i64) {
        self.mutate_tokens(connection, TokenAction::Move, |session| {
            match session.move_token(id, col, row) {
                Some(token) => Ok(vec![(
                    Recipient::RoomExcept(connection),
                    ServerEvent::TokenMoved {
                        id: token.id,
                        col: token.col,
                        row: token.row,
                    },
                )]),
                None => {
                    tracing::debug!(token_id = id.0, "move of unknown token ignored");
                    Ok(Vec::new())
                }
            }
        });
    }

    fn delete_token(&mut self, connection: ConnectionId, id: TokenId) {
        self.mutate_tokens(connection, TokenAction::Delete, |session| {
            match session.remove_token(id) {
                Some(token) => Ok(vec![(
                    Recipient::Room,
                    ServerEvent::TokenDeleted { id: token.id },
                )]),
                None => {
                    tracing::debug!(token_id = id.0, "delete of unknown token ignored");
                    Ok(Vec::new())
                }
            }
        });
    }

    /// Resolves the acting connection's session, checks the GM rule, and
    /// applies `apply`. Events are routed to the session's roster.
    fn mutate_tokens<F>(&mut self, connection: ConnectionId, action: TokenAction, apply: F)
    where
        F: FnOnce(&mut Session) -> Result<Outbound, SessionError>,
    {
        let session_id = match self.registry.lookup(connection) {
            Ok(binding) => binding.session_id.clone(),
            Err(_) => {
                tracing::debug!(conn_id = %connection, %action, "token action outside a session ignored");
                return;
            }
        };
        let Ok(session) = self.store.get_mut(&session_id) else {
            tracing::debug!(conn_id = %connection, %session_id, %action, "token action on a vanished session ignored");
            return;
        };

        let outcome = match authorize(session, connection, action) {
            Ok(()) => apply(session),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(outbound) => {
                let room: Vec<_> = session.connections().collect();
                self.router.dispatch(&room, outbound);
            }
            Err(err) => self.reject(connection, err),
        }
    }

    // -- Queries ----------------------------------------------------------

    fn list_sessions(&mut self, connection: ConnectionId) {
        let list = self.store.summaries();
        tracing::debug!(conn_id = %connection, sessions = list.len(), "listing sessions");
        self.router.send_to(connection, ServerEvent::SessionsList(list));
    }

    /// Returns a health snapshot.
    pub fn status(&self) -> HubStatus {
        HubStatus {
            status: "ok",
            active_sessions: self.store.len(),
            connections: self.router.len(),
            timestamp: Utc::now(),
        }
    }

    /// Drops every session (cancelling pending teardowns), every binding,
    /// and every outbound queue. Returns how many sessions were dropped.
    pub fn shutdown(&mut self) -> usize {
        let dropped = self.store.clear().len();
        self.registry.clear();
        self.router.clear();
        tracing::info!(sessions = dropped, "hub shut down");
        dropped
    }

    /// Answers a rejected action. Only ever reaches the acting connection.
    fn reject(&self, connection: ConnectionId, err: SessionError) {
        tracing::debug!(conn_id = %connection, %err, "action rejected");
        let event = match err {
            SessionError::PermissionDenied(_) => ServerEvent::PermissionDenied {
                message: err.to_string(),
            },
            _ => ServerEvent::SessionError {
                message: err.to_string(),
            },
        };
        self.router.send_to(connection, event);
    }
}

/// Substitutes `default` for a blank display name.
fn display_name(raw: String, default: &str) -> String {
    if raw.trim().is_empty() {
        default.to_owned()
    } else {
        raw
    }
}
