//! Client and server events.
//!
//! Every frame is one JSON object of the form
//! `{"event": "<kebab-case name>", "data": <payload>}`. Inbound frames
//! decode into [`ClientEvent`], which the room layer matches exhaustively;
//! outbound frames are built as [`ServerEvent`]s.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{PlayerEntry, SessionId, SessionSummary, Token, TokenId};

/// Payload of a request that carries no fields.
///
/// Accepts any JSON value (`{}`, `null`, ...) and ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoPayload {}

impl<'de> Deserialize<'de> for NoPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Self {})
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Open a new session with the sender as its Game Master.
    CreateSession {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        #[serde(rename = "gmName", default)]
        gm_name: String,
    },

    /// Join an existing session as a player.
    JoinSession {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        #[serde(rename = "playerName", default)]
        player_name: String,
    },

    /// Place a token (GM only). The id is chosen by the client.
    AddToken(Token),

    /// Move a token to a new cell (GM only).
    MoveToken { id: TokenId, col: i64, row: i64 },

    /// Remove a token (GM only).
    DeleteToken { id: TokenId },

    /// Ask for a snapshot of every open session.
    ///
    /// `data` is optional; a missing payload decodes as `None`.
    ListSessions(Option<NoPayload>),
}

impl ClientEvent {
    /// Returns the wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create-session",
            Self::JoinSession { .. } => "join-session",
            Self::AddToken(_) => "add-token",
            Self::MoveToken { .. } => "move-token",
            Self::DeleteToken { .. } => "delete-token",
            Self::ListSessions(_) => "list-sessions",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Full session state handed to a connection when it creates or joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    #[serde(rename = "isGM")]
    pub is_gm: bool,
    pub players: Vec<PlayerEntry>,
    pub tokens: Vec<Token>,
}

/// Roster change notification: who joined or left, and the new roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterUpdate {
    pub player_name: String,
    pub players: Vec<PlayerEntry>,
}

/// Everything the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// The sender created a session and is its GM.
    SessionCreated(SessionSnapshot),

    /// The sender joined a session as a player.
    SessionJoined(SessionSnapshot),

    /// A create/join (or other session-level request) was refused.
    SessionError { message: String },

    /// A token was placed. Sent to the whole room.
    TokenAdded(Token),

    /// A token moved. Sent to everyone but the mover.
    TokenMoved { id: TokenId, col: i64, row: i64 },

    /// A token was removed. Sent to the whole room.
    TokenDeleted { id: TokenId },

    /// Someone joined the session.
    PlayerJoined(RosterUpdate),

    /// A player left the session.
    PlayerLeft(RosterUpdate),

    /// The GM left; the session will be torn down shortly.
    GmDisconnected { message: String },

    /// A non-GM attempted a GM-only action.
    PermissionDenied { message: String },

    /// Reply to `list-sessions`.
    SessionsList(Vec<SessionSummary>),
}

impl ServerEvent {
    /// Returns the wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionCreated(_) => "session-created",
            Self::SessionJoined(_) => "session-joined",
            Self::SessionError { .. } => "session-error",
            Self::TokenAdded(_) => "token-added",
            Self::TokenMoved { .. } => "token-moved",
            Self::TokenDeleted { .. } => "token-deleted",
            Self::PlayerJoined(_) => "player-joined",
            Self::PlayerLeft(_) => "player-left",
            Self::GmDisconnected { .. } => "gm-disconnected",
            Self::PermissionDenied { .. } => "permission-denied",
            Self::SessionsList(_) => "sessions-list",
        }
    }
}
