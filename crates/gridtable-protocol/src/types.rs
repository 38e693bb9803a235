//! Core value types that travel on the wire.
//!
//! Identifiers, tokens and roster entries. Field names follow the
//! camelCase JSON the browser client already speaks (`sessionId`,
//! `isGM`, `createdAt`).

use std::fmt;

use chrono::{DateTime, Utc};
use gridtable_transport::ConnectionId;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a game session, chosen by the GM who creates it.
///
/// Compared byte-for-byte: `"abc"` and `"ABC"` are different sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a token, unique within one session.
///
/// Clients send ids either as JSON integers or as numeric strings (the
/// value of a DOM `data-id` attribute). Both are normalized here, once, to
/// an integer; everything downstream compares `TokenId`s only. Strings
/// that are not integers are rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenId(pub i64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TokenIdVisitor)
    }
}

struct TokenIdVisitor;

impl Visitor<'_> for TokenIdVisitor {
    type Value = TokenId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string holding an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenId, E> {
        Ok(TokenId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenId, E> {
        i64::try_from(v)
            .map(TokenId)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    // JavaScript has a single number type; `3.0` is still token 3.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TokenId, E> {
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Ok(TokenId(v as i64))
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenId, E> {
        v.trim()
            .parse::<i64>()
            .map(TokenId)
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// What a token depicts.
///
/// The server never validates the type; anything outside the known set
/// is carried through unchanged as [`TokenKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenKind {
    Pc,
    Monster,
    Npc,
    PropTree,
    PropRock,
    Building,
    Other(String),
}

impl TokenKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pc => "pc",
            Self::Monster => "monster",
            Self::Npc => "npc",
            Self::PropTree => "prop-tree",
            Self::PropRock => "prop-rock",
            Self::Building => "building",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for TokenKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pc" => Self::Pc,
            "monster" => Self::Monster,
            "npc" => Self::Npc,
            "prop-tree" => Self::PropTree,
            "prop-rock" => Self::PropRock,
            "building" => Self::Building,
            _ => Self::Other(raw),
        }
    }
}

impl From<TokenKind> for String {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Other(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

/// A token sent without a `type` carries an empty kind.
impl Default for TokenKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marker placed on the shared grid.
///
/// `col` and `row` are not bounds-checked; the grid size is a client
/// concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    #[serde(rename = "type", default)]
    pub kind: TokenKind,
    pub col: i64,
    pub row: i64,
    #[serde(default)]
    pub label: String,
}

// ---------------------------------------------------------------------------
// Roster and listings
// ---------------------------------------------------------------------------

/// One entry of a session roster as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    #[serde(rename = "isGM")]
    pub is_gm: bool,
}

/// A summary of a session returned by `list-sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub gm_name: String,
    pub player_count: usize,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Delivery scope of a server event, resolved against the roster of the
/// session the event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection in the session, including the one that acted.
    Room,

    /// Every connection in the session except the given one.
    RoomExcept(ConnectionId),

    /// A single connection, whether or not it is in a session.
    Connection(ConnectionId),
}
