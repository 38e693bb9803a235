//! Wire protocol for Gridtable.
//!
//! This crate defines the "language" browser clients and the server speak:
//!
//! - **Types** ([`SessionId`], [`TokenId`], [`Token`], [`PlayerEntry`],
//!   [`SessionSummary`]): the values that travel on the wire.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): the named frames,
//!   encoded as `{"event": "...", "data": ...}`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the session
//! layer (who is in which session). It doesn't know about connections or
//! sessions beyond their identifiers.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Session / Room (state)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, NoPayload, RosterUpdate, ServerEvent, SessionSnapshot};
pub use types::{
    PlayerEntry, Recipient, SessionId, SessionSummary, Token, TokenId, TokenKind,
};

pub use gridtable_transport::ConnectionId;
