//! Session state for Gridtable.
//!
//! This crate owns the data a game session is made of and the rules that
//! protect it:
//!
//! 1. **Session Store**: every session by id ([`SessionStore`])
//! 2. **Connection Registry**: which session each connection is in
//!    ([`ConnectionRegistry`])
//! 3. **Authorization Gate**: only the GM mutates tokens ([`authorize`])
//! 4. **Token mutations**: add/move/delete on a [`Session`]
//!
//! Everything here is synchronous and single-owner. The room layer wraps
//! it in a mutex and decides who hears about each change.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← lifecycle, broadcast routing, teardown timers
//!     ↕
//! Session Layer (this crate)  ← sessions, rosters, tokens, GM rule
//!     ↕
//! Protocol Layer (below)  ← SessionId, TokenId, Token, PlayerEntry
//! ```

mod auth;
mod error;
mod registry;
mod session;
mod store;
mod tokens;

pub use auth::{TokenAction, authorize};
pub use error::SessionError;
pub use registry::{Binding, ConnectionRegistry};
pub use session::{Member, Role, Session, SessionState};
pub use store::SessionStore;
