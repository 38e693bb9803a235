//! # Gridtable
//!
//! Real-time session server for a shared tabletop battle map.
//!
//! A Game Master creates a session, players join it, and the GM places,
//! moves, and removes tokens on a grid. Every change is pushed to the
//! other people at the table over WebSocket. The server is the single
//! authority: it owns the session registry, lets only the GM change
//! tokens, and fans out each change to the right connections in order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridtable::prelude::*;
//!
//! # async fn start() -> Result<(), GridtableError> {
//! let server = GridtableServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use error::GridtableError;
pub use server::{GridtableServer, GridtableServerBuilder};

pub use gridtable_protocol as protocol;
pub use gridtable_room as room;
pub use gridtable_session as session;
pub use gridtable_transport as transport;

/// The types most servers need.
pub mod prelude {
    pub use crate::{GridtableError, GridtableServer, GridtableServerBuilder, ServerConfig};
    pub use gridtable_protocol::{
        ClientEvent, ServerEvent, SessionId, Token, TokenId, TokenKind,
    };
    pub use gridtable_room::{HubConfig, HubHandle, HubStatus};
}
