//! Session lifecycle and broadcast routing for Gridtable.
//!
//! All sessions of a server live in one [`Hub`], guarded by a single
//! mutex behind [`HubHandle`]. Each action runs to completion under that
//! lock: resolve the connection, authorize, mutate, enqueue events.
//! Socket writes happen elsewhere, in per-connection writer tasks that
//! drain the queues the [`Router`] fills.
//!
//! # Key types
//!
//! - [`HubHandle`]: async entry point used by the server
//! - [`Hub`]: create/join/leave, token actions, teardown
//! - [`Router`]: per-connection outbound queues
//! - [`HubConfig`]: GM grace delay

mod config;
mod error;
mod handle;
mod hub;
mod router;

pub use config::{DEFAULT_GM_GRACE, HubConfig};
pub use error::RoomError;
pub use handle::HubHandle;
pub use hub::{
    DEFAULT_GM_NAME, DEFAULT_PLAYER_NAME, GM_DISCONNECTED_MESSAGE, Hub, HubStatus,
};
pub use router::{ClientReceiver, ClientSender, Router};
