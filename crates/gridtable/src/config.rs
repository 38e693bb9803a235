//! Server configuration.

use std::time::Duration;

use gridtable_room::{DEFAULT_GM_GRACE, HubConfig};

/// Address the server listens on unless told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Everything needed to start a [`GridtableServer`](crate::GridtableServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` for the WebSocket listener. Port 0 picks a free port.
    pub bind_addr: String,

    /// Delay between a GM disconnecting and their session being removed.
    pub gm_grace: Duration,

    /// Close connections that send nothing for this long. `None` keeps
    /// idle connections open indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl ServerConfig {
    /// The slice of this config the hub needs.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            gm_grace: self.gm_grace,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            gm_grace: DEFAULT_GM_GRACE,
            idle_timeout: None,
        }
    }
}
