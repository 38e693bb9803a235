//! Hub configuration.

use std::time::Duration;

/// How long a session lingers in Closing after its GM disconnects.
pub const DEFAULT_GM_GRACE: Duration = Duration::from_secs(5);

/// Configuration for the session hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Delay between the GM disconnecting and the session being removed.
    ///
    /// Remaining members receive `gm-disconnected` immediately; the
    /// session id stays reserved until this elapses.
    pub gm_grace: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            gm_grace: DEFAULT_GM_GRACE,
        }
    }
}
