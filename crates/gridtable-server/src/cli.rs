use std::time::Duration;

use clap::Parser;
use gridtable::{DEFAULT_BIND_ADDR, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "gridtable-server", about = "Gridtable battle map session server")]
pub struct Args {
    /// Address to listen on for WebSocket connections
    #[arg(short, long, env = "GRIDTABLE_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Seconds a session stays open after its GM disconnects
    #[arg(long, env = "GRIDTABLE_GM_GRACE_SECS", default_value_t = 5)]
    pub gm_grace_secs: u64,

    /// Close connections that send nothing for this many seconds
    #[arg(long, env = "GRIDTABLE_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind.clone(),
            gm_grace: Duration::from_secs(self.gm_grace_secs),
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["gridtable-server"]);
        let config = args.server_config();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.gm_grace, Duration::from_secs(5));
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "gridtable-server",
            "--bind",
            "127.0.0.1:4000",
            "--gm-grace-secs",
            "30",
            "--idle-timeout-secs",
            "600",
        ]);
        let config = args.server_config();
        assert_eq!(config.bind_addr, "127.0.0.1:4000");
        assert_eq!(config.gm_grace, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_args_rejects_bad_grace() {
        let result = Args::try_parse_from(["gridtable-server", "--gm-grace-secs", "soon"]);
        assert!(result.is_err());
    }
}
