// Path: crates/types/src/config/mod.rs

//! Configuration for the baker daemon (`bakerd.toml`).
//!
//! Every field has a default so an empty file, or no file at all, is a valid
//! configuration. Command line flags are layered on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod network;
pub use network::{Network, NetworkConstants};

fn default_network() -> Network {
    Network::Hangzhounet
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./")
}
fn default_status_addr() -> String {
    "127.0.0.1".to_string()
}
fn default_status_port() -> u16 {
    8082
}
fn default_prefetch_cycles_ahead() -> u64 {
    2
}
fn default_shutdown_grace_secs() -> u64 {
    10
}
fn default_rpc_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_max_baking_priority() -> u32 {
    8
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakerConfig {
    /// The network to operate on.
    #[serde(default = "default_network")]
    pub network: Network,
    /// Directory holding the database file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Compute and sign endorsements, but never inject or seal them.
    #[serde(default)]
    pub dry_run_endorse: bool,
    /// Compute and sign blocks, but never inject or seal them.
    #[serde(default)]
    pub dry_run_bake: bool,
    /// Bind address of the status/metrics HTTP server.
    #[serde(default = "default_status_addr")]
    pub status_addr: String,
    /// Bind port of the status/metrics HTTP server.
    #[serde(default = "default_status_port")]
    pub status_port: u16,
    /// How many cycles beyond the head's cycle the rights cache is kept filled.
    #[serde(default = "default_prefetch_cycles_ahead")]
    pub prefetch_cycles_ahead: u64,
    /// Upper bound on the wait for in-flight tasks during shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Per-request timeout applied by the RPC client.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Interval between two head polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Highest baking priority requested when fetching rights.
    #[serde(default = "default_max_baking_priority")]
    pub max_baking_priority: u32,
    /// URL of the remote signer, when the delegate uses one.
    #[serde(default)]
    pub signer_url: Option<String>,
    /// Enable debug-level logging.
    #[serde(default)]
    pub log_debug: bool,
    /// Enable trace-level logging.
    #[serde(default)]
    pub log_trace: bool,
}

impl Default for BakerConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            dry_run_endorse: false,
            dry_run_bake: false,
            status_addr: default_status_addr(),
            status_port: default_status_port(),
            prefetch_cycles_ahead: default_prefetch_cycles_ahead(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_baking_priority: default_max_baking_priority(),
            signer_url: None,
            log_debug: false,
            log_trace: false,
        }
    }
}

impl BakerConfig {
    /// File name of the database inside `data_dir`.
    pub const DATABASE_FILE: &'static str = "bakerd.db";

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(Self::DATABASE_FILE)
    }

    /// Protocol constants of the configured network.
    pub fn constants(&self) -> NetworkConstants {
        self.network.constants()
    }

    /// Rejects combinations that cannot work.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than zero".into());
        }
        if self.rpc_timeout_secs == 0 {
            return Err("rpc_timeout_secs must be greater than zero".into());
        }
        if self.prefetch_cycles_ahead > self.constants().preserved_cycles {
            return Err(format!(
                "prefetch_cycles_ahead ({}) exceeds preserved_cycles ({}) for {}",
                self.prefetch_cycles_ahead,
                self.constants().preserved_cycles,
                self.network
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: BakerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.network, Network::Hangzhounet);
        assert_eq!(cfg.status_port, 8082);
        assert_eq!(cfg.prefetch_cycles_ahead, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn overrides_are_read_from_toml() {
        let cfg: BakerConfig = toml::from_str(
            r#"
            network = "mainnet"
            dry_run_bake = true
            signer_url = "http://127.0.0.1:6732"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.network, Network::Mainnet);
        assert!(cfg.dry_run_bake);
        assert_eq!(cfg.signer_url.as_deref(), Some("http://127.0.0.1:6732"));
    }

    #[test]
    fn validate_rejects_prefetch_beyond_preserved_cycles() {
        let cfg = BakerConfig {
            prefetch_cycles_ahead: 9,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
