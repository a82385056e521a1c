//! Server configuration, parsed from a TOML file plus environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use deadswitch_core::Address;
use deadswitch_inherit::{HeartbeatConfig, DEFAULT_HEARTBEAT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// General server settings
    #[serde(default)]
    pub server: ServerSection,

    /// The wallet this server hosts
    pub wallet: WalletSection,

    /// Heartbeat warning thresholds
    #[serde(default)]
    pub heartbeat: HeartbeatSection,
}

/// General server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Data directory (wallet state file)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Check interval in seconds (default: 1 hour)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            check_interval_secs: default_check_interval(),
            log_level: default_log_level(),
        }
    }
}

/// Wallet deployment parameters. Only used when the state file is first
/// created; afterwards the persisted state is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSection {
    /// Ledger account holding the wallet's funds
    pub account: Address,

    /// Initial owner (the deployer)
    pub owner: Address,

    /// Initial heartbeat timeout in seconds
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,

    /// Human-readable label
    #[serde(default = "default_wallet_label")]
    pub label: String,
}

/// Heartbeat warning thresholds (fractions of the timeout)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatSection {
    #[serde(default = "default_checkin_threshold")]
    pub checkin_threshold: f64,

    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        Self {
            checkin_threshold: default_checkin_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_check_interval() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_timeout() -> u64 {
    DEFAULT_HEARTBEAT_TIMEOUT
}

fn default_wallet_label() -> String {
    "deadswitch".to_string()
}

fn default_checkin_threshold() -> f64 {
    0.5
}

fn default_critical_threshold() -> f64 {
    0.9
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DEADSWITCH_DATA_DIR`
    /// - `DEADSWITCH_CHECK_INTERVAL`
    /// - `DEADSWITCH_LOG_LEVEL`
    /// - `DEADSWITCH_ACCOUNT`
    /// - `DEADSWITCH_OWNER`
    /// - `DEADSWITCH_HEARTBEAT_TIMEOUT`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("DEADSWITCH_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEADSWITCH_CHECK_INTERVAL") {
            if let Ok(secs) = v.parse::<u64>() {
                self.server.check_interval_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("DEADSWITCH_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_ACCOUNT") {
            self.wallet.account = v
                .parse()
                .with_context(|| format!("Invalid DEADSWITCH_ACCOUNT: {}", v))?;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_OWNER") {
            self.wallet.owner = v
                .parse()
                .with_context(|| format!("Invalid DEADSWITCH_OWNER: {}", v))?;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_HEARTBEAT_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.wallet.heartbeat_timeout_secs = secs;
            }
        }
        Ok(())
    }

    /// Path of the persisted wallet state.
    pub fn state_path(&self) -> PathBuf {
        self.server
            .data_dir
            .join(format!("{}.state.json", self.wallet.label))
    }

    /// Heartbeat evaluation settings.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            checkin_threshold: self.heartbeat.checkin_threshold,
            critical_threshold: self.heartbeat.critical_threshold,
            poll_interval_secs: self.server.check_interval_secs,
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.wallet.heartbeat_timeout_secs > 0,
            "wallet.heartbeat_timeout_secs must be > 0"
        );
        anyhow::ensure!(
            !self.wallet.account.is_zero(),
            "wallet.account must not be the zero address"
        );
        anyhow::ensure!(
            self.wallet.account != self.wallet.owner,
            "wallet.account and wallet.owner must differ"
        );
        anyhow::ensure!(
            !self.wallet.label.is_empty()
                && self
                    .wallet
                    .label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "wallet.label must be non-empty and use only [A-Za-z0-9_-]"
        );

        // Check interval must be at least 60 seconds
        anyhow::ensure!(
            self.server.check_interval_secs >= 60,
            "server.check_interval_secs must be >= 60"
        );

        self.heartbeat_config()
            .validate()
            .context("Invalid [heartbeat] thresholds")?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
