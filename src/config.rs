//! Configuration handling for vpn-hop

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error(
        "Hop interval ({hop_interval:?}) must be greater than the minimum uptime ({min_uptime:?})"
    )]
    HopIntervalTooShort {
        min_uptime: Duration,
        hop_interval: Duration,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rotation: RotationConfig,
    pub vpn: VpnConfig,
    pub probe: ProbeConfig,
}

/// When to rotate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Minimum session age before a rotation is permitted
    pub min_uptime_secs: u64,
    /// Cycle period
    pub hop_interval_secs: u64,
}

/// External VPN control program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnConfig {
    pub program: String,
    /// Subcommand that lists available exit locations
    pub locations_command: String,
    /// Upper bound on a single invocation; unset means wait forever
    pub command_timeout_secs: Option<u64>,
}

/// Outbound reachability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            min_uptime_secs: 10 * 60,
            hop_interval_secs: 60 * 60,
        }
    }
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            program: "nordvpn".to_string(),
            locations_command: "countries".to_string(),
            command_timeout_secs: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: "https://www.google.com/".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RotationConfig {
    pub fn min_uptime(&self) -> Duration {
        Duration::from_secs(self.min_uptime_secs)
    }

    pub fn hop_interval(&self) -> Duration {
        Duration::from_secs(self.hop_interval_secs)
    }

    /// A hop interval at or below the minimum uptime could never see a
    /// session old enough to rotate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hop_interval() <= self.min_uptime() {
            return Err(ConfigError::HopIntervalTooShort {
                min_uptime: self.min_uptime(),
                hop_interval: self.hop_interval(),
            });
        }
        Ok(())
    }
}

impl VpnConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load config from an explicit path, or from default locations
    ///
    /// Search order: `./vpn-hop.toml`, then `~/.vpn-hop/config.toml`,
    /// falling back to built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local_config = PathBuf::from("vpn-hop.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".vpn-hop").join("config.toml");
            if home_config.exists() {
                return Self::load(&home_config);
            }
        }

        info!("No config file found, using defaults");
        Ok(Config::default())
    }
}
