//! Configuration for the mindtree agent.

use crate::core::growth::GrowthTuning;
use crate::core::lowfocus::LowFocusTuning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default HTTP port (matches the original backend the frontend expects).
pub const DEFAULT_PORT: u16 = 3001;

/// Default reading-poll cadence in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Default simulation frame cadence in milliseconds (~30 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// A reading older than this is considered stale ("sensor disconnected").
pub const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 5000;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to bind (0 for random)
    pub port: u16,

    /// How often the poller fetches the latest reading
    pub poll_interval_ms: u64,

    /// Simulation tick cadence; independent of the poll cadence
    pub frame_interval_ms: u64,

    /// Maximum reading age for the `isActive` freshness flag
    pub freshness_window_ms: u64,

    /// Growth engine tuning
    pub growth: GrowthTuning,

    /// Low-focus detector tuning
    pub low_focus: LowFocusTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
            growth: GrowthTuning::default(),
            low_focus: LowFocusTuning::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindtree-agent")
            .join("config.json")
    }

    /// Freshness window as a chrono duration for timestamp arithmetic.
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.freshness_window_ms as i64)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
