//! Configuration for the bridge

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Total time to wait for a reply before giving up, in milliseconds
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Upper bound on each wait between reply checks, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Name of the object the host page delivers replies to
    #[serde(default = "default_callback_object")]
    pub callback_object: String,

    /// Name of the function on that object the host page invokes
    #[serde(default = "default_callback_function")]
    pub callback_function: String,
}

fn default_reply_timeout_ms() -> u64 {
    15_000
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_callback_object() -> String {
    "ScormManager".to_string()
}

fn default_callback_function() -> String {
    "ScormValueCallback".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: default_reply_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            callback_object: default_callback_object(),
            callback_function: default_callback_function(),
        }
    }
}

impl BridgeConfig {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: BridgeConfig = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("scorm-bridge").join("config.yml")),
            Some(PathBuf::from("scorm-bridge.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: BridgeConfig = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(BridgeConfig::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Total reply wait as a `Duration`
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Per-iteration wait bound as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
