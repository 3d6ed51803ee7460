//! Session configuration.
//!
//! Durations and storage keys with the reference defaults: sessions last
//! 5 minutes, the liveness task re-checks every 30 seconds. A host can load
//! overrides from `<config dir>/<app name>/session.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// How long a session stays valid after a successful verification.
const DEFAULT_SESSION_DURATION_MS: i64 = 5 * 60 * 1000;

/// Cadence of the periodic liveness re-check.
const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 30_000;

/// Store key holding the last successful authentication time (epoch millis).
const DEFAULT_STORAGE_KEY: &str = "last_auth_time";

/// Store key holding the reference PIN.
const DEFAULT_PIN_KEY: &str = "auth_pin";

/// Config file name
const CONFIG_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session_duration_ms: i64,
    pub liveness_interval_ms: u64,
    pub storage_key: String,
    pub pin_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_duration_ms: DEFAULT_SESSION_DURATION_MS,
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            pin_key: DEFAULT_PIN_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    /// Load the config for `app_name`, falling back to defaults when no file
    /// exists.
    pub fn load(app_name: &str) -> Result<Self> {
        let path = Self::config_path(app_name)?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, app_name: &str) -> Result<()> {
        let path = Self::config_path(app_name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path(app_name: &str) -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(app_name).join(CONFIG_FILE))
    }
}
