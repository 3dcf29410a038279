use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the companion service, including the `/api` prefix.
    pub base_url: String,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"file"` or `"memory"`.
    pub backend: String,
    pub preferences_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the transition effect is shown after a background is picked.
    pub transition_delay_ms: u64,
    /// Greeting used when the service cannot start a moment.
    pub fallback_greeting: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".into(),
            timeout_secs: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let preferences_path = default_app_dir()
            .join("preferences.json")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: "file".into(),
            preferences_path,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transition_delay_ms: 2500,
            fallback_greeting: "I'm here. What's on your mind?".into(),
        }
    }
}

impl SessionConfig {
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Returns `~/.moment-catcher/`
pub fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".moment-catcher")
}

/// Returns the default config file path: `~/.moment-catcher/config.toml`
pub fn default_config_path() -> PathBuf {
    default_app_dir().join("config.toml")
}

impl AppConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (MOMENT_API_BASE_URL, MOMENT_PREFERENCES, MOMENT_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOMENT_API_BASE_URL") {
            self.service.base_url = val;
        }
        if let Ok(val) = std::env::var("MOMENT_PREFERENCES") {
            self.storage.preferences_path = val;
        }
        if let Ok(val) = std::env::var("MOMENT_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the preferences file path, expanding `~` if needed.
    pub fn resolved_preferences_path(&self) -> PathBuf {
        expand_tilde(&self.storage.preferences_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
