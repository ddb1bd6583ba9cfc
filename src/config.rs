use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::notifications::{NotificationQueueConfig, ToastConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub notifications: Option<NotificationsConfig>,
    #[serde(default)]
    pub toasts: Option<ToastsConfig>,
    #[serde(default)]
    pub slot: Option<SlotConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NotificationsConfig {
    pub short_ms: Option<u64>,
    pub long_ms: Option<u64>,
    pub max_records: Option<usize>,
}

impl NotificationsConfig {
    pub fn short_ms(&self) -> u64 {
        self.short_ms.unwrap_or(4000)
    }

    pub fn long_ms(&self) -> u64 {
        self.long_ms.unwrap_or(10000)
    }

    pub fn max_records(&self) -> usize {
        self.max_records.unwrap_or(1000)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ToastsConfig {
    pub short_ms: Option<u64>,
    pub long_ms: Option<u64>,
}

impl ToastsConfig {
    pub fn short_ms(&self) -> u64 {
        self.short_ms.unwrap_or(2000)
    }

    pub fn long_ms(&self) -> u64 {
        self.long_ms.unwrap_or(3500)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SlotConfig {
    pub ttl_ms: Option<u64>,
}

impl SlotConfig {
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms.unwrap_or(1000)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, otherwise the per-user default location.
    /// A missing default file yields the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn queue_config(&self) -> NotificationQueueConfig {
        let notifications = self.notifications.clone().unwrap_or_default();
        NotificationQueueConfig {
            short_duration: Duration::from_millis(notifications.short_ms()),
            long_duration: Duration::from_millis(notifications.long_ms()),
            max_records: notifications.max_records(),
        }
    }

    pub fn toast_config(&self) -> ToastConfig {
        let toasts = self.toasts.clone().unwrap_or_default();
        ToastConfig {
            short_duration: Duration::from_millis(toasts.short_ms()),
            long_duration: Duration::from_millis(toasts.long_ms()),
            ..ToastConfig::default()
        }
    }

    pub fn slot_ttl(&self) -> Duration {
        Duration::from_millis(self.slot.clone().unwrap_or_default().ttl_ms())
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or("info")
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("snackbar").join("config.toml"))
}
