use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AppError, Result};

/// Settings handed to components at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub user_id: u64,
    pub group_id: u64,
    /// Longest edge of browser thumbnails, in pixels.
    pub thumbnail_size: u32,
    pub worker_threads: usize,
    pub load_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_id: 1,
            group_id: 1,
            thumbnail_size: 96,
            worker_threads: 2,
            load_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_size == 0 {
            return Err(AppError::InvalidConfig(
                "thumbnail_size must be positive".into(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(AppError::InvalidConfig(
                "worker_threads must be positive".into(),
            ));
        }
        if self.load_timeout_ms == 0 {
            return Err(AppError::InvalidConfig(
                "load_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let config = if matches!(extension.as_str(), "yaml" | "yml") {
        serde_yaml::from_str::<ClientConfig>(&raw)?
    } else {
        serde_json::from_str::<ClientConfig>(&raw)?
    };
    config.validate()?;
    Ok(config)
}
