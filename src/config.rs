use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::StoreConfig;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "wwwroot";

/// Optional settings file; every field falls back to a default
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    pub base_path: Option<String>,
    pub store_name: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub settle_delay_ms: Option<u64>,
}

impl AppConfig {
    /// Starter file contents with every default spelled out
    pub fn starter() -> Self {
        Self {
            base_path: Some(StoreConfig::DEFAULT_BASE_PATH.to_string()),
            store_name: Some(StoreConfig::DEFAULT_NAME.to_string()),
            port: Some(DEFAULT_PORT),
            static_dir: Some(DEFAULT_STATIC_DIR.to_string()),
            settle_delay_ms: Some(StoreConfig::DEFAULT_SETTLE_DELAY.as_millis() as u64),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        let base_path = self
            .base_path
            .as_deref()
            .unwrap_or(StoreConfig::DEFAULT_BASE_PATH);
        let name = self.store_name.as_deref().unwrap_or(StoreConfig::DEFAULT_NAME);
        let settle_delay = self
            .settle_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(StoreConfig::DEFAULT_SETTLE_DELAY);
        StoreConfig::new(base_path, name).with_settle_delay(settle_delay)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn static_dir(&self) -> PathBuf {
        PathBuf::from(self.static_dir.as_deref().unwrap_or(DEFAULT_STATIC_DIR))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("workspace-db.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AppConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AppConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
