//! Configuration management for Cacheup

pub mod schema;

pub use schema::Config;

use crate::error::{CacheupError, CacheupResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the project-local config file, discovered by walking up from cwd
const LOCAL_CONFIG_NAME: &str = ".cacheup.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cacheup")
            .join("config.toml")
    }

    /// Get the state directory path
    ///
    /// Honors `CACHEUP_STATE_DIR` so tests and sandboxed pipelines can
    /// redirect it.
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CACHEUP_STATE_DIR") {
            return PathBuf::from(dir);
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cacheup")
    }

    /// Get the default server log directory
    pub fn logs_dir() -> PathBuf {
        Self::state_dir().join("logs")
    }

    /// Path of the durable server record
    pub fn server_record_path() -> PathBuf {
        Self::state_dir().join("server.json")
    }

    /// Find a project-local `.cacheup.toml` by walking up from `start`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            let candidate = d.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        None
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> CacheupResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CacheupResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CacheupError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CacheupError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load global config and overlay a project-local one on top of it
    ///
    /// Local values win key-by-key; tables are merged recursively so a
    /// local file only has to name the settings it changes.
    pub async fn load_merged(&self, local: Option<&Path>) -> CacheupResult<Config> {
        let Some(local) = local else {
            return self.load().await;
        };

        let global_value = if self.config_path.exists() {
            self.read_toml_value(&self.config_path).await?
        } else {
            toml::Value::Table(Default::default())
        };
        let local_value = self.read_toml_value(local).await?;

        let merged = merge_toml(global_value, local_value);
        merged
            .try_into()
            .map_err(|e: toml::de::Error| CacheupError::ConfigInvalid {
                path: local.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn read_toml_value(&self, path: &Path) -> CacheupResult<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CacheupError::io(format!("reading config from {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| CacheupError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CacheupResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CacheupError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CacheupResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheupError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure all state directories exist
    pub async fn ensure_state_dirs() -> CacheupResult<()> {
        let dirs = [Self::state_dir(), Self::logs_dir()];

        for dir in &dirs {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| CacheupError::io(format!("creating directory {}", dir.display()), e))?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge two TOML values, `overlay` winning on conflicts
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            toml::Value::Table(base)
        }
        (_, overlay) => overlay,
    }
}
