//! Durable server record
//!
//! Written once after a successful launch and read back by the paired
//! `stop` and `status` commands, possibly from a different process run.

use crate::config::ConfigManager;
use crate::error::{CacheupError, CacheupResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// Record of the launched cache server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Unique id of this launch
    pub id: Uuid,

    /// OS process id of the server
    pub pid: u32,

    /// Port the server listens on
    pub port: u16,

    /// Endpoint URL exported to the pipeline
    pub endpoint: String,

    /// When the server was launched
    pub created_at: DateTime<Utc>,
}

impl ServerRecord {
    pub fn new(pid: u32, port: u16, endpoint: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            pid,
            port,
            endpoint,
            created_at: Utc::now(),
        }
    }

    /// Path of the record file
    pub fn file_path() -> PathBuf {
        ConfigManager::server_record_path()
    }

    /// Load the record if one exists
    pub async fn load() -> CacheupResult<Option<Self>> {
        let path = Self::file_path();

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| CacheupError::io(format!("reading server record {}", path.display()), e))?;

        let record: ServerRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record, replacing any previous one
    pub async fn save(&self) -> CacheupResult<()> {
        let path = Self::file_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheupError::StatePersist(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| CacheupError::StatePersist(e.to_string()))?;

        Ok(())
    }

    /// Delete the record file if present
    pub async fn delete() -> CacheupResult<()> {
        let path = Self::file_path();
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| CacheupError::io(format!("deleting server record {}", path.display()), e))?;
        }
        Ok(())
    }
}
