//! Configuration schema for Cacheup
//!
//! Configuration is stored at `~/.config/cacheup/config.toml`, optionally
//! overridden by a project-local `.cacheup.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default readiness poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default readiness deadline in milliseconds
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 5_000;

/// Default number of launch attempts before giving up
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache server settings
    pub server: ServerConfig,

    /// Launch behavior
    pub launch: LaunchConfig,

    /// Pipeline integration
    pub pipeline: PipelineConfig,
}

/// Cache server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Executable that runs the cache server
    pub command: String,

    /// Extra arguments passed to the server executable
    pub args: Vec<String>,

    /// Base URL advertised to the pipeline (port is appended)
    pub host: String,

    /// Access token the server and clients authenticate with
    pub token: Option<String>,

    /// Team identifier exported to the pipeline
    pub team_id: Option<String>,

    /// Backing storage kind (e.g. "local", "s3")
    pub storage_provider: String,

    /// Backing storage location (directory or bucket path)
    pub storage_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "cacheup-server".to_string(),
            args: vec![],
            host: "http://127.0.0.1".to_string(),
            token: None,
            team_id: None,
            storage_provider: "local".to_string(),
            storage_path: None,
        }
    }
}

/// Launch behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Launch attempts before the step fails (must be >= 1)
    pub attempts: u32,

    /// Fixed port to use instead of an OS-assigned one
    pub port: Option<u16>,

    /// How long to wait for the server to accept connections, per attempt
    pub readiness_timeout_ms: u64,

    /// Delay between readiness probes
    pub poll_interval_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            port: None,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Pipeline integration configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File that receives `KEY=value` export lines. Falls back to the
    /// `GITHUB_ENV` environment variable, then to stdout.
    pub env_file: Option<PathBuf>,

    /// Directory the spawned server writes its logs to
    pub log_dir: Option<PathBuf>,
}
