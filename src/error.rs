//! Error types for Cacheup
//!
//! All modules use `CacheupResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cacheup operations
pub type CacheupResult<T> = Result<T, CacheupError>;

/// All errors that can occur in Cacheup
#[derive(Error, Debug)]
pub enum CacheupError {
    // Launch errors
    #[error("Could not allocate a listening port: {0}")]
    PortAllocation(String),

    #[error("Failed to spawn cache server `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache server not reachable on port {port} after {waited_ms}ms")]
    ReadinessTimeout { port: u16, waited_ms: u64 },

    #[error("Cache server failed to start after {attempts} attempts")]
    LaunchExhausted { attempts: u32 },

    // Server state errors
    #[error("A cache server is already recorded (pid {pid}). Run: cacheup stop")]
    ServerRunning { pid: u32 },

    #[error("No cache server is recorded")]
    NoServer,

    #[error("Failed to persist server state: {0}")]
    StatePersist(String),

    #[error("Failed to signal pid {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required setting: {name}. Set it via --{flag} or config")]
    ConfigMissing { name: String, flag: String },

    // Pipeline errors
    #[error("Failed to write pipeline env file {path}: {source}")]
    EnvFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl CacheupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Whether this error fails a single launch attempt (retryable by the
    /// orchestrator) rather than the whole operation
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::PortAllocation(_) | Self::Spawn { .. } | Self::ReadinessTimeout { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ServerRunning { .. } => Some("Run: cacheup stop"),
            Self::NoServer => Some("Run: cacheup start"),
            Self::Spawn { .. } => Some("Check that server_command points at an installed binary"),
            Self::LaunchExhausted { .. } => {
                Some("Check the server log directory for startup errors")
            }
            _ => None,
        }
    }
}
