//! Cache-server launch orchestration
//!
//! One attempt is: allocate a port, spawn the server detached, poll the
//! port until it accepts a TCP connection. [`retry::RetryOrchestrator`]
//! runs attempts until one succeeds or the budget is spent.

pub mod port;
pub mod probe;
pub mod retry;
pub mod spawn;

pub use retry::{AttemptOutcome, AttemptRecord, LaunchState, LaunchStrategy, RetryOrchestrator};
pub use spawn::ServerProcess;

use crate::config::schema::LaunchConfig;
use crate::config::schema::ServerConfig;
use crate::error::CacheupResult;
use async_trait::async_trait;
use retry::AttemptFailure;
use std::path::PathBuf;
use std::time::Duration;

/// Opaque reference to a spawned server: its pid and the port it was
/// told to bind
#[derive(Debug)]
pub struct ServerHandle {
    pub pid: u32,
    pub port: u16,
    _process: Option<ServerProcess>,
}

impl ServerHandle {
    pub fn new(process: ServerProcess, port: u16) -> Self {
        Self {
            pid: process.pid(),
            port,
            _process: Some(process),
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(pid: u32, port: u16) -> Self {
        Self {
            pid,
            port,
            _process: None,
        }
    }
}

/// Produced exactly once, by the first attempt whose server became
/// reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchResult {
    pub pid: u32,
    pub port: u16,
    /// 1-based index of the attempt that won
    pub attempt: u32,
}

/// Production [`LaunchStrategy`]: wires the port allocator, process
/// launcher and readiness probe together
pub struct ServerLauncher {
    server: ServerConfig,
    launch: LaunchConfig,
    storage_path: PathBuf,
}

impl ServerLauncher {
    pub fn new(server: ServerConfig, launch: LaunchConfig, storage_path: PathBuf) -> Self {
        Self {
            server,
            launch,
            storage_path,
        }
    }

    async fn run_once(&self) -> Result<ServerHandle, AttemptFailure> {
        let port = port::allocate(self.launch.port)
            .await
            .map_err(AttemptFailure::new)?;

        let process =
            spawn::launch(port, &self.server, &self.storage_path).map_err(AttemptFailure::new)?;
        let handle = ServerHandle::new(process, port);

        match probe::wait_ready(
            port,
            Duration::from_millis(self.launch.readiness_timeout_ms),
            Duration::from_millis(self.launch.poll_interval_ms),
        )
        .await
        {
            Ok(()) => Ok(handle),
            // The process exists but never came up; hand it back so the
            // orchestrator can account for it
            Err(e) => Err(AttemptFailure::with_orphan(e, handle)),
        }
    }
}

#[async_trait]
impl LaunchStrategy for ServerLauncher {
    async fn attempt(&mut self, _attempt: u32) -> Result<ServerHandle, AttemptFailure> {
        self.run_once().await
    }
}

/// Run the full launch operation with the configured attempt budget
pub async fn run(
    server: ServerConfig,
    launch: LaunchConfig,
    storage_path: PathBuf,
) -> CacheupResult<(LaunchResult, Vec<u32>)> {
    let attempts = launch.attempts;
    let launcher = ServerLauncher::new(server, launch, storage_path);
    let mut orchestrator = RetryOrchestrator::new(launcher, attempts);
    let result = orchestrator.run().await?;
    Ok((result, orchestrator.orphaned_pids()))
}
