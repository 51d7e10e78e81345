//! Detached cache-server process spawning

use crate::config::schema::ServerConfig;
use crate::error::{CacheupError, CacheupResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// Handle for a spawned cache-server process.
///
/// Holds the child without owning its lifetime: the process is started in
/// its own session and is never killed on drop, so it outlives this step
/// of the pipeline.
#[derive(Debug)]
pub struct ServerProcess {
    pid: u32,
    command: String,
    _child: Child,
}

impl ServerProcess {
    /// OS process identifier of the server
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Executable the server was started from
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Spawn the cache server listening on `port`, detached from this process.
///
/// The child inherits the parent environment plus `PORT`, `ACCESS_TOKEN`,
/// `STORAGE_PROVIDER` and `STORAGE_PATH`. Its stdio is silenced; the
/// server writes its own logs under the log directory. Returns as soon as
/// the OS has created the process; readiness is probed separately.
pub fn launch(port: u16, server: &ServerConfig, storage_path: &Path) -> CacheupResult<ServerProcess> {
    let mut cmd = Command::new(&server.command);
    cmd.args(&server.args)
        .env("PORT", port.to_string())
        .env("STORAGE_PROVIDER", &server.storage_provider)
        .env("STORAGE_PATH", storage_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    if let Some(token) = &server.token {
        cmd.env("ACCESS_TOKEN", token);
    }

    // New session so the server survives this process and its terminal
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let child = cmd
        .spawn()
        .map_err(|e| CacheupError::spawn(&server.command, e))?;

    let pid = child
        .id()
        .ok_or_else(|| CacheupError::Internal("spawned server has no pid".to_string()))?;

    debug!(pid, port, command = %server.command, "spawned cache server");

    Ok(ServerProcess {
        pid,
        command: server.command.clone(),
        _child: child,
    })
}
