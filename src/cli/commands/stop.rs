//! Stop command - terminate the recorded cache server

use crate::cli::args::StopArgs;
use crate::error::{CacheupError, CacheupResult};
use crate::state::ServerRecord;
use console::style;
use tracing::{debug, info};

/// Execute the stop command
///
/// A missing record is not an error: the paired start step may have
/// failed, and the teardown step must not fail the pipeline for it.
pub async fn execute(args: StopArgs) -> CacheupResult<()> {
    let Some(record) = ServerRecord::load().await? else {
        println!(
            "{} No cache server is recorded, nothing to stop",
            style("!").yellow()
        );
        return Ok(());
    };

    let signal = if args.force {
        libc::SIGKILL
    } else {
        libc::SIGTERM
    };

    println!(
        "Stopping cache server (pid {})...",
        style(record.pid).cyan()
    );

    match send_signal(record.pid, signal) {
        Ok(()) => info!(pid = record.pid, signal, "signaled cache server"),
        // Already gone; still clear the record
        Err(CacheupError::Signal { reason, .. }) if reason == "ESRCH" => {
            debug!(pid = record.pid, "server process already exited");
        }
        Err(e) => return Err(e),
    }

    ServerRecord::delete().await?;

    println!("{} Cache server stopped", style("✓").green());
    Ok(())
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: i32) -> CacheupResult<()> {
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc == 0 {
        return Ok(());
    }
    let errno = std::io::Error::last_os_error();
    let reason = match errno.raw_os_error() {
        Some(libc::ESRCH) => "ESRCH".to_string(),
        Some(libc::EPERM) => "EPERM".to_string(),
        _ => errno.to_string(),
    };
    Err(CacheupError::Signal { pid, reason })
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _signal: i32) -> CacheupResult<()> {
    Err(CacheupError::Signal {
        pid,
        reason: "signals are not supported on this platform".to_string(),
    })
}
