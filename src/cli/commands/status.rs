//! Status command - inspect the recorded cache server

use crate::config::Config;
use crate::error::CacheupResult;
use crate::launch::probe;
use crate::state::ServerRecord;
use chrono::Utc;
use console::{style, Emoji};
use std::time::Duration;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// How long a single status probe waits for a connection
const STATUS_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Execute the status command
pub async fn execute(config: &Config) -> CacheupResult<()> {
    println!("{}", style("Cacheup Server Status").bold().cyan());
    println!();

    let Some(record) = ServerRecord::load().await? else {
        println!(
            "  {} {} - Run: cacheup start",
            WARN,
            style("No cache server is recorded").yellow()
        );
        return Ok(());
    };

    let age = Utc::now().signed_duration_since(record.created_at);
    println!("{}", style("Recorded server:").bold());
    println!("  PID:      {}", record.pid);
    println!("  Port:     {}", record.port);
    println!("  Endpoint: {}", record.endpoint);
    println!("  Started:  {} ({} min ago)", record.created_at, age.num_minutes());
    println!();

    if process_alive(record.pid) {
        println!("  {} {}", CHECK, style("Process is running").green());
    } else {
        println!(
            "  {} {} - Run: cacheup stop to clear the record",
            CROSS,
            style("Process is gone").red()
        );
    }

    let interval = Duration::from_millis(config.launch.poll_interval_ms);
    match probe::wait_ready(record.port, STATUS_PROBE_TIMEOUT, interval).await {
        Ok(()) => println!(
            "  {} {}",
            CHECK,
            style("Port is accepting connections").green()
        ),
        Err(_) => println!(
            "  {} {}",
            CROSS,
            style("Port is not reachable").red()
        ),
    }

    Ok(())
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    // Signal 0 probes existence without delivering anything
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    #[serial]
    async fn status_without_record_succeeds() {
        let temp = TempDir::new().unwrap();
        std::env::set_var("CACHEUP_STATE_DIR", temp.path());

        execute(&Config::default()).await.unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn own_process_is_alive() {
        assert!(process_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn missing_pid_is_dead() {
        assert!(!process_alive(999_999_999));
    }
}
