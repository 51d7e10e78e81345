//! TCP readiness probing
//!
//! Black-box liveness check: the server counts as ready once a TCP
//! connection to its port succeeds. Nothing above the transport layer is
//! inspected.

use crate::error::{CacheupError, CacheupResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Poll `port` on loopback until a connection succeeds or `timeout` of
/// wall-clock time has elapsed.
///
/// One connection is attempted every `interval`. Only elapsed time is
/// budgeted, never attempt counts, and each connect is clipped to the
/// remaining budget so the call never outlives `timeout + interval`.
pub async fn wait_ready(port: u16, timeout: Duration, interval: Duration) -> CacheupResult<()> {
    let started = Instant::now();

    loop {
        let elapsed = started.elapsed();
        let Some(remaining) = timeout.checked_sub(elapsed) else {
            return Err(timeout_error(port, started));
        };

        match tokio::time::timeout(remaining, TcpStream::connect(("127.0.0.1", port))).await {
            Ok(Ok(_stream)) => {
                debug!(port, elapsed_ms = elapsed.as_millis() as u64, "port is accepting connections");
                return Ok(());
            }
            Ok(Err(e)) => {
                trace!(port, error = %e, "connect refused, will retry");
            }
            Err(_) => {
                // Connect itself consumed the rest of the budget
                return Err(timeout_error(port, started));
            }
        }

        if started.elapsed() >= timeout {
            return Err(timeout_error(port, started));
        }
        tokio::time::sleep(interval).await;
    }
}

fn timeout_error(port: u16, started: Instant) -> CacheupError {
    CacheupError::ReadinessTimeout {
        port,
        waited_ms: started.elapsed().as_millis() as u64,
    }
}
