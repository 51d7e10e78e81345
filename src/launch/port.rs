//! Port allocation for the cache server
//!
//! The allocator never holds the port: the listener used to discover a
//! free port is dropped before the server is spawned, so the server
//! itself performs the real bind.

use crate::error::{CacheupError, CacheupResult};
use tokio::net::TcpListener;
use tracing::debug;

/// Pick the port the cache server will listen on.
///
/// A nonzero `preferred` port is returned as-is without asking the OS
/// whether it is free; the caller accepts the bind-failure risk. With no
/// preference (or a preference of 0), the OS assigns an ephemeral port.
pub async fn allocate(preferred: Option<u16>) -> CacheupResult<u16> {
    if let Some(port) = preferred {
        if port > 0 {
            debug!(port, "using configured port");
            return Ok(port);
        }
    }

    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(|e| CacheupError::PortAllocation(e.to_string()))?;
    let port = listener
        .local_addr()
        .map_err(|e| CacheupError::PortAllocation(e.to_string()))?
        .port();

    debug!(port, "allocated ephemeral port");
    Ok(port)
}
