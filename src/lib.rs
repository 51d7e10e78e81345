//! Cacheup - Remote Build-Cache Server Launcher
//!
//! Starts a long-lived cache server as a CI pipeline step, waits for it
//! to accept TCP connections, and hands its address and credentials to
//! the rest of the pipeline.

pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod pipeline;
pub mod state;

pub use error::{CacheupError, CacheupResult};
