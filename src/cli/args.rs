//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Cacheup - Remote Build-Cache Server Launcher
///
/// Starts a long-lived cache server as a CI pipeline step, waits for it
/// to accept connections, and exports its address and credentials to the
/// rest of the pipeline.
#[derive(Parser, Debug)]
#[command(name = "cacheup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CACHEUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cacheup.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the cache server and export its address to the pipeline
    Start(StartArgs),

    /// Stop the recorded cache server
    Stop(StopArgs),

    /// Show the recorded cache server and whether it is reachable
    Status,

    /// Initialize a project-local .cacheup.toml config
    Init(InitArgs),
}

/// Arguments for the start command
#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Base URL advertised to the pipeline (port is appended)
    #[arg(long, env = "CACHEUP_HOST")]
    pub host: Option<String>,

    /// Access token for the cache server
    #[arg(long, env = "CACHEUP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Team identifier exported to the pipeline
    #[arg(long, env = "CACHEUP_TEAM")]
    pub team: Option<String>,

    /// Backing storage kind (e.g. local, s3)
    #[arg(long, env = "CACHEUP_STORAGE_PROVIDER")]
    pub storage_provider: Option<String>,

    /// Backing storage location
    #[arg(long, env = "CACHEUP_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Launch attempts before the step fails
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,

    /// Fixed port instead of an OS-assigned one
    #[arg(short, long)]
    pub port: Option<u16>,

    /// File that receives KEY=value export lines
    #[arg(long, env = "GITHUB_ENV")]
    pub env_file: Option<PathBuf>,
}

/// Arguments for the stop command
#[derive(Parser, Debug)]
pub struct StopArgs {
    /// Send SIGKILL instead of SIGTERM
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .cacheup.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}
