//! Start command - launch the cache server for this pipeline run

use crate::cli::args::StartArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{CacheupError, CacheupResult};
use crate::launch;
use crate::pipeline::{self, PipelineContext};
use crate::state::ServerRecord;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{debug, warn};

/// Execute the start command
pub async fn execute(args: StartArgs, config: &Config) -> CacheupResult<()> {
    let config = apply_overrides(config.clone(), &args);

    let token = config
        .server
        .token
        .clone()
        .ok_or_else(|| missing("server.token", "token"))?;
    let team = config
        .server
        .team_id
        .clone()
        .ok_or_else(|| missing("server.team_id", "team"))?;

    // One recorded server at a time; stop the old one first
    if let Some(existing) = ServerRecord::load().await? {
        return Err(CacheupError::ServerRunning { pid: existing.pid });
    }

    let log_dir = config
        .pipeline
        .log_dir
        .clone()
        .unwrap_or_else(ConfigManager::logs_dir);
    if !log_dir.exists() {
        debug!("Creating log directory: {}", log_dir.display());
        fs::create_dir_all(&log_dir)
            .await
            .map_err(|e| CacheupError::io(format!("creating log directory {}", log_dir.display()), e))?;
    }

    let storage_path = config
        .server
        .storage_path
        .clone()
        .unwrap_or_else(|| ConfigManager::state_dir().join("storage"));

    let pb = create_progress_bar("Starting cache server...");
    let outcome = launch::run(config.server.clone(), config.launch.clone(), storage_path).await;
    pb.finish_and_clear();

    let (result, orphans) = outcome?;

    for &pid in &orphans {
        warn!(pid, "process from a failed attempt was left running");
    }

    let endpoint = pipeline::endpoint_url(&config.server.host, result.port);

    let mut ctx = PipelineContext::new();
    pipeline::record_launch(&result, &config.server.host, &token, &team, &mut ctx);
    ctx.flush_env(config.pipeline.env_file.as_deref()).await?;

    ServerRecord::new(result.pid, result.port, endpoint.clone())
        .save()
        .await?;

    println!(
        "{} Cache server started (attempt {} of {})",
        style("✓").green(),
        result.attempt,
        config.launch.attempts
    );
    println!("  PID:      {}", result.pid);
    println!("  Port:     {}", result.port);
    println!("  Endpoint: {}", style(&endpoint).cyan());
    println!("  Stop with: cacheup stop");

    Ok(())
}

/// CLI flags win over config file values
fn apply_overrides(mut config: Config, args: &StartArgs) -> Config {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(token) = &args.token {
        config.server.token = Some(token.clone());
    }
    if let Some(team) = &args.team {
        config.server.team_id = Some(team.clone());
    }
    if let Some(provider) = &args.storage_provider {
        config.server.storage_provider = provider.clone();
    }
    if let Some(path) = &args.storage_path {
        config.server.storage_path = Some(path.clone());
    }
    if let Some(attempts) = args.attempts {
        config.launch.attempts = attempts;
    }
    if let Some(port) = args.port {
        config.launch.port = Some(port);
    }
    if let Some(env_file) = &args.env_file {
        config.pipeline.env_file = Some(env_file.clone());
    }
    config
}

fn missing(name: &str, flag: &str) -> CacheupError {
    CacheupError::ConfigMissing {
        name: name.to_string(),
        flag: flag.to_string(),
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
