//! Init command - create project-local .cacheup.toml

use crate::cli::args::InitArgs;
use crate::error::{CacheupError, CacheupResult};
use console::style;
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# Cacheup project configuration
# Settings here override your global config (~/.config/cacheup/config.toml)
# Docs: https://github.com/cacheup/cacheup

[server]
# command = "cacheup-server"
# host = "http://127.0.0.1"
# team_id = "team_example"
# storage_provider = "local"       # local, s3
# storage_path = "/var/cache/cacheup"

[launch]
# attempts = 3
# port = 4000                      # omit to let the OS pick
# readiness_timeout_ms = 5000
# poll_interval_ms = 250

[pipeline]
# env_file = "/tmp/pipeline.env"   # defaults to $GITHUB_ENV
# log_dir = "/var/log/cacheup"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> CacheupResult<()> {
    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| CacheupError::io("getting current directory", e))?
        }
    };

    let config_path = target_dir.join(".cacheup.toml");

    if config_path.exists() && !args.force {
        return Err(CacheupError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| CacheupError::io(format!("writing {}", config_path.display()), e))?;

    println!(
        "{} Created project config: {}",
        style("✓").green(),
        config_path.display()
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> CacheupResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| CacheupError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
