//! Pipeline integration
//!
//! The launched server is announced to the rest of the pipeline through
//! exported variables and saved state. Both sinks are modeled as an
//! explicit [`PipelineContext`] value rather than ambient process-wide
//! mutation, so recording is testable without a pipeline host.

use crate::error::{CacheupError, CacheupResult};
use crate::launch::LaunchResult;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Well-known state key the teardown step reads the process id from
pub const STATE_KEY_PID: &str = "pid";

/// Variable names exported to downstream pipeline steps
pub const VAR_API_ENDPOINT: &str = "API_ENDPOINT";
pub const VAR_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const VAR_TEAM_ID: &str = "TEAM_ID";

/// Accumulated pipeline-visible side effects of a launch
#[derive(Debug, Default)]
pub struct PipelineContext {
    exported: BTreeMap<String, String>,
    state: BTreeMap<String, String>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a variable for export to later pipeline steps
    pub fn export_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.exported.insert(key.into(), value.into());
    }

    /// Stage a cross-step state value
    pub fn save_state(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.state.insert(key.into(), value.into());
    }

    pub fn exported(&self) -> &BTreeMap<String, String> {
        &self.exported
    }

    pub fn state(&self) -> &BTreeMap<String, String> {
        &self.state
    }

    /// Write staged exports as `KEY=value` lines.
    ///
    /// Appends to `env_file` when one is given (the `$GITHUB_ENV`
    /// contract); otherwise the lines go to stdout so a shell step can
    /// eval them.
    pub async fn flush_env(&self, env_file: Option<&Path>) -> CacheupResult<()> {
        let mut lines = String::new();
        for (key, value) in &self.exported {
            lines.push_str(key);
            lines.push('=');
            lines.push_str(value);
            lines.push('\n');
        }

        match env_file {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| CacheupError::EnvFileWrite {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                file.write_all(lines.as_bytes())
                    .await
                    .map_err(|e| CacheupError::EnvFileWrite {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                debug!(path = %path.display(), vars = self.exported.len(), "appended pipeline exports");
            }
            None => {
                print!("{lines}");
                info!(vars = self.exported.len(), "no env file configured, exports printed to stdout");
            }
        }

        Ok(())
    }
}

/// Build the endpoint URL downstream clients connect to
pub fn endpoint_url(host: &str, port: u16) -> String {
    format!("{}:{}", host.trim_end_matches('/'), port)
}

/// Record a successful launch into the pipeline context.
///
/// Exports the endpoint and credentials, and saves the pid under
/// [`STATE_KEY_PID`] for the paired `stop` step.
pub fn record_launch(
    result: &LaunchResult,
    host: &str,
    token: &str,
    team_id: &str,
    ctx: &mut PipelineContext,
) {
    ctx.export_var(VAR_API_ENDPOINT, endpoint_url(host, result.port));
    ctx.export_var(VAR_ACCESS_TOKEN, token);
    ctx.export_var(VAR_TEAM_ID, team_id);
    ctx.save_state(STATE_KEY_PID, result.pid.to_string());
}
