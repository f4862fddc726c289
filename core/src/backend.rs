use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Error reported by a single backend invocation
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Tool ran but exited non-zero; carries captured stderr/stdout
    #[error("{0}")]
    Failed(String),
}

/// One parameter set tried against a backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub label: &'static str,
    /// Arguments appended to the backend's base command line
    pub extra_args: Vec<String>,
}

impl BackendConfig {
    pub fn new(label: &'static str, extra_args: &[&str]) -> Self {
        Self {
            label,
            extra_args: extra_args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Capability contract for an external audio-extraction tool
///
/// A backend either writes a non-empty file at `dest` or fails with an
/// error message suitable for classification.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Stable identifier, used in attempt records and logs
    fn id(&self) -> &'static str;

    /// Upper bound for a single extraction attempt
    fn attempt_timeout(&self) -> Duration;

    /// Cheap availability check. A backend that fails the probe is
    /// skipped entirely without consuming a retry slot.
    async fn probe(&self) -> bool;

    /// Configuration variants in the order they should be tried
    fn configs(&self) -> Vec<BackendConfig>;

    /// Run one extraction attempt with the given configuration
    async fn extract(
        &self,
        url: &str,
        dest: &Path,
        config: &BackendConfig,
    ) -> Result<(), BackendError>;
}

/// Run an external tool to completion, capturing output.
///
/// Children are spawned with `kill_on_drop` so that dropping the future
/// (e.g. when the orchestrator's timeout fires) terminates the process.
pub(crate) async fn run_tool(program: &str, args: &[String]) -> Result<(), BackendError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BackendError::Spawn {
            tool: program.to_string(),
            source: e,
        })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Err(BackendError::Failed(
            format!("{}\n{}", stderr.trim(), stdout.trim())
                .trim()
                .to_string(),
        ))
    }
}

/// Check whether `program <args> --version` runs successfully
pub(crate) async fn tool_available(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
