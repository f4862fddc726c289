use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::{run_tool, tool_available, BackendConfig, BackendError, ExtractionBackend};

const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

fn base_args(url: &str, dest: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "bestaudio".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        "0".to_string(),
        "--no-playlist".to_string(),
        // Write the destination directly; otherwise a killed child leaves
        // a .part file the orchestrator's cleanup would have to chase
        "--no-part".to_string(),
        "--output".to_string(),
        dest.to_string_lossy().into_owned(),
        url.to_string(),
    ]
}

/// yt-dlp invoked as a standalone binary
///
/// First choice in the fallback chain: fastest to start and the most
/// commonly installed of the supported tools.
pub struct YtDlpBackend {
    timeout: Duration,
}

impl YtDlpBackend {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    fn attempt_timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self) -> bool {
        tool_available("yt-dlp", &[]).await
    }

    fn configs(&self) -> Vec<BackendConfig> {
        vec![
            BackendConfig::new("default", &[]),
            // Android player client sidesteps some web-client bot checks
            BackendConfig::new(
                "android-client",
                &["--extractor-args", "youtube:player_client=android"],
            ),
            BackendConfig::new(
                "geo-bypass",
                &[
                    "--geo-bypass",
                    "--extractor-retries",
                    "5",
                    "--user-agent",
                    DESKTOP_USER_AGENT,
                ],
            ),
        ]
    }

    async fn extract(
        &self,
        url: &str,
        dest: &Path,
        config: &BackendConfig,
    ) -> Result<(), BackendError> {
        let mut args = base_args(url, dest);
        args.extend(config.extra_args.iter().cloned());
        run_tool("yt-dlp", &args).await
    }
}

/// yt_dlp invoked as a Python module (`python -m yt_dlp`)
///
/// Covers machines where the package is installed via pip but the
/// standalone binary is not on PATH. The interpreter is resolved once
/// and cached for the lifetime of the backend.
pub struct YtDlpModuleBackend {
    timeout: Duration,
    interpreter: OnceCell<Option<String>>,
}

impl YtDlpModuleBackend {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interpreter: OnceCell::new(),
        }
    }

    async fn resolve_interpreter(&self) -> Option<&str> {
        self.interpreter
            .get_or_init(|| async {
                for candidate in ["python3", "python"] {
                    if tool_available(candidate, &["-m", "yt_dlp"]).await {
                        info!("resolved yt_dlp module interpreter: {}", candidate);
                        return Some(candidate.to_string());
                    }
                }
                None
            })
            .await
            .as_deref()
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpModuleBackend {
    fn id(&self) -> &'static str {
        "yt-dlp-python"
    }

    fn attempt_timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self) -> bool {
        self.resolve_interpreter().await.is_some()
    }

    fn configs(&self) -> Vec<BackendConfig> {
        vec![
            BackendConfig::new("default", &[]),
            BackendConfig::new(
                "android-client",
                &["--extractor-args", "youtube:player_client=android"],
            ),
        ]
    }

    async fn extract(
        &self,
        url: &str,
        dest: &Path,
        config: &BackendConfig,
    ) -> Result<(), BackendError> {
        let interpreter = self
            .resolve_interpreter()
            .await
            .ok_or_else(|| BackendError::Failed("python yt_dlp module not found".to_string()))?;

        let mut args = vec!["-m".to_string(), "yt_dlp".to_string()];
        args.extend(base_args(url, dest));
        args.extend(config.extra_args.iter().cloned());
        run_tool(interpreter, &args).await
    }
}
