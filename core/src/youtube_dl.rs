use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::backend::{run_tool, tool_available, BackendConfig, BackendError, ExtractionBackend};

/// Legacy youtube-dl binary, kept as the last resort in the chain
///
/// Slower and long out of date, but occasionally succeeds where the
/// newer extractors are blocked.
pub struct YoutubeDlBackend {
    timeout: Duration,
}

impl YoutubeDlBackend {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ExtractionBackend for YoutubeDlBackend {
    fn id(&self) -> &'static str {
        "youtube-dl"
    }

    fn attempt_timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self) -> bool {
        tool_available("youtube-dl", &[]).await
    }

    fn configs(&self) -> Vec<BackendConfig> {
        vec![BackendConfig::new("default", &[])]
    }

    async fn extract(
        &self,
        url: &str,
        dest: &Path,
        config: &BackendConfig,
    ) -> Result<(), BackendError> {
        let mut args = vec![
            "-f".to_string(),
            "bestaudio".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--no-playlist".to_string(),
            "--no-part".to_string(),
            "--output".to_string(),
            dest.to_string_lossy().into_owned(),
            url.to_string(),
        ];
        args.extend(config.extra_args.iter().cloned());
        run_tool("youtube-dl", &args).await
    }
}
