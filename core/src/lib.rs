pub mod backend;
pub mod classify;
pub mod orchestrator;
pub mod store;
pub mod utils;
pub mod youtube_dl;
pub mod ytdlp;

pub use backend::{BackendConfig, BackendError, ExtractionBackend};
pub use classify::{classify, FailureKind};
pub use orchestrator::{
    AttemptOutcome, AttemptRecord, ConversionOutcome, FailureCause, Orchestrator,
};
pub use store::ArtifactStore;
pub use utils::{extract_video_id, format_size_mb, is_valid_youtube_url};
pub use youtube_dl::YoutubeDlBackend;
pub use ytdlp::{YtDlpBackend, YtDlpModuleBackend};

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// Default bound on a single extraction attempt.
///
/// Deliberately a parameter rather than a constant baked into the
/// backends: deployments tune it anywhere between 60 and 120 seconds.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(90);

/// Main conversion pipeline: URL in, MP3 artifact (or typed failure) out
///
/// Wires the default backend chain (yt-dlp binary, python yt_dlp module,
/// legacy youtube-dl) in priority order on top of an [`ArtifactStore`].
pub struct Mp3ify {
    orchestrator: Orchestrator,
}

impl Mp3ify {
    /// Create a pipeline with the default backend chain
    pub async fn new(downloads_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_timeout(downloads_dir, DEFAULT_ATTEMPT_TIMEOUT).await
    }

    /// Create a pipeline with a custom per-attempt timeout
    pub async fn with_timeout(
        downloads_dir: impl AsRef<Path>,
        attempt_timeout: Duration,
    ) -> Result<Self> {
        let store = ArtifactStore::new(downloads_dir.as_ref()).await?;
        let mut orchestrator = Orchestrator::new(store);
        orchestrator.add_backend(Box::new(YtDlpBackend::new(attempt_timeout)));
        orchestrator.add_backend(Box::new(YtDlpModuleBackend::new(attempt_timeout)));
        orchestrator.add_backend(Box::new(YoutubeDlBackend::new(attempt_timeout)));
        Ok(Self { orchestrator })
    }

    /// Create a pipeline over an explicit backend chain
    pub fn with_backends(
        store: ArtifactStore,
        backends: Vec<Box<dyn ExtractionBackend>>,
    ) -> Self {
        let mut orchestrator = Orchestrator::new(store);
        for backend in backends {
            orchestrator.add_backend(backend);
        }
        Self { orchestrator }
    }

    pub fn store(&self) -> &ArtifactStore {
        self.orchestrator.store()
    }

    /// Validate the URL and run one orchestration.
    ///
    /// Invalid URLs fail fast without invoking any backend.
    pub async fn convert(&self, url: &str) -> ConversionOutcome {
        if !is_valid_youtube_url(url) {
            return ConversionOutcome::invalid_input("Invalid YouTube URL");
        }
        self.orchestrator.run(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_skips_backends() {
        struct Exploding;

        #[async_trait::async_trait]
        impl ExtractionBackend for Exploding {
            fn id(&self) -> &'static str {
                "exploding"
            }
            fn attempt_timeout(&self) -> Duration {
                Duration::from_secs(1)
            }
            async fn probe(&self) -> bool {
                panic!("probe must not run for invalid input");
            }
            fn configs(&self) -> Vec<BackendConfig> {
                vec![]
            }
            async fn extract(
                &self,
                _url: &str,
                _dest: &std::path::Path,
                _config: &BackendConfig,
            ) -> Result<(), BackendError> {
                panic!("extract must not run for invalid input");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).await.unwrap();
        let pipeline = Mp3ify::with_backends(store, vec![Box::new(Exploding)]);

        match pipeline.convert("not-a-url").await {
            ConversionOutcome::Failure { kind, message, .. } => {
                assert_eq!(kind, FailureCause::InvalidInput);
                assert_eq!(message, "Invalid YouTube URL");
            }
            other => panic!("expected invalid input, got {:?}", other),
        }
    }
}
