use mp3ify_core::{Mp3ify, DEFAULT_ATTEMPT_TIMEOUT};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Mp3ify>,
    /// Caps simultaneous orchestration runs; each run may hold a child
    /// process and an open artifact file.
    pub conversion_limiter: Arc<Semaphore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let downloads_dir = std::env::var("MP3IFY_DOWNLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join("downloads"));

        let attempt_timeout = std::env::var("MP3IFY_ATTEMPT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT);

        let max_concurrent = std::env::var("MP3IFY_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4);

        info!(
            downloads_dir = %downloads_dir.display(),
            attempt_timeout_secs = attempt_timeout.as_secs(),
            max_concurrent,
            "initializing conversion pipeline"
        );

        let pipeline = Arc::new(Mp3ify::with_timeout(&downloads_dir, attempt_timeout).await?);

        Ok(Self {
            pipeline,
            conversion_limiter: Arc::new(Semaphore::new(max_concurrent)),
        })
    }
}
