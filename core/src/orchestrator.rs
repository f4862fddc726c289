use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::ExtractionBackend;
use crate::classify::{classify, FailureKind};
use crate::store::ArtifactStore;

/// Terminal cause carried by a failed orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    InvalidInput,
    AuthRequired,
    AllBackendsExhausted,
    Internal,
}

/// How a single attempt settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed,
    TimedOut,
}

/// One (backend, configuration) pairing tried within a run
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub backend_id: &'static str,
    pub config_index: usize,
    pub config_label: &'static str,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub error_detail: Option<String>,
}

/// Terminal result of one orchestration run
#[derive(Debug)]
pub enum ConversionOutcome {
    Success {
        artifact_path: PathBuf,
        size_bytes: u64,
        attempts: Vec<AttemptRecord>,
    },
    Failure {
        kind: FailureCause,
        message: String,
        attempts: Vec<AttemptRecord>,
    },
}

impl ConversionOutcome {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Failure {
            kind: FailureCause::InvalidInput,
            message: message.into(),
            attempts: Vec::new(),
        }
    }
}

/// Sequences backends and configurations against one request
///
/// Backends are consumed in priority order; each contributes an ordered
/// list of configuration variants. The run terminates on the first
/// non-empty artifact, on an auth-required classification, or when every
/// candidate is exhausted. Attempts are accumulated in an immutable log
/// rather than shared counters, so a timeout and a late completion can
/// never double-fire.
pub struct Orchestrator {
    backends: Vec<Box<dyn ExtractionBackend>>,
    store: ArtifactStore,
}

impl Orchestrator {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            backends: Vec::new(),
            store,
        }
    }

    pub fn add_backend(&mut self, backend: Box<dyn ExtractionBackend>) {
        self.backends.push(backend);
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Produce exactly one [`ConversionOutcome`] for a validated URL
    pub async fn run(&self, url: &str) -> ConversionOutcome {
        let request_id = Uuid::new_v4();
        let dest = self.store.allocate(&request_id);
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for backend in &self.backends {
            if !backend.probe().await {
                info!(backend = backend.id(), "backend unavailable, skipping");
                continue;
            }

            let configs = backend.configs();
            for (config_index, config) in configs.iter().enumerate() {
                // A prior failed attempt may have left a partial file
                if let Err(e) = self.store.clean(&dest).await {
                    return ConversionOutcome::Failure {
                        kind: FailureCause::Internal,
                        message: format!("failed to clear partial artifact: {}", e),
                        attempts,
                    };
                }

                let started_at = Utc::now();
                info!(
                    backend = backend.id(),
                    config = config.label,
                    "starting extraction attempt"
                );

                match timeout(backend.attempt_timeout(), backend.extract(url, &dest, config)).await
                {
                    Ok(Ok(())) => match self.store.size_of(&dest).await {
                        Some(size_bytes) if size_bytes > 0 => {
                            info!(
                                backend = backend.id(),
                                config = config.label,
                                size_bytes,
                                "extraction succeeded"
                            );
                            attempts.push(AttemptRecord {
                                backend_id: backend.id(),
                                config_index,
                                config_label: config.label,
                                started_at,
                                outcome: AttemptOutcome::Success,
                                error_detail: None,
                            });
                            return ConversionOutcome::Success {
                                artifact_path: dest,
                                size_bytes,
                                attempts,
                            };
                        }
                        _ => {
                            warn!(
                                backend = backend.id(),
                                config = config.label,
                                "backend reported success but wrote no output"
                            );
                            attempts.push(AttemptRecord {
                                backend_id: backend.id(),
                                config_index,
                                config_label: config.label,
                                started_at,
                                outcome: AttemptOutcome::Failed,
                                error_detail: Some("empty or missing output file".to_string()),
                            });
                            let _ = self.store.clean(&dest).await;
                        }
                    },
                    Ok(Err(e)) => {
                        let detail = e.to_string();
                        let kind = classify(&detail);
                        warn!(
                            backend = backend.id(),
                            config = config.label,
                            ?kind,
                            "extraction attempt failed"
                        );
                        attempts.push(AttemptRecord {
                            backend_id: backend.id(),
                            config_index,
                            config_label: config.label,
                            started_at,
                            outcome: AttemptOutcome::Failed,
                            error_detail: Some(detail.clone()),
                        });
                        let _ = self.store.clean(&dest).await;

                        match kind {
                            FailureKind::AuthRequired => {
                                // Property of the video, not the tool: no
                                // remaining candidate can fix it
                                return ConversionOutcome::Failure {
                                    kind: FailureCause::AuthRequired,
                                    message: detail,
                                    attempts,
                                };
                            }
                            FailureKind::ToolUnavailable => break,
                            _ => {}
                        }
                    }
                    Err(_elapsed) => {
                        warn!(
                            backend = backend.id(),
                            config = config.label,
                            timeout_secs = backend.attempt_timeout().as_secs(),
                            "extraction attempt timed out"
                        );
                        attempts.push(AttemptRecord {
                            backend_id: backend.id(),
                            config_index,
                            config_label: config.label,
                            started_at,
                            outcome: AttemptOutcome::TimedOut,
                            error_detail: Some(format!(
                                "timed out after {}s",
                                backend.attempt_timeout().as_secs()
                            )),
                        });
                        // Dropping the extract future killed the child;
                        // anything it wrote still needs to go
                        let _ = self.store.clean(&dest).await;
                    }
                }
            }
        }

        let message = aggregate_errors(&attempts);
        ConversionOutcome::Failure {
            kind: FailureCause::AllBackendsExhausted,
            message,
            attempts,
        }
    }
}

fn aggregate_errors(attempts: &[AttemptRecord]) -> String {
    if attempts.is_empty() {
        return "no extraction backend is available".to_string();
    }
    let details: Vec<String> = attempts
        .iter()
        .map(|a| {
            format!(
                "{}[{}]: {}",
                a.backend_id,
                a.config_label,
                a.error_detail.as_deref().unwrap_or("no detail")
            )
        })
        .collect();
    format!("all backends exhausted: {}", details.join("; "))
}
