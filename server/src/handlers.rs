use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use mp3ify_core::{extract_video_id, format_size_mb, ConversionOutcome, FailureCause};

use crate::state::AppState;

/// Grammar of filenames the artifact store generates. Anything else is
/// rejected before touching the filesystem.
static ARTIFACT_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{14}_[0-9a-f]{8}\.mp3$").unwrap());

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub filename: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "fileSize")]
    pub file_size: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "mp3ify-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /convert — run one orchestration and report its single outcome
///
/// The body is extracted as an `Option` so a missing or malformed `url`
/// field maps to the same 400 as a URL that fails the grammar, instead
/// of the extractor's default rejection.
pub async fn convert(
    State(state): State<AppState>,
    body: Option<Json<ConvertRequest>>,
) -> Response {
    let Some(Json(request)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid YouTube URL");
    };

    let url = request.url.trim().to_string();
    info!(
        video_id = extract_video_id(&url).as_deref().unwrap_or("unknown"),
        "received conversion request for {}", url
    );

    let _permit = match state.conversion_limiter.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Conversion service is shutting down",
            );
        }
    };

    match state.pipeline.convert(&url).await {
        ConversionOutcome::Success {
            artifact_path,
            size_bytes,
            attempts,
        } => {
            debug!(attempt_count = attempts.len(), "orchestration settled");
            let filename = match artifact_path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Conversion produced an unreadable artifact",
                    );
                }
            };

            info!(filename, size_bytes, "conversion succeeded");
            Json(ConvertResponse {
                success: true,
                download_url: format!("/download/{}", filename),
                filename,
                file_size: format_size_mb(size_bytes),
            })
            .into_response()
        }
        ConversionOutcome::Failure {
            kind,
            message,
            attempts,
        } => {
            // Attempt-by-attempt detail stays in the logs; the caller only
            // sees the terminal classification
            for attempt in &attempts {
                debug!(
                    backend = attempt.backend_id,
                    config = attempt.config_label,
                    outcome = ?attempt.outcome,
                    detail = attempt.error_detail.as_deref().unwrap_or(""),
                    "conversion attempt"
                );
            }
            warn!(?kind, "conversion failed: {}", message);

            let status = match kind {
                FailureCause::InvalidInput => StatusCode::BAD_REQUEST,
                FailureCause::AuthRequired => StatusCode::FORBIDDEN,
                FailureCause::AllBackendsExhausted | FailureCause::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            error_response(status, message)
        }
    }
}

/// GET /download/:filename — stream a finished artifact
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    if !ARTIFACT_NAME_REGEX.is_match(&filename) {
        return error_response(StatusCode::NOT_FOUND, "File not found");
    }

    let path = state.pipeline.store().root().join(&filename);
    if tokio::fs::metadata(&path).await.is_err() {
        return error_response(StatusCode::NOT_FOUND, "File not found");
    }

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("failed to open artifact {}: {}", path.display(), e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to open file");
        }
    };

    info!("serving artifact {}", filename);
    let body = axum::body::Body::from_stream(ReaderStream::new(file));

    (
        StatusCode::OK,
        [
            ("Content-Type", "audio/mpeg".to_string()),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ),
            ("Cache-Control", "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}
