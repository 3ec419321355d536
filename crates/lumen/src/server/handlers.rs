//! Request handlers for `/health` and `/api/caption`.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::error::ApiError;
use super::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub has_token: bool,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
}

/// The file part pulled out of the form.
struct UploadedImage {
    filename: String,
    content_type: Option<String>,
    bytes: axum::body::Bytes,
}

/// GET /health - credential presence and model name
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ok = state.has_token();
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(HealthResponse {
            ok,
            has_token: ok,
            model: state.model.clone(),
        }),
    )
}

/// POST /api/caption - caption the uploaded `image` file
pub async fn caption(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let captioner = state.captioner.as_ref().ok_or(ApiError::MissingApiKey)?;

    let upload = read_upload(multipart).await?;
    tracing::info!(
        filename = %upload.filename,
        content_type = upload.content_type.as_deref().unwrap_or("-"),
        size = upload.bytes.len(),
        "Caption requested"
    );

    let caption = captioner
        .caption(&upload.bytes)
        .await
        .map_err(|e| ApiError::Server(e.to_string()))?;

    Ok(Json(CaptionResponse { caption }))
}

/// Find the first `image` part that carries a filename.
///
/// Parts without a filename attribute are plain form values, not files, and
/// are skipped.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedImage, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Not a multipart upload: {e}");
        ApiError::MissingFile
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::MissingFile),
            Err(e) => return Err(malformed(e, ApiError::MissingFile)),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::EmptyFilename);
        }

        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| {
                let detail = e.to_string();
                malformed(e, ApiError::Server(detail))
            })?;
        return Ok(UploadedImage {
            filename,
            content_type,
            bytes,
        });
    }
}

/// Map a multipart read failure, singling out the body limit.
fn malformed(error: MultipartError, fallback: ApiError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        tracing::debug!("Multipart read failed: {error}");
        fallback
    }
}
