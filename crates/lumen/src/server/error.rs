//! HTTP error responses for the captioning API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// JSON error envelope: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Every way a caption request can fail.
///
/// The `Display` text is the `error` string sent to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No multipart file field named `image`
    #[error("No image file provided")]
    MissingFile,

    /// The `image` field has an empty filename
    #[error("Empty filename")]
    EmptyFilename,

    /// No credential configured for the model
    #[error("Gemini API key not set")]
    MissingApiKey,

    /// Upload exceeded the configured body limit
    #[error("Image exceeds the upload size limit")]
    PayloadTooLarge,

    /// Anything that failed after validation
    #[error("Server error: {0}")]
    Server(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::EmptyFilename => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingApiKey | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Server(detail) = &self {
            tracing::error!("Server error: {detail}");
        }
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
