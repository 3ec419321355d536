//! Error types for the Lumen captioning service.
//!
//! Errors are split by concern so the HTTP layer can decide which ones are
//! client mistakes and which ones are reported as server failures.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while turning image bytes into a caption.
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The bytes are not an image the decoder recognises
    #[error("cannot identify image file: {0}")]
    Decode(String),

    /// Decoded fine, but could not be re-encoded for upload
    #[error("Failed to encode image as {format}: {message}")]
    Encode { format: String, message: String },

    /// The remote model call failed (transport, auth, quota, protocol)
    #[error("{message}")]
    Model {
        message: String,
        status_code: Option<u16>,
    },

    /// No credential resolved for the model provider
    #[error("Gemini API key not set")]
    MissingApiKey,

    /// A blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    Task(String),
}

impl CaptionError {
    /// Shorthand for a model failure without an HTTP status.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            status_code: None,
        }
    }
}

/// Convenience type alias for captioning results.
pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_displays_message_only() {
        let err = CaptionError::Model {
            message: "Gemini HTTP 429 Too Many Requests: quota".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "Gemini HTTP 429 Too Many Requests: quota");
    }

    #[test]
    fn test_config_validation_error_message() {
        let err = ConfigError::ValidationError("server.port must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: server.port must be > 0"
        );
    }
}
