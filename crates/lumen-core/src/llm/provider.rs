//! Vision model trait and request/response types.
//!
//! Defines the interface the captioner depends on, plus the factory that
//! builds the configured provider.

use crate::config::Config;
use crate::error::CaptionError;
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a MIME type.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// A single prompt + image request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Text prompt, sent ahead of the image
    pub prompt: String,
    /// The image to caption
    pub image: ImageInput,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            image,
        }
    }
}

/// The response from a model call.
///
/// `text` is `None` when the call succeeded but the model produced no text
/// (no candidates, or candidates without text parts).
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Generated text, if any
    pub text: Option<String>,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all vision model clients implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the server holds an `Arc<dyn VisionModel>`).
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate text for the given prompt and image.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, CaptionError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the configured model client.
pub struct VisionModelFactory;

impl VisionModelFactory {
    /// Create the Gemini client from config.
    ///
    /// Fails with `MissingApiKey` when no credential resolves.
    pub fn create(config: &Config) -> Result<Arc<dyn VisionModel>, CaptionError> {
        let api_key = config.api_key().ok_or(CaptionError::MissingApiKey)?;
        Ok(Arc::new(super::gemini::GeminiProvider::new(
            &config.gemini.endpoint,
            &api_key,
            &config.gemini.model,
            Duration::from_millis(config.gemini.timeout_ms),
        )))
    }
}
