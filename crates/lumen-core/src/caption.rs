//! Caption generation: decode the upload, ask the model, extract the text.
//!
//! The captioner is stateless apart from the model handle and prompt, so one
//! instance is shared by every request.

use std::sync::Arc;

use crate::decode;
use crate::error::CaptionResult;
use crate::llm::{ModelRequest, VisionModel};

/// Prompt sent with every image.
pub const CAPTION_PROMPT: &str =
    "🖼️ Generate a short and meaningful caption for this image with a friendly tone.";

/// Returned when the model succeeds but produces no text.
pub const FALLBACK_CAPTION: &str = "No caption generated.";

/// Turns raw image bytes into a caption using a vision model.
#[derive(Clone)]
pub struct Captioner {
    model: Arc<dyn VisionModel>,
    prompt: String,
}

impl Captioner {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            prompt: CAPTION_PROMPT.to_string(),
        }
    }

    /// Generate a caption for the given image bytes.
    ///
    /// Fails with `Decode` for bytes that are not an image and with `Model`
    /// when the remote call fails. An empty model reply is not an error and
    /// yields [`FALLBACK_CAPTION`].
    pub async fn caption(&self, bytes: &[u8]) -> CaptionResult<String> {
        let image = decode::prepare_image(bytes.to_vec()).await?;
        let request = ModelRequest::new(self.prompt.clone(), image);

        let response = self.model.generate(&request).await?;
        tracing::debug!(
            provider = self.model.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Model call finished"
        );

        Ok(match response.text {
            Some(text) if !text.is_empty() => text.trim().to_string(),
            _ => FALLBACK_CAPTION.to_string(),
        })
    }
}
