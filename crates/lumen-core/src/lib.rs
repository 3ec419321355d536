//! Lumen Core - image captioning backed by a hosted vision model.
//!
//! Lumen takes an uploaded image, checks that it decodes, and asks a
//! multimodal model for a short caption with a fixed prompt.
//!
//! ```text
//! bytes → Decode → Gemini generateContent → trimmed caption
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{Captioner, Config, VisionModelFactory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_from_optional(&Config::default_path())?;
//!     let captioner = Captioner::new(VisionModelFactory::create(&config)?);
//!
//!     let caption = captioner.caption(&std::fs::read("./image.jpg")?).await?;
//!     println!("{caption}");
//!     Ok(())
//! }
//! ```

pub mod caption;
pub mod config;
pub mod decode;
pub mod error;
pub mod llm;

pub use caption::{Captioner, CAPTION_PROMPT, FALLBACK_CAPTION};
pub use config::Config;
pub use error::{CaptionError, CaptionResult, ConfigError};
pub use llm::{ImageInput, ModelRequest, ModelResponse, VisionModel, VisionModelFactory};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
