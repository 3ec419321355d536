//! Model integration for caption generation.
//!
//! Provides the `VisionModel` abstraction the captioner talks to, plus the
//! Gemini REST client that implements it in production.

pub(crate) mod gemini;
pub(crate) mod provider;

pub use gemini::GeminiProvider;
pub use provider::{
    resolve_env_var, ImageInput, ModelRequest, ModelResponse, VisionModel, VisionModelFactory,
};
