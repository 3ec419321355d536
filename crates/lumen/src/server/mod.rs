//! HTTP endpoint layer: router, shared state, handlers and error mapping.

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use lumen_core::{Captioner, Config, VisionModelFactory};
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

/// Read-only state shared by every request.
pub struct AppState {
    /// Model identifier reported by `/health`
    pub model: String,
    /// `None` when no credential was configured at startup
    pub captioner: Option<Captioner>,
}

impl AppState {
    pub fn new(model: impl Into<String>, captioner: Option<Captioner>) -> Self {
        Self {
            model: model.into(),
            captioner,
        }
    }

    /// Build the Gemini-backed captioner if a credential is configured.
    pub fn from_config(config: &Config) -> Self {
        let captioner = match VisionModelFactory::create(config) {
            Ok(model) => Some(Captioner::new(model)),
            Err(e) => {
                tracing::debug!("Captioning disabled: {e}");
                None
            }
        };
        Self::new(config.gemini.model.clone(), captioner)
    }

    pub fn has_token(&self) -> bool {
        self.captioner.is_some()
    }
}

/// Assemble the application router.
pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/caption", post(handlers::caption))
        .route_service("/", ServeFile::new(config.index_path()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.server.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
