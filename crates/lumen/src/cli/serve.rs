//! The `lumen serve` command: run the HTTP captioning service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use lumen_core::Config;

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `PORT`)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Gemini model identifier (overrides `GEMINI_MODEL`)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Landing page served at `/`
    #[arg(long)]
    pub index: Option<PathBuf>,
}

impl ServeArgs {
    /// Fold command-line overrides into the loaded config.
    ///
    /// `config` already carries the env overrides, so flags take precedence.
    fn apply(self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = self.model.filter(|m| !m.trim().is_empty()) {
            config.gemini.model = model;
        }
        if let Some(index) = self.index {
            config.server.index_path = index;
        }
        config.validate()?;
        Ok(())
    }
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config)?;

    let state = Arc::new(AppState::from_config(&config));
    if !state.has_token() {
        tracing::warn!(
            "Gemini API key not set. /health will report failure and captions will be refused \
             until GEMINI_API_KEY is provided."
        );
    }

    let index = config.index_path();
    if !index.exists() {
        tracing::warn!("Landing page not found at {}; GET / will 404", index.display());
    }

    let app = server::build_router(state, &config);

    let listen_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    tracing::info!("Lumen v{} using model {}", lumen_core::VERSION, config.gemini.model);
    tracing::info!("HTTP server listening on http://{}", listen_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /");
    tracing::info!("  GET  /health");
    tracing::info!("  POST /api/caption");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
