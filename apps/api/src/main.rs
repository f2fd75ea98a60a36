mod config;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::documents::DocumentWriter;
use crate::generation::orchestrator::InterviewPrepOrchestrator;
use crate::llm_client::{LlmGateway, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Prep API v{}", env!("CARGO_PKG_VERSION"));

    // One gateway (and one token cache) shared by every branch of every request
    let llm: Option<Arc<dyn TextGenerator>> = match config.gateway.clone() {
        Some(settings) => {
            info!(api_url = %settings.api_url, token_url = %settings.token_url, "LLM gateway initialized");
            Some(Arc::new(
                LlmGateway::new(settings).context("Failed to build LLM HTTP client")?,
            ))
        }
        None => {
            warn!("LLM_API_URL or LLM_API_KEY not set, running in template-only mode");
            None
        }
    };

    let documents = DocumentWriter::new(llm.clone(), config.pipeline.llm_timeout);
    let orchestrator = InterviewPrepOrchestrator::new(llm, config.pipeline);
    info!(
        branch_timeout_ms = config.pipeline.branch_timeout.as_millis() as u64,
        request_timeout_ms = config.pipeline.request_timeout.as_millis() as u64,
        "Pipeline configured"
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        documents: Arc::new(documents),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
