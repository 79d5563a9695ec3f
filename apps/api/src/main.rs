mod artifact;
mod cli;
mod config;
mod embedding;
mod errors;
mod matching;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::matching::pipeline::MatchPipeline;
use crate::matching::semantic::SemanticEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shortlist v{}", env!("CARGO_PKG_VERSION"));

    // Load the embedding backend once; every run shares the handle
    let embedder = create_embedder(&config.embedding)?;
    info!(
        "Embedder initialized (backend: {}, model: {})",
        embedder.name(),
        embedder.model_id()
    );

    let engine = SemanticEngine::new(embedder, config.retry);
    let pipeline = Arc::new(MatchPipeline::new(engine, config.pipeline.clone()));

    match cli.command {
        Some(Command::Rank(args)) => {
            let summary = cli::run_rank(&pipeline, &args).await?;
            info!(
                "Wrote {} ranked candidates to {} ({} skipped)",
                summary.ranked,
                summary.output.display(),
                summary.skipped
            );
            Ok(())
        }
        Some(Command::Serve) | None => serve(config.port, pipeline).await,
    }
}

async fn serve(port: u16, pipeline: Arc<MatchPipeline>) -> Result<()> {
    let state = AppState { pipeline };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
