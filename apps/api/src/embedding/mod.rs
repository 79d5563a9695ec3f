//! Embedding backends — the single `embed(text) -> vector` capability the
//! semantic engine depends on.
//!
//! Default: `HashEmbedder` (feature hashing, deterministic, offline).
//! `HttpEmbedder` calls an OpenAI-compatible `/embeddings` endpoint.
//!
//! The chosen backend is built once at startup and shared as `Arc<dyn Embedder>`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

pub mod hash;
pub mod http;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding response was empty")]
    EmptyResponse,

    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),
}

impl EmbeddingError {
    /// Whether another attempt could succeed: transport failures, 429 and 5xx.
    /// A body that does not decode fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Http(e) => !e.is_decode() && !e.is_builder(),
            EmbeddingError::Unavailable(_) => true,
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::EmptyResponse | EmbeddingError::DimensionMismatch { .. } => false,
        }
    }
}

/// Text → dense vector. Implementations must be deterministic for identical
/// input and must not mutate shared state across calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend label ("hash" | "http"), reported alongside results.
    fn name(&self) -> &'static str;

    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

pub fn create_embedder(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.backend {
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(config.dimension)),
        EmbeddingBackend::Http => Arc::new(HttpEmbedder::new(
            config.api_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.timeout,
        )?),
    };
    Ok(embedder)
}
