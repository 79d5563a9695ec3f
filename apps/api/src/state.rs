use std::sync::Arc;

use crate::matching::pipeline::MatchPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; holds the shared embedder handle and scoring policy.
    pub pipeline: Arc<MatchPipeline>,
}
