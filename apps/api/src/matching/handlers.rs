//! Axum route handlers for the Matching API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::pipeline::{RunStatus, SkippedDocument};
use crate::matching::profile::MatchResult;
use crate::matching::shortlist::{self, ShortlistPolicy};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_profile: Value,
    #[serde(default)]
    pub candidates: Vec<Value>,
    #[serde(flatten)]
    pub policy: ShortlistPolicy,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub run_id: Uuid,
    pub job_title: String,
    pub status: RunStatus,
    pub generated_at: DateTime<Utc>,
    pub embedder: String,
    pub shortlist: Vec<MatchResult>,
    pub skipped: Vec<SkippedDocument>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/matches
///
/// Runs the matching pipeline for one job over the supplied candidates and
/// returns the ranked shortlist. `status` is `no_candidates` when nothing
/// survived validation or the shortlist policy.
pub async fn handle_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    if !request.policy.is_valid() {
        return Err(AppError::Validation(
            "min_score must be within [0, 1]".to_string(),
        ));
    }

    let run = state
        .pipeline
        .run(&request.job_profile, &request.candidates)
        .await?;

    let shortlist = shortlist::apply(run.shortlist, &request.policy);
    let status = RunStatus::of(&shortlist);

    Ok(Json(MatchResponse {
        run_id: run.run_id,
        job_title: run.job_title,
        status,
        generated_at: Utc::now(),
        embedder: run.embedder,
        shortlist,
        skipped: run.skipped,
    }))
}
