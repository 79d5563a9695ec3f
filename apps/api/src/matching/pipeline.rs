//! Match pipeline — one job against a batch of candidate documents.
//!
//! validate → embed job once → score candidates concurrently → rank.
//!
//! - a malformed candidate is skipped and reported, never fatal.
//! - a malformed job fails the run (`MatchError::InvalidJob`).
//! - zero valid candidates is a successful run with an empty shortlist.
//! - the embedding and scoring phase runs under `run_timeout`; on expiry the
//!   partial results are dropped and the run fails.

use std::str::FromStr;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::matching::combiner::{combine, ScoreWeights, ScoringPolicy};
use crate::matching::keyword::score_keywords;
use crate::matching::profile::{CandidateProfile, JobProfile, MatchResult};
use crate::matching::ranker::rank;
use crate::matching::semantic::{SemanticEngine, TextEmbedding};
use crate::matching::validation::{validate_candidate, validate_job, SchemaError};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid job profile: {0}")]
    InvalidJob(#[from] SchemaError),

    #[error("match run exceeded timeout of {0:?}; partial results discarded")]
    Timeout(Duration),
}

/// What to do with a candidate once embedding retries are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Score on keywords only and record the semantic score as unavailable.
    #[default]
    KeywordOnly,
    /// Leave the candidate out of the shortlist and report it as skipped.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword_only" => Ok(FailurePolicy::KeywordOnly),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("expected 'keyword_only' or 'skip', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub scoring: ScoringPolicy,
    pub failure_policy: FailurePolicy,
    /// Max candidate evaluations in flight.
    pub concurrency: usize,
    pub run_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            failure_policy: FailurePolicy::default(),
            concurrency: 8,
            run_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    /// Position of the document in the input batch.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ranked,
    NoCandidates,
}

#[derive(Debug, Clone)]
pub struct MatchRun {
    pub run_id: Uuid,
    pub job_title: String,
    pub embedder: String,
    /// Full ranking, top first.
    pub shortlist: Vec<MatchResult>,
    pub skipped: Vec<SkippedDocument>,
}

impl RunStatus {
    /// Status of whatever shortlist is handed back to the caller, after any
    /// top-N / min-score filtering.
    pub fn of(shortlist: &[MatchResult]) -> Self {
        if shortlist.is_empty() {
            RunStatus::NoCandidates
        } else {
            RunStatus::Ranked
        }
    }
}

enum Evaluation {
    Scored(MatchResult),
    Skipped(SkippedDocument),
}

/// Job-side data shared read-only by every candidate evaluation.
struct JobContext {
    profile: JobProfile,
    weights: ScoreWeights,
    /// `None` when the job text could not be embedded.
    embedding: Option<TextEmbedding>,
}

#[derive(Clone)]
pub struct MatchPipeline {
    engine: SemanticEngine,
    settings: PipelineSettings,
}

impl MatchPipeline {
    pub fn new(engine: SemanticEngine, settings: PipelineSettings) -> Self {
        Self { engine, settings }
    }

    pub fn embedder_label(&self) -> String {
        let embedder = self.engine.embedder();
        format!("{}:{}", embedder.name(), embedder.model_id())
    }

    pub async fn run(
        &self,
        job_document: &Value,
        candidate_documents: &[Value],
    ) -> Result<MatchRun, MatchError> {
        let run_id = Uuid::new_v4();
        let profile = validate_job(job_document)?;

        info!(
            %run_id,
            job_title = %profile.job_title,
            candidates = candidate_documents.len(),
            "starting match run"
        );

        let mut skipped = Vec::new();
        let mut candidates = Vec::with_capacity(candidate_documents.len());
        for (index, document) in candidate_documents.iter().enumerate() {
            match validate_candidate(document) {
                Ok(candidate) => candidates.push((index, candidate)),
                Err(e) => {
                    warn!(%run_id, index, field = e.field(), "skipping candidate: {e}");
                    skipped.push(SkippedDocument {
                        index,
                        candidate_name: document
                            .get("candidate_name")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let job_title = profile.job_title.clone();
        let mut results = Vec::new();

        if candidates.is_empty() {
            info!(%run_id, "no valid candidates; returning empty shortlist");
        } else {
            let timeout = self.settings.run_timeout;
            let evaluations = tokio::time::timeout(timeout, self.evaluate_all(profile, candidates))
                .await
                .map_err(|_| {
                    warn!(%run_id, ?timeout, "match run timed out");
                    MatchError::Timeout(timeout)
                })?;

            for evaluation in evaluations {
                match evaluation {
                    Evaluation::Scored(result) => results.push(result),
                    Evaluation::Skipped(doc) => skipped.push(doc),
                }
            }
        }

        skipped.sort_by_key(|s| s.index);
        let shortlist = rank(results);

        info!(
            %run_id,
            ranked = shortlist.len(),
            skipped = skipped.len(),
            "match run complete"
        );

        Ok(MatchRun {
            run_id,
            job_title,
            embedder: self.embedder_label(),
            shortlist,
            skipped,
        })
    }

    async fn evaluate_all(
        &self,
        profile: JobProfile,
        candidates: Vec<(usize, CandidateProfile)>,
    ) -> Vec<Evaluation> {
        let embedding = match self.engine.embed_text(&profile.semantic_text()).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!("job text embedding failed after retries: {e}");
                None
            }
        };

        let job = JobContext {
            weights: self.settings.scoring.weights_for(&profile.job_title),
            profile,
            embedding,
        };

        stream::iter(candidates)
            .map(|(index, candidate)| self.evaluate(index, candidate, &job))
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await
    }

    async fn evaluate(
        &self,
        index: usize,
        candidate: CandidateProfile,
        job: &JobContext,
    ) -> Evaluation {
        let keyword = score_keywords(&job.profile.required_skills, &candidate.skills);

        let candidate_text = candidate.semantic_text();
        let semantic = match &job.embedding {
            // Nothing to compare on the candidate side, whatever the backend state.
            _ if candidate_text.trim().is_empty() => Ok(0.0),
            Some(job_embedding) => self
                .engine
                .score_against(job_embedding, &candidate_text)
                .await
                .map_err(|e| e.to_string()),
            None => Err("job text could not be embedded".to_string()),
        };

        let semantic_score = match semantic {
            Ok(score) => Some(score),
            Err(reason) => match self.settings.failure_policy {
                FailurePolicy::KeywordOnly => {
                    warn!(
                        candidate = %candidate.candidate_name,
                        "semantic score unavailable, using keywords only: {reason}"
                    );
                    None
                }
                FailurePolicy::Skip => {
                    warn!(
                        candidate = %candidate.candidate_name,
                        "semantic score unavailable, skipping candidate: {reason}"
                    );
                    return Evaluation::Skipped(SkippedDocument {
                        index,
                        candidate_name: Some(candidate.candidate_name),
                        reason: format!("embedding backend unavailable: {reason}"),
                    });
                }
            },
        };

        let combined = combine(
            keyword.score,
            &keyword.matched_skills,
            semantic_score,
            &job.weights,
            &self.settings.scoring.bands,
        );

        debug!(
            candidate = %candidate.candidate_name,
            keyword = keyword.score,
            semantic = ?semantic_score,
            final_score = combined.final_score,
            "candidate scored"
        );

        Evaluation::Scored(MatchResult {
            candidate_name: candidate.candidate_name,
            contact_info: candidate.contact_info,
            keyword_score: keyword.score,
            semantic_score,
            final_match_score: combined.final_score,
            matched_skills: keyword.matched_skills.into_iter().collect(),
            explanation: combined.explanation,
            original_filename: candidate.original_filename,
        })
    }
}
