//! Semantic similarity — cosine similarity of embedded job and candidate text.
//!
//! - empty text on either side → 0.0 and no embedding call.
//! - negative cosine is clamped to 0.0; non-finite results are 0.0.
//! - transient backend errors are retried with exponential backoff, bounded
//!   by `RetryPolicy::max_retries`.
//!
//! The job side is embedded once per run (`embed_text`) and reused via
//! `score_against` for every candidate.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::embedding::{Embedder, EmbeddingError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each following retry.
    pub backoff: Duration,
}

/// Backoff stops doubling after this many retries.
const MAX_BACKOFF_EXPONENT: u32 = 16;

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// An embedded text block. `Empty` means there was no text to embed.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEmbedding {
    Empty,
    Vector(Vec<f32>),
}

/// Cosine similarity clamped to [0, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() {
        sim.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Clone)]
pub struct SemanticEngine {
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
}

impl SemanticEngine {
    pub fn new(embedder: Arc<dyn Embedder>, retry: RetryPolicy) -> Self {
        Self { embedder, retry }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embeds a text block, retrying transient failures.
    pub async fn embed_text(&self, text: &str) -> Result<TextEmbedding, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(TextEmbedding::Empty);
        }

        let mut attempt = 0;
        loop {
            match self.embedder.embed(text).await {
                Ok(vector) => return Ok(TextEmbedding::Vector(vector)),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        backend = self.embedder.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "embedding call failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Similarity of two embedded blocks. Empty on either side scores 0.0.
    pub fn similarity(
        job: &TextEmbedding,
        candidate: &TextEmbedding,
    ) -> Result<f64, EmbeddingError> {
        match (job, candidate) {
            (TextEmbedding::Vector(a), TextEmbedding::Vector(b)) => {
                if a.len() != b.len() {
                    return Err(EmbeddingError::DimensionMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Ok(cosine_similarity(a, b))
            }
            _ => Ok(0.0),
        }
    }

    /// Scores candidate text against an already-embedded job block.
    pub async fn score_against(
        &self,
        job: &TextEmbedding,
        candidate_text: &str,
    ) -> Result<f64, EmbeddingError> {
        if matches!(job, TextEmbedding::Empty) {
            return Ok(0.0);
        }
        let candidate = self.embed_text(candidate_text).await?;
        Self::similarity(job, &candidate)
    }

    /// One-off job/candidate comparison; the pipeline embeds the job once
    /// and uses `score_against` instead.
    #[allow(dead_code)]
    pub async fn score_semantic(
        &self,
        job_text: &str,
        candidate_text: &str,
    ) -> Result<f64, EmbeddingError> {
        let job = self.embed_text(job_text).await?;
        self.score_against(&job, candidate_text).await
    }
}
