//! Shortlist policy — the caller-side limit applied after ranking.
//!
//! The ranker never truncates; HTTP and batch callers pass a policy here.

use serde::{Deserialize, Serialize};

use crate::matching::profile::MatchResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistPolicy {
    /// Drop results whose final score is below this value.
    #[serde(default)]
    pub min_score: Option<f64>,
    /// Keep at most this many results.
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl ShortlistPolicy {
    pub fn is_valid(&self) -> bool {
        self.min_score.map_or(true, |m| (0.0..=1.0).contains(&m))
    }
}

/// Expects `ranked` already ordered by `ranker::rank`.
pub fn apply(ranked: Vec<MatchResult>, policy: &ShortlistPolicy) -> Vec<MatchResult> {
    let min = policy.min_score.unwrap_or(f64::MIN);
    let limit = policy.top_n.unwrap_or(usize::MAX);

    ranked
        .into_iter()
        .filter(|r| r.final_match_score >= min)
        .take(limit)
        .collect()
}
