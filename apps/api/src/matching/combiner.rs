//! Score combination and explanation text.
//!
//! final = keyword_weight × keyword + semantic_weight × semantic, weights sum to 1.
//! When the semantic score is unavailable the candidate is scored on keywords only.
//! Explanations are plain string formatting over the inputs, so the same inputs
//! always give the same text.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("keyword_weight must be within [0, 1], got {0}")]
    WeightOutOfRange(f64),

    #[error("semantic band thresholds must be ascending within [0, 1], got {0:?}")]
    UnorderedBands([f64; 3]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    keyword: f64,
    semantic: f64,
}

impl ScoreWeights {
    /// Semantic weight is derived as `1 - keyword_weight`.
    pub fn new(keyword_weight: f64) -> Result<Self, PolicyError> {
        if !(0.0..=1.0).contains(&keyword_weight) {
            return Err(PolicyError::WeightOutOfRange(keyword_weight));
        }
        Ok(Self {
            keyword: keyword_weight,
            semantic: 1.0 - keyword_weight,
        })
    }

    pub fn keyword(&self) -> f64 {
        self.keyword
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keyword: 0.5,
            semantic: 0.5,
        }
    }
}

/// Lower bounds of the low / medium / high similarity bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    low: f64,
    medium: f64,
    high: f64,
}

impl BandThresholds {
    pub fn new(low: f64, medium: f64, high: f64) -> Result<Self, PolicyError> {
        let ordered = 0.0 <= low && low <= medium && medium <= high && high <= 1.0;
        if !ordered {
            return Err(PolicyError::UnorderedBands([low, medium, high]));
        }
        Ok(Self { low, medium, high })
    }

    pub fn band(&self, score: f64) -> SemanticBand {
        if score >= self.high {
            SemanticBand::High
        } else if score >= self.medium {
            SemanticBand::Medium
        } else if score >= self.low {
            SemanticBand::Low
        } else {
            SemanticBand::VeryLow
        }
    }
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            low: 0.2,
            medium: 0.4,
            high: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticBand {
    VeryLow,
    Low,
    Medium,
    High,
}

impl SemanticBand {
    pub fn label(&self) -> &'static str {
        match self {
            SemanticBand::VeryLow => "very low",
            SemanticBand::Low => "low",
            SemanticBand::Medium => "medium",
            SemanticBand::High => "high",
        }
    }
}

/// Weighting policy for a run: default weights, per-title overrides and bands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringPolicy {
    pub weights: ScoreWeights,
    /// Keyed by lowercased job title.
    pub title_weights: BTreeMap<String, ScoreWeights>,
    pub bands: BandThresholds,
}

impl ScoringPolicy {
    pub fn weights_for(&self, job_title: &str) -> ScoreWeights {
        self.title_weights
            .get(&job_title.trim().to_lowercase())
            .copied()
            .unwrap_or(self.weights)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub final_score: f64,
    pub explanation: String,
}

pub fn combine(
    keyword_score: f64,
    matched_skills: &BTreeSet<String>,
    semantic_score: Option<f64>,
    weights: &ScoreWeights,
    bands: &BandThresholds,
) -> Combined {
    let final_score = match semantic_score {
        Some(semantic) => weights.keyword() * keyword_score + weights.semantic() * semantic,
        None => keyword_score,
    };

    Combined {
        final_score: final_score.clamp(0.0, 1.0),
        explanation: build_explanation(keyword_score, matched_skills, semantic_score, bands),
    }
}

pub fn build_explanation(
    keyword_score: f64,
    matched_skills: &BTreeSet<String>,
    semantic_score: Option<f64>,
    bands: &BandThresholds,
) -> String {
    let skills_part = if matched_skills.is_empty() {
        "No required skills matched.".to_string()
    } else {
        let names: Vec<&str> = matched_skills.iter().map(String::as_str).collect();
        format!(
            "Matched required skills: {} ({:.0}% of requirements).",
            names.join(", "),
            keyword_score * 100.0
        )
    };

    let semantic_part = match semantic_score {
        Some(score) => format!(
            "Semantic similarity is {} ({score:.2}).",
            bands.band(score).label()
        ),
        None => "Semantic similarity unavailable; scored on keywords only.".to_string(),
    };

    format!("{skills_part} {semantic_part}")
}
