//! Keyword matching — recall of the job's required skills in the candidate's skill set.
//!
//! score = |required ∩ candidate| / |required|, 0.0 when nothing is required.
//! Extra candidate skills are never penalized. Matching is exact after
//! normalization; "JS" and "JavaScript" are different skills.

use std::collections::BTreeSet;

/// Trimmed, lowercased skill, or `None` for blank input.
pub fn normalize_skill(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub score: f64,
    /// Sorted, normalized.
    pub matched_skills: BTreeSet<String>,
}

pub fn score_keywords<'a, J, C>(job_skills: J, candidate_skills: C) -> KeywordMatch
where
    J: IntoIterator<Item = &'a String>,
    C: IntoIterator<Item = &'a String>,
{
    let required: BTreeSet<String> = job_skills
        .into_iter()
        .filter_map(|s| normalize_skill(s))
        .collect();
    let possessed: BTreeSet<String> = candidate_skills
        .into_iter()
        .filter_map(|s| normalize_skill(s))
        .collect();

    if required.is_empty() {
        return KeywordMatch {
            score: 0.0,
            matched_skills: BTreeSet::new(),
        };
    }

    let matched_skills: BTreeSet<String> = required.intersection(&possessed).cloned().collect();
    let score = matched_skills.len() as f64 / required.len() as f64;

    KeywordMatch {
        score,
        matched_skills,
    }
}
