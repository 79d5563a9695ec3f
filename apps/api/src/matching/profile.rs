//! Validated profile types and the per-candidate match result.
//!
//! Profiles are built only by `validation` and never mutated afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A job opening as supplied by the upstream JD parser.
#[derive(Debug, Clone, PartialEq)]
pub struct JobProfile {
    pub job_title: String,
    /// Normalized (trimmed, lowercase) and deduplicated.
    pub required_skills: BTreeSet<String>,
    pub responsibilities: Vec<String>,
}

impl JobProfile {
    /// Responsibilities joined into the single block handed to the embedder.
    pub fn semantic_text(&self) -> String {
        self.responsibilities.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

/// An applicant as supplied by the upstream resume parser.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub candidate_name: String,
    pub contact_info: ContactInfo,
    /// Normalized (trimmed, lowercase) and deduplicated; categorised skills are flattened.
    pub skills: BTreeSet<String>,
    pub experience: Vec<String>,
    pub original_filename: Option<String>,
}

impl CandidateProfile {
    pub fn semantic_text(&self) -> String {
        self.experience.join(" ")
    }
}

/// One scored candidate for one job. This is the record shape of the
/// ranked-candidates artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_name: String,
    #[serde(default)]
    pub contact_info: ContactInfo,
    pub keyword_score: f64,
    /// `None` when the embedding backend was unavailable and the candidate
    /// was scored on keywords only.
    pub semantic_score: Option<f64>,
    pub final_match_score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_text_joins_entries_in_order() {
        let job = JobProfile {
            job_title: "Data Engineer".to_string(),
            required_skills: BTreeSet::new(),
            responsibilities: vec!["Build pipelines".to_string(), "Own the warehouse".to_string()],
        };
        assert_eq!(job.semantic_text(), "Build pipelines Own the warehouse");
    }

    #[test]
    fn test_contact_info_omits_missing_fields() {
        let contact = ContactInfo {
            email: Some("ann@example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "ann@example.com" }));
    }

    #[test]
    fn test_unavailable_semantic_score_serializes_as_null() {
        let result = MatchResult {
            candidate_name: "Ann".to_string(),
            contact_info: ContactInfo::default(),
            keyword_score: 0.5,
            semantic_score: None,
            final_match_score: 0.5,
            matched_skills: vec!["sql".to_string()],
            explanation: String::new(),
            original_filename: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["semantic_score"].is_null());
        assert!(json.get("original_filename").is_none());
    }
}
