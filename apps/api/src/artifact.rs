//! Filesystem side of the batch command: profile documents in, ranked-candidates artifact out.
//!
//! The artifact is one pretty-printed JSON array of `MatchResult`, top-ranked first.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::matching::profile::MatchResult;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Candidate documents read from a directory, plus files that could not be read.
#[derive(Debug, Default)]
pub struct CandidateBatch {
    pub documents: Vec<Value>,
    /// (file name, reason)
    pub unreadable: Vec<(String, String)>,
}

pub fn load_document(path: &Path) -> Result<Value, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every `*.json` file in `dir` in file-name order. A file that cannot be
/// read or parsed is reported in `unreadable` and does not stop the batch.
/// Object documents without `original_filename` get the file name filled in.
pub fn load_candidates(dir: &Path) -> Result<CandidateBatch, ArtifactError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut batch = CandidateBatch::default();
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match load_document(&path) {
            Ok(mut document) => {
                if let Some(obj) = document.as_object_mut() {
                    obj.entry("original_filename")
                        .or_insert_with(|| Value::String(file_name.clone()));
                }
                batch.documents.push(document);
            }
            Err(e) => {
                warn!(file = %file_name, "skipping unreadable candidate file: {e}");
                batch.unreadable.push((file_name, e.to_string()));
            }
        }
    }
    Ok(batch)
}

pub fn write_ranked(path: &Path, results: &[MatchResult]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let json = serde_json::to_string_pretty(results).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err(path))
}

/// Reads an artifact written by `write_ranked`.
#[allow(dead_code)]
pub fn read_ranked(path: &Path) -> Result<Vec<MatchResult>, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::ContactInfo;
    use serde_json::json;

    fn result(name: &str, keyword: f64, semantic: Option<f64>, final_score: f64) -> MatchResult {
        MatchResult {
            candidate_name: name.to_string(),
            contact_info: ContactInfo {
                email: Some(format!("{}@example.com", name.to_lowercase())),
                ..Default::default()
            },
            keyword_score: keyword,
            semantic_score: semantic,
            final_match_score: final_score,
            matched_skills: vec!["sql".to_string()],
            explanation: format!("explanation for {name}"),
            original_filename: Some(format!("{name}.json")),
        }
    }

    #[test]
    fn test_ranked_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("ranked_candidates.json");
        let ranked = vec![
            result("Ann", 2.0 / 3.0, Some(0.123456789), 0.394_940_061_1),
            result("Bob", 0.5, None, 0.5 - f64::EPSILON),
            result("Cy", 0.0, Some(0.0), 0.0),
        ];

        write_ranked(&path, &ranked).unwrap();
        let restored = read_ranked(&path).unwrap();

        assert_eq!(restored, ranked);
    }

    #[test]
    fn test_artifact_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranked.json");
        write_ranked(&path, &[]).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, json!([]));
    }

    #[test]
    fn test_load_candidates_reads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"candidate_name":"Bob"}"#).unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"candidate_name":"Ann","original_filename":"ann_resume.pdf"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("c.json"), "{ not json").unwrap();

        let batch = load_candidates(dir.path()).unwrap();

        assert_eq!(batch.documents.len(), 2);
        assert_eq!(batch.documents[0]["original_filename"], "ann_resume.pdf");
        assert_eq!(batch.documents[1]["original_filename"], "b.json");
        assert_eq!(batch.unreadable.len(), 1);
        assert_eq!(batch.unreadable[0].0, "c.json");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_candidates(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
