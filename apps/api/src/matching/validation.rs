//! Profile schema validation — turns parser-produced JSON into typed profiles.
//!
//! Rules:
//! - `job_title` / `candidate_name` must be non-empty strings.
//! - list fields are optional and default to empty; when present they must be
//!   arrays of strings (candidate `skills` may also be an object of arrays).
//! - skills are trimmed, lowercased and deduplicated; empty entries are dropped.
//!
//! A `SchemaError` rejects only the offending document; callers keep going.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::matching::keyword::normalize_skill;
use crate::matching::profile::{CandidateProfile, ContactInfo, JobProfile};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("field '<root>' must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field '{0}' must not be empty")]
    EmptyField(String),
}

impl SchemaError {
    /// Name of the field the error is about.
    pub fn field(&self) -> &str {
        match self {
            SchemaError::NotAnObject => "<root>",
            SchemaError::MissingField(field) | SchemaError::EmptyField(field) => field,
            SchemaError::WrongType { field, .. } => field,
        }
    }
}

pub fn validate_job(document: &Value) -> Result<JobProfile, SchemaError> {
    let obj = as_object(document)?;

    Ok(JobProfile {
        job_title: required_string(obj, "job_title")?,
        required_skills: skill_list(obj.get("required_skills"), "required_skills")?,
        responsibilities: string_list(obj.get("responsibilities"), "responsibilities")?,
    })
}

pub fn validate_candidate(document: &Value) -> Result<CandidateProfile, SchemaError> {
    let obj = as_object(document)?;

    let candidate_name = required_string(obj, "candidate_name")?;

    let skills = match obj.get("skills") {
        Some(Value::Object(categories)) => {
            // Categorised skills: { "languages": [...], "databases": [...] }
            let mut skills = BTreeSet::new();
            for (category, list) in categories {
                skills.extend(skill_list(Some(list), &format!("skills.{category}"))?);
            }
            skills
        }
        other => skill_list(other, "skills")?,
    };

    Ok(CandidateProfile {
        candidate_name,
        contact_info: contact_info(obj.get("contact_info"))?,
        skills,
        experience: experience_entries(obj.get("experience"))?,
        original_filename: optional_string(obj, "original_filename")?,
    })
}

fn as_object(document: &Value) -> Result<&Map<String, Value>, SchemaError> {
    document.as_object().ok_or(SchemaError::NotAnObject)
}

fn required_string(obj: &Map<String, Value>, field: &str) -> Result<String, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(SchemaError::MissingField(field.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(SchemaError::EmptyField(field.to_string()))
        }
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(SchemaError::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(SchemaError::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

/// Array of strings, trimmed, empty entries dropped. Missing or null → empty.
fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>, SchemaError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SchemaError::WrongType {
                field: field.to_string(),
                expected: "an array of strings",
            })
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            _ => {
                return Err(SchemaError::WrongType {
                    field: format!("{field}[{i}]"),
                    expected: "a string",
                })
            }
        }
    }
    Ok(out)
}

fn skill_list(value: Option<&Value>, field: &str) -> Result<BTreeSet<String>, SchemaError> {
    Ok(string_list(value, field)?
        .iter()
        .filter_map(|s| normalize_skill(s))
        .collect())
}

fn contact_info(value: Option<&Value>) -> Result<ContactInfo, SchemaError> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(ContactInfo::default()),
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(SchemaError::WrongType {
                field: "contact_info".to_string(),
                expected: "an object",
            })
        }
    };

    let field = |name: &str| {
        optional_string(obj, name).map_err(|_| SchemaError::WrongType {
            field: format!("contact_info.{name}"),
            expected: "a string",
        })
    };

    Ok(ContactInfo {
        email: field("email")?,
        phone: field("phone")?,
        linkedin_url: field("linkedin_url")?,
    })
}

/// Experience entries are either plain strings or role objects whose
/// `responsibilities` are joined into one entry. Entries without text are dropped.
fn experience_entries(value: Option<&Value>) -> Result<Vec<String>, SchemaError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SchemaError::WrongType {
                field: "experience".to_string(),
                expected: "an array",
            })
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let text = match item {
            Value::String(s) => s.trim().to_string(),
            Value::Object(role) => string_list(
                role.get("responsibilities"),
                &format!("experience[{i}].responsibilities"),
            )?
            .join(" "),
            _ => {
                return Err(SchemaError::WrongType {
                    field: format!("experience[{i}]"),
                    expected: "a string or an object",
                })
            }
        };
        if !text.is_empty() {
            entries.push(text);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_job_normalizes_skills() {
        let job = validate_job(&json!({
            "job_title": "Data Engineer",
            "required_skills": ["Python", " SQL ", "python", ""],
            "responsibilities": ["Build pipelines", "  "]
        }))
        .unwrap();

        assert_eq!(job.job_title, "Data Engineer");
        assert_eq!(
            job.required_skills.into_iter().collect::<Vec<_>>(),
            vec!["python", "sql"]
        );
        assert_eq!(job.responsibilities, vec!["Build pipelines"]);
    }

    #[test]
    fn test_job_without_lists_is_valid() {
        let job = validate_job(&json!({ "job_title": "Clerk" })).unwrap();
        assert!(job.required_skills.is_empty());
        assert!(job.responsibilities.is_empty());
    }

    #[test]
    fn test_missing_job_title_is_rejected() {
        let err = validate_job(&json!({ "required_skills": ["rust"] })).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("job_title".to_string()));
        assert_eq!(err.field(), "job_title");
    }

    #[test]
    fn test_blank_job_title_is_rejected() {
        let err = validate_job(&json!({ "job_title": "   " })).unwrap_err();
        assert_eq!(err, SchemaError::EmptyField("job_title".to_string()));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let err = validate_candidate(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err, SchemaError::NotAnObject);
        assert_eq!(err.field(), "<root>");
    }

    #[test]
    fn test_skills_with_non_string_entry_names_the_index() {
        let err = validate_candidate(&json!({
            "candidate_name": "Ann",
            "skills": ["rust", 42]
        }))
        .unwrap_err();
        assert_eq!(err.field(), "skills[1]");
        assert!(err.to_string().contains("skills[1]"));
    }

    #[test]
    fn test_required_skills_of_wrong_type_is_rejected() {
        let err = validate_job(&json!({
            "job_title": "Engineer",
            "required_skills": "rust, sql"
        }))
        .unwrap_err();
        assert_eq!(err.field(), "required_skills");
    }

    #[test]
    fn test_categorised_skills_are_flattened() {
        let candidate = validate_candidate(&json!({
            "candidate_name": "Ann",
            "skills": {
                "languages": ["Python", "Rust"],
                "databases": ["PostgreSQL", "python"]
            }
        }))
        .unwrap();

        assert_eq!(
            candidate.skills.into_iter().collect::<Vec<_>>(),
            vec!["postgresql", "python", "rust"]
        );
    }

    #[test]
    fn test_categorised_skill_error_names_the_category() {
        let err = validate_candidate(&json!({
            "candidate_name": "Ann",
            "skills": { "languages": "Python" }
        }))
        .unwrap_err();
        assert_eq!(err.field(), "skills.languages");
    }

    #[test]
    fn test_experience_accepts_strings_and_role_objects() {
        let candidate = validate_candidate(&json!({
            "candidate_name": "Ann",
            "experience": [
                "Led a data platform team",
                {
                    "job_title": "Engineer",
                    "responsibilities": ["Wrote ETL jobs", "Tuned SQL"]
                },
                { "job_title": "Intern" },
                ""
            ]
        }))
        .unwrap();

        assert_eq!(
            candidate.experience,
            vec!["Led a data platform team", "Wrote ETL jobs Tuned SQL"]
        );
    }

    #[test]
    fn test_contact_info_is_carried_through() {
        let candidate = validate_candidate(&json!({
            "candidate_name": "Ann",
            "contact_info": { "email": "ann@example.com", "phone": "555-0100" }
        }))
        .unwrap();

        assert_eq!(candidate.contact_info.email.as_deref(), Some("ann@example.com"));
        assert_eq!(candidate.contact_info.phone.as_deref(), Some("555-0100"));
        assert_eq!(candidate.contact_info.linkedin_url, None);
    }

    #[test]
    fn test_contact_info_with_wrong_email_type_is_rejected() {
        let err = validate_candidate(&json!({
            "candidate_name": "Ann",
            "contact_info": { "email": 7 }
        }))
        .unwrap_err();
        assert_eq!(err.field(), "contact_info.email");
    }

    #[test]
    fn test_candidate_without_contact_info_is_valid() {
        let candidate = validate_candidate(&json!({ "candidate_name": "Bob" })).unwrap();
        assert_eq!(candidate.contact_info, ContactInfo::default());
        assert!(candidate.skills.is_empty());
        assert!(candidate.experience.is_empty());
        assert_eq!(candidate.original_filename, None);
    }
}
