use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Input for a single job-search run. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationInput {
    #[serde(default)]
    pub resume: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[serde(default)]
    pub keywords: String,
}

fn default_location() -> String {
    "Remote".to_string()
}

fn default_job_type() -> String {
    "full-time".to_string()
}

impl Default for InvocationInput {
    fn default() -> Self {
        Self {
            resume: String::new(),
            location: default_location(),
            job_type: default_job_type(),
            keywords: String::new(),
        }
    }
}

impl InvocationInput {
    /// Used when a run is started without any input at all.
    pub fn fallback() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunResultRow {
    pub run_id: Uuid,
    pub output: Value,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let input: InvocationInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input, InvocationInput::default());
        assert_eq!(input.location, "Remote");
        assert_eq!(input.job_type, "full-time");
        assert!(input.resume.is_empty());
        assert!(input.keywords.is_empty());
    }

    #[test]
    fn test_camel_case_job_type() {
        let input: InvocationInput = serde_json::from_str(
            r#"{"resume": "10 years of Rust", "jobType": "contract", "keywords": "rust, tokio"}"#,
        )
        .unwrap();
        assert_eq!(input.job_type, "contract");
        assert_eq!(input.location, "Remote");
        assert_eq!(input.keywords, "rust, tokio");
    }
}
