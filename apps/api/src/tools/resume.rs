//! Resume analysis tool: asks the model for a fixed analysis schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{complete_json, LanguageModel};

/// Resume analysis prompt template. Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this resume and extract key information.

Return a JSON object with this EXACT schema:
{
  "skills": ["Rust", "PostgreSQL"],
  "experience": [
    {"title": "Backend Engineer", "company": "Acme", "duration": "2019-2023", "highlights": ["..."]}
  ],
  "education": [
    {"degree": "BSc Computer Science", "institution": "University", "year": "2018"}
  ],
  "summary": "Two-sentence overview of the candidate",
  "years_experience": 5
}

Resume:
{resume_text}"#;

/// Sampling temperature for resume extraction. Extraction should be repeatable.
pub const RESUME_ANALYSIS_TEMPERATURE: f32 = 0.0;

/// A resume analysis as the model returned it, plus `raw_text`.
///
/// Field types are not enforced: whatever object the model produced is kept,
/// so one oddly typed field never discards the rest of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeAnalysis(pub Map<String, Value>);

impl ResumeAnalysis {
    fn failed(error: String, summary: &str, raw_text: Option<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".into(), Value::String(error));
        fields.insert("skills".into(), Value::Array(Vec::new()));
        fields.insert("experience".into(), Value::Array(Vec::new()));
        fields.insert("education".into(), Value::Array(Vec::new()));
        fields.insert("summary".into(), Value::String(summary.to_string()));
        fields.insert("years_experience".into(), Value::from(0));
        if let Some(raw_text) = raw_text {
            fields.insert("raw_text".into(), Value::String(raw_text));
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn error(&self) -> Option<&str> {
        self.get("error").and_then(Value::as_str)
    }
}

/// Analyzes `resume_text`. Blank input short-circuits without calling the model.
/// A failed call or a reply that is not a JSON object yields an error record
/// that keeps the raw text.
pub async fn analyze_resume(model: &dyn LanguageModel, resume_text: &str) -> ResumeAnalysis {
    if resume_text.trim().is_empty() {
        return ResumeAnalysis::failed(
            "Empty resume text provided".to_string(),
            "No resume to analyze",
            None,
        );
    }

    let prompt = RESUME_ANALYSIS_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
    let reply = complete_json::<Value>(model, &prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| e.to_string())
        .and_then(|value| match value {
            Value::Object(fields) => Ok(fields),
            other => Err(format!("expected a JSON object, got {other}")),
        });

    match reply {
        Ok(mut fields) => {
            info!(
                "Resume analyzed: {} skills, {} years experience",
                fields.get("skills").and_then(serde_json::Value::as_array).map_or(0, Vec::len),
                fields.get("years_experience").unwrap_or(&serde_json::Value::Null)
            );
            fields.insert("raw_text".into(), Value::String(resume_text.to_string()));
            ResumeAnalysis(fields)
        }
        Err(e) => {
            error!("Resume analysis failed: {e}");
            ResumeAnalysis::failed(e, "Analysis failed", Some(resume_text.to_string()))
        }
    }
}
