//! Output normalizer: turns the agent's final text into the run's output record.
//!
//! JSON extraction is an ordered chain of independent strategies; the first one
//! that yields a value wins:
//!   1. the whole text parsed as JSON
//!   2. the first fenced code block holding a `{ ... }` object
//!
//! The result is never an `Err`: every failure becomes an `ErrorPayload` that
//! carries the raw text for diagnosis.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Hard cap on jobs in a run output, regardless of what the model returned.
pub const MAX_JOBS: usize = 5;
pub const DEFAULT_SUMMARY: &str = "No summary provided";

static FENCED_OBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced block pattern is valid")
});

// ────────────────────────────────────────────────────────────────────────────
// Output records
// ────────────────────────────────────────────────────────────────────────────

/// The successful run output. Field values are passed through from the model as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub summary: Value,
    /// At most `MAX_JOBS` entries.
    pub jobs: Vec<Value>,
    pub recommendations: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub raw_output: String,
}

/// Exactly one of these is pushed per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutput {
    Success(StructuredResult),
    Error(ErrorPayload),
}

impl RunOutput {
    pub fn error(error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        RunOutput::Error(ErrorPayload {
            error: error.into(),
            raw_output: raw_output.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RunOutput::Error(_))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction chain
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    FencedBlock,
}

/// Outcome of one extraction strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseAttempt {
    Parsed(Value),
    Failed(String),
}

/// Outcome of the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Found { strategy: Strategy, value: Value },
    NotFound { reasons: Vec<String> },
}

const STRATEGIES: [(Strategy, fn(&str) -> ParseAttempt); 2] = [
    (Strategy::Direct, parse_direct),
    (Strategy::FencedBlock, parse_fenced_block),
];

pub fn parse_direct(text: &str) -> ParseAttempt {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => ParseAttempt::Parsed(value),
        Err(e) => ParseAttempt::Failed(format!("direct parse: {e}")),
    }
}

pub fn parse_fenced_block(text: &str) -> ParseAttempt {
    let Some(caps) = FENCED_OBJECT_RE.captures(text) else {
        return ParseAttempt::Failed("fenced block: no ```json block found".to_string());
    };
    match serde_json::from_str::<Value>(caps[1].trim()) {
        Ok(value) => ParseAttempt::Parsed(value),
        Err(e) => ParseAttempt::Failed(format!("fenced block: {e}")),
    }
}

pub fn extract_json(text: &str) -> Extraction {
    let mut reasons = Vec::new();
    for (strategy, attempt) in STRATEGIES {
        match attempt(text) {
            ParseAttempt::Parsed(value) => return Extraction::Found { strategy, value },
            ParseAttempt::Failed(reason) => reasons.push(reason),
        }
    }
    Extraction::NotFound { reasons }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("'jobs' must be a sequence, got {0}")]
    JobsNotASequence(&'static str),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds a `StructuredResult` from extracted JSON, applying defaults and the job cap.
pub fn build_structured_result(value: Value) -> Result<StructuredResult, NormalizeError> {
    let Value::Object(mut map) = value else {
        return Err(NormalizeError::NotAnObject(type_name(&value)));
    };

    let summary = map
        .remove("summary")
        .unwrap_or_else(|| Value::String(DEFAULT_SUMMARY.to_string()));
    let jobs = match map.remove("jobs") {
        None => Vec::new(),
        Some(Value::Array(mut jobs)) => {
            jobs.truncate(MAX_JOBS);
            jobs
        }
        Some(other) => return Err(NormalizeError::JobsNotASequence(type_name(&other))),
    };
    let recommendations = map
        .remove("recommendations")
        .unwrap_or_else(|| Value::Array(Vec::new()));

    Ok(StructuredResult {
        summary,
        jobs,
        recommendations,
    })
}

/// Normalizes the agent's final text.
pub fn normalize_text(text: &str) -> Result<RunOutput, NormalizeError> {
    match extract_json(text) {
        Extraction::Found { value, .. } => Ok(RunOutput::Success(build_structured_result(value)?)),
        Extraction::NotFound { reasons } => {
            warn!("No JSON in agent output: {}", reasons.join("; "));
            Ok(RunOutput::error("Could not parse JSON output", text))
        }
    }
}

/// Normalizes a whole agent invocation result (a mapping with an `output` key).
/// Never fails: unexpected shapes and processing errors become error payloads.
pub fn normalize_invocation(result: &Value) -> RunOutput {
    let outcome = match result.get("output") {
        Some(Value::String(text)) => normalize_text(text),
        Some(other) => Ok(RunOutput::error(
            "Could not parse JSON output",
            other.to_string(),
        )),
        None => Ok(RunOutput::error(
            "Unexpected output format",
            result.to_string(),
        )),
    };

    outcome.unwrap_or_else(|e| {
        error!("Failed to process results: {e}");
        RunOutput::error(format!("Failed to process results: {e}"), result.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation(output: &str) -> Value {
        json!({"input": "task", "output": output})
    }

    fn jobs(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"title": format!("Job {i}"), "company": "Acme"}))
            .collect()
    }

    #[test]
    fn test_no_json_gives_parse_error_payload() {
        let output = normalize_invocation(&invocation("no json here"));
        assert_eq!(
            output,
            RunOutput::error("Could not parse JSON output", "no json here")
        );
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({"error": "Could not parse JSON output", "raw_output": "no json here"})
        );
    }

    #[test]
    fn test_fenced_block_is_extracted() {
        let text = "Here you go:\n```json\n{\"summary\":\"ok\",\"jobs\":[],\"recommendations\":[\"apply\"]}\n```";
        let output = normalize_invocation(&invocation(text));
        assert_eq!(
            output,
            RunOutput::Success(StructuredResult {
                summary: json!("ok"),
                jobs: vec![],
                recommendations: json!(["apply"]),
            })
        );
    }

    #[test]
    fn test_fenced_block_without_language_tag() {
        let text = "```\n{\"summary\": \"plain fence\"}\n```";
        match extract_json(text) {
            Extraction::Found { strategy, value } => {
                assert_eq!(strategy, Strategy::FencedBlock);
                assert_eq!(value["summary"], "plain fence");
            }
            other => panic!("expected fenced extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_direct_parse_wins_over_fenced() {
        match extract_json("{\"summary\": \"direct\"}") {
            Extraction::Found { strategy, .. } => assert_eq!(strategy, Strategy::Direct),
            other => panic!("expected direct extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_fenced_block_reports_both_reasons() {
        let text = "```json\n{\"summary\": oops}\n```";
        match extract_json(text) {
            Extraction::NotFound { reasons } => {
                assert_eq!(reasons.len(), 2);
                assert!(reasons[0].starts_with("direct parse"));
                assert!(reasons[1].starts_with("fenced block"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_jobs_are_capped_at_five() {
        for n in [0, 3, 5, 6, 12] {
            let text = json!({"summary": "s", "jobs": jobs(n), "recommendations": []}).to_string();
            let fenced = format!("```json\n{text}\n```");
            for candidate in [text.as_str(), fenced.as_str()] {
                match normalize_invocation(&invocation(candidate)) {
                    RunOutput::Success(result) => {
                        assert_eq!(result.jobs.len(), n.min(MAX_JOBS));
                        if n > 0 {
                            assert_eq!(result.jobs[0]["title"], "Job 0");
                        }
                    }
                    other => panic!("expected success, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let output = normalize_text("{}").unwrap();
        assert_eq!(
            output,
            RunOutput::Success(StructuredResult {
                summary: json!(DEFAULT_SUMMARY),
                jobs: vec![],
                recommendations: json!([]),
            })
        );
    }

    #[test]
    fn test_field_types_pass_through() {
        let text = r#"{"summary": {"total_jobs_found": 3}, "jobs": [1, "two"], "recommendations": "apply now", "extra": true}"#;
        match normalize_text(text).unwrap() {
            RunOutput::Success(result) => {
                assert_eq!(result.summary, json!({"total_jobs_found": 3}));
                assert_eq!(result.jobs, vec![json!(1), json!("two")]);
                assert_eq!(result.recommendations, json!("apply now"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_output_key_is_unexpected_format() {
        let result = json!({"intermediate_steps": []});
        assert_eq!(
            normalize_invocation(&result),
            RunOutput::error("Unexpected output format", result.to_string())
        );
        let not_a_map = json!("just text");
        assert_eq!(
            normalize_invocation(&not_a_map),
            RunOutput::error("Unexpected output format", "\"just text\"")
        );
    }

    #[test]
    fn test_non_object_json_is_processing_failure() {
        let result = invocation("[1, 2, 3]");
        match normalize_invocation(&result) {
            RunOutput::Error(payload) => {
                assert_eq!(
                    payload.error,
                    "Failed to process results: expected a JSON object, got array"
                );
                assert_eq!(payload.raw_output, result.to_string());
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_sequence_jobs_is_processing_failure() {
        let output = normalize_invocation(&invocation(r#"{"summary": "s", "jobs": 7}"#));
        match output {
            RunOutput::Error(payload) => {
                assert!(payload.error.starts_with("Failed to process results:"));
                assert!(payload.error.contains("'jobs' must be a sequence"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_iteration_limit_marker_is_unparseable() {
        let marker = "Agent stopped due to iteration limit or time limit.";
        let output = normalize_invocation(&invocation(marker));
        assert_eq!(output, RunOutput::error("Could not parse JSON output", marker));
    }

    #[test]
    fn test_structured_result_round_trips_through_direct_parse() {
        let original = StructuredResult {
            summary: json!("Found 2 strong Rust roles"),
            jobs: jobs(2),
            recommendations: json!(["Tailor resume for async Rust", "Apply this week"]),
        };
        let text = serde_json::to_string(&original).unwrap();
        match normalize_text(&text).unwrap() {
            RunOutput::Success(parsed) => assert_eq!(parsed, original),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_run_output_deserializes_both_shapes() {
        let success: RunOutput =
            serde_json::from_value(json!({"summary": "s", "jobs": [], "recommendations": []}))
                .unwrap();
        assert!(!success.is_error());
        let failure: RunOutput =
            serde_json::from_value(json!({"error": "e", "raw_output": "r"})).unwrap();
        assert!(failure.is_error());
    }
}
