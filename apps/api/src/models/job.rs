use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOT_SPECIFIED: &str = "Not specified";

/// A single job posting in the shape every job-board adapter produces.
///
/// Built per search call from whatever fields the upstream scraper returned;
/// missing fields degrade to an empty string (or "Not specified" for salary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub posting_date: String,
    pub employment_type: String,
    pub salary: String,
    /// Bounded length; see `job_search::DESCRIPTION_LIMIT`.
    pub description: String,
    pub url: String,
    pub is_remote: bool,
}

impl JobRecord {
    /// Reads a job mapping that already uses `JobRecord` key names but may be
    /// incomplete or loosely typed (e.g. jobs echoed back by the model).
    pub fn from_loose(value: &Value) -> Self {
        Self {
            title: text_at(value, &["title"]).unwrap_or_default(),
            company: text_at(value, &["company"]).unwrap_or_default(),
            location: text_at(value, &["location"]).unwrap_or_default(),
            posting_date: text_at(value, &["posting_date"]).unwrap_or_default(),
            employment_type: text_at(value, &["employment_type"]).unwrap_or_default(),
            salary: text_at(value, &["salary"]).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            description: text_at(value, &["description"]).unwrap_or_default(),
            url: text_at(value, &["url"]).unwrap_or_default(),
            is_remote: value
                .get("is_remote")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Walks `path` into a JSON object and renders the leaf as text.
///
/// Strings are returned as-is, numbers and booleans are stringified, and
/// null / missing / non-scalar leaves yield `None`.
pub fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
