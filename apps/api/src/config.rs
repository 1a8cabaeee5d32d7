use std::str::FromStr;

use anyhow::{Context, Result};

use crate::agent::controller::DEFAULT_MAX_ITERATIONS;
use crate::llm_client::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional: without it, run results are kept in an in-memory dataset.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub apify_token: String,
    pub apify_base_url: String,
    pub search_result_limit: u32,
    pub agent_max_iterations: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            apify_token: require_env("APIFY_TOKEN")?,
            apify_base_url: std::env::var("APIFY_BASE_URL")
                .unwrap_or_else(|_| "https://api.apify.com".to_string()),
            search_result_limit: parse_env("SEARCH_RESULT_LIMIT", 10)?,
            agent_max_iterations: parse_env("AGENT_MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("JOBSCOUT_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("JOBSCOUT_TEST_BAD_NUMBER", "five");
        let result: Result<u16> = parse_env("JOBSCOUT_TEST_BAD_NUMBER", 8080);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("JOBSCOUT_TEST_BAD_NUMBER"));
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("JOBSCOUT_TEST_ITERATIONS", " 3 ");
        let value: usize = parse_env("JOBSCOUT_TEST_ITERATIONS", 5).unwrap();
        assert_eq!(value, 3);
    }
}
