//! Client for the hosted job-board scrapers.
//!
//! Each job board is scraped by a separate actor on the Apify platform. A search
//! starts an actor run, waits for it to finish, then reads the run's default
//! dataset. The adapters only see the `JobSearchService` trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// How long the platform should hold the start request open while the actor runs.
const WAIT_FOR_FINISH_SECS: u64 = 240;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("actor run {run_id} has no dataset")]
    MissingDataset { run_id: String },
}

/// Input sent to every job-board actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    pub limit: u32,
}

#[async_trait]
pub trait JobSearchService: Send + Sync {
    /// Runs the named scraper and returns its raw dataset items.
    async fn run_search(
        &self,
        actor_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<Value>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    data: Option<ActorRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRun {
    id: String,
    status: String,
    default_dataset_id: Option<String>,
}

#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApifyClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(WAIT_FOR_FINISH_SECS + 60))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn run_url(&self, actor_id: &str) -> String {
        format!(
            "{}/v2/acts/{}/runs?waitForFinish={}",
            self.base_url,
            actor_path(actor_id),
            WAIT_FOR_FINISH_SECS
        )
    }

    fn dataset_url(&self, dataset_id: &str, limit: u32) -> String {
        format!(
            "{}/v2/datasets/{}/items?clean=true&limit={}",
            self.base_url, dataset_id, limit
        )
    }
}

/// `owner/name` actor ids are addressed as `owner~name` in API paths.
fn actor_path(actor_id: &str) -> String {
    actor_id.replace('/', "~")
}

async fn error_from(response: reqwest::Response) -> SearchError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    SearchError::Api { status, message }
}

#[async_trait]
impl JobSearchService for ApifyClient {
    async fn run_search(
        &self,
        actor_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<Value>, SearchError> {
        let response = self
            .client
            .post(self.run_url(actor_id))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let Some(run) = response.json::<RunEnvelope>().await?.data else {
            return Ok(Vec::new());
        };
        if run.status != "SUCCEEDED" {
            warn!("Actor {} run {} finished with status {}", actor_id, run.id, run.status);
        }
        let dataset_id = run
            .default_dataset_id
            .ok_or(SearchError::MissingDataset { run_id: run.id })?;

        let response = self
            .client
            .get(self.dataset_url(&dataset_id, request.limit))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let items: Vec<Value> = response.json().await?;
        debug!("Actor {} returned {} items", actor_id, items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_path_uses_tilde() {
        assert_eq!(
            actor_path("krandiash/linkedin-jobs-scraper"),
            "krandiash~linkedin-jobs-scraper"
        );
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = ApifyClient::new("https://api.apify.com/", "token").unwrap();
        assert_eq!(
            client.run_url("krandiash/indeed-scraper"),
            "https://api.apify.com/v2/acts/krandiash~indeed-scraper/runs?waitForFinish=240"
        );
        assert_eq!(
            client.dataset_url("abc123", 10),
            "https://api.apify.com/v2/datasets/abc123/items?clean=true&limit=10"
        );
    }

    #[test]
    fn test_run_envelope_reads_dataset_id() {
        let body = r#"{"data": {"id": "run1", "status": "SUCCEEDED", "defaultDatasetId": "ds1"}}"#;
        let envelope: RunEnvelope = serde_json::from_str(body).unwrap();
        let run = envelope.data.unwrap();
        assert_eq!(run.default_dataset_id.as_deref(), Some("ds1"));
        assert_eq!(run.status, "SUCCEEDED");
    }

    #[test]
    fn test_search_request_shape() {
        let request = SearchRequest {
            query: "rust developer".into(),
            location: "Remote".into(),
            limit: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query": "rust developer", "location": "Remote", "limit": 10})
        );
    }
}
