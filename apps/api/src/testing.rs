//! Test doubles for the model and the job-search service.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{LanguageModel, LlmError};
use crate::tools::search_client::{JobSearchService, SearchError, SearchRequest};

/// Replies with canned responses in order and records every prompt it sees.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Every call fails as if the API were down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    /// Answers every call with the same text.
    pub fn repeating(response: &str, times: usize) -> Self {
        Self::new(vec![response; times])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        prompt: &str,
        _system: &str,
        _stop: &[String],
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

/// Returns fixed dataset items (or fails) and records each request.
pub struct FakeSearch {
    items: Option<Vec<Value>>,
    calls: Mutex<Vec<(String, SearchRequest)>>,
}

impl FakeSearch {
    pub fn returning(items: Vec<Value>) -> Self {
        Self {
            items: Some(items),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            items: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, SearchRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSearchService for FakeSearch {
    async fn run_search(
        &self,
        actor_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<Value>, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((actor_id.to_string(), request.clone()));
        self.items.clone().ok_or_else(|| SearchError::Api {
            status: 502,
            message: "actor crashed".to_string(),
        })
    }
}
