//! The agent's fixed tool set: three job-board searches and resume analysis.
//!
//! Tools are a closed enumeration (`ToolKind`). The model names a tool by string;
//! `ToolSet` resolves that name through a lookup table and rejects unknown names
//! with `UnknownToolError`.

pub mod format;
pub mod job_search;
pub mod resume;
pub mod search_client;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LanguageModel;
use crate::models::job::JobRecord;
use crate::tools::job_search::{search_jobs, JobBoard};
use crate::tools::resume::{analyze_resume, ResumeAnalysis};
use crate::tools::search_client::JobSearchService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    JobSearch(JobBoard),
    AnalyzeResume,
}

impl ToolKind {
    /// Prompt order.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::JobSearch(JobBoard::ALL[0]),
        ToolKind::JobSearch(JobBoard::ALL[1]),
        ToolKind::JobSearch(JobBoard::ALL[2]),
        ToolKind::AnalyzeResume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::JobSearch(board) => board.tool_name(),
            ToolKind::AnalyzeResume => "analyze_resume",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::JobSearch(board) => board.description(),
            ToolKind::AnalyzeResume => {
                "Analyze a resume to extract skills, experience, and other key information."
            }
        }
    }
}

/// What the prompt shows the model about one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
}

impl From<ToolKind> for ToolSpec {
    fn from(kind: ToolKind) -> Self {
        Self {
            kind,
            name: kind.name(),
            description: kind.description(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{name} is not a valid tool, try one of [{}].", .available.join(", "))]
pub struct UnknownToolError {
    pub name: String,
    pub available: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Unknown(#[from] UnknownToolError),

    #[error("tool {tool} failed: {message}")]
    Failed { tool: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Jobs(Vec<JobRecord>),
    Resume(ResumeAnalysis),
}

impl ToolOutput {
    /// Text fed back to the model as the observation.
    pub fn to_observation(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The agent loop's view of its tools.
#[async_trait]
pub trait Toolbox: Send + Sync {
    fn specs(&self) -> Vec<ToolSpec>;

    /// Invokes the named tool and returns the observation text.
    async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError>;
}

/// The production tool set, backed by the job-search service and the language model.
pub struct ToolSet {
    search: Arc<dyn JobSearchService>,
    /// Used for resume extraction; production passes a temperature-0 handle.
    model: Arc<dyn LanguageModel>,
    search_limit: u32,
    specs: Vec<ToolSpec>,
    by_name: HashMap<&'static str, ToolKind>,
}

impl ToolSet {
    pub fn new(
        search: Arc<dyn JobSearchService>,
        model: Arc<dyn LanguageModel>,
        search_limit: u32,
    ) -> Self {
        let specs: Vec<ToolSpec> = ToolKind::ALL.into_iter().map(ToolSpec::from).collect();
        let by_name = specs.iter().map(|s| (s.name, s.kind)).collect();
        Self {
            search,
            model,
            search_limit,
            specs,
            by_name,
        }
    }

    pub fn lookup(&self, name: &str) -> Result<ToolKind, UnknownToolError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| UnknownToolError {
                name: name.to_string(),
                available: self.specs.iter().map(|s| s.name).collect(),
            })
    }

    pub async fn run(&self, kind: ToolKind, input: &str) -> ToolOutput {
        match kind {
            ToolKind::JobSearch(board) => ToolOutput::Jobs(
                search_jobs(self.search.as_ref(), board, input, self.search_limit).await,
            ),
            ToolKind::AnalyzeResume => {
                ToolOutput::Resume(analyze_resume(self.model.as_ref(), input).await)
            }
        }
    }
}

#[async_trait]
impl Toolbox for ToolSet {
    fn specs(&self) -> Vec<ToolSpec> {
        self.specs.clone()
    }

    async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let kind = self.lookup(name)?;
        self.run(kind, input)
            .await
            .to_observation()
            .map_err(|e| ToolError::Failed {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }
}
