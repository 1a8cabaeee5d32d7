//! One invocation end to end: input -> agent loop -> normalizer -> sink.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::agent::controller::AgentController;
use crate::agent::prompts::render_task;
use crate::llm_client::LanguageModel;
use crate::models::run::InvocationInput;
use crate::output::{normalize_invocation, RunOutput};
use crate::runs::sink::{ResultSink, StoredRun};
use crate::tools::Toolbox;

/// Everything a run needs. Cheap to clone.
#[derive(Clone)]
pub struct RunContext {
    pub model: Arc<dyn LanguageModel>,
    pub tools: Arc<dyn Toolbox>,
    pub sink: Arc<dyn ResultSink>,
    pub max_iterations: usize,
}

/// The response body of a finished run. `output` is exactly what was pushed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub output: RunOutput,
}

/// Runs one invocation. Never fails: every outcome ends as one pushed record.
pub async fn execute_run(ctx: &RunContext, input: Option<InvocationInput>) -> RunRecord {
    let run_id = Uuid::new_v4();
    let input = input.unwrap_or_else(|| {
        info!("Run {run_id}: no input provided, using fallback input");
        InvocationInput::fallback()
    });
    info!(
        "Run {run_id}: location={}, job_type={}, keywords={:?}, resume_chars={}",
        input.location,
        input.job_type,
        input.keywords,
        input.resume.chars().count()
    );

    let controller = AgentController::new(ctx.model.clone(), ctx.tools.clone(), ctx.max_iterations);
    let output = match controller.run(&render_task(&input)).await {
        Ok(run) => {
            info!(
                "Run {run_id}: agent stopped ({:?}) after {} tool steps",
                run.stop_reason,
                run.intermediate_steps.len()
            );
            normalize_invocation(&run.to_value())
        }
        Err(e) => {
            error!("Run {run_id}: agent run failed: {e}");
            RunOutput::error(format!("Agent run failed: {e}"), "")
        }
    };

    if let Err(e) = ctx.sink.push(&StoredRun::new(run_id, output.clone())).await {
        error!("Run {run_id}: failed to push result: {e:#}");
    }

    RunRecord { run_id, output }
}
