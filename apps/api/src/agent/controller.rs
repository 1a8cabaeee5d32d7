//! Agent loop controller: drives the ReAct loop over the fixed tool set.
//!
//! The loop is an explicit state machine:
//!
//!   Thinking ──model call──▶ AwaitingToolResult ──tool call──▶ Thinking
//!      │
//!      ├──final answer──▶ Done
//!      └──budget spent──▶ Exhausted
//!
//! Every model call spends one iteration. A response that fails to parse is fed
//! back as an observation and spends its iteration too, so self-correction is
//! bounded by the same budget. Tool failures become observations; only a failed
//! model call ends the loop with an error.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::agent::parser::{parse_react_output, AgentStep};
use crate::agent::prompts::{fill_template, AGENT_SYSTEM, REACT_PROMPT_TEMPLATE};
use crate::llm_client::{LanguageModel, LlmError};
use crate::tools::{ToolSpec, Toolbox};

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
/// Output when the budget runs out before a final answer.
pub const ITERATION_LIMIT_MARKER: &str = "Agent stopped due to iteration limit or time limit.";
/// Generation stops here so the model cannot write its own observations.
const STOP_SEQUENCE: &str = "\nObservation:";
/// Tool name recorded for turns where the model's response could not be parsed.
const PARSE_ERROR_TOOL: &str = "_Exception";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("language model call failed: {0}")]
    Llm(#[from] LlmError),
}

/// One completed reasoning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTurn {
    pub thought: String,
    pub tool: String,
    pub tool_input: String,
    pub observation: String,
    /// The model's raw response, replayed verbatim in the scratchpad.
    #[serde(skip)]
    pub log: String,
}

#[derive(Debug, Clone, PartialEq)]
enum AgentState {
    Thinking,
    AwaitingToolResult {
        thought: String,
        tool: String,
        input: String,
        log: String,
    },
    Done(String),
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    FinalAnswer,
    IterationLimit,
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    pub input: String,
    pub output: String,
    pub stop_reason: StopReason,
    pub intermediate_steps: Vec<AgentTurn>,
}

impl AgentRun {
    /// The mapping handed to the output normalizer.
    pub fn to_value(&self) -> Value {
        json!({
            "input": self.input,
            "output": self.output,
            "stop_reason": self.stop_reason,
            "intermediate_steps": self.intermediate_steps,
        })
    }
}

#[derive(Clone)]
pub struct AgentController {
    model: Arc<dyn LanguageModel>,
    tools: Arc<dyn Toolbox>,
    max_iterations: usize,
}

impl AgentController {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tools: Arc<dyn Toolbox>,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            tools,
            max_iterations,
        }
    }

    pub async fn run(&self, task: &str) -> Result<AgentRun, AgentError> {
        let specs = self.tools.specs();
        let stop = vec![STOP_SEQUENCE.to_string()];
        let mut transcript: Vec<AgentTurn> = Vec::new();
        let mut iterations = 0;
        let mut state = AgentState::Thinking;

        loop {
            state = match state {
                AgentState::Thinking if iterations >= self.max_iterations => AgentState::Exhausted,
                AgentState::Thinking => {
                    iterations += 1;
                    info!("Agent step {}/{}: thinking", iterations, self.max_iterations);
                    let prompt = render_prompt(&specs, &transcript, task);
                    let response = self.model.complete(&prompt, AGENT_SYSTEM, &stop).await?;

                    match parse_react_output(&response) {
                        Ok(AgentStep::Finish { answer, .. }) => AgentState::Done(answer),
                        Ok(AgentStep::Action {
                            thought,
                            tool,
                            input,
                        }) => AgentState::AwaitingToolResult {
                            thought,
                            tool,
                            input,
                            log: response,
                        },
                        Err(e) => {
                            warn!("Agent step {}: unparseable model output: {e}", iterations);
                            transcript.push(AgentTurn {
                                thought: String::new(),
                                tool: PARSE_ERROR_TOOL.to_string(),
                                tool_input: "Invalid or incomplete response".to_string(),
                                observation: e.to_string(),
                                log: response,
                            });
                            AgentState::Thinking
                        }
                    }
                }
                AgentState::AwaitingToolResult {
                    thought,
                    tool,
                    input,
                    log,
                } => {
                    info!("Agent step {}: {} <- {:?}", iterations, tool, input);
                    let observation = match self.tools.invoke(&tool, &input).await {
                        Ok(observation) => observation,
                        Err(e) => {
                            warn!("Tool {} failed: {e}", tool);
                            e.to_string()
                        }
                    };
                    transcript.push(AgentTurn {
                        thought,
                        tool,
                        tool_input: input,
                        observation,
                        log,
                    });
                    AgentState::Thinking
                }
                AgentState::Done(answer) => {
                    info!("Agent finished after {} steps", iterations);
                    return Ok(AgentRun {
                        input: task.to_string(),
                        output: answer,
                        stop_reason: StopReason::FinalAnswer,
                        intermediate_steps: transcript,
                    });
                }
                AgentState::Exhausted => {
                    warn!("Agent hit the iteration limit ({})", self.max_iterations);
                    return Ok(AgentRun {
                        input: task.to_string(),
                        output: ITERATION_LIMIT_MARKER.to_string(),
                        stop_reason: StopReason::IterationLimit,
                        intermediate_steps: transcript,
                    });
                }
            };
        }
    }
}

/// Renders the ReAct prompt with the tool list and everything observed so far.
pub fn render_prompt(specs: &[ToolSpec], transcript: &[AgentTurn], task: &str) -> String {
    let tools = specs
        .iter()
        .map(|s| format!("{}: {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = specs.iter().map(|s| s.name).collect::<Vec<_>>().join(", ");

    let mut scratchpad = String::new();
    for turn in transcript {
        scratchpad.push_str(&turn.log);
        scratchpad.push_str("\nObservation: ");
        scratchpad.push_str(&turn.observation);
        scratchpad.push_str("\nThought: ");
    }

    fill_template(
        REACT_PROMPT_TEMPLATE,
        &[
            ("tools", tools.as_str()),
            ("tool_names", tool_names.as_str()),
            ("input", task),
            ("agent_scratchpad", scratchpad.as_str()),
        ],
    )
}
