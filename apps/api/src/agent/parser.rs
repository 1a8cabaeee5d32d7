//! Parser for ReAct-formatted model responses.
//!
//! A response either names an action (`Action:` + `Action Input:`) or gives a
//! `Final Answer:`. Anything else is a `ParseError`, which the loop feeds back
//! to the model as an observation.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const FINAL_ANSWER: &str = "Final Answer:";
const THOUGHT: &str = "Thought:";
const OBSERVATION: &str = "\nObservation:";

static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .expect("action pattern is valid")
});
static ACTION_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*:").expect("action label pattern is valid"));
static ACTION_INPUT_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").expect("action input pattern is valid")
});

/// One parsed model response.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Action {
        thought: String,
        tool: String,
        input: String,
    },
    Finish {
        thought: String,
        answer: String,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    ActionAndFinalAnswer,

    #[error("Could not parse LLM output: `{0}`")]
    Unparseable(String),
}

pub fn parse_react_output(text: &str) -> Result<AgentStep, ParseError> {
    let text = drop_fabricated_observation(text);
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return Err(ParseError::ActionAndFinalAnswer);
        }
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        return Ok(AgentStep::Action {
            thought: thought_before(text, start),
            tool: caps[1].trim().to_string(),
            input: caps[2].trim().trim_matches('"').to_string(),
        });
    }

    if let Some(idx) = text.find(FINAL_ANSWER) {
        return Ok(AgentStep::Finish {
            thought: thought_before(text, idx),
            answer: text[idx + FINAL_ANSWER.len()..].trim().to_string(),
        });
    }

    if !ACTION_LABEL_RE.is_match(text) {
        Err(ParseError::MissingAction)
    } else if !ACTION_INPUT_LABEL_RE.is_match(text) {
        Err(ParseError::MissingActionInput)
    } else {
        Err(ParseError::Unparseable(text.to_string()))
    }
}

/// The model sometimes keeps going and writes its own observation; that part is discarded.
fn drop_fabricated_observation(text: &str) -> &str {
    match text.find(OBSERVATION) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn thought_before(text: &str, end: usize) -> String {
    let head = text[..end].trim();
    head.strip_prefix(THOUGHT).unwrap_or(head).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_action() {
        let text = " I should search LinkedIn first.\nAction: search_linkedin_jobs\nAction Input: rust developer, Berlin";
        let step = parse_react_output(text).unwrap();
        assert_eq!(
            step,
            AgentStep::Action {
                thought: "I should search LinkedIn first.".into(),
                tool: "search_linkedin_jobs".into(),
                input: "rust developer, Berlin".into(),
            }
        );
    }

    #[test]
    fn test_strips_quotes_from_action_input() {
        let text = "Thought: go\nAction: search_dice_jobs\nAction Input: \"golang, Remote\"\n";
        match parse_react_output(text).unwrap() {
            AgentStep::Action { input, thought, .. } => {
                assert_eq!(input, "golang, Remote");
                assert_eq!(thought, "go");
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_keeps_multiline_action_input() {
        let text = "Action: analyze_resume\nAction Input: Jane Doe\nSenior Engineer\nRust, Go";
        match parse_react_output(text).unwrap() {
            AgentStep::Action { tool, input, .. } => {
                assert_eq!(tool, "analyze_resume");
                assert_eq!(input, "Jane Doe\nSenior Engineer\nRust, Go");
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_discards_fabricated_observation() {
        let text = "Action: search_indeed_jobs\nAction Input: rust\nObservation: [lots of jobs]\nThought: I now know\nFinal Answer: {}";
        match parse_react_output(text).unwrap() {
            AgentStep::Action { input, .. } => assert_eq!(input, "rust"),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_parses_final_answer() {
        let text = " I now know the final answer\nFinal Answer: ```json\n{\"summary\": \"ok\"}\n```";
        let step = parse_react_output(text).unwrap();
        assert_eq!(
            step,
            AgentStep::Finish {
                thought: "I now know the final answer".into(),
                answer: "```json\n{\"summary\": \"ok\"}\n```".into(),
            }
        );
    }

    #[test]
    fn test_rejects_action_with_final_answer() {
        let text = "Action: search_dice_jobs\nAction Input: rust\nFinal Answer: done";
        assert_eq!(
            parse_react_output(text),
            Err(ParseError::ActionAndFinalAnswer)
        );
    }

    #[test]
    fn test_missing_action() {
        assert_eq!(
            parse_react_output("I think I should look for jobs."),
            Err(ParseError::MissingAction)
        );
    }

    #[test]
    fn test_missing_action_input() {
        assert_eq!(
            parse_react_output("Thought: search\nAction: search_linkedin_jobs"),
            Err(ParseError::MissingActionInput)
        );
    }

    #[test]
    fn test_error_messages_are_model_readable() {
        assert_eq!(
            ParseError::MissingAction.to_string(),
            "Invalid Format: Missing 'Action:' after 'Thought:'"
        );
    }
}
