// All LLM prompt constants for the agent loop.

use crate::models::run::InvocationInput;

/// System prompt for every reasoning step. Pins the final answer to the run output schema.
pub const AGENT_SYSTEM: &str = "You are a job search assistant. \
    You find real openings with the tools you are given and never invent job postings. \
    Follow the Thought/Action/Action Input format exactly. \
    When you give the Final Answer it MUST be a single JSON object wrapped in a ```json code block \
    with exactly the fields `summary`, `jobs` and `recommendations`, and NO other text after it. \
    Use \"Not specified\" for any job field you do not know.";

/// ReAct prompt. Replace `{tools}`, `{tool_names}`, `{input}` and `{agent_scratchpad}`.
pub const REACT_PROMPT_TEMPLATE: &str = r#"Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin! Remember to ALWAYS follow the format above - start with Thought, then Action, then Action Input.

Question: {input}
Thought:{agent_scratchpad}"#;

/// Task handed to the agent for one run.
/// Replace `{resume}`, `{location}`, `{job_type}` and `{keywords}`.
pub const TASK_PROMPT_TEMPLATE: &str = r#"Find relevant job opportunities based on this resume and preferences:
Resume:
{resume}

Job Preferences:
- Location: {location}
- Job Type: {job_type}
- Keywords: {keywords}

Analyze the resume and search for matching jobs. Return a JSON response with:
1. A brief summary of the search results
2. An array of relevant jobs found (limit to top 5 most relevant)
3. Recommended next steps for the job seeker

Format the response as a JSON object with these exact fields:
{
    "summary": "Brief overview of search results",
    "jobs": [
        {
            "title": "Job title",
            "company": "Company name",
            "location": "Job location",
            "salary": "Salary if available",
            "match_score": 0.85,
            "url": "Job posting URL"
        }
    ],
    "recommendations": ["List of recommended next steps"]
}"#;

pub fn render_task(input: &InvocationInput) -> String {
    fill_template(
        TASK_PROMPT_TEMPLATE,
        &[
            ("resume", input.resume.as_str()),
            ("location", input.location.as_str()),
            ("job_type", input.job_type.as_str()),
            ("keywords", input.keywords.as_str()),
        ],
    )
}

/// Replaces `{name}` placeholders in one left-to-right pass. Substituted text is
/// never scanned again, and braces that do not name a variable are kept as-is.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = vars.iter().find_map(|(name, value)| {
            tail.strip_prefix(*name)
                .and_then(|after| after.strip_prefix('}'))
                .map(|after| (*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
