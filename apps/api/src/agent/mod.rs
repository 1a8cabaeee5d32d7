// ReAct agent: prompt rendering, response parsing and the bounded reasoning loop.
// All model calls go through the `LanguageModel` trait.

pub mod controller;
pub mod parser;
pub mod prompts;
