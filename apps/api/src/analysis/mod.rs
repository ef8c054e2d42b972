// Resume analysis: prompt selection, generation call, match percentage extraction, chart rendering.
// All model calls go through llm_client::TextGenerator.

pub mod chart;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod service;
