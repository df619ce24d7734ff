//! AI review of changed files against Markdown guidelines.
//!
//! Provides the guideline loader, prompt construction, the
//! OpenAI-compatible LLM client, batch orchestration and rendering.

pub mod guidelines;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod render;
