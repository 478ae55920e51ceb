//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for LLM API calls and
//! the prompts used by the page-quality judge.

mod client;
mod prompts;

pub use client::{ChatModel, LlmClient, LlmResponse, Message, Role, TokenUsage};
pub use prompts::{BODY_HEADING, Prompts, SIMILAR_HEADING};
