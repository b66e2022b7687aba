//! Guidance model client abstraction.
//!
//! Provides a trait for calling a chat language model with free-text output.
//! The search loop always sends exactly one `user` message carrying both the
//! task instructions and the guess-history context.

use crate::errors::Result;
use serde::Serialize;

/// A chat message for the LLM conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Speaker role in a chat conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Trait for chat LLM clients.
#[allow(async_fn_in_trait)]
pub trait LlmClient: Send + Sync {
    /// Send a request and return the response as plain text.
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}

pub mod openai;
