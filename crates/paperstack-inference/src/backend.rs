//! Generation backend abstraction.

use async_trait::async_trait;

use paperstack_core::{ChatRole, Result};

/// One turn of a chat conversation handed to a backend.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Text generation backend (Gemini, OpenAI-compatible, mock).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Provider identifier for logging ("gemini", "openai", "mock").
    fn provider_id(&self) -> &str;

    /// Model this backend generates with.
    fn model_name(&self) -> &str;

    /// Single-shot generation with a system instruction.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    /// Multi-turn chat completion with a system instruction.
    async fn chat(&self, system: &str, history: &[ChatTurn]) -> Result<String>;
}
