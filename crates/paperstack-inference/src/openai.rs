//! OpenAI-compatible generation backend (fallback provider).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use paperstack_core::{defaults, ChatRole, Error, Result};

use crate::backend::{ChatTurn, GenerationBackend};

/// OpenAI-compatible chat completions backend.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiBackend {
    /// Create a backend with custom endpoint and model.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        info!(
            subsystem = "inference",
            component = "openai",
            model = %model,
            "Initializing OpenAI backend"
        );
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::GEN_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    /// Read `OPENAI_API_KEY` (plus optional `OPENAI_BASE_URL` /
    /// `OPENAI_MODEL`) from the environment; `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| defaults::OPENAI_BASE_URL.to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| defaults::OPENAI_MODEL.to_string());
        Some(Self::with_config(base_url, api_key, model))
    }

    async fn call(&self, messages: Vec<Message>) -> Result<String> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: self.model.clone(),
                messages,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "OpenAI request failed ({}): {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("OpenAI returned no choices".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "openai",
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(text)
    }

    fn messages(system: &str, history: &[ChatTurn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !system.is_empty() {
            messages.push(Message {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        for turn in history {
            messages.push(Message {
                role: match turn.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: turn.content.clone(),
            });
        }
        messages
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    fn provider_id(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, system, prompt), fields(subsystem = "inference", component = "openai", op = "generate", model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        self.call(Self::messages(system, &[ChatTurn::user(prompt)]))
            .await
    }

    #[instrument(skip(self, system, history), fields(subsystem = "inference", component = "openai", op = "chat", model = %self.model))]
    async fn chat(&self, system: &str, history: &[ChatTurn]) -> Result<String> {
        self.call(Self::messages(system, history)).await
    }
}
