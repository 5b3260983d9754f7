//! Gemini generation backend (REST, `generateContent`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use paperstack_core::{defaults, ChatRole, Error, Result};

use crate::backend::{ChatTurn, GenerationBackend};

/// Gemini REST backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiBackend {
    /// Create a backend from an API key, with default endpoint and model.
    pub fn new(api_key: String) -> Self {
        Self::with_config(
            defaults::GEMINI_BASE_URL.to_string(),
            api_key,
            defaults::GEMINI_MODEL.to_string(),
        )
    }

    /// Create a backend with custom endpoint and model.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        info!(
            subsystem = "inference",
            component = "gemini",
            model = %model,
            "Initializing Gemini backend"
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

    /// Read `GEMINI_API_KEY` (plus optional `GEMINI_MODEL`) from the
    /// environment; `None` when no key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| defaults::GEMINI_MODEL.to_string());
        Some(Self::with_config(
            defaults::GEMINI_BASE_URL.to_string(),
            api_key,
            model,
        ))
    }

    async fn call(&self, request: GenerateRequest) -> Result<String> {
        let start = Instant::now();
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Gemini request failed ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| Error::Inference("Gemini returned no candidates".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "gemini",
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(text)
    }

    fn system_content(system: &str) -> Option<Content> {
        if system.is_empty() {
            return None;
        }
        Some(Content {
            role: None,
            parts: vec![Part {
                text: system.to_string(),
            }],
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, system, prompt), fields(subsystem = "inference", component = "gemini", op = "generate", model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        self.call(GenerateRequest {
            system_instruction: Self::system_content(system),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        })
        .await
    }

    #[instrument(skip(self, system, history), fields(subsystem = "inference", component = "gemini", op = "chat", model = %self.model))]
    async fn chat(&self, system: &str, history: &[ChatTurn]) -> Result<String> {
        let contents = history
            .iter()
            .map(|turn| Content {
                // Gemini names the assistant role "model".
                role: Some(match turn.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "model".to_string(),
                }),
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        self.call(GenerateRequest {
            system_instruction: Self::system_content(system),
            contents,
        })
        .await
    }
}
