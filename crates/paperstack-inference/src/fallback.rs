//! Primary/secondary provider failover.

use async_trait::async_trait;
use tracing::warn;

use paperstack_core::{Error, Result};

use crate::backend::{ChatTurn, GenerationBackend};

/// Tries the primary backend and falls back to the secondary on failure.
///
/// Every failover is logged at WARN with both provider ids so flapping
/// providers show up in operations.
pub struct FallbackBackend {
    primary: Box<dyn GenerationBackend>,
    secondary: Option<Box<dyn GenerationBackend>>,
}

impl FallbackBackend {
    pub fn new(
        primary: Box<dyn GenerationBackend>,
        secondary: Option<Box<dyn GenerationBackend>>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Build from the environment: Gemini primary, OpenAI secondary.
    /// `None` when neither provider has a key configured.
    pub fn from_env() -> Option<Self> {
        let gemini = crate::GeminiBackend::from_env();
        let openai = crate::OpenAiBackend::from_env();
        match (gemini, openai) {
            (Some(g), o) => Some(Self::new(
                Box::new(g),
                o.map(|b| Box::new(b) as Box<dyn GenerationBackend>),
            )),
            (None, Some(o)) => Some(Self::new(Box::new(o), None)),
            (None, None) => None,
        }
    }

    async fn with_fallback<'a, F, Fut>(&'a self, run: F) -> Result<String>
    where
        F: Fn(&'a dyn GenerationBackend) -> Fut,
        Fut: std::future::Future<Output = Result<String>> + 'a,
    {
        match run(self.primary.as_ref()).await {
            Ok(text) => Ok(text),
            Err(e) => match &self.secondary {
                Some(secondary) => {
                    warn!(
                        subsystem = "inference",
                        provider = self.primary.provider_id(),
                        fallback = secondary.provider_id(),
                        error = %e,
                        "Primary provider failed, trying fallback"
                    );
                    run(secondary.as_ref()).await
                }
                None => Err(Error::Inference(format!(
                    "{} failed and no fallback is configured: {}",
                    self.primary.provider_id(),
                    e
                ))),
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for FallbackBackend {
    fn provider_id(&self) -> &str {
        self.primary.provider_id()
    }

    fn model_name(&self) -> &str {
        self.primary.model_name()
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        self.with_fallback(|backend| backend.generate(system, prompt))
            .await
    }

    async fn chat(&self, system: &str, history: &[ChatTurn]) -> Result<String> {
        self.with_fallback(|backend| backend.chat(system, history))
            .await
    }
}
