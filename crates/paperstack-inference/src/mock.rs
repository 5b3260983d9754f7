//! Mock generation backend for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use paperstack_core::{Error, Result};

use crate::backend::{ChatTurn, GenerationBackend};

/// Records every call and returns a fixed response.
#[derive(Clone)]
pub struct MockBackend {
    response: Arc<Mutex<Result<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Mock that answers every request with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(response.into()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that fails every request.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Arc::new(Mutex::new(Err(Error::Inference(message.into())))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());
        match &*self.response.lock().unwrap() {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(Error::Inference(e.to_string())),
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    fn provider_id(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, _system: &str, prompt: &str) -> Result<String> {
        self.answer(prompt)
    }

    async fn chat(&self, _system: &str, history: &[ChatTurn]) -> Result<String> {
        let last = history.last().map(|t| t.content.as_str()).unwrap_or("");
        self.answer(last)
    }
}
