//! # paperstack-inference
//!
//! LLM generation backend abstraction for paperstack.
//!
//! This crate provides:
//! - Pluggable [`GenerationBackend`] trait
//! - Gemini implementation (primary)
//! - OpenAI-compatible implementation (fallback)
//! - [`FallbackBackend`] combinator with WARN-logged failover
//! - Prompt builders and lenient parsers for summaries, tag suggestion,
//!   quizzes, study plans, and chat
//!
//! # Feature Flags
//!
//! - `mock`: deterministic [`mock::MockBackend`] for tests and offline
//!   development

pub mod backend;
pub mod fallback;
pub mod gemini;
pub mod openai;
pub mod tasks;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use backend::{ChatTurn, GenerationBackend};
pub use fallback::FallbackBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;
pub use tasks::{
    build_chat_system, build_quiz_prompt, build_study_plan_prompt, build_summary_prompt,
    build_tag_prompt, parse_quiz, parse_tag_suggestions, DocumentBrief, QuizQuestion,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fallback_uses_secondary_on_failure() {
        let primary = MockBackend::failing("primary down");
        let secondary = MockBackend::new("fallback answer");
        let backend = FallbackBackend::new(
            Box::new(primary),
            Some(Box::new(secondary.clone())),
        );

        let answer = backend.generate("", "hello").await.unwrap();
        assert_eq!(answer, "fallback answer");
        assert_eq!(secondary.calls(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_fallback_prefers_primary() {
        let primary = MockBackend::new("primary answer");
        let secondary = MockBackend::new("fallback answer");
        let backend = FallbackBackend::new(
            Box::new(primary),
            Some(Box::new(secondary.clone())),
        );

        assert_eq!(backend.generate("", "hi").await.unwrap(), "primary answer");
        assert!(secondary.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_without_secondary_propagates() {
        let backend = FallbackBackend::new(Box::new(MockBackend::failing("down")), None);
        assert!(backend.generate("", "hi").await.is_err());
    }

    #[tokio::test]
    async fn test_chat_history_reaches_backend() {
        let mock = MockBackend::new("ok");
        let history = vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("reply"),
            ChatTurn::user("second"),
        ];
        mock.chat("system", &history).await.unwrap();
        assert_eq!(mock.calls(), vec!["second"]);
    }
}
