//! Criteria provider: one oracle call per run.
//!
//! Turns the full protocol text into the eligibility-criteria section
//! used for every patient in the batch. This call happens once, before
//! any patient is processed; failure here is fatal to the run because
//! assessment without criteria is meaningless.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::prompts;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};

/// Errors from criteria extraction. Both variants abort the run.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("criteria extraction call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("oracle returned empty criteria text")]
    EmptyCriteria,
}

/// Thin adapter over the criteria extraction oracle.
///
/// The extracted text is cached for the provider's lifetime; repeated
/// calls within a run return the same criteria without another oracle
/// round-trip.
pub struct CriteriaProvider {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    cached: Mutex<Option<String>>,
}

impl CriteriaProvider {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            cached: Mutex::new(None),
        }
    }

    /// Extract the eligibility-criteria section from protocol text.
    pub async fn extract(&self, document_text: &str) -> Result<String, CriteriaError> {
        if let Some(criteria) = self.cached.lock().clone() {
            return Ok(criteria);
        }

        let messages = vec![
            ChatMessage::system(prompts::CRITERIA_EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(prompts::criteria_extraction_prompt(document_text)),
        ];

        let response = self.provider.complete(messages, &self.completion).await?;
        let criteria = response.content.trim().to_string();

        if criteria.is_empty() {
            return Err(CriteriaError::EmptyCriteria);
        }

        info!(
            criteria_len = criteria.len(),
            tokens = response.usage.total(),
            "eligibility criteria extracted"
        );

        *self.cached.lock() = Some(criteria.clone());
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, OutputContract, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        reply: String,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                usage: TokenUsage::default(),
                model: "mock".to_string(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn complete_structured(
            &self,
            _messages: Vec<ChatMessage>,
            _contract: &OutputContract,
            _config: &CompletionConfig,
        ) -> Result<serde_json::Value, ProviderError> {
            unreachable!("criteria provider never requests structured output")
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_extract_returns_trimmed_criteria() {
        let provider = Arc::new(FixedProvider::new("  Inclusion: age >= 18\n"));
        let criteria =
            CriteriaProvider::new(provider, CompletionConfig::default());

        let text = criteria.extract("protocol body").await.unwrap();
        assert_eq!(text, "Inclusion: age >= 18");
    }

    #[tokio::test]
    async fn test_extract_caches_across_calls() {
        let provider = Arc::new(FixedProvider::new("criteria"));
        let criteria =
            CriteriaProvider::new(provider.clone(), CompletionConfig::default());

        criteria.extract("protocol").await.unwrap();
        criteria.extract("protocol").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_response_is_fatal() {
        let provider = Arc::new(FixedProvider::new("   \n  "));
        let criteria =
            CriteriaProvider::new(provider, CompletionConfig::default());

        let result = criteria.extract("protocol").await;
        assert!(matches!(result, Err(CriteriaError::EmptyCriteria)));
    }
}
