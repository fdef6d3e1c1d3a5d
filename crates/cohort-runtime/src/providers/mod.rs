//! LLM provider abstractions for cohort-runtime.
//!
//! Both oracles in the pipeline (criteria extraction and per-patient
//! assessment) go through the [`LlmProvider`] trait. Free-text output is
//! available via [`LlmProvider::complete`]; assessment uses
//! [`LlmProvider::complete_structured`], which constrains the response to
//! a JSON Schema so the model cannot answer with prose where the
//! pipeline expects a verdict.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling. See
//! [`ApiCredential`] for the patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a single completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for reproducible screening runs)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// Enable prompt caching (Anthropic-specific). The criteria text is
    /// identical across every patient in a batch, so caching it pays for
    /// itself after the first call.
    pub prompt_caching: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250514".to_string(),
            max_tokens: 2000,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
            prompt_caching: true,
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A JSON Schema contract for structured output.
///
/// Shipped to the provider as a forced tool definition; the model's only
/// way to answer is an object validating against `schema`.
#[derive(Debug, Clone)]
pub struct OutputContract {
    /// Tool name, e.g. `record_eligibility_verdict`.
    pub name: String,

    /// What the structured answer represents, for the model's benefit.
    pub description: String,

    /// The JSON Schema the response object must satisfy.
    pub schema: serde_json::Value,
}

/// Response from a free-text completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model used
    pub model: String,

    /// Stop reason
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Tokens read from cache (Anthropic)
    pub cache_read_tokens: u32,

    /// Tokens written to cache (Anthropic)
    pub cache_creation_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// This is the ONLY place where oracle calls are made. The orchestrator
/// never assumes a structured response is valid; it gates everything
/// through the verdict schema before trusting it.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a free-text chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Execute a schema-constrained completion, returning the raw
    /// structured object. Callers validate before trusting it.
    async fn complete_structured(
        &self,
        messages: Vec<ChatMessage>,
        contract: &OutputContract,
        config: &CompletionConfig,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Check if provider is usable.
    async fn health_check(&self) -> bool;

    /// Get provider name for logging.
    fn name(&self) -> &str;

    /// Estimate tokens for a prompt.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // Simple estimate: ~4 chars per token
        (text.len() / 4) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a clinician.");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Assess this patient.");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
            cache_read_tokens: 0,
            cache_creation_tokens: 0,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_completion_config_default_is_deterministic() {
        let config = CompletionConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert!(config.prompt_caching);
    }
}
