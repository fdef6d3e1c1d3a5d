//! # cohort-runtime
//!
//! Async screening runtime for cohort: LLM providers, criteria
//! extraction, and the batch assessment orchestrator.
//!
//! ## Architecture
//!
//! ```text
//! protocol text ──▶ CriteriaProvider ──▶ criteria text (one call per run)
//!                                             │
//! patient rows ──▶ ScreeningOrchestrator ◀────┘
//!                        │  compact record + criteria, per patient
//!                        ▼
//!                  LlmProvider::complete_structured (forced tool)
//!                        │  schema gate, retries, timeout
//!                        ▼
//!                  BatchResults (verdicts + failure markers, input order)
//! ```
//!
//! ## Key Guarantees
//!
//! - **One criteria call per run**: the extracted text is cached and
//!   reused for every patient
//! - **Per-patient isolation**: a failed assessment becomes a failure
//!   marker; the batch always completes
//! - **Deterministic order**: results come back in input order no matter
//!   the concurrency setting
//! - **Schema-gated verdicts**: nothing enters the results without
//!   passing the embedded verdict schema

pub mod config;
pub mod criteria;
pub mod orchestrator;
pub mod prompts;
pub mod providers;

pub use config::{ConfigError, RuntimeConfig};
pub use criteria::{CriteriaError, CriteriaProvider};
pub use orchestrator::{PatientRecord, RunTally, ScreeningError, ScreeningOrchestrator};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, OutputContract, ProviderError,
    TokenUsage,
};

#[cfg(feature = "anthropic")]
pub use providers::AnthropicProvider;
