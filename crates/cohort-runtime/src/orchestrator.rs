//! Batch screening orchestrator.
//!
//! Drives one assessment oracle call per patient and owns everything the
//! raw call does not: compaction of the patient record, per-call timeout,
//! bounded retry with backoff, the verdict schema gate, and per-patient
//! isolation - one patient failing never aborts the batch.
//!
//! The caller hands in an already-ordered patient list; results come
//! back in exactly that order even when patients are assessed
//! concurrently, so repeated runs over the same inputs produce the same
//! collection order.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use cohort_core::{
    encode, validate_verdict, verdict_schema_json, AssessmentFailure, BatchResults,
    EligibilityVerdict, ScreeningEntry, SectionBoundary, SectionedRecord, UppercaseBoundary,
};

use crate::config::RuntimeConfig;
use crate::prompts;
use crate::providers::{ChatMessage, LlmProvider, OutputContract, ProviderError};

/// Errors from a single patient assessment.
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("oracle call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("response did not conform to the verdict schema: {0}")]
    SchemaViolation(String),

    #[error("verdict names patient '{returned}' but '{expected}' was assessed")]
    PatientMismatch { expected: String, returned: String },
}

impl ScreeningError {
    /// Transient failures and malformed responses are both worth
    /// retrying; a missing credential is not.
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::Provider(ProviderError::NotConfigured(_)))
    }
}

/// One patient's raw tabular input, keyed by the identifier the caller
/// derived from the source file.
#[derive(Debug, Clone)]
pub struct PatientRecord {
    pub patient_id: String,
    pub rows: Vec<Vec<String>>,
}

/// Running counts for the current batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTally {
    pub assessed: usize,
    pub failed: usize,
}

/// The screening orchestrator.
///
/// # Architecture
/// - One schema-constrained oracle call per patient
/// - Bounded parallelism via an ordered buffered stream
/// - Timeout and exponential-backoff retry around every call
/// - Schema gate before any verdict is trusted
pub struct ScreeningOrchestrator {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,
    boundary: Arc<dyn SectionBoundary>,
    tally: Mutex<RunTally>,
}

impl ScreeningOrchestrator {
    /// Create an orchestrator with the default section-boundary
    /// convention.
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            boundary: Arc::new(UppercaseBoundary::new()),
            tally: Mutex::new(RunTally::default()),
        }
    }

    /// Replace the section-boundary predicate used during compaction.
    pub fn with_boundary(mut self, boundary: Arc<dyn SectionBoundary>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Counts accumulated so far.
    pub fn tally(&self) -> RunTally {
        *self.tally.lock()
    }

    /// Screen a whole batch.
    ///
    /// Never fails batch-wide: every input patient yields exactly one
    /// entry, a verdict or an explicit failure marker, in input order.
    pub async fn screen_batch(
        &self,
        trial_id: &str,
        criteria_text: &str,
        patients: &[PatientRecord],
    ) -> BatchResults {
        let started = Instant::now();

        // `buffered` polls up to `concurrency` assessments at once but
        // yields in input order, which keeps the collection
        // deterministic.
        let entries: Vec<ScreeningEntry> = stream::iter(
            patients
                .iter()
                .map(|patient| self.screen_patient(trial_id, criteria_text, patient)),
        )
        .buffered(self.config.concurrency.max(1))
        .collect()
        .await;

        let mut results = BatchResults::new();
        for entry in entries {
            results.record(entry);
        }

        info!(
            trial_id,
            patients = patients.len(),
            assessed = results.assessed_count(),
            failed = results.failed_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch screening complete"
        );

        results
    }

    /// Assess one patient, exhausting local retries before surfacing a
    /// failure marker.
    async fn screen_patient(
        &self,
        trial_id: &str,
        criteria_text: &str,
        patient: &PatientRecord,
    ) -> ScreeningEntry {
        let record = SectionedRecord::from_rows(&patient.rows, self.boundary.as_ref());
        let compact = encode(&record);

        if compact.is_empty() {
            // Not a pipeline error: the oracle sees an empty record and
            // is expected to answer UNCLEAR with low confidence.
            warn!(patient_id = %patient.patient_id, "record compacted to empty notation");
        }

        let assess = || self.assess_once(trial_id, criteria_text, &patient.patient_id, &compact);
        let result = assess
            .retry(
                ExponentialBuilder::default().with_max_times(self.config.max_retries),
            )
            .when(ScreeningError::is_retryable)
            .notify(|err: &ScreeningError, delay: Duration| {
                warn!(
                    patient_id = %patient.patient_id,
                    error = %err,
                    retry_in = ?delay,
                    "assessment attempt failed, retrying"
                );
            })
            .await;

        match result {
            Ok(mut verdict) => {
                verdict.assessed_at = Some(Utc::now());
                self.tally.lock().assessed += 1;
                info!(
                    patient_id = %patient.patient_id,
                    eligibility = ?verdict.overall_eligibility,
                    confidence = verdict.confidence_score,
                    "patient assessed"
                );
                ScreeningEntry::Verdict(verdict)
            }
            Err(err) => {
                self.tally.lock().failed += 1;
                warn!(
                    patient_id = %patient.patient_id,
                    error = %err,
                    "assessment failed after retries, recording failure marker"
                );
                let mut failure = AssessmentFailure::new(&patient.patient_id, err.to_string());
                failure.assessed_at = Some(Utc::now());
                ScreeningEntry::Failed(failure)
            }
        }
    }

    /// One oracle call: timeout, schema gate, typed validation.
    async fn assess_once(
        &self,
        trial_id: &str,
        criteria_text: &str,
        patient_id: &str,
        compact_record: &str,
    ) -> Result<EligibilityVerdict, ScreeningError> {
        let messages = vec![
            ChatMessage::system(prompts::ASSESSMENT_SYSTEM_PROMPT),
            ChatMessage::user(prompts::assessment_prompt(
                trial_id,
                patient_id,
                criteria_text,
                compact_record,
            )),
        ];

        let completion = self.config.completion_config();
        let response = tokio::time::timeout(
            self.config.call_timeout,
            self.provider
                .complete_structured(messages, verdict_contract(), &completion),
        )
        .await
        .map_err(|_| ScreeningError::Timeout(self.config.call_timeout))??;

        validate_verdict(&response)
            .map_err(|errors| ScreeningError::SchemaViolation(errors.join("; ")))?;

        let verdict: EligibilityVerdict = serde_json::from_value(response)
            .map_err(|e| ScreeningError::SchemaViolation(e.to_string()))?;
        verdict
            .validate()
            .map_err(|e| ScreeningError::SchemaViolation(e.to_string()))?;

        if verdict.patient_id != patient_id {
            return Err(ScreeningError::PatientMismatch {
                expected: patient_id.to_string(),
                returned: verdict.patient_id,
            });
        }

        Ok(verdict)
    }
}

/// The forced-tool contract every assessment call carries: the embedded
/// verdict schema, compiled once.
fn verdict_contract() -> &'static OutputContract {
    static CONTRACT: OnceLock<OutputContract> = OnceLock::new();
    CONTRACT.get_or_init(|| OutputContract {
        name: "record_eligibility_verdict".to_string(),
        description: "Record the structured eligibility verdict for the screened patient."
            .to_string(),
        schema: serde_json::from_str(verdict_schema_json())
            .expect("embedded verdict schema is valid JSON"),
    })
}
