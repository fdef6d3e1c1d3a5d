//! # cohort-core
//!
//! Deterministic core of the clinical-trial eligibility screening
//! pipeline.
//!
//! This crate holds everything that can be reasoned about without a
//! network: the sectioned patient-record model, the compact-notation
//! encoder that feeds the assessment oracle, the verdict data model with
//! its JSON Schema gate, and the batch result store.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input always produces the same compact
//!    notation, byte for byte
//! 2. **No LLM calls**: oracle traffic lives in `cohort-runtime`
//! 3. **Best-effort encoding**: the encoder never fails on textual
//!    input; at worst it produces an empty record
//! 4. **Gated verdicts**: a schema-invalid oracle response can never
//!    enter the result collection as a verdict
//!
//! ## Example
//!
//! ```rust,ignore
//! use cohort_core::{encode, SectionedRecord, UppercaseBoundary};
//!
//! let record = SectionedRecord::from_rows(&rows, &UppercaseBoundary::new());
//! let compact = encode(&record);
//! ```

pub mod boundary;
pub mod encoder;
pub mod record;
pub mod results;
pub mod schema;
pub mod verdict;

// Re-export main types at crate root
pub use boundary::{SectionBoundary, UppercaseBoundary};
pub use encoder::{decode, encode, DecodeError};
pub use record::{Section, SectionedRecord};
pub use results::{BatchResults, StoreError};
pub use schema::{is_valid_verdict, validate_verdict, verdict_schema_json, SchemaError};
pub use verdict::{
    AssessmentFailure, CriterionEvaluation, CriterionStatus, EligibilityVerdict,
    OverallEligibility, ScreeningEntry, VerdictError, ASSESSMENT_FAILED,
};
