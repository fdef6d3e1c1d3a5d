//! Eligibility verdict model.
//!
//! These types mirror the JSON contract the assessment oracle is held to
//! (`spec/verdict.schema.json`) and the shape the reporting dashboard
//! reads. Field names are load-bearing: the dashboard indexes the result
//! artifact by `patient_id`, `overall_eligibility`, `confidence_score`,
//! and `criteria_evaluation`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from typed verdict validation.
#[derive(Error, Debug, PartialEq)]
pub enum VerdictError {
    #[error("patient_id must be non-empty")]
    EmptyPatientId,

    #[error("confidence_score {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// Overall eligibility outcome for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallEligibility {
    Eligible,
    NotEligible,
    LikelyEligible,
    Unclear,
}

impl OverallEligibility {
    /// The wire-format name, as serialized in the result artifact.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "ELIGIBLE",
            Self::NotEligible => "NOT_ELIGIBLE",
            Self::LikelyEligible => "LIKELY_ELIGIBLE",
            Self::Unclear => "UNCLEAR",
        }
    }
}

impl std::fmt::Display for OverallEligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionStatus {
    Met,
    NotMet,
    NeedsVerification,
}

/// One criterion judged against the patient's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    /// The criterion text from the protocol.
    pub criterion: String,

    /// The patient's relevant value, when the record contains one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_value: Option<String>,

    pub status: CriterionStatus,

    /// Per-criterion support score.
    pub score: f64,
}

/// Structured eligibility outcome for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub patient_id: String,

    pub trial_id: String,

    pub overall_eligibility: OverallEligibility,

    /// Confidence in the overall verdict, in [0, 1].
    pub confidence_score: f64,

    /// Per-criterion breakdown, in protocol order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria_evaluation: Vec<CriterionEvaluation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    /// Ordered follow-up actions for the study coordinator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,

    /// When the orchestrator accepted this verdict. Stamped locally,
    /// never taken from the oracle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
}

impl EligibilityVerdict {
    /// Typed re-check of the invariants the JSON Schema also enforces.
    ///
    /// Deserialization alone cannot guarantee ranges, so anything that
    /// builds a verdict without going through the schema gate calls this.
    pub fn validate(&self) -> Result<(), VerdictError> {
        if self.patient_id.is_empty() {
            return Err(VerdictError::EmptyPatientId);
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(VerdictError::ConfidenceOutOfRange(self.confidence_score));
        }
        Ok(())
    }
}

/// Marker recorded when a patient could not be assessed after retries.
///
/// Carries no verdict fields; the dashboard reads entries defensively,
/// so a failure marker renders as an unassessed patient rather than
/// breaking the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentFailure {
    pub patient_id: String,

    /// Always `"ASSESSMENT_FAILED"`.
    pub status: String,

    /// Human-readable cause, after local retries were exhausted.
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
}

/// Serialized value of [`AssessmentFailure::status`].
pub const ASSESSMENT_FAILED: &str = "ASSESSMENT_FAILED";

impl AssessmentFailure {
    pub fn new(patient_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            status: ASSESSMENT_FAILED.to_string(),
            error: error.into(),
            assessed_at: None,
        }
    }
}

/// One entry in the batch result collection: a verdict or an explicit
/// failure marker. Serialized untagged so verdicts keep the exact shape
/// the dashboard expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreeningEntry {
    Verdict(EligibilityVerdict),
    Failed(AssessmentFailure),
}

impl ScreeningEntry {
    pub fn patient_id(&self) -> &str {
        match self {
            Self::Verdict(v) => &v.patient_id,
            Self::Failed(f) => &f.patient_id,
        }
    }

    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Verdict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict() -> EligibilityVerdict {
        EligibilityVerdict {
            patient_id: "EHR_001".to_string(),
            trial_id: "NCT00000000".to_string(),
            overall_eligibility: OverallEligibility::Eligible,
            confidence_score: 0.9,
            criteria_evaluation: vec![CriterionEvaluation {
                criterion: "Age >= 18".to_string(),
                patient_value: Some("54".to_string()),
                status: CriterionStatus::Met,
                score: 1.0,
            }],
            recommendation: None,
            next_steps: vec![],
            assessed_at: None,
        }
    }

    #[test]
    fn test_enum_wire_format() {
        let json = serde_json::to_value(verdict()).unwrap();
        assert_eq!(json["overall_eligibility"], "ELIGIBLE");
        assert_eq!(json["criteria_evaluation"][0]["status"], "MET");
    }

    #[test]
    fn test_display_matches_wire_format() {
        assert_eq!(OverallEligibility::Eligible.to_string(), "ELIGIBLE");
        assert_eq!(OverallEligibility::NotEligible.to_string(), "NOT_ELIGIBLE");
        assert_eq!(
            OverallEligibility::LikelyEligible.to_string(),
            "LIKELY_ELIGIBLE"
        );
        assert_eq!(OverallEligibility::Unclear.to_string(), "UNCLEAR");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(verdict()).unwrap();
        assert!(json.get("recommendation").is_none());
        assert!(json.get("next_steps").is_none());
        assert!(json.get("assessed_at").is_none());
    }

    #[test]
    fn test_validate_confidence_range() {
        let mut v = verdict();
        assert!(v.validate().is_ok());

        v.confidence_score = 1.5;
        assert_eq!(v.validate(), Err(VerdictError::ConfidenceOutOfRange(1.5)));

        v.confidence_score = -0.1;
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_validate_empty_patient_id() {
        let mut v = verdict();
        v.patient_id.clear();
        assert_eq!(v.validate(), Err(VerdictError::EmptyPatientId));
    }

    #[test]
    fn test_failure_marker_shape() {
        let failure = AssessmentFailure::new("EHR_002", "timeout after 30s");
        let json = serde_json::to_value(&failure).unwrap();

        assert_eq!(json["patient_id"], "EHR_002");
        assert_eq!(json["status"], "ASSESSMENT_FAILED");
        assert_eq!(json["error"], "timeout after 30s");
    }

    #[test]
    fn test_entry_round_trip_untagged() {
        let entries = vec![
            ScreeningEntry::Verdict(verdict()),
            ScreeningEntry::Failed(AssessmentFailure::new("EHR_002", "boom")),
        ];

        let json = serde_json::to_string(&entries).unwrap();
        let parsed: Vec<ScreeningEntry> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, entries);
        assert!(parsed[0].is_verdict());
        assert!(!parsed[1].is_verdict());
        assert_eq!(parsed[1].patient_id(), "EHR_002");
    }
}
