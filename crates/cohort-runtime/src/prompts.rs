//! System prompts for the two screening oracles.
//!
//! Prompt layout is chosen for cache efficiency:
//! 1. System prompt (fixed per run) - cached
//! 2. Criteria text (fixed per run) - cached
//! 3. Per-patient compact record - not cached
//!
//! Key terminology:
//! - Criteria oracle = extracts the eligibility section from a protocol
//! - Assessment oracle = judges one patient against that section

/// System prompt for the criteria extraction oracle.
///
/// The framing is deliberately narrow: extract, do not summarize or
/// interpret. Criteria text is reused verbatim across the whole batch,
/// so paraphrasing here would distort every downstream assessment.
pub const CRITERIA_EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are a clinician preparing a clinical trial for patient screening.

Your task is to extract the Patient Selection Criteria section from the
protocol document you are given, including both the Inclusion Criteria
and the Exclusion Criteria.

## Constraints
1. Return ONLY the text of that section - no commentary, no headers you
   invent, no summaries
2. Preserve the original wording and the original ordering of criteria
3. Keep criterion numbering/bullets exactly as they appear
4. If the document contains no recognizable selection criteria section,
   return an empty response
"#;

/// System prompt for the per-patient assessment oracle.
///
/// The verdict structure itself is enforced by the forced tool's JSON
/// Schema; this prompt covers the judgment rules the schema cannot
/// express.
pub const ASSESSMENT_SYSTEM_PROMPT: &str = r#"
You are a clinician screening one patient against a clinical trial's
eligibility criteria.

The patient's health record is provided in a compact sectioned notation:

SECTION_NAME[row_count]{column,headers}:
  comma,joined,row,values

Each stanza is one block of the record (demographics, vitals, labs, ...).
Rows are chronological where the section repeats over time.

## Judgment Rules
1. Evaluate ONLY the criteria you are given - do not invent criteria
2. For each criterion, cite the patient's relevant value when the record
   contains one
3. A criterion is MET or NOT_MET only when the record contains clear
   evidence; otherwise it is NEEDS_VERIFICATION
4. Do not guess missing values. An absent lab result is absent
5. Uncertainty is a valid screening outcome: when the evidence cannot
   support a firm verdict, return UNCLEAR with low confidence

## Confidence Guidelines
- >= 0.7: clear evidence for nearly every criterion
- 0.4 - 0.7: some criteria unverifiable, overall direction still clear
- < 0.4: record is too sparse to screen; overall verdict should be
  UNCLEAR

## Critical Reminder
You are screening, not enrolling. Flag what a study coordinator must
verify; do not resolve it yourself.
"#;

/// User prompt for the criteria extraction call.
pub fn criteria_extraction_prompt(document_text: &str) -> String {
    format!(
        "Extract the Patient Selection Criteria section from this protocol \
         document:\n\n<document>\n{}\n</document>",
        document_text
    )
}

/// User prompt for one patient assessment call.
///
/// The criteria block comes first so prompt caching can reuse it across
/// every patient in the batch.
pub fn assessment_prompt(
    trial_id: &str,
    patient_id: &str,
    criteria_text: &str,
    compact_record: &str,
) -> String {
    format!(
        "<eligibility_criteria trial_id=\"{trial_id}\">\n{criteria_text}\n</eligibility_criteria>\n\n\
         <patient_record patient_id=\"{patient_id}\">\n{compact_record}\n</patient_record>\n\n\
         Screen patient {patient_id} against trial {trial_id}. \
         Report patient_id as \"{patient_id}\" and trial_id as \"{trial_id}\"."
    )
}
