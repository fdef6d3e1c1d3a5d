//! JSON Schema gate for oracle responses.
//!
//! Every assessment oracle response must validate against
//! `spec/verdict.schema.json` before it is trusted. The same schema
//! document is handed to the oracle as its constrained-output contract,
//! so the gate and the wire format cannot drift apart.

use std::sync::OnceLock;

use thiserror::Error;

/// Embedded verdict schema (loaded at compile time).
const VERDICT_SCHEMA_JSON: &str = include_str!("../../../spec/verdict.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation setup.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load verdict schema: {0}")]
    LoadError(String),
}

/// The raw verdict schema document, for callers that need to ship it to
/// the oracle as an output contract.
pub fn verdict_schema_json() -> &'static str {
    VERDICT_SCHEMA_JSON
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(VERDICT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate an oracle response against the verdict schema.
///
/// Returns `Ok(())` if valid, or the full list of violations. A response
/// that fails here must never reach the result collection as a verdict.
pub fn validate_verdict(response: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(response)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check whether a response is schema-valid. Use [`validate_verdict`]
/// for the violation details.
pub fn is_valid_verdict(response: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(response))
        .unwrap_or(false)
}
