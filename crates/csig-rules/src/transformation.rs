//! The transform boundary
//!
//! [`transform`] is the only entry point external callers use. It never
//! fails: parse errors, shape errors and panics inside a rule all become
//! `{<criteriaKey>: false, "error": <message>}`.

use csig_core::{CsigError, RawInput};
use csig_envelope::{EnvelopeBuilder, EvaluationEnvelope, ValidationResult};
use csig_in::{describe, normalize_with, NormalizeOptions};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// One compliance check over a normalized payload
pub trait Transformation: Send + Sync {
    /// Stable identifier, stamped into envelope metadata
    fn id(&self) -> &str;

    /// Key of the primary boolean in the result mapping
    fn criteria_key(&self) -> &str;

    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::default()
    }

    /// Pre-flight check; a failed result stops evaluation
    fn validate(&self, _payload: &Value) -> ValidationResult {
        ValidationResult::skipped("no pre-flight validation")
    }

    fn evaluate(&self, payload: &Value) -> Result<RuleOutcome, CsigError>;
}

/// What a rule decided, with the reasons behind it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub compliant: bool,
    /// Extra result fields next to the primary flag
    pub fields: Map<String, Value>,
    pub pass_reasons: Vec<String>,
    pub fail_reasons: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RuleOutcome {
    pub fn new(compliant: bool) -> Self {
        Self {
            compliant,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Record a reason on the pass or fail side, depending on the outcome
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        if self.compliant {
            self.pass_reasons.push(reason.into());
        } else {
            self.fail_reasons.push(reason.into());
        }
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    /// Result mapping: the primary flag plus any extra fields
    pub fn result(&self, criteria_key: &str) -> Value {
        let mut map = self.fields.clone();
        map.insert(criteria_key.to_string(), Value::Bool(self.compliant));
        Value::Object(map)
    }
}

/// `{<criteriaKey>: false, "error": <message>}`
pub fn safe_failure(criteria_key: &str, message: &str) -> Value {
    let mut map = Map::new();
    map.insert(criteria_key.to_string(), Value::Bool(false));
    map.insert("error".to_string(), Value::String(message.to_string()));
    Value::Object(map)
}

enum Run {
    Completed {
        summary: Value,
        validation: ValidationResult,
        outcome: RuleOutcome,
    },
    Rejected {
        summary: Value,
        validation: ValidationResult,
    },
    Failed {
        summary: Option<Value>,
        validation: Option<ValidationResult>,
        error: String,
    },
}

fn execute(transformation: &dyn Transformation, raw: RawInput) -> Run {
    let payload = match normalize_with(raw, &transformation.normalize_options()) {
        Ok(payload) => payload,
        Err(e) => {
            return Run::Failed {
                summary: None,
                validation: None,
                error: e.to_string(),
            }
        }
    };
    let summary = describe(&payload);

    let validation = transformation.validate(&payload);
    if validation.is_failed() {
        return Run::Rejected { summary, validation };
    }

    match transformation.evaluate(&payload) {
        Ok(outcome) => Run::Completed {
            summary,
            validation,
            outcome,
        },
        Err(e) => Run::Failed {
            summary: Some(summary),
            validation: Some(validation),
            error: e.to_string(),
        },
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("Transformation panicked: {}", detail)
}

fn run_guarded(transformation: &dyn Transformation, raw: RawInput) -> Run {
    let run = panic::catch_unwind(AssertUnwindSafe(|| execute(transformation, raw)))
        .unwrap_or_else(|payload| Run::Failed {
            summary: None,
            validation: None,
            error: panic_message(payload),
        });

    match &run {
        Run::Completed { outcome, .. } => {
            debug!(rule = transformation.id(), compliant = outcome.compliant, "evaluated")
        }
        Run::Rejected { validation, .. } => {
            warn!(rule = transformation.id(), errors = ?validation.errors, "validation failed")
        }
        Run::Failed { error, .. } => {
            warn!(rule = transformation.id(), error = %error, "transformation failed")
        }
    }
    run
}

fn validation_message(validation: &ValidationResult) -> String {
    format!("Validation failed: {}", validation.errors.join("; "))
}

/// Run a transformation and return its result mapping.
pub fn transform(transformation: &dyn Transformation, raw: impl Into<RawInput>) -> Value {
    let key = transformation.criteria_key();
    match run_guarded(transformation, raw.into()) {
        Run::Completed { outcome, .. } => outcome.result(key),
        Run::Rejected { validation, .. } => safe_failure(key, &validation_message(&validation)),
        Run::Failed { error, .. } => safe_failure(key, &error),
    }
}

/// Run a transformation and wrap its result in an evaluation envelope.
pub fn transform_enveloped(
    transformation: &dyn Transformation,
    raw: impl Into<RawInput>,
) -> EvaluationEnvelope {
    let key = transformation.criteria_key();
    let envelope = match run_guarded(transformation, raw.into()) {
        Run::Completed {
            summary,
            validation,
            outcome,
        } => EnvelopeBuilder::new(outcome.result(key))
            .validation(validation)
            .input_summary(summary)
            .pass_reasons(outcome.pass_reasons)
            .fail_reasons(outcome.fail_reasons)
            .recommendations(outcome.recommendations),
        Run::Rejected {
            summary,
            validation,
        } => EnvelopeBuilder::new(safe_failure(key, &validation_message(&validation)))
            .fail_reason("Input failed pre-flight validation")
            .validation(validation)
            .input_summary(summary),
        Run::Failed {
            summary,
            validation,
            error,
        } => {
            let mut builder = EnvelopeBuilder::new(safe_failure(key, &error))
                .fail_reason(format!("Could not evaluate {}", key))
                .transformation_error(error);
            if let Some(validation) = validation {
                builder = builder.validation(validation);
            }
            if let Some(summary) = summary {
                builder = builder.input_summary(summary);
            }
            builder
        }
    };
    envelope.transformation_id(transformation.id()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use csig_core::get_bool;
    use serde_json::json;

    struct Enabled;

    impl Transformation for Enabled {
        fn id(&self) -> &str {
            "test.enabled"
        }

        fn criteria_key(&self) -> &str {
            "isEnabled"
        }

        fn evaluate(&self, payload: &Value) -> Result<RuleOutcome, CsigError> {
            let enabled = get_bool(payload, &["enabled"])
                .ok_or_else(|| CsigError::shape("missing key 'enabled'"))?;
            Ok(RuleOutcome::new(enabled).because("enabled flag read"))
        }
    }

    struct Panicky;

    impl Transformation for Panicky {
        fn id(&self) -> &str {
            "test.panicky"
        }

        fn criteria_key(&self) -> &str {
            "isFine"
        }

        fn evaluate(&self, _payload: &Value) -> Result<RuleOutcome, CsigError> {
            panic!("index out of bounds")
        }
    }

    #[test]
    fn test_success_result() {
        assert_eq!(transform(&Enabled, "{'enabled': True}"), json!({"isEnabled": true}));
        assert_eq!(
            transform(&Enabled, json!({"response": {"enabled": false}})),
            json!({"isEnabled": false})
        );
    }

    #[test]
    fn test_safe_failures() {
        for raw in [RawInput::Value(json!(42)), RawInput::Value(Value::Null), RawInput::from("{not json")] {
            let out = transform(&Enabled, raw);
            assert_eq!(out["isEnabled"], json!(false));
            assert!(out["error"].is_string());
        }

        let out = transform(&Enabled, "not { valid");
        assert_eq!(
            out["error"],
            json!("Invalid JSON: input is neither a recognized literal nor valid JSON")
        );

        let out = transform(&Enabled, "{}");
        assert_eq!(out["error"], json!("Unexpected shape: missing key 'enabled'"));
    }

    #[test]
    fn test_panic_is_contained() {
        let out = transform(&Panicky, "{}");
        assert_eq!(out["isFine"], json!(false));
        assert_eq!(out["error"], json!("Transformation panicked: index out of bounds"));

        let env = transform_enveloped(&Panicky, "{}");
        assert_eq!(env.additional_info.transformation.errors.len(), 1);
    }

    #[test]
    fn test_outcome_fields() {
        let outcome = RuleOutcome::new(true).with_field("percentage", json!(80));
        assert_eq!(outcome.result("isOn"), json!({"isOn": true, "percentage": 80}));

        let outcome = RuleOutcome::new(false).because("nothing enabled");
        assert!(outcome.pass_reasons.is_empty());
        assert_eq!(outcome.fail_reasons, vec!["nothing enabled"]);
    }
}
