//! Validation status and shape hints
//!
//! Validation runs before any business rule. A `failed` result stops the
//! transformation and is reported as-is in the envelope.

use csig_core::{get_dotted, path::type_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of pre-flight validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Skipped,
    #[default]
    Unknown,
}

impl ValidationStatus {
    /// Ordering used when combining results; failed dominates
    fn rank(self) -> u8 {
        match self {
            ValidationStatus::Passed => 0,
            ValidationStatus::Skipped => 1,
            ValidationStatus::Unknown => 2,
            ValidationStatus::Failed => 3,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationStatus::Passed => write!(f, "passed"),
            ValidationStatus::Failed => write!(f, "failed"),
            ValidationStatus::Skipped => write!(f, "skipped"),
            ValidationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Status plus ordered errors and warnings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn passed() -> Self {
        Self {
            status: ValidationStatus::Passed,
            ..Self::default()
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            status: ValidationStatus::Failed,
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Skipped,
            errors: Vec::new(),
            warnings: vec![reason.into()],
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Add an error; the status becomes failed
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self.status = ValidationStatus::Failed;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }

    /// Combine two results: the more severe status wins, messages concatenate
    pub fn combine(mut self, other: ValidationResult) -> Self {
        if other.status.rank() > self.status.rank() {
            self.status = other.status;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }
}

/// JSON type a hinted field is expected to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedType {
    Mapping,
    Array,
    String,
    Number,
    Bool,
    Any,
}

impl ExpectedType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ExpectedType::Mapping => value.is_object(),
            ExpectedType::Array => value.is_array(),
            ExpectedType::String => value.is_string(),
            ExpectedType::Number => value.is_number(),
            ExpectedType::Bool => value.is_boolean(),
            ExpectedType::Any => true,
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ExpectedType::Mapping => "mapping",
            ExpectedType::Array => "array",
            ExpectedType::String => "string",
            ExpectedType::Number => "number",
            ExpectedType::Bool => "bool",
            ExpectedType::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Optional hint about where a payload keeps its data.
///
/// Required hints fail validation when violated; optional ones only warn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeHint {
    /// Dotted path, empty for the payload root
    pub path: String,
    #[serde(default = "default_expect")]
    pub expect: ExpectedType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_expect() -> ExpectedType {
    ExpectedType::Any
}

fn default_required() -> bool {
    true
}

impl ShapeHint {
    pub fn required(path: impl Into<String>, expect: ExpectedType) -> Self {
        Self {
            path: path.into(),
            expect,
            required: true,
        }
    }

    pub fn optional(path: impl Into<String>, expect: ExpectedType) -> Self {
        Self {
            path: path.into(),
            expect,
            required: false,
        }
    }

    fn check(&self, payload: &Value) -> Option<String> {
        let label = if self.path.is_empty() { "<root>" } else { self.path.as_str() };
        match get_dotted(payload, &self.path) {
            None => Some(format!("missing '{}'", label)),
            Some(value) if !self.expect.accepts(value) => Some(format!(
                "'{}' should be {}, got {}",
                label,
                self.expect,
                type_name(value)
            )),
            Some(_) => None,
        }
    }
}

/// Check a payload against shape hints. No hints means `skipped`.
pub fn validate_shape(payload: &Value, hints: &[ShapeHint]) -> ValidationResult {
    if hints.is_empty() {
        return ValidationResult::skipped("no shape hints configured");
    }

    let mut result = ValidationResult::passed();
    for hint in hints {
        if let Some(problem) = hint.check(payload) {
            result = if hint.required {
                result.with_error(problem)
            } else {
                result.with_warning(problem)
            };
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_unknown() {
        let v = ValidationResult::default();
        assert_eq!(v.status, ValidationStatus::Unknown);
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"status": "unknown", "errors": [], "warnings": []})
        );
    }

    #[test]
    fn test_combine_failed_wins() {
        let combined = ValidationResult::passed()
            .with_warning("w1")
            .combine(ValidationResult::failed(vec!["e1".into()]));
        assert!(combined.is_failed());
        assert_eq!(combined.errors, vec!["e1"]);
        assert_eq!(combined.warnings, vec!["w1"]);

        let combined = ValidationResult::skipped("none").combine(ValidationResult::passed());
        assert_eq!(combined.status, ValidationStatus::Skipped);
    }

    #[test]
    fn test_shape_hints() {
        let payload = json!({"value": [], "count": "3"});
        let hints = vec![
            ShapeHint::required("value", ExpectedType::Array),
            ShapeHint::optional("count", ExpectedType::Number),
        ];
        let v = validate_shape(&payload, &hints);
        assert_eq!(v.status, ValidationStatus::Passed);
        assert_eq!(v.warnings, vec!["'count' should be number, got string"]);

        let v = validate_shape(&json!({"items": []}), &hints);
        assert!(v.is_failed());
        assert_eq!(v.errors, vec!["missing 'value'"]);
    }

    #[test]
    fn test_root_hint_and_no_hints() {
        let v = validate_shape(&json!([1]), &[ShapeHint::required("", ExpectedType::Mapping)]);
        assert_eq!(v.errors, vec!["'<root>' should be mapping, got array"]);

        assert_eq!(validate_shape(&json!({}), &[]).status, ValidationStatus::Skipped);
    }
}
