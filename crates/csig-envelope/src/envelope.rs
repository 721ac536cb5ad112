//! Evaluation envelope
//!
//! Every transformation reports through the same fixed structure, whatever
//! stage it reached: the primary result plus data collection, validation,
//! transformation and evaluation sections, and metadata.

use crate::validation::ValidationResult;
use chrono::{DateTime, SecondsFormat, Utc};
use csig_core::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Success/error outcome of a stage, derived from its error list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Success,
    Error,
}

impl StageOutcome {
    pub fn from_errors(errors: &[String]) -> Self {
        if errors.is_empty() {
            StageOutcome::Success
        } else {
            StageOutcome::Error
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCollection {
    pub status: StageOutcome,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub status: StageOutcome,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub pass_reasons: Vec<String>,
    pub fail_reasons: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfo {
    pub data_collection: DataCollection,
    pub validation: ValidationResult,
    pub transformation: Transformation,
    pub evaluation: Evaluation,
    pub metadata: Map<String, Value>,
}

/// The standardized output of a transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationEnvelope {
    pub transformed_response: Value,
    pub additional_info: AdditionalInfo,
}

impl EvaluationEnvelope {
    /// Boolean result reported under `criteria_key`, if any
    pub fn primary_flag(&self, criteria_key: &str) -> Option<bool> {
        self.transformed_response.get(criteria_key)?.as_bool()
    }

    pub fn is_compliant(&self, criteria_key: &str) -> bool {
        self.primary_flag(criteria_key) == Some(true)
    }

    pub fn data_collection_status(&self) -> StageOutcome {
        self.additional_info.data_collection.status
    }

    pub fn transformation_status(&self) -> StageOutcome {
        self.additional_info.transformation.status
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Optional inputs of [`build_envelope`]; everything defaults to empty
#[derive(Debug, Clone, Default)]
pub struct EnvelopeParts {
    pub validation: Option<ValidationResult>,
    pub pass_reasons: Vec<String>,
    pub fail_reasons: Vec<String>,
    pub recommendations: Vec<String>,
    pub input_summary: Option<Value>,
    pub transformation_errors: Vec<String>,
    pub api_errors: Vec<String>,
    /// Merged over the default metadata, key by key
    pub metadata: Map<String, Value>,
    pub transformation_id: Option<String>,
    /// Defaults to now
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Build an envelope in one call
pub fn build_envelope(result: Value, parts: EnvelopeParts) -> EvaluationEnvelope {
    EnvelopeBuilder::from_parts(result, parts).build()
}

/// Chainable construction of an [`EvaluationEnvelope`]
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    result: Value,
    parts: EnvelopeParts,
}

impl EnvelopeBuilder {
    pub fn new(result: Value) -> Self {
        Self::from_parts(result, EnvelopeParts::default())
    }

    pub fn from_parts(result: Value, parts: EnvelopeParts) -> Self {
        Self { result, parts }
    }

    pub fn validation(mut self, validation: ValidationResult) -> Self {
        self.parts.validation = Some(validation);
        self
    }

    pub fn pass_reason(mut self, reason: impl Into<String>) -> Self {
        self.parts.pass_reasons.push(reason.into());
        self
    }

    pub fn pass_reasons(mut self, reasons: Vec<String>) -> Self {
        self.parts.pass_reasons.extend(reasons);
        self
    }

    pub fn fail_reason(mut self, reason: impl Into<String>) -> Self {
        self.parts.fail_reasons.push(reason.into());
        self
    }

    pub fn fail_reasons(mut self, reasons: Vec<String>) -> Self {
        self.parts.fail_reasons.extend(reasons);
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.parts.recommendations.push(recommendation.into());
        self
    }

    pub fn recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.parts.recommendations.extend(recommendations);
        self
    }

    pub fn input_summary(mut self, summary: Value) -> Self {
        self.parts.input_summary = Some(summary);
        self
    }

    pub fn transformation_error(mut self, error: impl Into<String>) -> Self {
        self.parts.transformation_errors.push(error.into());
        self
    }

    pub fn api_error(mut self, error: impl Into<String>) -> Self {
        self.parts.api_errors.push(error.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parts.metadata.insert(key.into(), value);
        self
    }

    pub fn metadata_override(mut self, overrides: Map<String, Value>) -> Self {
        self.parts.metadata.extend(overrides);
        self
    }

    pub fn transformation_id(mut self, id: impl Into<String>) -> Self {
        self.parts.transformation_id = Some(id.into());
        self
    }

    pub fn evaluated_at(mut self, at: DateTime<Utc>) -> Self {
        self.parts.evaluated_at = Some(at);
        self
    }

    pub fn build(self) -> EvaluationEnvelope {
        let parts = self.parts;

        let evaluated_at = parts.evaluated_at.unwrap_or_else(Utc::now);
        let mut metadata = Map::new();
        metadata.insert(
            "evaluationDate".to_string(),
            Value::String(evaluated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        metadata.insert("schemaVersion".to_string(), Value::String(SCHEMA_VERSION.to_string()));
        if let Some(id) = parts.transformation_id {
            metadata.insert("transformationId".to_string(), Value::String(id));
        }
        metadata.extend(parts.metadata);

        EvaluationEnvelope {
            transformed_response: self.result,
            additional_info: AdditionalInfo {
                data_collection: DataCollection {
                    status: StageOutcome::from_errors(&parts.api_errors),
                    errors: parts.api_errors,
                },
                validation: parts.validation.unwrap_or_default(),
                transformation: Transformation {
                    status: StageOutcome::from_errors(&parts.transformation_errors),
                    errors: parts.transformation_errors,
                    input_summary: parts.input_summary,
                },
                evaluation: Evaluation {
                    pass_reasons: parts.pass_reasons,
                    fail_reasons: parts.fail_reasons,
                    recommendations: parts.recommendations,
                },
                metadata,
            },
        }
    }
}
