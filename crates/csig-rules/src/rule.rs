//! Declarative rules
//!
//! Most vendor checks come in one of a few shapes: a field holds an expected
//! value, a list of findings must be empty, a list of configured items must
//! not be, or coverage across an inventory must clear a threshold. A
//! [`RuleSpec`] describes one such check as data.

use crate::transformation::{RuleOutcome, Transformation};
use csig_core::{get_dotted, path::type_name, CsigError};
use csig_coverage::{is_truthy, AssetRecord, Predicate, ThresholdProfile, TypeClassifier};
use csig_envelope::{validate_shape, ShapeHint, ValidationResult};
use csig_in::NormalizeOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use tracing::debug;

/// Verdict used when the data a rule needs is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    Compliant,
    #[default]
    NonCompliant,
}

impl MissingDataPolicy {
    pub fn is_compliant(self) -> bool {
        matches!(self, MissingDataPolicy::Compliant)
    }

    fn label(self) -> &'static str {
        match self {
            MissingDataPolicy::Compliant => "compliant",
            MissingDataPolicy::NonCompliant => "non-compliant",
        }
    }
}

/// Where a coverage rule gets its threshold profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ProfileSource {
    /// `endpoint_protection` or `backup_coverage`
    Builtin { name: String },
    Inline(ThresholdProfile),
}

impl ProfileSource {
    pub fn builtin(name: impl Into<String>) -> Self {
        ProfileSource::Builtin { name: name.into() }
    }

    pub fn resolve(&self) -> Result<Cow<'_, ThresholdProfile>, CsigError> {
        match self {
            ProfileSource::Inline(profile) => Ok(Cow::Borrowed(profile)),
            ProfileSource::Builtin { name } => match name.as_str() {
                "endpoint_protection" => Ok(Cow::Owned(ThresholdProfile::endpoint_protection())),
                "backup_coverage" => Ok(Cow::Owned(ThresholdProfile::backup_coverage())),
                other => Err(CsigError::config(format!("unknown builtin profile '{}'", other))),
            },
        }
    }
}

/// The check a rule performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Field at `path` equals `value` (strings case-insensitive)
    FieldEquals { path: String, value: Value },

    /// Field at `path` is truthy
    FieldTruthy { path: String },

    /// No item of the list at `path` matches `filter`; an empty list passes
    EmptyListCompliant {
        #[serde(default)]
        path: String,
        #[serde(default)]
        filter: Option<Predicate>,
    },

    /// At least `min_count` items of the list at `path` match `filter`
    NonEmptyList {
        #[serde(default)]
        path: String,
        #[serde(default)]
        filter: Option<Predicate>,
        #[serde(default = "default_min_count")]
        min_count: usize,
    },

    /// A flag of a threshold profile over the payload's asset list
    Coverage {
        profile: ProfileSource,
        /// Profile flag to report; defaults to the rule's criteria key
        #[serde(default)]
        flag: Option<String>,
    },
}

fn default_min_count() -> usize {
    1
}

/// One declarative rule from a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,

    pub criteria_key: String,

    #[serde(default)]
    pub description: String,

    pub check: RuleKind,

    #[serde(default)]
    pub missing_data: MissingDataPolicy,

    #[serde(default)]
    pub shape_hints: Vec<ShapeHint>,

    /// Overrides the default wrapper keys the normalizer peels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper_keys: Option<Vec<String>>,

    /// Added to the envelope when the rule is not compliant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl RuleSpec {
    pub fn new(id: impl Into<String>, criteria_key: impl Into<String>, check: RuleKind) -> Self {
        Self {
            id: id.into(),
            criteria_key: criteria_key.into(),
            description: String::new(),
            check,
            missing_data: MissingDataPolicy::default(),
            shape_hints: Vec::new(),
            wrapper_keys: None,
            recommendation: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_missing_data(mut self, policy: MissingDataPolicy) -> Self {
        self.missing_data = policy;
        self
    }

    pub fn with_shape_hint(mut self, hint: ShapeHint) -> Self {
        self.shape_hints.push(hint);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Check everything that can be checked without a payload
    pub fn validate(&self) -> Result<(), CsigError> {
        if self.id.trim().is_empty() {
            return Err(CsigError::config("rule id must not be empty"));
        }
        if self.criteria_key.trim().is_empty() {
            return Err(CsigError::config(format!("rule '{}' has no criteria key", self.id)));
        }
        if let RuleKind::Coverage { profile, flag } = &self.check {
            let profile = profile.resolve()?;
            profile.build_scorer()?;
            let wanted = flag.as_deref().unwrap_or(&self.criteria_key);
            if !profile.flags.iter().any(|f| f.criteria_key == wanted) {
                return Err(CsigError::config(format!(
                    "profile '{}' has no flag '{}'",
                    profile.name, wanted
                )));
            }
        }
        Ok(())
    }

    fn missing(&self, what: String) -> RuleOutcome {
        debug!(rule = %self.id, %what, policy = ?self.missing_data, "missing data");
        RuleOutcome::new(self.missing_data.is_compliant())
            .because(format!("{}; treated as {}", what, self.missing_data.label()))
    }

    /// `Ok(None)` when nothing is at `path`; a shape error when something
    /// other than a list is.
    fn list_at<'a>(&self, payload: &'a Value, path: &str) -> Result<Option<&'a Vec<Value>>, CsigError> {
        match get_dotted(payload, path) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(CsigError::shape(format!(
                "expected a list at '{}', got {}",
                display_path(path),
                type_name(other)
            ))),
        }
    }

    fn evaluate_check(&self, payload: &Value) -> Result<RuleOutcome, CsigError> {
        match &self.check {
            RuleKind::FieldEquals { path, value } => {
                let Some(actual) = get_dotted(payload, path) else {
                    return Ok(self.missing(format!("'{}' is absent", path)));
                };
                let compliant = AssetRecord::new(payload)
                    .map(|record| Predicate::field_equals(path.as_str(), value.clone()).evaluate(&record))
                    .unwrap_or(false);
                Ok(RuleOutcome::new(compliant)
                    .because(format!("'{}' is {}, expected {}", path, actual, value)))
            }

            RuleKind::FieldTruthy { path } => {
                let Some(actual) = get_dotted(payload, path) else {
                    return Ok(self.missing(format!("'{}' is absent", path)));
                };
                let compliant = is_truthy(actual);
                Ok(RuleOutcome::new(compliant).because(format!("'{}' is {}", path, actual)))
            }

            RuleKind::EmptyListCompliant { path, filter } => {
                let Some(items) = self.list_at(payload, path)? else {
                    return Ok(self.missing(format!("no list at '{}'", display_path(path))));
                };
                let matching = count_matching(items, filter.as_ref());
                Ok(RuleOutcome::new(matching == 0)
                    .because(format!("{} of {} item(s) flagged", matching, items.len())))
            }

            RuleKind::NonEmptyList {
                path,
                filter,
                min_count,
            } => {
                let Some(items) = self.list_at(payload, path)? else {
                    return Ok(self.missing(format!("no list at '{}'", display_path(path))));
                };
                let matching = count_matching(items, filter.as_ref());
                Ok(RuleOutcome::new(matching >= *min_count)
                    .because(format!("{} matching item(s), {} required", matching, min_count)))
            }

            RuleKind::Coverage { profile, flag } => {
                let profile = profile.resolve()?;
                let scorer = profile.build_scorer()?;
                let Some(assets) = asset_value(payload, &profile.asset_key_refs()) else {
                    return Ok(self.missing(format!(
                        "no asset list under any of: {}",
                        profile.asset_keys.join(", ")
                    )));
                };

                let report = scorer.score_value(assets)?;
                let flags = profile.derive_flags(&report);
                let wanted = flag.as_deref().unwrap_or(&self.criteria_key);
                let compliant = flags.get(wanted).copied().ok_or_else(|| {
                    CsigError::config(format!("profile '{}' has no flag '{}'", profile.name, wanted))
                })?;

                let mut outcome = RuleOutcome::new(compliant).with_field("coverage", json!(report.scores));
                for (key, value) in flags.iter().filter(|(k, _)| k.as_str() != wanted) {
                    outcome = outcome.with_field(key.as_str(), json!(value));
                }
                for category in scorer.category_names() {
                    outcome = outcome.because(format!(
                        "{}: {} of {} ({}%)",
                        category,
                        report.count(category),
                        report.denominator(category),
                        report.score(category)
                    ));
                }
                Ok(outcome)
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// The asset list if one is found, else the first asset key that holds
/// something else, so that a malformed list is scored as a shape error
/// rather than treated as missing.
fn asset_value<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    if payload.is_array() {
        return Some(payload);
    }
    keys.iter()
        .find_map(|key| payload.get(*key).filter(|v| v.is_array()))
        .or_else(|| keys.iter().find_map(|key| get_dotted(payload, key)))
}

fn count_matching(items: &[Value], filter: Option<&Predicate>) -> usize {
    let Some(filter) = filter else {
        return items.len();
    };
    let classifier = TypeClassifier::default();
    items
        .iter()
        .filter_map(|value| Some(AssetRecord::new(value)?.with_type(classifier.classify(value))))
        .filter(|record| filter.evaluate(record))
        .count()
}

impl Transformation for RuleSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn criteria_key(&self) -> &str {
        &self.criteria_key
    }

    fn normalize_options(&self) -> NormalizeOptions {
        match &self.wrapper_keys {
            Some(keys) => NormalizeOptions::default().with_wrapper_keys(keys.iter().cloned()),
            None => NormalizeOptions::default(),
        }
    }

    fn validate(&self, payload: &Value) -> ValidationResult {
        validate_shape(payload, &self.shape_hints)
    }

    fn evaluate(&self, payload: &Value) -> Result<RuleOutcome, CsigError> {
        if !(payload.is_object() || payload.is_array()) {
            return Err(CsigError::shape(format!(
                "expected a mapping or list, got {}",
                type_name(payload)
            )));
        }

        let mut outcome = self.evaluate_check(payload)?;
        if !outcome.compliant {
            if let Some(recommendation) = &self.recommendation {
                outcome = outcome.with_recommendation(recommendation.clone());
            }
        }
        Ok(outcome)
    }
}
