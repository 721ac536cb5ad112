//! Asset predicates
//!
//! A predicate answers one yes/no question about an asset. Absent data
//! never raises; it simply does not satisfy the predicate.

use crate::asset::{is_truthy, AssetRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A side-effect free test over one asset
pub trait AssetPredicate: Send + Sync {
    fn matches(&self, asset: &AssetRecord<'_>) -> bool;
}

impl<F> AssetPredicate for F
where
    F: Fn(&AssetRecord<'_>) -> bool + Send + Sync,
{
    fn matches(&self, asset: &AssetRecord<'_>) -> bool {
        self(asset)
    }
}

/// Declarative predicate, loadable from YAML profiles.
///
/// ```yaml
/// kind: any
/// of:
///   - { kind: field_truthy, field: protection.enabled }
///   - { kind: field_in, field: status, values: [protected, active] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Field is present and truthy
    FieldTruthy { field: String },
    /// Field equals the value exactly (strings compare case-insensitively)
    FieldEquals { field: String, value: Value },
    /// Field equals any of the values
    FieldIn { field: String, values: Vec<Value> },
    /// String field contains the needle, or array field contains it as an element
    FieldContains {
        field: String,
        needle: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    /// Field is present and not null
    FieldPresent { field: String },
    /// Field is a non-empty string, array or mapping
    FieldNonEmpty { field: String },
    /// Asset was classified into this partition
    TypeIs { asset_type: String },
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
    /// Matches every asset
    Always,
}

impl Predicate {
    pub fn field_truthy(field: impl Into<String>) -> Self {
        Predicate::FieldTruthy { field: field.into() }
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::FieldIn {
            field: field.into(),
            values,
        }
    }

    pub fn field_contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Predicate::FieldContains {
            field: field.into(),
            needle: needle.into(),
            case_sensitive: false,
        }
    }

    pub fn type_is(asset_type: impl Into<String>) -> Self {
        Predicate::TypeIs {
            asset_type: asset_type.into(),
        }
    }

    pub fn all(of: Vec<Predicate>) -> Self {
        Predicate::All { of }
    }

    pub fn any(of: Vec<Predicate>) -> Self {
        Predicate::Any { of }
    }

    pub fn negate(predicate: Predicate) -> Self {
        Predicate::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn evaluate(&self, asset: &AssetRecord<'_>) -> bool {
        match self {
            Predicate::FieldTruthy { field } => asset.is_truthy(field),
            Predicate::FieldEquals { field, value } => {
                asset.get(field).map(|v| loose_eq(v, value)).unwrap_or(false)
            }
            Predicate::FieldIn { field, values } => asset
                .get(field)
                .map(|v| values.iter().any(|c| loose_eq(v, c)))
                .unwrap_or(false),
            Predicate::FieldContains {
                field,
                needle,
                case_sensitive,
            } => match asset.get(field) {
                Some(Value::String(s)) => contains(s, needle, *case_sensitive),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| eq_str(s, needle, *case_sensitive)),
                _ => false,
            },
            Predicate::FieldPresent { field } => asset.get(field).is_some(),
            Predicate::FieldNonEmpty { field } => match asset.get(field) {
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(Value::Array(items)) => !items.is_empty(),
                Some(Value::Object(map)) => !map.is_empty(),
                Some(_) => true,
                None => false,
            },
            Predicate::TypeIs { asset_type } => asset
                .asset_type()
                .map(|t| t.eq_ignore_ascii_case(asset_type))
                .unwrap_or(false),
            Predicate::All { of } => of.iter().all(|p| p.evaluate(asset)),
            Predicate::Any { of } => of.iter().any(|p| p.evaluate(asset)),
            Predicate::Not { predicate } => !predicate.evaluate(asset),
            Predicate::Always => true,
        }
    }
}

impl AssetPredicate for Predicate {
    fn matches(&self, asset: &AssetRecord<'_>) -> bool {
        self.evaluate(asset)
    }
}

/// Strings compare case-insensitively, numbers by value, everything else exactly
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

fn eq_str(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}
