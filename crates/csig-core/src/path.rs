//! Null-safe lookups into untyped JSON payloads
//!
//! Vendor payloads are walked with chained lookups that may fail at any
//! step. These helpers make the failure explicit as `None` instead of
//! guessing field presence at every call site. An explicit JSON `null` is
//! treated the same as a missing key.

use crate::error::{CsigError, Result};
use serde_json::{Map, Value};

/// Walk `keys` from `value`. Numeric segments index into arrays.
pub fn get_path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = match current {
            Value::Object(map) => map.get(*key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Same as [`get_path`] with a dotted path such as `properties.enableRbacAuthorization`.
pub fn get_dotted<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return if value.is_null() { None } else { Some(value) };
    }
    let keys: Vec<&str> = path.split('.').collect();
    get_path(value, &keys)
}

pub fn get_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    get_path(value, keys)?.as_bool()
}

pub fn get_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    get_path(value, keys)?.as_str()
}

pub fn get_u64(value: &Value, keys: &[&str]) -> Option<u64> {
    get_path(value, keys)?.as_u64()
}

pub fn get_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    get_path(value, keys)?.as_f64()
}

pub fn get_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    get_path(value, keys)?.as_array()
}

pub fn get_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    get_path(value, keys)?.as_object()
}

/// Like [`get_array`], but a missing key or a non-array is a [`CsigError::Shape`].
pub fn require_array<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Vec<Value>> {
    match get_path(value, keys) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(CsigError::shape(format!(
            "expected an array at '{}', got {}",
            keys.join("."),
            type_name(other)
        ))),
        None => Err(CsigError::shape(format!("missing key '{}'", keys.join(".")))),
    }
}

/// Like [`get_object`], but a missing key or a non-mapping is a [`CsigError::Shape`].
pub fn require_object<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Map<String, Value>> {
    match get_path(value, keys) {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(CsigError::shape(format!(
            "expected a mapping at '{}', got {}",
            keys.join("."),
            type_name(other)
        ))),
        None => Err(CsigError::shape(format!("missing key '{}'", keys.join(".")))),
    }
}

/// JSON type name for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
