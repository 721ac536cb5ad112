//! Input normalization for csig.
//!
//! Turns whatever a caller hands over into a JSON value:
//! - mappings pass through
//! - bytes are decoded as UTF-8 and treated as text
//! - text is parsed as a literal first, then as JSON with `'` rewritten to `"`
//!
//! The resulting mapping is then stripped of known response wrapper keys,
//! at most `max_depth` layers deep.

use crate::literal::parse_literal;
use csig_core::{CsigError, RawInput};
use serde_json::{json, Value};
use tracing::debug;

/// Wrapper keys peeled off vendor responses, checked in this order
pub const DEFAULT_WRAPPER_KEYS: [&str; 6] =
    ["response", "result", "apiResponse", "api_response", "Output", "data"];

/// Unwrapping never descends further than this
pub const MAX_UNWRAP_DEPTH: usize = 3;

const NOT_LITERAL_OR_JSON: &str = "input is neither a recognized literal nor valid JSON";
const UNSUPPORTED_TYPE: &str = "input must be text, bytes, or a mapping";

/// Tunables for [`normalize_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub wrapper_keys: Vec<String>,
    pub max_depth: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            wrapper_keys: DEFAULT_WRAPPER_KEYS.iter().map(|k| k.to_string()).collect(),
            max_depth: MAX_UNWRAP_DEPTH,
        }
    }
}

impl NormalizeOptions {
    /// Options that parse but never unwrap
    pub fn no_unwrap() -> Self {
        Self {
            max_depth: 0,
            ..Self::default()
        }
    }

    pub fn with_wrapper_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wrapper_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Normalize raw input with the default wrapper keys and depth.
pub fn normalize(raw: impl Into<RawInput>) -> Result<Value, CsigError> {
    normalize_with(raw, &NormalizeOptions::default())
}

/// Normalize raw input with explicit options.
///
/// Valid JSON that is not a mapping (a bare list, a number) is returned
/// as-is; callers check the shape they need.
pub fn normalize_with(raw: impl Into<RawInput>, options: &NormalizeOptions) -> Result<Value, CsigError> {
    let parsed = parse_raw(raw.into())?;
    let (value, depth) = unwrap_envelopes(parsed, options);
    if depth > 0 {
        debug!(depth, "peeled response wrappers");
    }
    Ok(value)
}

/// Coerce raw input into a JSON value without unwrapping.
pub fn parse_raw(raw: RawInput) -> Result<Value, CsigError> {
    match raw {
        RawInput::Value(value @ Value::Object(_)) => Ok(value),
        RawInput::Value(Value::String(text)) | RawInput::Text(text) => parse_text(&text),
        RawInput::Bytes(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| CsigError::parse(format!("input bytes are not UTF-8: {}", e)))?;
            parse_text(&text)
        }
        RawInput::Value(other) => {
            debug!(kind = csig_core::path::type_name(&other), "rejecting unsupported input");
            Err(CsigError::type_error(UNSUPPORTED_TYPE))
        }
    }
}

/// Parse text as a literal mapping, falling back to quote-normalized JSON.
pub fn parse_text(text: &str) -> Result<Value, CsigError> {
    match parse_literal(text) {
        Ok(value @ Value::Object(_)) => {
            debug!("parsed input as literal mapping");
            return Ok(value);
        }
        Ok(_) => debug!("literal is not a mapping, trying JSON"),
        Err(e) => debug!(error = %e, "literal parse failed, trying JSON"),
    }

    let quoted = text.replace('\'', "\"");
    serde_json::from_str::<Value>(&quoted).map_err(|e| {
        debug!(error = %e, "JSON parse failed");
        CsigError::parse(NOT_LITERAL_OR_JSON)
    })
}

/// Peel wrapper layers off `value`.
///
/// Each iteration descends into the first wrapper key whose value is a
/// mapping. Stops when no such key exists or after `options.max_depth`
/// iterations. Returns the payload and the number of layers removed.
pub fn unwrap_envelopes(value: Value, options: &NormalizeOptions) -> (Value, usize) {
    let mut current = value;
    let mut depth = 0;

    while depth < options.max_depth {
        let Value::Object(map) = &mut current else {
            break;
        };
        let key = options
            .wrapper_keys
            .iter()
            .find(|k| matches!(map.get(k.as_str()), Some(Value::Object(_))));
        let Some(inner) = key.and_then(|k| map.remove(k.as_str())) else {
            break;
        };
        current = inner;
        depth += 1;
    }

    (current, depth)
}

/// Small description of a normalized payload for envelope input summaries.
pub fn describe(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys.truncate(20);
            json!({ "type": "mapping", "keyCount": map.len(), "keys": keys })
        }
        Value::Array(items) => json!({ "type": "array", "length": items.len() }),
        other => json!({ "type": csig_core::path::type_name(other) }),
    }
}
