//! Raw input: the untyped value handed to a transformation
use serde_json::Value;

/// Input of unknown origin.
///
/// Text may hold a serialized mapping in JSON or literal syntax, bytes are
/// expected to be UTF-8 text, and `Value` is anything a caller already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Text(String),
    Bytes(Vec<u8>),
    Value(Value),
}

impl RawInput {
    /// Name of the variant, for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            RawInput::Text(_) => "text",
            RawInput::Bytes(_) => "bytes",
            RawInput::Value(Value::Object(_)) => "mapping",
            RawInput::Value(Value::Array(_)) => "array",
            RawInput::Value(Value::Null) => "null",
            RawInput::Value(Value::Bool(_)) => "bool",
            RawInput::Value(Value::Number(_)) => "number",
            RawInput::Value(Value::String(_)) => "string",
        }
    }

    /// Size in bytes of textual input, or `None` for parsed values
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            RawInput::Text(s) => Some(s.len()),
            RawInput::Bytes(b) => Some(b.len()),
            RawInput::Value(_) => None,
        }
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Text(text)
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RawInput {
    fn from(bytes: Vec<u8>) -> Self {
        RawInput::Bytes(bytes)
    }
}

impl From<&[u8]> for RawInput {
    fn from(bytes: &[u8]) -> Self {
        RawInput::Bytes(bytes.to_vec())
    }
}

/// JSON strings are text to be parsed, everything else stays a value.
impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawInput::Text(text),
            other => RawInput::Value(other),
        }
    }
}
