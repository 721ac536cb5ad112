//! Unified error model
use thiserror::Error;

/// Errors raised by normalization, scoring and configuration.
///
/// Division by a zero denominator is deliberately absent: coverage scoring
/// yields 0% instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsigError {
    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Invalid input type: {0}")]
    Type(String),

    #[error("Unexpected shape: {0}")]
    Shape(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CsigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short machine-readable kind, used in envelope error lists
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Type(_) => "type",
            Self::Shape(_) => "shape",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, CsigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = CsigError::parse("input is neither a recognized literal nor valid JSON");
        assert_eq!(
            err.to_string(),
            "Invalid JSON: input is neither a recognized literal nor valid JSON"
        );
        assert_eq!(err.kind(), "parse");

        let err = CsigError::shape("expected an array at 'value'");
        assert!(err.to_string().starts_with("Unexpected shape"));
    }
}
