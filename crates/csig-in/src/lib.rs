//! csig-in: Input Normalizer
//!
//! Vendor responses reach a transformation as JSON text, as the literal repr
//! of a mapping, as raw bytes, or already parsed. This crate reduces all of
//! them to one JSON value and strips the response envelopes vendors wrap
//! their payloads in.
//!
//! # Example
//!
//! ```
//! use csig_in::normalize;
//! use serde_json::json;
//!
//! let payload = normalize(r#"{"response": {"result": {"value": []}}}"#).unwrap();
//! assert_eq!(payload, json!({"value": []}));
//!
//! let payload = normalize("{'enabled': True}").unwrap();
//! assert_eq!(payload, json!({"enabled": true}));
//! ```

pub mod literal;
pub mod normalizer;

pub use literal::parse_literal;
pub use normalizer::{
    describe, normalize, normalize_with, parse_raw, parse_text, unwrap_envelopes,
    NormalizeOptions, DEFAULT_WRAPPER_KEYS, MAX_UNWRAP_DEPTH,
};
