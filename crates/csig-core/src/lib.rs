//! csig core: shared types for compliance signal transformations
//!
//! Every transformation in the workspace speaks the same small vocabulary:
//! a [`RawInput`] of unknown origin comes in, [`CsigError`] describes what
//! went wrong, and [`path`] gives null-safe access into untyped payloads.

pub mod error;
pub mod path;
pub mod raw_input;

pub use error::{CsigError, Result};
pub use path::{
    get_array, get_bool, get_dotted, get_f64, get_object, get_path, get_str, get_u64,
    require_array, require_object,
};
pub use raw_input::RawInput;

/// Version stamped into every evaluation envelope
pub const SCHEMA_VERSION: &str = "1.0.0";
