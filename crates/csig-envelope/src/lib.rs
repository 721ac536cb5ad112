//! csig-envelope: Evaluation envelope
//!
//! Wraps a transformation result together with data collection, validation,
//! transformation and evaluation status into one fixed, serializable shape.
//!
//! ```
//! use csig_envelope::{EnvelopeBuilder, ValidationResult};
//! use serde_json::json;
//!
//! let envelope = EnvelopeBuilder::new(json!({"isBackupEnabled": true}))
//!     .validation(ValidationResult::passed())
//!     .pass_reason("3 of 3 backup jobs enabled")
//!     .transformation_id("acme.backup.enabled")
//!     .build();
//!
//! assert!(envelope.is_compliant("isBackupEnabled"));
//! let value = envelope.into_value();
//! assert_eq!(value["additionalInfo"]["validation"]["status"], "passed");
//! ```

pub mod envelope;
pub mod validation;

pub use envelope::{
    build_envelope, AdditionalInfo, DataCollection, EnvelopeBuilder, EnvelopeParts, Evaluation,
    EvaluationEnvelope, StageOutcome, Transformation,
};
pub use validation::{validate_shape, ExpectedType, ShapeHint, ValidationResult, ValidationStatus};
