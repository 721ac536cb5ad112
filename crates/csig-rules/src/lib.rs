//! csig-rules: transformations and the safe transform boundary
//!
//! A [`Transformation`] turns one normalized vendor payload into one
//! compliance signal. [`transform`] runs it behind a boundary that always
//! returns a mapping, and [`transform_enveloped`] wraps the same run in an
//! [`EvaluationEnvelope`](csig_envelope::EvaluationEnvelope).
//!
//! Declarative rules cover the common shapes and load from YAML:
//!
//! ```
//! use csig_rules::{transform, RuleCatalog};
//! use serde_json::json;
//!
//! let catalog = RuleCatalog::from_yaml(r#"
//! name: acme
//! rules:
//!   - id: acme.backup.enabled
//!     criteria_key: isBackupEnabled
//!     check: { kind: field_truthy, path: settings.backupEnabled }
//! "#).unwrap();
//!
//! let rule = catalog.require("acme.backup.enabled").unwrap();
//! let out = transform(rule, r#"{"response": {"settings": {"backupEnabled": true}}}"#);
//! assert_eq!(out, json!({"isBackupEnabled": true}));
//!
//! let out = transform(rule, "not { valid");
//! assert_eq!(out["isBackupEnabled"], false);
//! ```

pub mod catalog;
pub mod rule;
pub mod transformation;

pub use catalog::{CatalogError, RuleCatalog};
pub use rule::{MissingDataPolicy, ProfileSource, RuleKind, RuleSpec};
pub use transformation::{safe_failure, transform, transform_enveloped, RuleOutcome, Transformation};
