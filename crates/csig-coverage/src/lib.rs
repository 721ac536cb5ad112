//! csig-coverage: Coverage Scorer
//!
//! Classifies a heterogeneous list of asset records, counts how many satisfy
//! each named category, and derives percentage coverage and threshold flags.
//!
//! # Example
//!
//! ```
//! use csig_coverage::{
//!     CategorySpec, Denominator, FlagRule, Predicate, Threshold, ThresholdProfile,
//! };
//! use serde_json::json;
//!
//! let profile = ThresholdProfile::new("servers@1.0")
//!     .with_category(CategorySpec::new(
//!         "Server Protection",
//!         Predicate::all(vec![Predicate::type_is("server"), Predicate::field_truthy("protected")]),
//!         Denominator::asset_type("server"),
//!     ))
//!     .with_flag(
//!         FlagRule::new("isServerProtectionDeployed", "Server Protection")
//!             .with_threshold(Threshold::at_least(50)),
//!     );
//!
//! let payload = json!({"value": [
//!     {"type": "server", "protected": true},
//!     {"type": "server", "protected": false},
//!     {"type": "computer"},
//! ]});
//!
//! let evaluation = csig_coverage::evaluate(&profile, &payload).unwrap();
//! assert_eq!(evaluation.report.score("Server Protection"), 50);
//! assert!(evaluation.flags["isServerProtectionDeployed"]);
//! ```

pub mod asset;
pub mod category;
pub mod predicate;
pub mod profile;
pub mod scorer;

pub use asset::{
    is_truthy, locate_assets, AssetRecord, ClassifierConfig, PatternConfig, TypeClassifier,
};
pub use category::{CategoryRule, CategorySpec, Denominator};
pub use predicate::{AssetPredicate, Predicate};
pub use profile::{FlagRule, Threshold, ThresholdProfile};
pub use scorer::{percentage, CoverageReport, CoverageScore, CoverageScorer, SafeguardCounter};

use csig_core::CsigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Report plus the flags a profile derives from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEvaluation {
    pub report: CoverageReport,
    pub flags: BTreeMap<String, bool>,
}

/// Locate the asset list in `payload`, score it and derive the profile's flags.
pub fn evaluate(profile: &ThresholdProfile, payload: &Value) -> Result<CoverageEvaluation, CsigError> {
    let scorer = profile.build_scorer()?;
    let assets = locate_assets(payload, &profile.asset_key_refs()).ok_or_else(|| {
        CsigError::shape(format!(
            "no asset list found under any of: {}",
            profile.asset_keys.join(", ")
        ))
    })?;
    let report = scorer.score(assets);
    let flags = profile.derive_flags(&report);
    Ok(CoverageEvaluation { report, flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quick_evaluate() {
        let payload = json!({"jobs": [
            {"name": "db", "enabled": true, "lastResult": "Success"},
            {"name": "files", "status": "paused"},
        ]});
        let evaluation = evaluate(&ThresholdProfile::backup_coverage(), &payload).unwrap();
        assert!(evaluation.flags["isBackupEnabled"]);
        assert!(evaluation.flags["isBackupHealthy"]);
        assert_eq!(evaluation.report.score("Backup Enabled"), 50);
    }

    #[test]
    fn test_missing_asset_list() {
        let err = evaluate(&ThresholdProfile::backup_coverage(), &json!({"count": 0})).unwrap_err();
        assert!(matches!(err, CsigError::Shape(_)));
    }
}
