//! Coverage scoring
//!
//! One pass classifies every asset into a type partition, one scan per
//! category counts predicate matches, and each count is turned into a
//! whole-number percentage of that category's denominator.
//!
//! Percentages round half up (`12.5` → `13`) using integer arithmetic, are
//! clamped to 100, and are 0 whenever the denominator is 0.

use crate::asset::{AssetRecord, TypeClassifier};
use crate::category::{CategoryRule, Denominator};
use csig_core::{path::type_name, CsigError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Category name → number of matching assets
pub type SafeguardCounter = BTreeMap<String, u64>;

/// Category name → percentage in `0..=100`
pub type CoverageScore = BTreeMap<String, u8>;

/// Everything a scoring pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Mapping entries in the asset list
    pub total_assets: u64,
    /// Entries ignored because they were not mappings
    pub skipped: u64,
    /// Partition name → asset count
    pub partitions: BTreeMap<String, u64>,
    pub counts: SafeguardCounter,
    /// Category name → denominator actually used
    pub denominators: BTreeMap<String, u64>,
    pub scores: CoverageScore,
}

impl CoverageReport {
    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn denominator(&self, category: &str) -> u64 {
        self.denominators.get(category).copied().unwrap_or(0)
    }

    pub fn score(&self, category: &str) -> u8 {
        self.scores.get(category).copied().unwrap_or(0)
    }

    pub fn partition(&self, asset_type: &str) -> u64 {
        self.partitions.get(asset_type).copied().unwrap_or(0)
    }

    /// At least one match against a non-empty population
    pub fn is_present(&self, category: &str) -> bool {
        self.count(category) > 0 && self.denominator(category) > 0
    }
}

/// `round(100 * count / denominator)`, half up; 0 when `denominator == 0`.
pub fn percentage(count: u64, denominator: u64) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let count = count as u128;
    let denominator = denominator as u128;
    let pct = (200 * count + denominator) / (2 * denominator);
    pct.min(100) as u8
}

/// Scores asset lists against a fixed set of categories
#[derive(Debug, Clone)]
pub struct CoverageScorer {
    categories: Vec<CategoryRule>,
    classifier: TypeClassifier,
}

impl CoverageScorer {
    /// Build a scorer, rejecting duplicate names and dangling category denominators
    pub fn new(categories: Vec<CategoryRule>) -> Result<Self, CsigError> {
        let mut seen = HashSet::new();
        for rule in &categories {
            if rule.name.trim().is_empty() {
                return Err(CsigError::config("category name must not be empty"));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(CsigError::config(format!("duplicate category '{}'", rule.name)));
            }
        }
        for rule in &categories {
            if let Denominator::Category { category } = &rule.denominator {
                if !seen.contains(category.as_str()) {
                    return Err(CsigError::config(format!(
                        "category '{}' is measured against unknown category '{}'",
                        rule.name, category
                    )));
                }
            }
        }

        Ok(Self {
            categories,
            classifier: TypeClassifier::default(),
        })
    }

    pub fn with_classifier(mut self, classifier: TypeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Report with every category present and zeroed
    pub fn zeroed(&self) -> CoverageReport {
        let mut report = CoverageReport::default();
        for rule in &self.categories {
            report.counts.insert(rule.name.clone(), 0);
            report.denominators.insert(rule.name.clone(), 0);
            report.scores.insert(rule.name.clone(), 0);
        }
        report
    }

    /// Score an arbitrary value; anything but an array is a shape error.
    ///
    /// Callers that must not fail recover with [`CoverageScorer::zeroed`].
    pub fn score_value(&self, assets: &Value) -> Result<CoverageReport, CsigError> {
        match assets {
            Value::Array(items) => Ok(self.score(items)),
            other => {
                warn!(got = type_name(other), "asset list is not an array");
                Err(CsigError::shape(format!(
                    "expected a list of assets, got {}",
                    type_name(other)
                )))
            }
        }
    }

    /// Score a list of assets. Non-mapping entries are skipped.
    pub fn score(&self, assets: &[Value]) -> CoverageReport {
        let mut report = self.zeroed();

        // Partition pass
        let mut records = Vec::with_capacity(assets.len());
        for value in assets {
            let Some(record) = AssetRecord::new(value) else {
                report.skipped += 1;
                continue;
            };
            let asset_type = self.classifier.classify(value);
            if let Some(t) = asset_type {
                *report.partitions.entry(t.to_string()).or_insert(0) += 1;
            }
            records.push(record.with_type(asset_type));
        }
        report.total_assets = records.len() as u64;
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "ignored non-mapping asset entries");
        }

        // Count pass, one scan per category
        for rule in &self.categories {
            let count = records.iter().filter(|r| rule.matches(r)).count() as u64;
            report.counts.insert(rule.name.clone(), count);
        }

        // Score pass; category denominators read the counts above
        for rule in &self.categories {
            let denominator = match &rule.denominator {
                Denominator::TotalAssets => report.total_assets,
                Denominator::AssetType { asset_type } => report.partition(asset_type),
                Denominator::Category { category } => report.count(category),
            };
            let count = report.count(&rule.name);
            let score = percentage(count, denominator);
            debug!(
                category = %rule.name,
                count,
                denominator,
                score,
                "scored category"
            );
            report.denominators.insert(rule.name.clone(), denominator);
            report.scores.insert(rule.name.clone(), score);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SERVER;
    use crate::predicate::Predicate;
    use serde_json::json;

    fn server_scorer() -> CoverageScorer {
        CoverageScorer::new(vec![
            CategoryRule::new(
                "Server Protection",
                Predicate::all(vec![Predicate::type_is(SERVER), Predicate::field_truthy("protected")]),
                Denominator::asset_type(SERVER),
            ),
            CategoryRule::new("Any Protection", Predicate::field_truthy("protected"), Denominator::TotalAssets),
        ])
        .unwrap()
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(7, 5), 100);
        assert_eq!(percentage(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_server_protection_half() {
        let mut assets = Vec::new();
        for i in 0..4 {
            assets.push(json!({"type": "server", "protected": i < 2}));
        }
        for _ in 0..6 {
            assets.push(json!({"type": "computer", "protected": false}));
        }

        let report = server_scorer().score(&assets);
        assert_eq!(report.total_assets, 10);
        assert_eq!(report.partition(SERVER), 4);
        assert_eq!(report.count("Server Protection"), 2);
        assert_eq!(report.score("Server Protection"), 50);
        assert_eq!(report.score("Any Protection"), 20);
    }

    #[test]
    fn test_zero_denominator() {
        let assets = vec![json!({"type": "computer", "protected": true})];
        let report = server_scorer().score(&assets);
        assert_eq!(report.denominator("Server Protection"), 0);
        assert_eq!(report.score("Server Protection"), 0);
        assert!(!report.is_present("Server Protection"));
    }

    #[test]
    fn test_empty_and_malformed_lists() {
        let scorer = server_scorer();
        let report = scorer.score(&[]);
        assert_eq!(report, scorer.zeroed());

        let report = scorer.score(&[json!(1), json!("x"), json!({"type": "server", "protected": true})]);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.total_assets, 1);
        assert_eq!(report.score("Server Protection"), 100);

        let err = scorer.score_value(&json!({"value": []})).unwrap_err();
        assert!(matches!(err, CsigError::Shape(_)));
    }

    #[test]
    fn test_untyped_assets_count_toward_total_only() {
        let assets = vec![json!({"protected": true}), json!({"type": "fridge", "protected": true})];
        let report = server_scorer().score(&assets);
        assert_eq!(report.total_assets, 2);
        assert!(report.partitions.is_empty());
        assert_eq!(report.score("Any Protection"), 100);
    }

    #[test]
    fn test_category_denominator() {
        let scorer = CoverageScorer::new(vec![
            CategoryRule::new("Protected", Predicate::field_truthy("protected"), Denominator::TotalAssets),
            CategoryRule::new(
                "Encrypted Among Protected",
                Predicate::all(vec![Predicate::field_truthy("protected"), Predicate::field_truthy("encrypted")]),
                Denominator::category("Protected"),
            ),
        ])
        .unwrap();

        let assets = vec![
            json!({"protected": true, "encrypted": true}),
            json!({"protected": true, "encrypted": false}),
            json!({"protected": true, "encrypted": true}),
            json!({"protected": false, "encrypted": true}),
        ];
        let report = scorer.score(&assets);
        assert_eq!(report.score("Protected"), 75);
        assert_eq!(report.denominator("Encrypted Among Protected"), 3);
        assert_eq!(report.score("Encrypted Among Protected"), 67);
    }

    #[test]
    fn test_invalid_configurations() {
        let dup = CoverageScorer::new(vec![
            CategoryRule::new("A", Predicate::Always, Denominator::TotalAssets),
            CategoryRule::new("A", Predicate::Always, Denominator::TotalAssets),
        ]);
        assert!(matches!(dup, Err(CsigError::Config(_))));

        let dangling = CoverageScorer::new(vec![CategoryRule::new(
            "A",
            Predicate::Always,
            Denominator::category("B"),
        )]);
        assert!(matches!(dangling, Err(CsigError::Config(_))));
    }

    #[test]
    fn test_monotonic_in_count() {
        for denominator in 1..=40u64 {
            let mut previous = 0;
            for count in 0..=denominator {
                let p = percentage(count, denominator);
                assert!(p >= previous);
                assert!(p <= 100);
                previous = p;
            }
        }
    }
}
