//! Threshold profiles
//!
//! A profile is per-deployment configuration: which categories to score,
//! and which criteria keys turn into `true` at what coverage. "Any backup
//! exists" and "critical systems adequately covered" need different
//! cut-offs, so thresholds live here rather than in code.

use crate::asset::{ClassifierConfig, TypeClassifier, COMPUTER, DEFAULT_ASSET_KEYS, SERVER};
use crate::category::{CategoryRule, CategorySpec, Denominator};
use crate::predicate::Predicate;
use crate::scorer::{CoverageReport, CoverageScorer};
use csig_core::CsigError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// When a category's coverage counts as passing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// Rounded coverage percentage is above zero
    Presence,
    /// At least one matching asset in a non-empty population, even when
    /// the rounded percentage is 0
    AnyMatch,
    /// Rounded coverage percentage is at least `percent`
    AtLeast { percent: u8 },
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Presence
    }
}

impl Threshold {
    pub fn at_least(percent: u8) -> Self {
        Threshold::AtLeast {
            percent: percent.min(100),
        }
    }

    pub fn passes(&self, report: &CoverageReport, category: &str) -> bool {
        match self {
            Threshold::Presence => report.score(category) > 0,
            Threshold::AnyMatch => report.is_present(category),
            Threshold::AtLeast { percent } => {
                report.denominator(category) > 0 && report.score(category) >= *percent
            }
        }
    }
}

/// One boolean output derived from one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRule {
    /// Key the flag is reported under, e.g. `isEndpointProtectionDeployed`
    pub criteria_key: String,
    pub category: String,
    /// Falls back to the profile's default threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
}

impl FlagRule {
    pub fn new(criteria_key: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            criteria_key: criteria_key.into(),
            category: category.into(),
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Categories, flags and classification for one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Profile name (e.g. "endpoint-protection@1.0")
    pub name: String,

    #[serde(default)]
    pub default_threshold: Threshold,

    #[serde(default)]
    pub categories: Vec<CategorySpec>,

    #[serde(default)]
    pub flags: Vec<FlagRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierConfig>,

    /// Keys searched for the asset list inside a payload
    #[serde(default = "default_asset_keys")]
    pub asset_keys: Vec<String>,
}

fn default_asset_keys() -> Vec<String> {
    DEFAULT_ASSET_KEYS.iter().map(|k| k.to_string()).collect()
}

impl ThresholdProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_threshold: Threshold::Presence,
            categories: Vec::new(),
            flags: Vec::new(),
            classifier: None,
            asset_keys: default_asset_keys(),
        }
    }

    pub fn with_category(mut self, category: CategorySpec) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_flag(mut self, flag: FlagRule) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_default_threshold(mut self, threshold: Threshold) -> Self {
        self.default_threshold = threshold;
        self
    }

    /// Endpoint protection console inventory: computers, servers, encryption
    pub fn endpoint_protection() -> Self {
        let protected = Predicate::any(vec![
            Predicate::field_truthy("protected"),
            Predicate::field_truthy("protection.enabled"),
            Predicate::field_in(
                "protectionStatus",
                vec![json!("protected"), json!("active"), json!("enabled")],
            ),
            Predicate::field_in("health.services.status", vec![json!("good")]),
        ]);
        let encrypted = Predicate::any(vec![
            Predicate::field_truthy("encrypted"),
            Predicate::field_truthy("encryption.enabled"),
            Predicate::field_in("encryptionStatus", vec![json!("encrypted"), json!("enabled")]),
        ]);

        Self::new("endpoint-protection@1.0")
            .with_category(CategorySpec::new(
                "Endpoint Protection",
                Predicate::all(vec![Predicate::type_is(COMPUTER), protected.clone()]),
                Denominator::asset_type(COMPUTER),
            ))
            .with_category(CategorySpec::new(
                "Server Protection",
                Predicate::all(vec![Predicate::type_is(SERVER), protected.clone()]),
                Denominator::asset_type(SERVER),
            ))
            .with_category(CategorySpec::new("Protected", protected.clone(), Denominator::TotalAssets))
            .with_category(CategorySpec::new(
                "Disk Encryption",
                Predicate::all(vec![protected, encrypted]),
                Denominator::category("Protected"),
            ))
            .with_flag(FlagRule::new("isEndpointProtectionEnabled", "Endpoint Protection"))
            .with_flag(
                FlagRule::new("isEndpointProtectionDeployed", "Endpoint Protection")
                    .with_threshold(Threshold::at_least(80)),
            )
            .with_flag(
                FlagRule::new("isServerProtectionDeployed", "Server Protection")
                    .with_threshold(Threshold::at_least(80)),
            )
            .with_flag(FlagRule::new("isDiskEncryptionEnabled", "Disk Encryption"))
    }

    /// Backup console inventory: jobs and their last result
    pub fn backup_coverage() -> Self {
        let enabled = Predicate::negate(Predicate::any(vec![
            Predicate::field_equals("enabled", false),
            Predicate::field_in("status", vec![json!("disabled"), json!("paused")]),
        ]));
        let succeeded = Predicate::any(vec![
            Predicate::field_in("lastResult", vec![json!("success"), json!("succeeded")]),
            Predicate::field_in("lastRunStatus", vec![json!("success"), json!("succeeded")]),
        ]);

        Self::new("backup-coverage@1.0")
            .with_category(CategorySpec::new("Backup Enabled", enabled.clone(), Denominator::TotalAssets))
            .with_category(CategorySpec::new(
                "Backup Succeeded",
                Predicate::all(vec![enabled, succeeded]),
                Denominator::category("Backup Enabled"),
            ))
            .with_flag(FlagRule::new("isBackupEnabled", "Backup Enabled"))
            .with_flag(
                FlagRule::new("isBackupHealthy", "Backup Succeeded")
                    .with_threshold(Threshold::at_least(80)),
            )
    }

    /// Load profile from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, CsigError> {
        let profile: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CsigError::config(format!("profile: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CsigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| CsigError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    /// Every flag must point at a defined category
    pub fn validate(&self) -> Result<(), CsigError> {
        check_percent(&self.default_threshold, || format!("profile '{}' default threshold", self.name))?;
        let names: HashSet<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        for flag in &self.flags {
            if !names.contains(flag.category.as_str()) {
                return Err(CsigError::config(format!(
                    "flag '{}' refers to unknown category '{}'",
                    flag.criteria_key, flag.category
                )));
            }
            if let Some(threshold) = &flag.threshold {
                check_percent(threshold, || format!("flag '{}' threshold", flag.criteria_key))?;
            }
        }
        Ok(())
    }

    pub fn build_scorer(&self) -> Result<CoverageScorer, CsigError> {
        self.validate()?;
        let rules: Vec<CategoryRule> = self.categories.iter().cloned().map(Into::into).collect();
        let classifier = match &self.classifier {
            Some(config) => TypeClassifier::from_config(config)?,
            None => TypeClassifier::default(),
        };
        Ok(CoverageScorer::new(rules)?.with_classifier(classifier))
    }

    /// Criteria key → flag value
    pub fn derive_flags(&self, report: &CoverageReport) -> BTreeMap<String, bool> {
        self.flags
            .iter()
            .map(|flag| {
                let threshold = flag.threshold.unwrap_or(self.default_threshold);
                (flag.criteria_key.clone(), threshold.passes(report, &flag.category))
            })
            .collect()
    }

    pub fn asset_key_refs(&self) -> Vec<&str> {
        self.asset_keys.iter().map(String::as_str).collect()
    }
}

fn check_percent(threshold: &Threshold, what: impl FnOnce() -> String) -> Result<(), CsigError> {
    match threshold {
        Threshold::AtLeast { percent } if *percent > 100 => Err(CsigError::config(format!(
            "{} is {}%, must be at most 100",
            what(),
            percent
        ))),
        _ => Ok(()),
    }
}
