//! Category rules: what to count and what to divide by

use crate::asset::AssetRecord;
use crate::predicate::{AssetPredicate, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Population a category's count is measured against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Denominator {
    /// Every mapping in the asset list
    TotalAssets,
    /// Assets classified into one partition (e.g. `server`)
    AssetType { asset_type: String },
    /// The count of another category (e.g. encrypted among protected)
    Category { category: String },
}

impl Default for Denominator {
    fn default() -> Self {
        Denominator::TotalAssets
    }
}

impl Denominator {
    pub fn asset_type(asset_type: impl Into<String>) -> Self {
        Denominator::AssetType {
            asset_type: asset_type.into(),
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Denominator::Category {
            category: category.into(),
        }
    }
}

impl fmt::Display for Denominator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Denominator::TotalAssets => write!(f, "all assets"),
            Denominator::AssetType { asset_type } => write!(f, "{} assets", asset_type),
            Denominator::Category { category } => write!(f, "'{}' matches", category),
        }
    }
}

/// A named category: predicate plus denominator
#[derive(Clone)]
pub struct CategoryRule {
    pub name: String,
    pub denominator: Denominator,
    predicate: Arc<dyn AssetPredicate>,
}

impl CategoryRule {
    pub fn new(
        name: impl Into<String>,
        predicate: impl AssetPredicate + 'static,
        denominator: Denominator,
    ) -> Self {
        Self {
            name: name.into(),
            denominator,
            predicate: Arc::new(predicate),
        }
    }

    /// Build from a closure; the signature is inferred from the bound
    pub fn from_fn<F>(name: impl Into<String>, f: F, denominator: Denominator) -> Self
    where
        F: Fn(&AssetRecord<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(name, f, denominator)
    }

    pub fn matches(&self, asset: &AssetRecord<'_>) -> bool {
        self.predicate.matches(asset)
    }
}

impl fmt::Debug for CategoryRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CategoryRule")
            .field("name", &self.name)
            .field("denominator", &self.denominator)
            .finish_non_exhaustive()
    }
}

/// Serializable category definition used in profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub predicate: Predicate,
    #[serde(default)]
    pub denominator: Denominator,
}

impl CategorySpec {
    pub fn new(name: impl Into<String>, predicate: Predicate, denominator: Denominator) -> Self {
        Self {
            name: name.into(),
            predicate,
            denominator,
        }
    }
}

impl From<CategorySpec> for CategoryRule {
    fn from(spec: CategorySpec) -> Self {
        CategoryRule::new(spec.name, spec.predicate, spec.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_denominator_yaml() {
        let d: Denominator = serde_yaml::from_str("kind: asset_type\nasset_type: server").unwrap();
        assert_eq!(d, Denominator::asset_type("server"));

        let spec: CategorySpec = serde_yaml::from_str(
            "name: Encryption\npredicate: { kind: field_truthy, field: encrypted }",
        )
        .unwrap();
        assert_eq!(spec.denominator, Denominator::TotalAssets);
    }

    #[test]
    fn test_rule_from_closure() {
        let rule = CategoryRule::from_fn(
            "Has Owner",
            |a| a.str_field("owner").is_some(),
            Denominator::TotalAssets,
        );
        let v = json!({"owner": "ops"});
        assert!(rule.matches(&AssetRecord::new(&v).unwrap()));
        assert_eq!(Denominator::category("Protected").to_string(), "'Protected' matches");
    }
}
