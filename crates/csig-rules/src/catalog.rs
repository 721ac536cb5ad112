//! Rule catalog
//!
//! A vendor's checks are a YAML list of [`RuleSpec`]s. Catalogs are
//! validated once at load time so that evaluation never meets a broken rule.

use crate::rule::RuleSpec;
use csig_core::CsigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("rule {id}: {source}")]
    InvalidRule {
        id: String,
        #[source]
        source: CsigError,
    },
}

/// Named, versioned list of rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCatalog {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl RuleCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    /// Parse and validate a catalog
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        info!(catalog = %catalog.name, rules = catalog.rules.len(), "loaded rule catalog");
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Ids must be unique and every rule must validate
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(CatalogError::DuplicateRule(rule.id.clone()));
            }
            rule.validate().map_err(|source| CatalogError::InvalidRule {
                id: rule.id.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&RuleSpec, CatalogError> {
        self.get(id).ok_or_else(|| CatalogError::UnknownRule(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
