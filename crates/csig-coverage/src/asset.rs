//! Asset records and type classification
//!
//! An asset is any inventory item a vendor reports: an endpoint, a device,
//! a backup job, an SLA domain. Nothing about its schema is assumed; the
//! scorer reads it through predicates and through the [`TypeClassifier`].

use csig_core::{get_dotted, CsigError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const COMPUTER: &str = "computer";
pub const SERVER: &str = "server";
pub const MOBILE: &str = "mobile";
pub const CLOUD: &str = "cloud";

/// Keys tried, in order, when looking for an asset's type
pub const DEFAULT_TYPE_KEYS: [&str; 6] =
    ["type", "assetType", "deviceType", "platform", "os", "operatingSystem"];

/// Keys tried, in order, when looking for the asset list inside a payload
pub const DEFAULT_ASSET_KEYS: [&str; 11] = [
    "value", "items", "assets", "devices", "computers", "endpoints", "hosts", "jobs", "records",
    "results", "data",
];

lazy_static! {
    /// Fallback patterns for free-form type strings. Order matters:
    /// "Windows Server 2019" must land in server, not computer.
    static ref DEFAULT_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)server").unwrap(), SERVER),
        (Regex::new(r"(?i)\b(ios|ipados|android|iphone|ipad|mobile|phone|tablet)\b").unwrap(), MOBILE),
        (Regex::new(r"(?i)\b(aws|azure|gcp|ec2|cloud|virtual machine)\b").unwrap(), CLOUD),
        (Regex::new(r"(?i)\b(windows|mac ?os|os x|darwin|linux|ubuntu|workstation|desktop|laptop)\b").unwrap(), COMPUTER),
    ];

    static ref DEFAULT_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("computer", COMPUTER);
        m.insert("workstation", COMPUTER);
        m.insert("desktop", COMPUTER);
        m.insert("laptop", COMPUTER);
        m.insert("endpoint", COMPUTER);
        m.insert("pc", COMPUTER);
        m.insert("server", SERVER);
        m.insert("mobile", MOBILE);
        m.insert("phone", MOBILE);
        m.insert("tablet", MOBILE);
        m.insert("smartphone", MOBILE);
        m.insert("cloud", CLOUD);
        m.insert("vm", CLOUD);
        m.insert("instance", CLOUD);
        m
    };
}

/// Borrowed view of one asset mapping plus its classified type
#[derive(Debug, Clone, Copy)]
pub struct AssetRecord<'a> {
    value: &'a Value,
    asset_type: Option<&'a str>,
}

impl<'a> AssetRecord<'a> {
    /// Wrap a value; `None` unless it is a mapping
    pub fn new(value: &'a Value) -> Option<Self> {
        value.is_object().then_some(Self { value, asset_type: None })
    }

    pub fn with_type(mut self, asset_type: Option<&'a str>) -> Self {
        self.asset_type = asset_type;
        self
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn asset_type(&self) -> Option<&'a str> {
        self.asset_type
    }

    /// Dotted-path lookup, `None` for missing or null
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        get_dotted(self.value, path)
    }

    pub fn str_field(&self, path: &str) -> Option<&'a str> {
        self.get(path)?.as_str()
    }

    pub fn bool_field(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    pub fn is_truthy(&self, path: &str) -> bool {
        self.get(path).map(is_truthy).unwrap_or(false)
    }
}

/// Loose truthiness for vendor flags that arrive as bools, numbers or strings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(
                s.as_str(),
                "" | "false" | "0" | "no" | "off" | "disabled" | "none" | "null"
            )
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Find the asset list in a payload: either the payload itself, or the
/// first of `keys` that holds an array.
pub fn locate_assets<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => keys.iter().find_map(|k| map.get(*k)?.as_array()),
        _ => None,
    }
}

/// Serializable overrides for [`TypeClassifier`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Attribute names to read the type from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_keys: Option<Vec<String>>,

    /// Exact (case-insensitive) type string → asset type
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Regex patterns tried in order after aliases
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,

    /// Drop built-in aliases and patterns instead of extending them
    #[serde(default)]
    pub replace_defaults: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: String,
    pub asset_type: String,
}

/// Maps an asset's free-form type attribute onto a partition name.
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    type_keys: Vec<String>,
    aliases: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self {
            type_keys: DEFAULT_TYPE_KEYS.iter().map(|k| k.to_string()).collect(),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            patterns: DEFAULT_PATTERNS
                .iter()
                .map(|(re, t)| (re.clone(), t.to_string()))
                .collect(),
        }
    }
}

impl TypeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration, compiling patterns
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, CsigError> {
        let mut classifier = if config.replace_defaults {
            Self {
                type_keys: DEFAULT_TYPE_KEYS.iter().map(|k| k.to_string()).collect(),
                aliases: HashMap::new(),
                patterns: Vec::new(),
            }
        } else {
            Self::default()
        };

        if let Some(keys) = &config.type_keys {
            classifier.type_keys = keys.clone();
        }
        for (alias, asset_type) in &config.aliases {
            classifier.aliases.insert(alias.to_ascii_lowercase(), asset_type.clone());
        }

        let mut patterns = Vec::with_capacity(config.patterns.len());
        for p in &config.patterns {
            let re = Regex::new(&p.pattern).map_err(|e| {
                CsigError::config(format!("invalid type pattern '{}': {}", p.pattern, e))
            })?;
            patterns.push((re, p.asset_type.clone()));
        }
        // Configured patterns take priority over the built-ins
        patterns.append(&mut classifier.patterns);
        classifier.patterns = patterns;

        Ok(classifier)
    }

    /// Use a single attribute for the type
    pub fn with_type_key(mut self, key: impl Into<String>) -> Self {
        self.type_keys = vec![key.into()];
        self
    }

    pub fn with_alias(mut self, alias: &str, asset_type: impl Into<String>) -> Self {
        self.aliases.insert(alias.to_ascii_lowercase(), asset_type.into());
        self
    }

    /// Partition name for an asset, `None` when the type is missing or unknown
    pub fn classify(&self, asset: &Value) -> Option<&str> {
        let raw = self
            .type_keys
            .iter()
            .find_map(|k| get_dotted(asset, k)?.as_str())?;
        let key = raw.trim().to_ascii_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(t) = self.aliases.get(&key) {
            return Some(t.as_str());
        }
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(&key))
            .map(|(_, t)| t.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_aliases_and_patterns() {
        let c = TypeClassifier::new();
        assert_eq!(c.classify(&json!({"type": "Computer"})), Some(COMPUTER));
        assert_eq!(c.classify(&json!({"type": "Windows Server 2019"})), Some(SERVER));
        assert_eq!(c.classify(&json!({"os": "Windows 11 Pro"})), Some(COMPUTER));
        assert_eq!(c.classify(&json!({"platform": "iOS"})), Some(MOBILE));
        assert_eq!(c.classify(&json!({"deviceType": "AWS EC2"})), Some(CLOUD));
    }

    #[test]
    fn test_classify_unknown() {
        let c = TypeClassifier::new();
        assert_eq!(c.classify(&json!({"type": "toaster"})), None);
        assert_eq!(c.classify(&json!({"type": ""})), None);
        assert_eq!(c.classify(&json!({"type": 3})), None);
        assert_eq!(c.classify(&json!({"name": "no type"})), None);
    }

    #[test]
    fn test_config_overrides() {
        let config = ClassifierConfig {
            type_keys: Some(vec!["kind".to_string()]),
            aliases: HashMap::from([("vmware".to_string(), "virtual".to_string())]),
            patterns: vec![PatternConfig {
                pattern: r"(?i)^nas".to_string(),
                asset_type: "storage".to_string(),
            }],
            replace_defaults: false,
        };
        let c = TypeClassifier::from_config(&config).unwrap();
        assert_eq!(c.classify(&json!({"kind": "VMware"})), Some("virtual"));
        assert_eq!(c.classify(&json!({"kind": "NAS-02"})), Some("storage"));
        assert_eq!(c.classify(&json!({"type": "server"})), None);
        assert_eq!(c.classify(&json!({"kind": "server"})), Some(SERVER));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let config = ClassifierConfig {
            patterns: vec![PatternConfig {
                pattern: "(".to_string(),
                asset_type: "x".to_string(),
            }],
            ..Default::default()
        };
        assert!(matches!(TypeClassifier::from_config(&config), Err(CsigError::Config(_))));
    }

    #[test]
    fn test_truthiness() {
        for v in [json!(true), json!(1), json!("enabled"), json!("Yes"), json!([0]), json!({"a": 1})] {
            assert!(is_truthy(&v), "{} should be truthy", v);
        }
        for v in [json!(false), json!(0), json!("false"), json!(" Off "), json!("disabled"), json!([]), json!(null)] {
            assert!(!is_truthy(&v), "{} should be falsy", v);
        }
    }

    #[test]
    fn test_locate_assets() {
        let bare = json!([{"id": 1}]);
        assert_eq!(locate_assets(&bare, &DEFAULT_ASSET_KEYS).map(Vec::len), Some(1));

        let wrapped = json!({"count": 2, "computers": [{"id": 1}, {"id": 2}]});
        assert_eq!(locate_assets(&wrapped, &DEFAULT_ASSET_KEYS).map(Vec::len), Some(2));

        let scalar = json!({"value": "n/a"});
        assert!(locate_assets(&scalar, &DEFAULT_ASSET_KEYS).is_none());
    }

    #[test]
    fn test_asset_record_access() {
        let v = json!({"health": {"status": "good"}, "encrypted": "true"});
        let asset = AssetRecord::new(&v).unwrap().with_type(Some(COMPUTER));
        assert_eq!(asset.str_field("health.status"), Some("good"));
        assert!(asset.is_truthy("encrypted"));
        assert!(!asset.is_truthy("missing"));
        assert_eq!(asset.asset_type(), Some(COMPUTER));
        assert!(AssetRecord::new(&json!(5)).is_none());
    }
}
