//! Linter configuration
//!
//! A [`LinterConfiguration`] maps rule identifiers to [`RuleConfig`] entries.
//! Entries carry an optional enable flag and severity next to the rule's own
//! parameters, which stay untyped here and are deserialized by each rule into
//! its options struct with [`parse_options`].
//!
//! ```json
//! {
//!   "rules": {
//!     "strong_iboutlet": { "severity": "error" },
//!     "discouraged_direct_init": { "types": ["Bundle", "UIDevice"] }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LintelError;
use crate::result::Result;
use crate::violation::Severity;

/// Default cap on detect-then-correct passes in fix mode
pub const DEFAULT_MAX_CORRECTION_ITERATIONS: usize = 10;

/// Configured rule severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    /// Warning (doesn't fail build)
    #[serde(alias = "warn")]
    Warning,
    /// Error (fails build)
    Error,
}

impl RuleSeverity {
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Off => None,
            RuleSeverity::Warning => Some(Severity::Warning),
            RuleSeverity::Error => Some(Severity::Error),
        }
    }
}

/// Configuration entry of one rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Enable or disable the rule, opt-in rules included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<RuleSeverity>,

    /// Rule-specific parameters
    #[serde(flatten)]
    #[schemars(description = "Parameters specific to the rule")]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl RuleConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Default::default()
        }
    }

    pub fn with_severity(mut self, severity: RuleSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Whether the entry turns the rule off
    pub fn is_off(&self) -> bool {
        self.enabled == Some(false) || self.severity == Some(RuleSeverity::Off)
    }

    /// Rule-specific parameters as one JSON object, `null` when there are none
    pub fn options_value(&self) -> serde_json::Value {
        if self.options.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::Object(self.options.clone())
        }
    }
}

/// Linter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinterConfiguration {
    /// Per-rule entries, in document order
    #[serde(default)]
    #[schemars(description = "Rule configuration keyed by rule identifier")]
    pub rules: IndexMap<String, RuleConfig>,

    /// Cap on detect-then-correct passes in fix mode
    #[serde(default = "default_max_correction_iterations")]
    pub max_correction_iterations: usize,
}

fn default_max_correction_iterations() -> usize {
    DEFAULT_MAX_CORRECTION_ITERATIONS
}

impl Default for LinterConfiguration {
    fn default() -> Self {
        Self {
            rules: IndexMap::new(),
            max_correction_iterations: DEFAULT_MAX_CORRECTION_ITERATIONS,
        }
    }
}

impl LinterConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>, config: RuleConfig) -> Self {
        self.rules.insert(rule_id.into(), config);
        self
    }

    pub fn with_max_correction_iterations(mut self, iterations: usize) -> Self {
        self.max_correction_iterations = iterations;
        self
    }

    /// Entry for the first of `ids` that is configured
    ///
    /// Returns the identifier actually used alongside the entry, so callers
    /// can tell an alias from the current identifier.
    pub fn rule_entry<'a, 'id>(
        &'a self,
        ids: impl IntoIterator<Item = &'id str>,
    ) -> Option<(&'a str, &'a RuleConfig)> {
        ids.into_iter()
            .find_map(|id| self.rules.get_key_value(id))
            .map(|(id, config)| (id.as_str(), config))
    }

    /// JSON schema of the configuration format
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(LinterConfiguration))
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Options of a rule without parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}

/// Deserialize rule-specific options, failing closed on any shape mismatch
///
/// `null` yields the default options.
pub fn parse_options<T>(rule_id: &str, options: &serde_json::Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    T::deserialize(options).map_err(|err| LintelError::config_error(rule_id, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct TypesOptions {
        types: Vec<String>,
    }

    #[test]
    fn test_json_configuration() {
        let config = LinterConfiguration::from_json_str(
            r#"{
                "rules": {
                    "strong_iboutlet": { "severity": "warn" },
                    "trailing_semicolon": { "enabled": false },
                    "discouraged_direct_init": { "types": ["Bundle"] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_correction_iterations, DEFAULT_MAX_CORRECTION_ITERATIONS);
        assert_eq!(
            config.rules["strong_iboutlet"].severity,
            Some(RuleSeverity::Warning)
        );
        assert!(config.rules["trailing_semicolon"].is_off());
        assert_eq!(
            config.rules["discouraged_direct_init"].options_value(),
            json!({ "types": ["Bundle"] })
        );
        let keys: Vec<_> = config.rules.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["strong_iboutlet", "trailing_semicolon", "discouraged_direct_init"]
        );
    }

    #[test]
    fn test_toml_configuration() {
        let config = LinterConfiguration::from_toml_str(
            r#"
            maxCorrectionIterations = 3

            [rules.private_unit_test]
            severity = "error"

            [rules.duplicate_enum_cases]
            severity = "off"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_correction_iterations, 3);
        assert_eq!(
            config.rules["private_unit_test"].severity,
            Some(RuleSeverity::Error)
        );
        assert!(config.rules["duplicate_enum_cases"].is_off());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            LinterConfiguration::from_json_str("{ rules: "),
            Err(LintelError::Serde(_))
        ));
        assert!(matches!(
            LinterConfiguration::from_toml_str("rules = 3"),
            Err(LintelError::Toml(_))
        ));
    }

    #[test]
    fn test_parse_options() {
        let parsed: TypesOptions =
            parse_options("discouraged_direct_init", &json!({ "types": ["Bundle"] })).unwrap();
        assert_eq!(parsed.types, vec!["Bundle".to_string()]);

        let defaults: TypesOptions = parse_options("discouraged_direct_init", &json!(null)).unwrap();
        assert_eq!(defaults, TypesOptions::default());

        let err = parse_options::<TypesOptions>("discouraged_direct_init", &json!({ "typs": [] }))
            .unwrap_err();
        assert_eq!(err.rule_id(), Some("discouraged_direct_init"));
        assert!(err.to_string().contains("typs"));

        assert!(parse_options::<NoOptions>("trailing_semicolon", &json!({ "x": 1 })).is_err());
        assert!(parse_options::<NoOptions>("trailing_semicolon", &json!({})).is_ok());
    }

    #[test]
    fn test_rule_entry_prefers_first_configured_id() {
        let config = LinterConfiguration::new().with_rule("old_name", RuleConfig::enabled());
        let (id, entry) = config.rule_entry(["new_name", "old_name"]).unwrap();
        assert_eq!(id, "old_name");
        assert_eq!(entry.enabled, Some(true));
        assert!(config.rule_entry(["missing"]).is_none());
    }

    #[test]
    fn test_schema_mentions_rules() {
        let schema = LinterConfiguration::json_schema();
        assert!(schema.to_string().contains("maxCorrectionIterations"));
    }
}
