//! Error types and handling for lintel operations

use thiserror::Error;

/// Main error type for lintel operations
#[derive(Debug, Error)]
pub enum LintelError {
    /// A rule's configuration has the wrong shape
    #[error("Configuration error in '{rule_id}': {message}")]
    Config { rule_id: String, message: String },

    /// A rule identifier that no registered rule answers to
    #[error("Unknown rule '{rule_id}'")]
    UnknownRule { rule_id: String },

    /// A rule panicked or violated its own contract during a run
    #[error("Rule '{rule_id}' failed: {message}")]
    RuleFailed { rule_id: String, message: String },

    /// Corrections could not be applied to the tree
    #[error("Correction error: {0}")]
    Correction(String),

    /// Source text did not produce a usable tree
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration documents that are not valid JSON
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// Configuration documents that are not valid TOML
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    UnknownRule,
    Rule,
    Correction,
    Parse,
    Serde,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::UnknownRule => "unknown-rule",
            ErrorKind::Rule => "rule",
            ErrorKind::Correction => "correction",
            ErrorKind::Parse => "parse",
            ErrorKind::Serde => "serde",
            ErrorKind::Internal => "internal",
        }
    }
}

impl LintelError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LintelError::Config { .. } => ErrorKind::Config,
            LintelError::UnknownRule { .. } => ErrorKind::UnknownRule,
            LintelError::RuleFailed { .. } => ErrorKind::Rule,
            LintelError::Correction(_) => ErrorKind::Correction,
            LintelError::Parse(_) => ErrorKind::Parse,
            LintelError::Serde(_) | LintelError::Toml(_) => ErrorKind::Serde,
            LintelError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if processing of other rules or files can continue
    ///
    /// Configuration errors fail the whole run closed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Rule | ErrorKind::Correction | ErrorKind::Parse | ErrorKind::UnknownRule
        )
    }

    /// Create a configuration error for one rule
    pub fn config_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    pub fn unknown_rule(rule_id: impl Into<String>) -> Self {
        Self::UnknownRule {
            rule_id: rule_id.into(),
        }
    }

    /// Create a rule failure
    pub fn rule_failed(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleFailed {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    pub fn correction_error(message: impl Into<String>) -> Self {
        Self::Correction(message.into())
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Rule the error is attributed to, if any
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            LintelError::Config { rule_id, .. }
            | LintelError::UnknownRule { rule_id }
            | LintelError::RuleFailed { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LintelError::config_error("discouraged_direct_init", "unknown field `typs`");
        assert_eq!(
            err.to_string(),
            "Configuration error in 'discouraged_direct_init': unknown field `typs`"
        );
        assert_eq!(err.rule_id(), Some("discouraged_direct_init"));
        assert_eq!(err.kind().as_str(), "config");
    }

    #[test]
    fn test_configuration_errors_are_not_recoverable() {
        assert!(!LintelError::config_error("a", "b").is_recoverable());
        assert!(!LintelError::internal_error("x").is_recoverable());
        assert!(LintelError::rule_failed("a", "panicked").is_recoverable());
    }

    #[test]
    fn test_serde_conversion() {
        let err: LintelError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Serde);
    }
}
