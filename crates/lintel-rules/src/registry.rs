//! Registry of built-in rules

use lintel_core::{
    LintelError, LinterConfiguration, Linter, Result, Rule, RuleDescription, RuleFactory,
};

use crate::builtin::{
    DiscouragedDirectInit, DiscouragedVoidReturn, DuplicateEnumCases, PrivateUnitTest,
    RedundantOptionalInitialization, StrongIBOutlet, TrailingSemicolon, UnownedVariableCapture,
};

/// Every built-in rule, ordered by identifier
pub static BUILTIN_RULES: &[RuleFactory] = &[
    RuleFactory::of::<DiscouragedDirectInit>(),
    RuleFactory::of::<DiscouragedVoidReturn>(),
    RuleFactory::of::<DuplicateEnumCases>(),
    RuleFactory::of::<PrivateUnitTest>(),
    RuleFactory::of::<RedundantOptionalInitialization>(),
    RuleFactory::of::<StrongIBOutlet>(),
    RuleFactory::of::<TrailingSemicolon>(),
    RuleFactory::of::<UnownedVariableCapture>(),
];

pub fn all() -> &'static [RuleFactory] {
    BUILTIN_RULES
}

/// Descriptions of all built-in rules, sorted by identifier
pub fn descriptors() -> Vec<&'static RuleDescription> {
    let mut descriptions: Vec<_> = BUILTIN_RULES
        .iter()
        .map(|factory| (factory.description)())
        .collect();
    descriptions.sort_by_key(|description| description.identifier);
    descriptions
}

/// Factory of the rule answering to `id`, deprecated aliases included
pub fn factory(id: &str) -> Result<&'static RuleFactory> {
    BUILTIN_RULES
        .iter()
        .find(|factory| (factory.description)().answers_to(id))
        .ok_or_else(|| LintelError::unknown_rule(id))
}

/// Build one rule from its rule-specific options
pub fn build(id: &str, options: &serde_json::Value) -> Result<Box<dyn Rule>> {
    let factory = factory(id)?;
    (factory.build)(options)
}

/// Linter running the built-in rules selected by `config`
pub fn linter(config: &LinterConfiguration) -> Result<Linter> {
    Linter::new(BUILTIN_RULES, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_identifiers_are_unique_and_sorted() {
        let ids: Vec<_> = descriptors().iter().map(|d| d.identifier).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), BUILTIN_RULES.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            factory("trailing_semicolon").unwrap().build_default().unwrap().identifier(),
            "trailing_semicolon"
        );
        let err = factory("no_such_rule").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownRule);
    }

    #[test]
    fn test_build_with_options() {
        assert!(build("discouraged_direct_init", &json!({ "types": ["Foo"] })).is_ok());
        assert!(build("discouraged_direct_init", &json!({ "types": 3 })).is_err());
    }

    #[test]
    fn test_default_selection_skips_opt_in_rules() {
        let linter = linter(&LinterConfiguration::default()).unwrap();
        let selected: Vec<_> = linter.rules().iter().map(|r| r.rule().identifier()).collect();
        assert!(!selected.contains(&"strong_iboutlet"));
        assert!(!selected.contains(&"discouraged_void_return"));
        assert_eq!(selected.len(), BUILTIN_RULES.len() - 2);
    }
}
