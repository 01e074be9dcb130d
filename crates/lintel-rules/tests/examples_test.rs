//! Replays the example corpus of every built-in rule

use lintel_rules::BUILTIN_RULES;
use lintel_test::verify_rule;

#[test]
fn test_builtin_rule_examples() {
    let failures: Vec<String> = BUILTIN_RULES
        .iter()
        .filter_map(|factory| {
            verify_rule(factory).err().map(|err| {
                format!("{}: {err:#}", (factory.description)().identifier)
            })
        })
        .collect();
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_every_rule_has_examples() {
    for description in lintel_rules::descriptors() {
        assert!(
            !description.triggering_examples.is_empty(),
            "{} has no triggering examples",
            description.identifier
        );
        assert!(
            !description.non_triggering_examples.is_empty(),
            "{} has no non-triggering examples",
            description.identifier
        );
    }
}

#[test]
fn test_rule_listing() {
    let listing: Vec<String> = lintel_rules::descriptors()
        .into_iter()
        .map(|description| {
            let mut line = format!(
                "{} {} {}",
                description.identifier,
                description.kind.as_str(),
                description.default_severity
            );
            if description.opt_in {
                line.push_str(" opt-in");
            }
            line
        })
        .collect();
    insta::assert_yaml_snapshot!(listing, @r"
    - discouraged_direct_init lint warning
    - discouraged_void_return style warning opt-in
    - duplicate_enum_cases lint error
    - private_unit_test lint warning
    - redundant_optional_initialization idiomatic warning
    - strong_iboutlet lint warning opt-in
    - trailing_semicolon idiomatic warning
    - unowned_variable_capture lint warning
    ");
}
