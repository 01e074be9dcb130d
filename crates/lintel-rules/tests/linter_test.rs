//! End-to-end runs of the built-in rule set

use lintel_core::{ErrorKind, LintOutcome, LinterConfiguration, RuleConfig, SourceFile};
use lintel_rules::linter;

fn render(outcome: &LintOutcome) -> String {
    if outcome.violations.is_empty() {
        return "clean".to_string();
    }
    outcome
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_duplicate_enum_cases_are_errors() {
    let file = SourceFile::parse(
        "enum PictureImport {\n    case add(image: UIImage)\n    case addURL(url: URL)\n    case add(data: Data)\n}",
    );
    let outcome = linter(&LinterConfiguration::default()).unwrap().lint(&file);
    assert_eq!(outcome.error_count(), 2);
    insta::assert_snapshot!(render(&outcome), @r"
    2:10: error: Enum shouldn't contain multiple cases with the same name (duplicate_enum_cases)
    4:10: error: Enum shouldn't contain multiple cases with the same name (duplicate_enum_cases)
    ");
}

#[test]
fn test_unowned_capture_offset() {
    let file = SourceFile::parse("foo { [unowned self] in bar() }");
    let outcome = linter(&LinterConfiguration::default()).unwrap().lint(&file);
    let found: Vec<_> = outcome
        .violations
        .iter()
        .map(|v| (v.rule_id.as_str(), v.offset))
        .collect();
    assert_eq!(found, vec![("unowned_variable_capture", 7)]);
}

#[test]
fn test_opt_in_rule_fix() {
    let config = LinterConfiguration::new().with_rule("strong_iboutlet", RuleConfig::enabled());
    let file = SourceFile::parse("@IBOutlet weak var label: UILabel?");

    let before = linter(&config).unwrap().lint(&file);
    assert_eq!(before.violations.len(), 1);
    assert_eq!(before.violations[0].offset, 10);

    let outcome = linter(&config).unwrap().fix(&file).unwrap();
    assert_eq!(outcome.corrected, "@IBOutlet var label: UILabel?");
    assert_eq!(outcome.applied_offsets(), vec![10]);
    assert!(outcome.remaining.is_clean());

    let default_outcome = linter(&LinterConfiguration::default()).unwrap().fix(&file).unwrap();
    assert!(!default_outcome.is_changed());
}

#[test]
fn test_corrections_of_several_rules_in_one_pass() {
    let file = SourceFile::parse("var a: Int? = nil;\nlet b = 1;\n");
    let outcome = linter(&LinterConfiguration::default()).unwrap().fix(&file).unwrap();

    assert_eq!(outcome.iterations, 1);
    let applied: Vec<_> = outcome
        .applied
        .iter()
        .map(|c| format!("{} {}", c.offset, c.rule_id))
        .collect();
    insta::assert_snapshot!(applied.join("\n"), @r"
    11 redundant_optional_initialization
    17 trailing_semicolon
    28 trailing_semicolon
    ");
    assert_eq!(outcome.corrected, "var a: Int?\nlet b = 1\n");
}

#[test]
fn test_disable_next_line() {
    let file = SourceFile::parse(
        "// lintel:disable:next trailing_semicolon\nlet a = 0;\nlet b = 0;\n",
    );
    let outcome = linter(&LinterConfiguration::default()).unwrap().lint(&file);
    let lines: Vec<_> = outcome.violations.iter().map(|v| v.location.line).collect();
    assert_eq!(lines, vec![3]);

    let fixed = linter(&LinterConfiguration::default()).unwrap().fix(&file).unwrap();
    assert_eq!(
        fixed.corrected,
        "// lintel:disable:next trailing_semicolon\nlet a = 0;\nlet b = 0\n"
    );
}

#[test]
fn test_severity_override_and_disable() {
    let config = LinterConfiguration::from_json_str(
        r#"{
            "rules": {
                "trailing_semicolon": { "severity": "error" },
                "duplicate_enum_cases": { "enabled": false }
            }
        }"#,
    )
    .unwrap();
    let file = SourceFile::parse("enum A { case a, a }\nlet x = 1;\n");
    let outcome = linter(&config).unwrap().lint(&file);
    insta::assert_snapshot!(render(&outcome), @"2:10: error: Lines should not have trailing semicolons (trailing_semicolon)");
}

#[test]
fn test_malformed_options_fail_closed() {
    let config = LinterConfiguration::from_toml_str(
        r#"
        [rules.discouraged_direct_init]
        types = "Bundle"
        "#,
    )
    .unwrap();
    let err = linter(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.rule_id(), Some("discouraged_direct_init"));
}

#[test]
fn test_configured_rule_options() {
    let config = LinterConfiguration::new().with_rule(
        "private_unit_test",
        RuleConfig::default().with_option("test_parent_classes", serde_json::json!(["MySpec"])),
    );
    let file = SourceFile::parse("private class FooSpec: MySpec {}\nprivate class FooTest: XCTestCase {}\n");
    let outcome = linter(&config).unwrap().lint(&file);
    let offsets: Vec<_> = outcome.violations.iter().map(|v| v.offset).collect();
    assert_eq!(offsets, vec![8]);
}

#[test]
fn test_many_files_keep_input_order() {
    let files = vec![
        SourceFile::parse("let a = 1;\n").with_path("a.swift"),
        SourceFile::parse("let b = 1\n").with_path("b.swift"),
        SourceFile::parse("foo { [unowned self] in }\n").with_path("c.swift"),
    ];
    let outcomes = linter(&LinterConfiguration::default())
        .unwrap()
        .lint_many(&files);
    let rendered: Vec<_> = outcomes.iter().map(render).collect();
    insta::assert_snapshot!(rendered.join("\n---\n"), @r"
    a.swift:1:10: warning: Lines should not have trailing semicolons (trailing_semicolon)
    ---
    clean
    ---
    c.swift:1:8: warning: Prefer capturing references as weak to avoid potential crashes (unowned_variable_capture)
    ");
}

#[test]
fn test_deeply_nested_file_keeps_the_batch_running() {
    let deep = format!("let a = {}1{};\n", "(".repeat(5000), ")".repeat(5000));
    let files = vec![SourceFile::parse(deep), SourceFile::parse("let b = 1;\n")];
    let outcomes = linter(&LinterConfiguration::default())
        .unwrap()
        .lint_many(&files);
    assert_eq!(outcomes.len(), 2);
    let offsets: Vec<_> = outcomes[1].violations.iter().map(|v| v.offset).collect();
    assert_eq!(offsets, vec![9]);
}

#[test]
fn test_fix_reaches_corrections_unlocked_by_an_earlier_pass() {
    let config =
        LinterConfiguration::new().with_rule("discouraged_void_return", RuleConfig::enabled());
    // The return is split only once its semicolon is gone
    let file = SourceFile::parse("a();\nfunc f() {\n    return g();\n}\n");
    let outcome = linter(&config).unwrap().fix(&file).unwrap();

    assert_eq!(outcome.corrected, "a()\nfunc f() {\n    g()\n    return\n}\n");
    assert_eq!(outcome.iterations, 2);
    let applied: Vec<_> = outcome
        .applied
        .iter()
        .map(|c| (c.rule_id.as_str(), c.offset))
        .collect();
    assert_eq!(
        applied,
        vec![
            ("trailing_semicolon", 3),
            ("discouraged_void_return", 20),
            ("trailing_semicolon", 30),
        ]
    );
    assert!(outcome.remaining.is_clean());
}
