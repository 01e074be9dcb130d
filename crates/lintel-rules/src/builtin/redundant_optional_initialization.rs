//! Redundant `= nil` on optional variables

use lintel_core::cst::ast::{AstNode, HasModifiers, PatternBinding, VariableDecl};
use lintel_core::cst::{SyntaxKind, SyntaxNode};
use lintel_core::source::offset;
use lintel_core::{
    AdjacentTrivia, ConfigurableRule, Correction, CorrectionExample, Example, NodeId,
    ReasonedViolation, Result, Rewriter, Rule, RuleDescription, RuleKind, Severity, SourceFile,
    SyntaxVisitor, VisitControl, ViolationCollector, ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub const IDENTIFIER: &str = "redundant_optional_initialization";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Redundant Optional Initialization",
    description: "Initializing an optional variable with nil is redundant",
    kind: RuleKind::Idiomatic,
    default_severity: Severity::Warning,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("var myVar: Int?"),
        Example::new("let myVar: Int? = nil"),
        Example::new("var myVar: Int? = 0"),
        Example::new("func foo(bar: Int? = 0) { }"),
        Example::new("var myVar: Optional<Int>"),
        Example::new("let myVar: Optional<Int> = nil"),
        Example::new("var myVar: Optional<Int> = 0"),
        Example::new("@Parameter static var someParameter: Bool? = nil"),
        Example::new("var foo: Int? {\n  if bar != nil { }\n  return 0\n}"),
        Example::new("var foo: Int? = {\n  if bar != nil { }\n  return 0\n}()"),
        Example::new("lazy var test: Int? = nil"),
        Example::new("func funcName() {\n  var myVar: String?\n}"),
        Example::new("func funcName() {\n  let myVar: String? = nil\n}"),
        Example::new("@State var selection: Int? = nil")
            .with_configuration(serde_json::json!({ "excluded_attribute_names": ["State"] })),
    ],
    triggering_examples: vec![
        Example::new("var myVar: Int?↓ = nil"),
        Example::new("var myVar: Optional<Int>↓ = nil"),
        Example::new("var myVar: Int?↓=nil"),
        Example::new("var myVar: String?↓ = nil {\n  didSet { print(\"didSet\") }\n}"),
        Example::new("func funcName() {\n    var myVar: String?↓ = nil\n}"),
        Example::new("@Parameter var someParameter: Bool?↓ = nil")
            .with_configuration(serde_json::json!({ "excluded_attribute_names": [] })),
    ],
    corrections: vec![
        CorrectionExample::new("var myVar: Int?↓ = nil", "var myVar: Int?"),
        CorrectionExample::new("var myVar: Optional<Int>↓ = nil", "var myVar: Optional<Int>"),
        CorrectionExample::new("var myVar: Int?↓=nil", "var myVar: Int?"),
        CorrectionExample::new("var myVar: Optional<Int>↓=nil", "var myVar: Optional<Int>"),
        CorrectionExample::new(
            "class C {\n#if true\nvar myVar: Int?↓ = nil\n#endif\n}",
            "class C {\n#if true\nvar myVar: Int?\n#endif\n}",
        ),
        CorrectionExample::new(
            "var myVar: Int?↓ = nil {\n    didSet { }\n}",
            "var myVar: Int? {\n    didSet { }\n}",
        ),
        CorrectionExample::new(
            "var myVar: Int?↓=nil{\n    didSet { }\n}",
            "var myVar: Int?{\n    didSet { }\n}",
        ),
        CorrectionExample::new(
            "func foo() {\n    var myVar: String?↓ = nil, b: Int\n}",
            "func foo() {\n    var myVar: String?, b: Int\n}",
        ),
    ],
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedundantOptionalInitializationOptions {
    /// Attributes whose variables keep their explicit `nil`
    pub excluded_attribute_names: Vec<String>,
}

impl Default for RedundantOptionalInitializationOptions {
    fn default() -> Self {
        Self {
            excluded_attribute_names: vec!["Parameter".to_string()],
        }
    }
}

#[derive(Debug, Default)]
pub struct RedundantOptionalInitialization {
    options: RedundantOptionalInitializationOptions,
}

impl RedundantOptionalInitialization {
    /// `var` declarations whose bindings may drop `= nil`
    fn is_candidate(&self, decl: &VariableDecl) -> bool {
        decl.is_var()
            && !decl.has_modifier(SyntaxKind::LazyKw)
            && !decl.attributes().any(|attribute| {
                attribute
                    .name()
                    .is_some_and(|name| self.options.excluded_attribute_names.contains(&name))
            })
    }
}

/// End of the optional type annotation of a binding initialized to `nil`
fn violation_position(binding: &PatternBinding) -> Option<usize> {
    let annotation = binding.type_annotation()?;
    let initializer = binding.initializer()?;
    let initializes_to_nil = initializer
        .value()
        .is_some_and(|value| value.kind() == SyntaxKind::NilLiteralExpr);
    (initializes_to_nil && annotation.is_optional())
        .then(|| offset(annotation.syntax().text_range().end()))
}

impl Rule for RedundantOptionalInitialization {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::new(self))
    }

    fn make_rewriter<'a>(&'a self, _file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
        Some(Box::new(Visitor::new(self)))
    }

    fn is_correctable(&self) -> bool {
        true
    }
}

impl ConfigurableRule for RedundantOptionalInitialization {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        Ok(Self {
            options: parse_options(IDENTIFIER, options)?,
        })
    }
}

struct Visitor<'a> {
    rule: &'a RedundantOptionalInitialization,
    violations: ViolationCollector,
    corrections: Vec<Correction>,
}

impl<'a> Visitor<'a> {
    fn new(rule: &'a RedundantOptionalInitialization) -> Self {
        Self {
            rule,
            violations: ViolationCollector::new(),
            corrections: Vec::new(),
        }
    }
}

impl SyntaxVisitor for Visitor<'_> {
    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        let Some(decl) = VariableDecl::cast(node.clone()) else {
            return VisitControl::Continue;
        };
        if !self.rule.is_candidate(&decl) {
            return VisitControl::Continue;
        }
        for binding in decl.bindings() {
            let (Some(position), Some(initializer)) =
                (violation_position(&binding), binding.initializer())
            else {
                continue;
            };
            self.violations.append(position);
            self.corrections.push(Correction::remove(
                NodeId::of_node(initializer.syntax()),
                AdjacentTrivia::LeadingWhitespace,
                position,
            ));
        }
        VisitControl::Continue
    }
}

impl ViolationsVisitor for Visitor<'_> {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}

impl Rewriter for Visitor<'_> {
    fn into_corrections(self: Box<Self>) -> Vec<Correction> {
        self.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::{CorrectionEngine, WalkOptions};
    use serde_json::json;

    #[test]
    fn test_every_nil_binding_is_reported() {
        let file = SourceFile::parse("var a: Int? = nil, b: String? = nil, c = 1");
        let positions: Vec<_> = RedundantOptionalInitialization::default()
            .validate(&file, WalkOptions::default())
            .into_iter()
            .map(|v| v.position)
            .collect();
        assert_eq!(positions, vec![11, 29]);
    }

    #[test]
    fn test_fix_keeps_other_bindings() {
        let file = SourceFile::parse("var a: Int? = nil, b: String? = nil");
        let rule = RedundantOptionalInitialization::default();
        let corrections = rule.propose_corrections(&file, WalkOptions::default());
        let (fixed, _) = CorrectionEngine::new()
            .apply_to_file(&file, corrections)
            .unwrap();
        assert_eq!(fixed.text(), "var a: Int?, b: String?");
    }

    #[test]
    fn test_excluded_attributes_replace_defaults() {
        let rule = RedundantOptionalInitialization::from_options(
            &json!({ "excluded_attribute_names": ["State"] }),
        )
        .unwrap();
        let file = SourceFile::parse("@Parameter var a: Int? = nil\n@State var b: Int? = nil");
        assert_eq!(rule.validate(&file, WalkOptions::default()).len(), 1);
    }
}
