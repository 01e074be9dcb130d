//! Argument-less initializers of types that should come from a factory

use std::collections::HashSet;

use lintel_core::cst::SyntaxNode;
use lintel_core::cst::ast::{AstNode, FunctionCallExpr};
use lintel_core::source::offset;
use lintel_core::{
    ConfigurableRule, Example, ReasonedViolation, Result, Rule, RuleDescription, RuleKind,
    Severity, SourceFile, SyntaxVisitor, VisitControl, ViolationCollector, ViolationsVisitor,
    parse_options,
};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub const IDENTIFIER: &str = "discouraged_direct_init";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Discouraged Direct Initialization",
    description: "Discouraged direct initialization of types that can be harmful",
    kind: RuleKind::Lint,
    default_severity: Severity::Warning,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("let foo = UIDevice.current"),
        Example::new("let foo = Bundle.main"),
        Example::new("let foo = Bundle(path: \"bar\")"),
        Example::new("let foo = Bundle(identifier: \"bar\")"),
        Example::new("let foo = Bundle.init(path: \"bar\")"),
        Example::new("let foo = Bundle.init(identifier: \"bar\")"),
        Example::new("let foo = NSError(domain: \"bar\", code: 0)"),
        Example::new("let foo = NSError.init(domain: \"bar\", code: 0)"),
        Example::new("func testNSError()"),
        Example::new("let foo = Bundle { }"),
        Example::new("let foo = Bundle()")
            .with_configuration(serde_json::json!({ "types": ["UIDevice"] })),
    ],
    triggering_examples: vec![
        Example::new("↓UIDevice()"),
        Example::new("↓Bundle()"),
        Example::new("let foo = ↓UIDevice()"),
        Example::new("let foo = ↓Bundle()"),
        Example::new("let foo = ↓NSError()"),
        Example::new("let foo = bar(bundle: ↓Bundle(), device: ↓UIDevice(), error: ↓NSError())"),
        Example::new("↓UIDevice.init()"),
        Example::new("↓Bundle.init()"),
        Example::new("↓NSError.init()"),
        Example::new("let foo = ↓UIDevice.init()"),
        Example::new("let foo = ↓Bundle.init()"),
        Example::new(
            "let foo = bar(bundle: ↓Bundle.init(), device: ↓UIDevice.init(), error: ↓NSError.init())",
        ),
        Example::new("let foo = ↓URLSession()")
            .with_configuration(serde_json::json!({ "types": ["URLSession"] })),
    ],
    corrections: vec![],
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscouragedDirectInitOptions {
    /// Type names whose argument-less initializer is reported
    pub types: Vec<String>,
}

impl Default for DiscouragedDirectInitOptions {
    fn default() -> Self {
        Self {
            types: vec![
                "Bundle".to_string(),
                "NSError".to_string(),
                "UIDevice".to_string(),
            ],
        }
    }
}

#[derive(Debug)]
pub struct DiscouragedDirectInit {
    /// Configured names and their `.init` spellings
    callees: HashSet<String>,
}

impl DiscouragedDirectInit {
    pub fn new(options: DiscouragedDirectInitOptions) -> Self {
        let callees = options
            .types
            .iter()
            .flat_map(|ty| [ty.clone(), format!("{ty}.init")])
            .collect();
        Self { callees }
    }

    fn is_discouraged(&self, call: &FunctionCallExpr) -> bool {
        call.argument_count() == 0
            && call.trailing_closure().is_none()
            && call.arguments().is_some()
            && call
                .callee()
                .is_some_and(|callee| self.callees.contains(callee.text().to_string().trim()))
    }
}

impl Default for DiscouragedDirectInit {
    fn default() -> Self {
        Self::new(DiscouragedDirectInitOptions::default())
    }
}

impl Rule for DiscouragedDirectInit {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor {
            rule: self,
            violations: ViolationCollector::new(),
        })
    }
}

impl ConfigurableRule for DiscouragedDirectInit {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(parse_options(IDENTIFIER, options)?))
    }
}

struct Visitor<'a> {
    rule: &'a DiscouragedDirectInit,
    violations: ViolationCollector,
}

impl SyntaxVisitor for Visitor<'_> {
    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        if let Some(call) = FunctionCallExpr::cast(node.clone())
            && self.rule.is_discouraged(&call)
        {
            self.violations.append(offset(node.text_range().start()));
        }
        VisitControl::Continue
    }
}

impl ViolationsVisitor for Visitor<'_> {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::WalkOptions;
    use serde_json::json;

    fn count(rule: &DiscouragedDirectInit, source: &str) -> usize {
        rule.validate(&SourceFile::parse(source), WalkOptions::default())
            .len()
    }

    #[test]
    fn test_init_spelling_follows_configured_types() {
        let rule = DiscouragedDirectInit::from_options(&json!({ "types": ["Foo"] })).unwrap();
        assert_eq!(count(&rule, "let a = Foo()\nlet b = Foo.init()\nlet c = Bundle()"), 2);
    }

    #[test]
    fn test_types_must_be_a_list() {
        let err = DiscouragedDirectInit::from_options(&json!({ "types": "Bundle" })).unwrap_err();
        assert_eq!(err.rule_id(), Some(IDENTIFIER));
    }
}
