//! `return expr` in functions without a result
//!
//! The correction splits the statement into the expression followed by a
//! bare `return`, and only applies when the return ends its block.

use lintel_core::cst::ast::{AstNode, CodeBlockItem, FunctionDecl, ReturnStmt};
use lintel_core::cst::{SyntaxKind, SyntaxNode, make};
use lintel_core::source::offset;
use lintel_core::{
    ConfigurableRule, Correction, CorrectionExample, Example, KindSet, NodeId, NoOptions,
    ReasonedViolation, Result, Rewriter, Rule, RuleDescription, RuleKind, Severity, SourceFile,
    SyntaxVisitor, VisitControl, ViolationCollector, ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;

pub const IDENTIFIER: &str = "discouraged_void_return";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Discouraged Void Return",
    description: "Functions without a return type should not return an expression",
    kind: RuleKind::Style,
    default_severity: Severity::Warning,
    opt_in: true,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("func f() -> Bool { return true }"),
        Example::new("func f() -> Bool { true }"),
        Example::new("func f() -> Void { g() }"),
        Example::new("func f() -> () { g() }"),
        Example::new("func f() { g() }"),
        Example::new("func f() { { return g() }() }"),
        Example::new("func f() {\n    func g() -> Int {\n        return 1\n    }\n}"),
        Example::new("init?() { return nil }"),
        Example::new("func f() {\n    var i: Int { return 1 }\n}"),
        Example::new("func f() { return }"),
        Example::new("protocol P {\n    func f()\n}"),
    ],
    triggering_examples: vec![
        Example::new("func f() -> Void { ↓return g() }"),
        Example::new("func f() -> () { ↓return g() }"),
        Example::new("func f() { ↓return g() }"),
        Example::new("func f(b: Bool) {\n    if b {\n        ↓return g()\n    }\n}"),
        Example::new("func f() {\n    func g() -> Int {\n        return 1\n    }\n    ↓return h()\n}"),
    ],
    corrections: vec![
        CorrectionExample::new(
            "func f() -> Void {\n    ↓return g()\n    // some comment\n}",
            "func f() -> Void {\n    g()\n    return\n    // some comment\n}",
        ),
        CorrectionExample::new(
            "func f(b: Bool) {\n    if b {\n        // some comment\n        ↓return g()\n    }\n}",
            "func f(b: Bool) {\n    if b {\n        // some comment\n        g()\n        return\n    }\n}",
        ),
    ],
});

#[derive(Debug, Default)]
pub struct DiscouragedVoidReturn;

impl Rule for DiscouragedVoidReturn {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::new(file))
    }

    fn make_rewriter<'a>(&'a self, file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
        Some(Box::new(Visitor::new(file)))
    }

    fn is_correctable(&self) -> bool {
        true
    }
}

impl ConfigurableRule for DiscouragedVoidReturn {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        parse_options::<NoOptions>(IDENTIFIER, options)?;
        Ok(Self)
    }
}

/// Whether a function declares no result, `Void` or `()`
fn returns_void(func: &FunctionDecl) -> bool {
    let Some(ty) = func.signature().and_then(|signature| signature.return_type()) else {
        return true;
    };
    let spelled: String = ty.text().to_string().split_whitespace().collect();
    match ty.kind() {
        SyntaxKind::IdentifierType => spelled == "Void",
        SyntaxKind::TupleType => spelled == "()",
        _ => false,
    }
}

/// Kinds that open a new result scope
fn scope_of(node: &SyntaxNode) -> Option<bool> {
    match node.kind() {
        SyntaxKind::FunctionDecl => FunctionDecl::cast(node.clone()).map(|func| returns_void(&func)),
        SyntaxKind::AccessorBlock | SyntaxKind::ClosureExpr | SyntaxKind::InitializerDecl => {
            Some(false)
        }
        _ => None,
    }
}

struct Visitor<'a> {
    file: &'a SourceFile,
    /// Innermost scope last, `true` when it returns `Void`
    returns_void_scope: Vec<bool>,
    violations: ViolationCollector,
    corrections: Vec<Correction>,
}

impl<'a> Visitor<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            returns_void_scope: Vec::new(),
            violations: ViolationCollector::new(),
            corrections: Vec::new(),
        }
    }

    /// `expr` on the return's line, then a bare `return` on the next
    fn split_return(&self, stmt: &ReturnStmt, position: usize) -> Option<Correction> {
        let item = stmt.syntax().parent().and_then(CodeBlockItem::cast)?;
        if item.semicolon().is_some() {
            return None;
        }
        let ends_block = item
            .syntax()
            .next_sibling()
            .is_none_or(|next| next.kind() != SyntaxKind::CodeBlockItem);
        if !ends_block {
            return None;
        }

        let expr = stmt.expr()?;
        let keyword = stmt.return_keyword()?;
        let mut replacement = vec![make::code_block_item(&expr)];
        replacement.extend(make::line_break(self.file.indentation_at(position)));
        replacement.push(make::node(
            SyntaxKind::CodeBlockItem,
            vec![make::node(
                SyntaxKind::ReturnStmt,
                vec![make::token(SyntaxKind::ReturnKw, keyword.text())],
            )],
        ));
        Some(Correction::replace(
            NodeId::of_node(item.syntax()),
            replacement,
            position,
        ))
    }
}

impl SyntaxVisitor for Visitor<'_> {
    fn skippable_declarations(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::ProtocolDecl])
    }

    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        if let Some(returns_void) = scope_of(node) {
            self.returns_void_scope.push(returns_void);
        }

        if let Some(stmt) = ReturnStmt::cast(node.clone())
            && stmt.expr().is_some()
            && self.returns_void_scope.last() == Some(&true)
        {
            let position = offset(node.text_range().start());
            self.violations.append(position);
            if let Some(correction) = self.split_return(&stmt, position) {
                self.corrections.push(correction);
            }
        }
        VisitControl::Continue
    }

    fn visit_post(&mut self, node: &SyntaxNode) {
        if scope_of(node).is_some() {
            self.returns_void_scope.pop();
        }
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

    #[test]
    fn test_return_in_middle_of_block_is_reported_but_not_corrected() {
        let file = SourceFile::parse("func f(b: Bool) {\n    if b {\n        return g()\n    }\n    h()\n}");
        let rule = DiscouragedVoidReturn;
        assert_eq!(rule.validate(&file, WalkOptions::default()).len(), 1);

        let inner = SourceFile::parse("func f() {\n    return g()\n    h()\n}");
        assert_eq!(rule.validate(&inner, WalkOptions::default()).len(), 1);
        assert!(rule.propose_corrections(&inner, WalkOptions::default()).is_empty());
    }

    #[test]
    fn test_split_keeps_indentation() {
        let file = SourceFile::parse("func f() {\n  return g()\n}");
        let corrections = DiscouragedVoidReturn.propose_corrections(&file, WalkOptions::default());
        let (fixed, result) = CorrectionEngine::new()
            .apply_to_file(&file, corrections)
            .unwrap();
        assert_eq!(fixed.text(), "func f() {\n  g()\n  return\n}");
        assert_eq!(result.applied_positions(), vec![13]);
        assert!(DiscouragedVoidReturn.validate(&fixed, WalkOptions::default()).is_empty());
    }
}
