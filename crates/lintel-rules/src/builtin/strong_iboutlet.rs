//! Strong `@IBOutlet` references

use lintel_core::cst::ast::{AstNode, HasModifiers, Modifier, VariableDecl};
use lintel_core::cst::{SyntaxKind, SyntaxNode};
use lintel_core::source::offset;
use lintel_core::{
    AdjacentTrivia, ConfigurableRule, Correction, CorrectionExample, Example, NodeId, NoOptions,
    ReasonedViolation, Result, Rewriter, Rule, RuleDescription, RuleKind, Severity, SourceFile,
    SyntaxVisitor, VisitControl, ViolationCollector, ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;

pub const IDENTIFIER: &str = "strong_iboutlet";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Strong IBOutlet",
    description: "@IBOutlets shouldn't be declared as weak",
    kind: RuleKind::Lint,
    default_severity: Severity::Warning,
    opt_in: true,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("class ViewController: UIViewController {\n    @IBOutlet var label: UILabel?\n}"),
        Example::new("class ViewController: UIViewController {\n    weak var label: UILabel?\n}"),
        Example::new("@IBAction func tap() {}"),
    ],
    triggering_examples: vec![
        Example::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓weak var label: UILabel?\n}",
        ),
        Example::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓unowned var label: UILabel!\n}",
        ),
        Example::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓weak var textField: UITextField?\n}",
        ),
    ],
    corrections: vec![
        CorrectionExample::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓weak var label: UILabel?\n}",
            "class ViewController: UIViewController {\n    @IBOutlet var label: UILabel?\n}",
        ),
        CorrectionExample::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓unowned var label: UILabel!\n}",
            "class ViewController: UIViewController {\n    @IBOutlet var label: UILabel!\n}",
        ),
        CorrectionExample::new(
            "class ViewController: UIViewController {\n    @IBOutlet ↓weak var textField: UITextField?\n}",
            "class ViewController: UIViewController {\n    @IBOutlet var textField: UITextField?\n}",
        ),
    ],
});

#[derive(Debug, Default)]
pub struct StrongIBOutlet;

impl Rule for StrongIBOutlet {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::default())
    }

    fn make_rewriter<'a>(&'a self, _file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
        Some(Box::new(Visitor::default()))
    }

    fn is_correctable(&self) -> bool {
        true
    }
}

impl ConfigurableRule for StrongIBOutlet {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        parse_options::<NoOptions>(IDENTIFIER, options)?;
        Ok(Self)
    }
}

/// The `weak` or `unowned` modifier of an outlet declaration
fn weak_outlet_modifier(node: &SyntaxNode) -> Option<Modifier> {
    let decl = VariableDecl::cast(node.clone())?;
    if !decl.has_attribute("IBOutlet") {
        return None;
    }
    decl.modifiers().find(|modifier| {
        matches!(
            modifier.kind(),
            Some(SyntaxKind::WeakKw | SyntaxKind::UnownedKw)
        )
    })
}

/// Detects and corrects in one walk; both outputs share the matches
#[derive(Default)]
struct Visitor {
    violations: ViolationCollector,
    corrections: Vec<Correction>,
}

impl SyntaxVisitor for Visitor {
    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        if let Some(modifier) = weak_outlet_modifier(node) {
            let position = offset(modifier.syntax().text_range().start());
            self.violations.append(position);
            self.corrections.push(Correction::remove(
                NodeId::of_node(modifier.syntax()),
                AdjacentTrivia::TrailingWhitespace,
                position,
            ));
        }
        VisitControl::Continue
    }
}

impl ViolationsVisitor for Visitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}

impl Rewriter for Visitor {
    fn into_corrections(self: Box<Self>) -> Vec<Correction> {
        self.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::{CorrectionEngine, WalkOptions};

    #[test]
    fn test_correction_drops_modifier_and_space() {
        let file = SourceFile::parse("@IBOutlet weak var label: UILabel?");
        let corrections = StrongIBOutlet.propose_corrections(&file, WalkOptions::default());
        let (fixed, result) = CorrectionEngine::new()
            .apply_to_file(&file, corrections)
            .unwrap();
        assert_eq!(fixed.text(), "@IBOutlet var label: UILabel?");
        assert_eq!(result.applied_positions(), vec![10]);
    }

    #[test]
    fn test_plain_weak_property_is_fine() {
        let file = SourceFile::parse("weak var delegate: Delegate?");
        assert!(StrongIBOutlet.validate(&file, WalkOptions::default()).is_empty());
    }
}
