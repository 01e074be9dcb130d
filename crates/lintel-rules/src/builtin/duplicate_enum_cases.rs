//! Duplicate enum case detection
//!
//! Reports every case element whose name is declared more than once in the
//! same enum. Cases in different branches of one `#if` block cannot be
//! active together and are not duplicates of each other.

use std::collections::HashMap;

use lintel_core::cst::ast::{AstNode, EnumCaseDecl, EnumDecl};
use lintel_core::cst::{SyntaxKind, SyntaxNode};
use lintel_core::{
    ConfigurableRule, Example, KindSet, NoOptions, ReasonedViolation, Result, Rule,
    RuleDescription, RuleKind, Severity, SourceFile, SyntaxVisitor, ViolationCollector,
    ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;

pub const IDENTIFIER: &str = "duplicate_enum_cases";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Duplicate Enum Cases",
    description: "Enum shouldn't contain multiple cases with the same name",
    kind: RuleKind::Lint,
    default_severity: Severity::Error,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new(
            "enum PictureImport {\n    case addImage(image: UIImage)\n    case addData(data: Data)\n}",
        ),
        Example::new("enum A {\n    case add(image: UIImage)\n}"),
        Example::new(
            "enum Tag: String {\n#if CONFIG_A\n    case value = \"CONFIG_A\"\n#elseif CONFIG_B\n    case value = \"CONFIG_B\"\n#else\n    case value = \"CONFIG_DEFAULT\"\n#endif\n}",
        ),
        Example::new("enum Outer {\n    case a\n    enum Inner {\n        case a\n    }\n}"),
        Example::new("protocol P {\n    func add()\n    func add(x: Int)\n}"),
    ],
    triggering_examples: vec![
        Example::new(
            "enum PictureImport {\n    case ↓add(image: UIImage)\n    case addURL(url: URL)\n    case ↓add(data: Data)\n}",
        ),
        Example::new("enum E { case ↓add(x: Int); case other; case ↓add(y: Int) }"),
        Example::new("enum Direction {\n    case ↓up, down, ↓up\n}"),
        Example::new(
            "enum Tag: String {\n    case ↓value\n#if DEBUG\n    case ↓value\n#endif\n}",
        ),
    ],
    corrections: vec![],
});

#[derive(Debug, Default)]
pub struct DuplicateEnumCases;

impl Rule for DuplicateEnumCases {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::default())
    }
}

impl ConfigurableRule for DuplicateEnumCases {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        parse_options::<NoOptions>(IDENTIFIER, options)?;
        Ok(Self)
    }
}

#[derive(Default)]
struct Visitor {
    violations: ViolationCollector,
}

impl SyntaxVisitor for Visitor {
    fn skippable_declarations(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::ProtocolDecl])
    }

    fn visit_post(&mut self, node: &SyntaxNode) {
        let Some(decl) = EnumDecl::cast(node.clone()) else {
            return;
        };
        let cases = collect_cases(&decl);

        let mut by_name: HashMap<&str, Vec<&Case>> = HashMap::new();
        for case in &cases {
            by_name.entry(case.name.as_str()).or_default().push(case);
        }

        let mut positions: Vec<usize> = cases
            .iter()
            .filter(|case| {
                by_name[case.name.as_str()]
                    .iter()
                    .any(|other| other.position != case.position && !case.excludes(other))
            })
            .map(|case| case.position)
            .collect();
        positions.sort_unstable();
        self.violations.extend(positions);
    }
}

impl ViolationsVisitor for Visitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}

/// A case element and the `#if` branches it is declared in
struct Case {
    name: String,
    position: usize,
    /// (block, branch) pairs, outermost first
    branches: Vec<(usize, usize)>,
}

impl Case {
    /// Whether both cases sit in different branches of one `#if` block
    fn excludes(&self, other: &Case) -> bool {
        self.branches
            .iter()
            .zip(&other.branches)
            .any(|(a, b)| a.0 == b.0 && a.1 != b.1)
    }
}

fn collect_cases(decl: &EnumDecl) -> Vec<Case> {
    let Some(members) = decl
        .syntax()
        .children()
        .find(|n| n.kind() == SyntaxKind::MemberBlock)
    else {
        return Vec::new();
    };

    let mut cases = Vec::new();
    let mut branches: Vec<(usize, usize)> = Vec::new();
    let mut blocks = 0;
    for item in members.children().filter_map(|item| item.first_child()) {
        if item.kind() == SyntaxKind::IfConfigDirective {
            let directive = item
                .first_token()
                .map(|t| t.text().to_string())
                .unwrap_or_default();
            match directive.as_str() {
                "#if" => {
                    blocks += 1;
                    branches.push((blocks, 0));
                }
                "#elseif" | "#else" => {
                    if let Some(last) = branches.last_mut() {
                        last.1 += 1;
                    }
                }
                "#endif" => {
                    branches.pop();
                }
                _ => {}
            }
            continue;
        }

        let Some(case_decl) = EnumCaseDecl::cast(item) else {
            continue;
        };
        for element in case_decl.elements() {
            let (Some(name), Some(token)) = (element.name(), element.name_token()) else {
                continue;
            };
            cases.push(Case {
                name,
                position: token.text_range().start().into(),
                branches: branches.clone(),
            });
        }
    }
    cases
}
