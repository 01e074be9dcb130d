//! Position model and traversal over a realistic source file

use lintel_core::cst::{SyntaxKind, SyntaxNode, SyntaxToken};
use lintel_core::{KindSet, SourceFile, SyntaxVisitor, VisitControl, WalkOptions, walk};

const SOURCE: &str = r#"import UIKit

/// Picture import screen
final class ImportController: UIViewController {
    @IBOutlet weak var label: UILabel?
    private var images: [UIImage]? = nil

    func load() {
        service.fetch { [weak self] result in
            self?.apply(result)
        }
    }
}

enum PictureImport {
    case add(image: UIImage)
#if DEBUG
    case debug
#endif
}

protocol Loader {
    func load()
}
"#;

#[test]
fn test_tree_is_lossless() {
    let file = SourceFile::parse(SOURCE);
    assert_eq!(file.syntax().text().to_string(), SOURCE);
}

#[test]
fn test_child_ranges_nest_in_order() {
    let file = SourceFile::parse(SOURCE);
    for node in file.syntax().descendants() {
        let range = node.text_range();
        let mut previous_end = range.start();
        for child in node.children_with_tokens() {
            let child_range = child.text_range();
            assert!(child_range.start() >= previous_end, "{:?} overlaps a sibling", child);
            assert!(range.contains_range(child_range), "{:?} escapes {:?}", child, node);
            previous_end = child_range.end();
        }
    }
}

#[test]
fn test_nodes_start_at_significant_tokens() {
    let file = SourceFile::parse(SOURCE);
    for node in file.syntax().descendants().skip(1) {
        if let Some(first) = node.first_token() {
            assert!(!first.kind().is_trivia(), "{:?} starts with trivia", node);
        }
    }
}

#[test]
fn test_line_columns() {
    let file = SourceFile::parse(SOURCE);
    let weak = SOURCE.find("weak").unwrap();
    let location = file.line_col(weak);
    assert_eq!((location.line, location.column), (5, 15));

    let mut previous = 0;
    for offset in 0..SOURCE.len() {
        let line = file.line_index().line_of(offset);
        assert!(line >= previous);
        previous = line;
    }
}

#[test]
fn test_parent_lookup() {
    let file = SourceFile::parse(SOURCE);
    let closure = file
        .syntax()
        .descendants()
        .find(|n| n.kind() == SyntaxKind::ClosureExpr)
        .unwrap();
    assert!(file.is_inside(&closure, SyntaxKind::ClassDecl));
    assert!(!file.is_inside(&closure, SyntaxKind::EnumDecl));
}

#[derive(Default)]
struct Recorder {
    skip: KindSet,
    entered: Vec<SyntaxKind>,
    exited: Vec<SyntaxKind>,
    token_offsets: Vec<usize>,
}

impl SyntaxVisitor for Recorder {
    fn skippable_declarations(&self) -> KindSet {
        self.skip
    }

    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        self.entered.push(node.kind());
        VisitControl::Continue
    }

    fn visit_post(&mut self, node: &SyntaxNode) {
        self.exited.push(node.kind());
    }

    fn visit_token(&mut self, token: &SyntaxToken) {
        self.token_offsets.push(token.text_range().start().into());
    }
}

#[test]
fn test_walk_visits_tokens_in_document_order() {
    let file = SourceFile::parse(SOURCE);
    let mut recorder = Recorder::default();
    walk(&mut recorder, &file.syntax(), WalkOptions::default());

    assert!(recorder.token_offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(recorder.entered.len(), recorder.exited.len());
    assert_eq!(recorder.exited.last(), Some(&SyntaxKind::SourceFile));
}

#[test]
fn test_skippable_declarations_prune_only_when_enabled() {
    let file = SourceFile::parse(SOURCE);
    let entered_kinds = |options| {
        let mut recorder = Recorder {
            skip: KindSet::of(&[SyntaxKind::ClassDecl]),
            ..Recorder::default()
        };
        walk(&mut recorder, &file.syntax(), options);
        recorder.entered
    };

    let pruned = entered_kinds(WalkOptions::default());
    let full = entered_kinds(WalkOptions::without_pruning());
    assert!(pruned.contains(&SyntaxKind::ClassDecl));
    assert!(!pruned.contains(&SyntaxKind::ClosureExpr));
    assert!(full.contains(&SyntaxKind::ClosureExpr));
}
