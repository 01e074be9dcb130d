//! Tests for CST construction and the lossless property

use super::*;
use crate::cst::ast::{AstNode, ClassDecl, Decl, HasModifiers};
use rowan::GreenNodeBuilder;

const CORPUS: &str = r#"import Foundation
import UIKit.UIView

/// Documented type
@objc(MyController)
public final class MyController: UIViewController, UITableViewDelegate {
    @IBOutlet private weak var label: UILabel?
    private(set) lazy var items: [String: [Int]] = [:]
    static let shared = MyController()

    enum State: Int {
        case idle = 0, running
        indirect case nested(State)
    }

    init?(coder: NSCoder) {
        super.init(coder: coder)
    }

    deinit {}

    subscript(index: Int) -> String {
        get { return items.keys.sorted()[index] }
        set { }
    }

    override func viewDidLoad() {
        super.viewDidLoad()
        let handler: (Int) async throws -> Void = { [weak self, unowned(unsafe) delegate = self.delegate] value in
            guard let self = self else { return }
            self.label?.text = "\(value) items"
        }
        items.forEach { key, _ in print(key) }
        let total = items.values.map { $0.count }.reduce(0, +)
        if total > 0 && !items.isEmpty { print(total as Any) } else if let first = items.first { _ = first }
        #if DEBUG
        print("debug")
        #endif
        switch state {
        case .idle where total == 0, .running:
            break
        @unknown default:
            fallthrough
        }
    }
}

protocol Shape: AnyObject where Self: Equatable {
    associatedtype Unit
    func area() -> Double
    var sides: Int { get }
}

extension Array where Element == Int {
    func sum() -> Int { reduce(0, +) };
}
"#;

#[test]
fn test_corpus_is_lossless() {
    let parsed = parse(CORPUS);
    assert_eq!(parsed.syntax().text().to_string(), CORPUS);
}

#[test]
fn test_corpus_has_no_errors() {
    let parsed = parse(CORPUS);
    assert!(parsed.errors().is_empty(), "{:?}", parsed.errors());
}

#[test]
fn test_declaration_kinds_in_corpus() {
    let root = parse(CORPUS).syntax();
    let count = |kind: SyntaxKind| root.descendants().filter(|n| n.kind() == kind).count();

    assert_eq!(count(SyntaxKind::ImportDecl), 2);
    assert_eq!(count(SyntaxKind::ClassDecl), 1);
    assert_eq!(count(SyntaxKind::EnumDecl), 1);
    assert_eq!(count(SyntaxKind::EnumCaseElement), 3);
    assert_eq!(count(SyntaxKind::ProtocolDecl), 1);
    assert_eq!(count(SyntaxKind::ExtensionDecl), 1);
    assert_eq!(count(SyntaxKind::InitializerDecl), 1);
    assert_eq!(count(SyntaxKind::DeinitDecl), 1);
    assert_eq!(count(SyntaxKind::SubscriptDecl), 1);
    assert_eq!(count(SyntaxKind::AssociatedtypeDecl), 1);
    assert_eq!(count(SyntaxKind::ClosureCaptureSpecifier), 2);
    assert_eq!(count(SyntaxKind::IfConfigDirective), 2);
}

#[test]
fn test_class_header_in_corpus() {
    let root = parse(CORPUS).syntax();
    let class = root.descendants().find_map(ClassDecl::cast).expect("class");

    assert_eq!(class.name().as_deref(), Some("MyController"));
    assert!(class.has_attribute("objc"));
    assert!(class.has_modifier(SyntaxKind::PublicKw));
    assert!(class.has_modifier(SyntaxKind::FinalKw));
    assert_eq!(
        class.inherited_type_names(),
        vec!["UIViewController", "UITableViewDelegate"]
    );
    let functions = class
        .members()
        .filter(|decl| matches!(decl, Decl::Function(_)))
        .count();
    assert_eq!(functions, 1);
}

#[test]
fn test_every_node_range_is_trimmed() {
    let root = parse(CORPUS).syntax();
    for node in root.descendants().skip(1) {
        let Some(first) = node.first_token() else {
            continue;
        };
        assert!(
            !first.kind().is_trivia(),
            "{:?} starts with trivia {:?}",
            node.kind(),
            first.kind()
        );
    }
}

#[test]
fn test_hand_built_tree() {
    let mut builder = GreenNodeBuilder::new();
    builder.start_node(SyntaxKind::SourceFile.into());
    builder.start_node(SyntaxKind::CodeBlockItem.into());
    builder.start_node(SyntaxKind::ReturnStmt.into());
    builder.token(SyntaxKind::ReturnKw.into(), "return");
    builder.finish_node();
    builder.finish_node();
    builder.token(SyntaxKind::Newline.into(), "\n");
    builder.finish_node();

    let root = SyntaxNode::new_root(builder.finish());
    assert_eq!(root.kind(), SyntaxKind::SourceFile);
    assert_eq!(root.text().to_string(), "return\n");
    assert_eq!(
        root.first_child().and_then(|n| n.first_child()).map(|n| n.kind()),
        Some(SyntaxKind::ReturnStmt)
    );
}
