//! Constructors for green tree fragments
//!
//! Corrections replace nodes with freshly built green elements. Fragments
//! are either assembled from tokens directly or parsed from a snippet and
//! lifted out of the resulting tree.

use rowan::{GreenNode, GreenToken, NodeOrToken};

use super::{SyntaxKind, SyntaxNode, parse};
use crate::error::LintelError;
use crate::result::Result;

/// A green node or token
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

pub fn token(kind: SyntaxKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

pub fn whitespace(text: &str) -> GreenElement {
    token(SyntaxKind::Whitespace, text)
}

pub fn newline() -> GreenElement {
    token(SyntaxKind::Newline, "\n")
}

pub fn node(kind: SyntaxKind, children: Vec<GreenElement>) -> GreenElement {
    NodeOrToken::Node(GreenNode::new(kind.into(), children))
}

/// Green element of an existing red node
pub fn from_syntax(node: &SyntaxNode) -> GreenElement {
    NodeOrToken::Node(node.green().into_owned())
}

/// Wrap an existing statement or expression in a `CodeBlockItem`
pub fn code_block_item(item: &SyntaxNode) -> GreenElement {
    node(SyntaxKind::CodeBlockItem, vec![from_syntax(item)])
}

/// A line break followed by `indent`
pub fn line_break(indent: &str) -> Vec<GreenElement> {
    let mut elements = vec![newline()];
    if !indent.is_empty() {
        elements.push(whitespace(indent));
    }
    elements
}

/// Parse `source` and return the first node of `kind`
///
/// Fails if the snippet does not parse cleanly.
pub fn parse_node(source: &str, kind: SyntaxKind) -> Result<GreenElement> {
    let parsed = parse(source);
    if let Some(error) = parsed.errors().first() {
        return Err(LintelError::parse_error(format!(
            "snippet {source:?}: {}",
            error.message
        )));
    }
    parsed
        .syntax()
        .descendants()
        .find(|node| node.kind() == kind)
        .map(|node| from_syntax(&node))
        .ok_or_else(|| LintelError::parse_error(format!("snippet {source:?} has no {kind:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_built_fragment_text() {
        let element = node(
            SyntaxKind::CodeBlockItem,
            vec![node(
                SyntaxKind::ReturnStmt,
                vec![token(SyntaxKind::ReturnKw, "return")],
            )],
        );
        let text = match element {
            NodeOrToken::Node(green) => SyntaxNode::new_root(green).text().to_string(),
            NodeOrToken::Token(_) => unreachable!(),
        };
        assert_eq!(text, "return");
    }

    #[test]
    fn test_parse_node_lifts_fragment() {
        let Ok(NodeOrToken::Node(green)) =
            parse_node("var x: Int? = nil", SyntaxKind::InitializerClause)
        else {
            panic!("expected an initializer clause");
        };
        assert_eq!(SyntaxNode::new_root(green).text(), "= nil");
        let err = parse_node("var x: = ", SyntaxKind::InitializerClause).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(parse_node("let x = 1", SyntaxKind::ClassDecl).is_err());
    }
}
