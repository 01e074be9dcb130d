//! Trivia handling for lintel syntax trees
//!
//! The parser attaches trivia (whitespace, newlines, comments) to the
//! enclosing node, so the trivia around a node are its sibling tokens:
//!
//! - **Leading trivia**: the run of trivia siblings directly before the element
//! - **Trailing trivia**: trivia siblings after the element, up to (not including)
//!   the next line break
//!
//! # Example
//!
//! ```rust
//! use lintel_core::cst::{parse, SyntaxKind, trivia::trailing_trivia};
//!
//! let root = parse("let a = 1 // one\nlet b = 2").syntax();
//! let item = root.first_child().unwrap();
//! let kinds: Vec<_> = trailing_trivia(&item.into()).iter().map(|t| t.kind).collect();
//! assert_eq!(kinds, vec![SyntaxKind::Whitespace, SyntaxKind::LineComment]);
//! ```

use rowan::{NodeOrToken, TextRange, TextSize};

use super::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// A single trivia token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub range: TextRange,
}

impl TriviaToken {
    pub fn from_token(token: &SyntaxToken) -> Self {
        Self {
            kind: token.kind(),
            text: token.text().to_string(),
            range: token.text_range(),
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == SyntaxKind::Whitespace
    }

    pub fn is_newline(&self) -> bool {
        self.kind == SyntaxKind::Newline
    }
}

/// Trivia surrounding a node or token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriviaInfo {
    pub leading: Vec<TriviaToken>,
    pub trailing: Vec<TriviaToken>,
}

impl TriviaInfo {
    pub fn of(element: &SyntaxElement) -> Self {
        Self {
            leading: leading_trivia(element),
            trailing: trailing_trivia(element),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }

    pub fn has_comments(&self) -> bool {
        self.leading
            .iter()
            .chain(&self.trailing)
            .any(TriviaToken::is_comment)
    }
}

fn as_trivia(element: SyntaxElement) -> Option<SyntaxToken> {
    element.into_token().filter(|token| token.kind().is_trivia())
}

/// Trivia siblings directly preceding `element`, in source order
pub fn leading_trivia(element: &SyntaxElement) -> Vec<TriviaToken> {
    let mut trivia: Vec<_> =
        std::iter::successors(element.prev_sibling_or_token(), |e| e.prev_sibling_or_token())
            .map_while(as_trivia)
            .map(|token| TriviaToken::from_token(&token))
            .collect();
    trivia.reverse();
    trivia
}

/// Trivia siblings following `element` on the same line
pub fn trailing_trivia(element: &SyntaxElement) -> Vec<TriviaToken> {
    std::iter::successors(element.next_sibling_or_token(), |e| e.next_sibling_or_token())
        .map_while(as_trivia)
        .take_while(|token| token.kind() != SyntaxKind::Newline)
        .map(|token| TriviaToken::from_token(&token))
        .collect()
}

/// Start of the first significant token inside `node`
pub fn position_after_skipping_leading_trivia(node: &SyntaxNode) -> TextSize {
    node.descendants_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .find(|token| !token.kind().is_trivia())
        .map_or_else(|| node.text_range().start(), |token| token.text_range().start())
}

/// End of the last significant token inside `node`
pub fn end_position_before_trailing_trivia(node: &SyntaxNode) -> TextSize {
    let mut token = node.last_token();
    while let Some(current) = token {
        if !current.kind().is_trivia() {
            return current.text_range().end();
        }
        if current.text_range().start() <= node.text_range().start() {
            break;
        }
        token = current.prev_token();
    }
    node.text_range().start()
}

/// Range of `node` without surrounding trivia
pub fn trimmed_range(node: &SyntaxNode) -> TextRange {
    let start = position_after_skipping_leading_trivia(node);
    let end = end_position_before_trailing_trivia(node).max(start);
    TextRange::new(start, end)
}

/// The next significant token after `token`, across node boundaries
pub fn next_significant_token(token: &SyntaxToken) -> Option<SyntaxToken> {
    std::iter::successors(token.next_token(), SyntaxToken::next_token)
        .find(|next| !next.kind().is_trivia())
}

/// Whether a newline or end of input follows `token`, ignoring spaces and comments
pub fn is_followed_by_newline(token: &SyntaxToken) -> bool {
    std::iter::successors(token.next_token(), SyntaxToken::next_token)
        .find(|next| !matches!(next.kind(), SyntaxKind::Whitespace | SyntaxKind::BlockComment))
        .is_none_or(|next| {
            matches!(next.kind(), SyntaxKind::Newline | SyntaxKind::LineComment)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;

    fn find(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
        root.descendants()
            .find(|node| node.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind} node"))
    }

    #[test]
    fn test_leading_trivia_of_declaration() {
        let root = parse("struct S {\n    // note\n    var x = 1\n}").syntax();
        let item = find(&root, SyntaxKind::VariableDecl).parent().unwrap();
        let leading = leading_trivia(&item.into());
        let kinds: Vec<_> = leading.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Newline,
                SyntaxKind::Whitespace,
                SyntaxKind::LineComment,
                SyntaxKind::Newline,
                SyntaxKind::Whitespace
            ]
        );
    }

    #[test]
    fn test_trailing_trivia_stops_at_newline() {
        let root = parse("let a = 1 /* x */ \nlet b = 2").syntax();
        let item = root.first_child().unwrap();
        let info = TriviaInfo::of(&item.into());
        assert!(info.has_comments());
        assert_eq!(info.trailing.len(), 3);
        assert!(info.trailing.iter().all(|t| !t.is_newline()));
    }

    #[test]
    fn test_trimmed_range_skips_trivia() {
        let source = "  let a = 1  \n";
        let root = parse(source).syntax();
        let range = trimmed_range(&root);
        assert_eq!(&source[range], "let a = 1");
    }

    #[test]
    fn test_followed_by_newline() {
        let root = parse("a();\nb(); c()").syntax();
        let semicolons: Vec<_> = root
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|t| t.kind() == SyntaxKind::Semicolon)
            .collect();
        assert_eq!(semicolons.len(), 2);
        assert!(is_followed_by_newline(&semicolons[0]));
        assert!(!is_followed_by_newline(&semicolons[1]));
    }
}
