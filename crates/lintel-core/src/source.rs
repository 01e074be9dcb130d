//! Source units: text, tree, location index and parent side table
//!
//! A [`SourceFile`] owns the green root of one parsed source unit. Green
//! trees are `Send + Sync`, so the same file can be analysed by many rules
//! on different threads; each consumer materialises its own red root with
//! [`SourceFile::syntax`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};
use serde::{Deserialize, Serialize};

use crate::cst::{self, ParseError, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Stable identity of a node or token within one tree
///
/// Ranges nest and never overlap between siblings, so kind plus range is
/// unique for every element except single-child chains of equal range, which
/// the kind disambiguates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl NodeId {
    pub fn of_node(node: &SyntaxNode) -> Self {
        Self {
            kind: node.kind(),
            range: node.text_range(),
        }
    }

    pub fn of_token(token: &SyntaxToken) -> Self {
        Self {
            kind: token.kind(),
            range: token.text_range(),
        }
    }

    pub fn of_element(element: &SyntaxElement) -> Self {
        match element {
            NodeOrToken::Node(node) => Self::of_node(node),
            NodeOrToken::Token(token) => Self::of_token(token),
        }
    }

    pub fn start(&self) -> usize {
        self.range.start().into()
    }

    pub fn end(&self) -> usize {
        self.range.end().into()
    }
}

/// 1-based line and character column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// Byte offset to line/column conversion
///
/// Uses a precomputed table of line start offsets for O(log n) lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of each line start (line 1 starts at offset 0)
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where 1-based `line` starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|idx| self.line_starts.get(idx))
            .copied()
    }

    /// 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx.max(1),
        }
    }

    /// Convert a byte offset into a 1-based line and character column
    ///
    /// Columns count Unicode scalar values, not bytes. Offsets past the end
    /// resolve to the end of the last line.
    pub fn line_col(&self, offset: usize, source: &str) -> LineCol {
        let offset = offset.min(source.len());
        let line = self.line_of(offset);
        let line_start = self.line_starts[line - 1];
        let column = source
            .get(line_start..offset)
            .map_or(offset - line_start, |text| text.chars().count())
            + 1;
        LineCol { line, column }
    }
}

/// Parent side table, built once per tree
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<NodeId, NodeId>,
}

impl ParentMap {
    pub fn build(root: &SyntaxNode) -> Self {
        let parents = root
            .descendants_with_tokens()
            .filter_map(|element| {
                let parent = element.parent()?;
                Some((NodeId::of_element(&element), NodeId::of_node(&parent)))
            })
            .collect();
        Self { parents }
    }

    pub fn parent(&self, id: &NodeId) -> Option<NodeId> {
        self.parents.get(id).copied()
    }

    /// Ancestors of `id`, innermost first, `id` excluded
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(&id), |current| self.parent(current))
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// One parsed source unit
#[derive(Debug)]
pub struct SourceFile {
    path: Option<PathBuf>,
    text: String,
    green: GreenNode,
    parse_errors: Vec<ParseError>,
    line_index: OnceCell<LineIndex>,
    parents: OnceCell<ParentMap>,
}

impl SourceFile {
    /// Parse `text` with the bundled parser
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let parsed = cst::parse(&text);
        Self {
            path: None,
            green: parsed.green().clone(),
            parse_errors: parsed.errors().to_vec(),
            text,
            line_index: OnceCell::new(),
            parents: OnceCell::new(),
        }
    }

    /// Wrap a tree produced elsewhere, usually by the correction engine
    pub fn from_green(green: GreenNode) -> Self {
        let text = SyntaxNode::new_root(green.clone()).text().to_string();
        Self {
            path: None,
            text,
            green,
            parse_errors: Vec::new(),
            line_index: OnceCell::new(),
            parents: OnceCell::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// A fresh red root for traversal on the current thread
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    /// Whether the file has no significant tokens
    pub fn is_empty(&self) -> bool {
        self.syntax()
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .all(|token| token.kind().is_trivia())
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }

    pub fn parents(&self) -> &ParentMap {
        self.parents.get_or_init(|| ParentMap::build(&self.syntax()))
    }

    pub fn line_col(&self, offset: usize) -> LineCol {
        self.line_index().line_col(offset, &self.text)
    }

    /// Whitespace at the start of the line containing `offset`
    pub fn indentation_at(&self, offset: usize) -> &str {
        let line = self.line_index().line_of(offset);
        let start = self.line_index().line_start(line).unwrap_or(0);
        let rest = self.text.get(start..).unwrap_or("");
        let end = rest
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Resolve a node identity in a red tree of this file
    pub fn find_node(root: &SyntaxNode, id: &NodeId) -> Option<SyntaxNode> {
        let covering = match root.covering_element(id.range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent()?,
        };
        covering
            .ancestors()
            .find(|node| node.kind() == id.kind && node.text_range() == id.range)
            .or_else(|| {
                covering
                    .descendants()
                    .find(|node| node.kind() == id.kind && node.text_range() == id.range)
            })
    }

    /// Whether `node` has an ancestor of `kind`, using the parent side table
    pub fn is_inside(&self, node: &SyntaxNode, kind: SyntaxKind) -> bool {
        self.parents()
            .ancestors(NodeId::of_node(node))
            .any(|ancestor| ancestor.kind == kind)
    }
}

/// Convert a `TextSize` into a byte offset
pub fn offset(size: TextSize) -> usize {
    size.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_is_one_based() {
        let source = "let a = 1\nlet ü = 2\n";
        let index = LineIndex::new(source);
        assert_eq!(index.line_col(0, source), LineCol { line: 1, column: 1 });
        assert_eq!(index.line_col(10, source), LineCol { line: 2, column: 1 });
        // `=` after the two-byte `ü` is the 7th character of line 2
        assert_eq!(index.line_col(17, source), LineCol { line: 2, column: 7 });
        assert_eq!(index.line_col(999, source).line, 3);
    }

    #[test]
    fn test_line_mapping_is_monotonic() {
        let source = "a\n\nbb\nccc\n";
        let index = LineIndex::new(source);
        let lines: Vec<_> = (0..source.len()).map(|offset| index.line_of(offset)).collect();
        assert!(lines.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(index.line_count(), 5);
    }

    #[test]
    fn test_parent_map_matches_red_tree() {
        let file = SourceFile::parse("class A { func f() { return } }");
        let root = file.syntax();
        for node in root.descendants().skip(1) {
            let parent = node.parent().unwrap();
            assert_eq!(
                file.parents().parent(&NodeId::of_node(&node)),
                Some(NodeId::of_node(&parent))
            );
        }
        let ret = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ReturnStmt)
            .unwrap();
        assert!(file.is_inside(&ret, SyntaxKind::ClassDecl));
        assert!(!file.is_inside(&ret, SyntaxKind::EnumDecl));
    }

    #[test]
    fn test_find_node_by_identity() {
        let file = SourceFile::parse("var a: Int? = nil\nvar b = 2");
        let root = file.syntax();
        for node in root.descendants() {
            let id = NodeId::of_node(&node);
            assert_eq!(SourceFile::find_node(&root, &id), Some(node));
        }
    }

    #[test]
    fn test_child_ranges_nest_in_parent() {
        let file = SourceFile::parse("enum E { case add(x: Int); case other; case add(y: Int) }");
        for node in file.syntax().descendants() {
            let mut previous_end = node.text_range().start();
            for child in node.children_with_tokens() {
                let range = child.text_range();
                assert!(range.start() >= previous_end);
                assert!(node.text_range().contains_range(range));
                previous_end = range.end();
            }
        }
    }

    #[test]
    fn test_empty_files() {
        assert!(SourceFile::parse("").is_empty());
        assert!(SourceFile::parse("  // only a comment\n\n").is_empty());
        assert!(!SourceFile::parse("x").is_empty());
    }

    #[test]
    fn test_indentation_at() {
        let file = SourceFile::parse("func f() {\n    return g()\n}");
        let offset = file.text().find("return").unwrap();
        assert_eq!(file.indentation_at(offset), "    ");
    }
}
