//! Correction engine
//!
//! Rewriters propose [`Correction`]s against node identities of the tree they
//! inspected. [`CorrectionEngine::apply`] validates the whole set, resolves
//! conflicts and applies the survivors in one structural rebuild. Subtrees
//! that contain no edit are shared with the input tree, so only the paths
//! from the root to edited nodes are allocated again.
//!
//! # Conflicts
//!
//! Two corrections conflict when their effective ranges (target plus any
//! removed whitespace) overlap or start at the same offset. Corrections are
//! ordered by start offset, stably; the earliest one wins and conflicting
//! later ones are returned as deferred for the next pass.

use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use crate::cst::{GreenElement, SyntaxElement, SyntaxKind, SyntaxNode};
use crate::error::LintelError;
use crate::result::Result;
use crate::source::{NodeId, SourceFile};

/// Whitespace siblings removed together with a removed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjacentTrivia {
    #[default]
    None,
    /// Spaces directly before the element, `= nil` in `Int? = nil`
    LeadingWhitespace,
    /// Spaces directly after the element, `weak ` in `weak var`
    TrailingWhitespace,
}

/// Structural edit of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the target with these elements
    Replace(Vec<GreenElement>),
    /// Drop the target
    Remove { trivia: AdjacentTrivia },
}

/// A proposed structural edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Node or token being replaced
    pub target: NodeId,
    pub edit: Edit,
    /// Reported position of the corrected violation, in the inspected tree
    pub position: usize,
    /// Proposing rule, filled in by the orchestrator
    pub rule_id: Option<String>,
}

impl Correction {
    pub fn replace(target: NodeId, replacement: Vec<GreenElement>, position: usize) -> Self {
        Self {
            target,
            edit: Edit::Replace(replacement),
            position,
            rule_id: None,
        }
    }

    pub fn remove(target: NodeId, trivia: AdjacentTrivia, position: usize) -> Self {
        Self {
            target,
            edit: Edit::Remove { trivia },
            position,
            rule_id: None,
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}

/// Text-level trace of one applied correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    /// Replaced range in the input tree
    pub range: TextRange,
    /// Length of the replacement text
    pub new_len: TextSize,
}

/// Outcome of one correction pass
#[derive(Debug, Clone)]
pub struct CorrectionResult {
    pub green: GreenNode,
    /// Applied corrections, ordered by position
    pub applied: Vec<Correction>,
    /// Conflicting corrections to retry against the new tree
    pub deferred: Vec<Correction>,
    /// Text edits, ordered by range start
    pub edits: Vec<TextEdit>,
}

impl CorrectionResult {
    /// Positions of the applied corrections, in input-tree coordinates
    pub fn applied_positions(&self) -> Vec<usize> {
        self.applied.iter().map(|c| c.position).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// A correction with its target resolved in the tree
#[derive(Debug)]
struct Resolved {
    correction: Correction,
    effective: TextRange,
    new_len: TextSize,
}

/// Validates and applies correction sets
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrectionEngine;

impl CorrectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply every non-conflicting correction to `root` in one pass
    pub fn apply(&self, root: &SyntaxNode, corrections: Vec<Correction>) -> Result<CorrectionResult> {
        let mut resolved = Vec::with_capacity(corrections.len());
        for correction in corrections {
            let Some(element) = find_element(root, &correction.target) else {
                return Err(LintelError::correction_error(format!(
                    "target {:?} at {:?} not found in tree",
                    correction.target.kind, correction.target.range
                )));
            };
            let effective = effective_range(&element, &correction.edit);
            let new_len = match &correction.edit {
                Edit::Replace(elements) => elements
                    .iter()
                    .map(element_len)
                    .fold(TextSize::from(0), |acc, len| acc + len),
                Edit::Remove { .. } => TextSize::from(0),
            };
            resolved.push(Resolved {
                correction,
                effective,
                new_len,
            });
        }

        let (accepted, deferred) = resolve_conflicts(resolved);
        tracing::debug!(
            accepted = accepted.len(),
            deferred = deferred.len(),
            "resolved corrections"
        );

        let green = if accepted.is_empty() {
            root.green().into_owned()
        } else {
            rebuild(root, &accepted)
        };

        // Every accepted edit must have landed exactly once
        let expected = accepted.iter().fold(bytes(root.text_range().len()), |len, r| {
            len + bytes(r.new_len) - bytes(r.effective.len())
        });
        let actual = bytes(green.text_len());
        if actual != expected {
            return Err(LintelError::internal_error(format!(
                "rebuilt tree is {actual} bytes, corrections imply {expected}"
            )));
        }

        let edits = accepted
            .iter()
            .map(|r| TextEdit {
                range: r.effective,
                new_len: r.new_len,
            })
            .collect();
        let mut applied: Vec<Correction> = accepted.into_iter().map(|r| r.correction).collect();
        applied.sort_by_key(|c| c.position);

        Ok(CorrectionResult {
            green,
            applied,
            deferred,
            edits,
        })
    }

    /// Apply to a source file and wrap the new tree
    pub fn apply_to_file(
        &self,
        file: &SourceFile,
        corrections: Vec<Correction>,
    ) -> Result<(SourceFile, CorrectionResult)> {
        let result = self.apply(&file.syntax(), corrections)?;
        let mut corrected = SourceFile::from_green(result.green.clone());
        if let Some(path) = file.path() {
            corrected = corrected.with_path(path);
        }
        Ok((corrected, result))
    }
}

/// Whether two effective ranges conflict
pub fn ranges_conflict(a: TextRange, b: TextRange) -> bool {
    a.start() == b.start() || (a.start() < b.end() && b.start() < a.end())
}

fn resolve_conflicts(mut resolved: Vec<Resolved>) -> (Vec<Resolved>, Vec<Correction>) {
    resolved.sort_by_key(|r| r.effective.start());

    let mut accepted: Vec<Resolved> = Vec::with_capacity(resolved.len());
    let mut deferred = Vec::new();
    for candidate in resolved {
        let conflicts = accepted
            .iter()
            .any(|kept| ranges_conflict(kept.effective, candidate.effective));
        if conflicts {
            tracing::trace!(
                target_kind = ?candidate.correction.target.kind,
                start = u32::from(candidate.effective.start()),
                "deferring conflicting correction"
            );
            deferred.push(candidate.correction);
        } else {
            accepted.push(candidate);
        }
    }
    (accepted, deferred)
}

fn bytes(size: TextSize) -> i64 {
    i64::from(u32::from(size))
}

fn element_len(element: &GreenElement) -> TextSize {
    match element {
        NodeOrToken::Node(node) => node.text_len(),
        NodeOrToken::Token(token) => token.text_len(),
    }
}

fn to_green(element: &SyntaxElement) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.green().into_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.green().to_owned()),
    }
}

/// Resolve a node or token identity in `root`
pub fn find_element(root: &SyntaxNode, id: &NodeId) -> Option<SyntaxElement> {
    if id.kind.is_token() {
        return root
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|t| t.kind() == id.kind && t.text_range() == id.range)
            .map(NodeOrToken::Token);
    }
    SourceFile::find_node(root, id).map(NodeOrToken::Node)
}

fn is_whitespace(element: &SyntaxElement) -> bool {
    element.kind() == SyntaxKind::Whitespace
}

fn effective_range(element: &SyntaxElement, edit: &Edit) -> TextRange {
    let range = element.text_range();
    match edit {
        Edit::Remove {
            trivia: AdjacentTrivia::LeadingWhitespace,
        } => std::iter::successors(element.prev_sibling_or_token(), |e| e.prev_sibling_or_token())
            .take_while(is_whitespace)
            .last()
            .map_or(range, |first| TextRange::new(first.text_range().start(), range.end())),
        Edit::Remove {
            trivia: AdjacentTrivia::TrailingWhitespace,
        } => std::iter::successors(element.next_sibling_or_token(), |e| e.next_sibling_or_token())
            .take_while(is_whitespace)
            .last()
            .map_or(range, |last| TextRange::new(range.start(), last.text_range().end())),
        _ => range,
    }
}

/// Rebuild `node` with the accepted corrections applied
fn rebuild(node: &SyntaxNode, accepted: &[Resolved]) -> GreenNode {
    let node_range = node.text_range();
    let mut children: Vec<GreenElement> = Vec::new();
    let mut skip_until: Option<TextSize> = None;

    for child in node.children_with_tokens() {
        let child_range = child.text_range();
        if let Some(end) = skip_until {
            if child_range.end() <= end && is_whitespace(&child) {
                continue;
            }
            skip_until = None;
        }

        let child_id = NodeId::of_element(&child);
        if let Some(hit) = accepted.iter().find(|r| r.correction.target == child_id) {
            match &hit.correction.edit {
                Edit::Replace(replacement) => children.extend(replacement.iter().cloned()),
                Edit::Remove { trivia } => {
                    if *trivia == AdjacentTrivia::LeadingWhitespace {
                        while children.last().is_some_and(|last| {
                            matches!(last, NodeOrToken::Token(t) if t.kind() == SyntaxKind::Whitespace.into())
                        }) {
                            children.pop();
                        }
                    }
                    if *trivia == AdjacentTrivia::TrailingWhitespace {
                        skip_until = Some(hit.effective.end());
                    }
                }
            }
            continue;
        }

        match &child {
            NodeOrToken::Node(inner)
                if accepted.iter().any(|r| {
                    inner.text_range().contains_range(r.correction.target.range)
                        && node_range.contains_range(r.correction.target.range)
                }) =>
            {
                children.push(NodeOrToken::Node(rebuild(inner, accepted)));
            }
            _ => children.push(to_green(&child)),
        }
    }

    GreenNode::new(node.kind().into(), children)
}

/// Maps offsets of a corrected tree back to the original source
///
/// Holds the text edits of every pass; positions are translated through the
/// passes in reverse order.
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    passes: Vec<Vec<TextEdit>>,
}

impl OffsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the edits of one pass, ordered by range start
    pub fn push_pass(&mut self, mut edits: Vec<TextEdit>) {
        edits.sort_by_key(|edit| edit.range.start());
        self.passes.push(edits);
    }

    /// Translate an offset in the latest tree into an original offset
    pub fn to_original(&self, offset: usize) -> usize {
        self.passes
            .iter()
            .rev()
            .fold(offset, |offset, edits| map_back(offset, edits))
    }
}

fn map_back(offset: usize, edits: &[TextEdit]) -> usize {
    // Signed shift between new and old coordinates accumulated so far
    let mut delta: i64 = 0;
    for edit in edits {
        let old_start = usize::from(edit.range.start());
        let old_len = usize::from(edit.range.len());
        let new_start = (old_start as i64 + delta) as usize;
        let new_len = usize::from(edit.new_len);
        if offset < new_start {
            break;
        }
        if offset < new_start + new_len {
            return old_start;
        }
        delta += new_len as i64 - old_len as i64;
    }
    (offset as i64 - delta).max(0) as usize
}
