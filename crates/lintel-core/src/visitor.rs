//! Depth-first traversal with subtree pruning
//!
//! [`walk`] drives a [`SyntaxVisitor`] over a tree in document order. Every
//! node gets a pre-visit ([`SyntaxVisitor::visit`]) whose [`VisitControl`]
//! decides whether its children are entered, and a post-visit
//! ([`SyntaxVisitor::visit_post`]) once the subtree is done. Post-visits run
//! for skipped nodes too.
//!
//! Pruning: a visitor names the declaration kinds whose subtrees can never
//! contain a match ([`SyntaxVisitor::skippable_declarations`]). When a
//! pre-visit answers [`VisitControl::Continue`] for such a declaration, its
//! children are not entered. Running with [`WalkOptions::without_pruning`]
//! ignores these sets and must produce the same results.

use rowan::{NodeOrToken, WalkEvent};

use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken};

const WORDS: usize = 7;

/// A set of syntax kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet {
    bits: [u64; WORDS],
}

impl KindSet {
    pub const EMPTY: KindSet = KindSet { bits: [0; WORDS] };

    /// Every declaration kind
    pub const ALL_DECLARATIONS: KindSet = {
        let mut set = KindSet::EMPTY;
        let mut idx = 0;
        while idx < SyntaxKind::ALL.len() {
            let kind = SyntaxKind::ALL[idx];
            if kind.is_declaration() {
                set = set.with(kind);
            }
            idx += 1;
        }
        set
    };

    pub const fn of(kinds: &[SyntaxKind]) -> KindSet {
        let mut set = KindSet::EMPTY;
        let mut idx = 0;
        while idx < kinds.len() {
            set = set.with(kinds[idx]);
            idx += 1;
        }
        set
    }

    pub const fn with(mut self, kind: SyntaxKind) -> KindSet {
        let raw = kind as usize;
        self.bits[raw / 64] |= 1 << (raw % 64);
        self
    }

    pub const fn without(mut self, kind: SyntaxKind) -> KindSet {
        let raw = kind as usize;
        self.bits[raw / 64] &= !(1 << (raw % 64));
        self
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let raw = kind as usize;
        self.bits[raw / 64] & (1 << (raw % 64)) != 0
    }

    pub const fn union(mut self, other: KindSet) -> KindSet {
        let mut idx = 0;
        while idx < WORDS {
            self.bits[idx] |= other.bits[idx];
            idx += 1;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        SyntaxKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.contains(*kind))
    }
}

impl std::fmt::Debug for KindSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SyntaxKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = SyntaxKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::EMPTY, KindSet::with)
    }
}

/// What the walker does after a pre-visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    /// Enter the children unless the node is a skippable declaration
    Continue,
    /// Enter the children, even of a skippable declaration
    VisitChildren,
    /// Do not enter the children
    SkipChildren,
    /// Enter the children, treating these declaration kinds as skippable
    /// within this subtree
    SkipKinds(KindSet),
}

/// Hooks invoked by [`walk`]
pub trait SyntaxVisitor {
    /// Declaration kinds whose subtrees never contain a match
    fn skippable_declarations(&self) -> KindSet {
        KindSet::EMPTY
    }

    fn visit(&mut self, _node: &SyntaxNode) -> VisitControl {
        VisitControl::Continue
    }

    fn visit_post(&mut self, _node: &SyntaxNode) {}

    /// Called for every token inside entered nodes, trivia included
    fn visit_token(&mut self, _token: &SyntaxToken) {}
}

/// Walker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Honour skippable declarations and [`VisitControl::SkipKinds`]
    pub pruning: bool,
}

impl WalkOptions {
    pub const fn without_pruning() -> Self {
        Self { pruning: false }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { pruning: true }
    }
}

/// Walk `root` depth-first in document order
pub fn walk<V: SyntaxVisitor + ?Sized>(visitor: &mut V, root: &SyntaxNode, options: WalkOptions) {
    let base = if options.pruning {
        visitor.skippable_declarations()
    } else {
        KindSet::EMPTY
    };
    // Innermost `SkipKinds` scope last; each entry holds the accumulated set
    let mut scopes: Vec<(SyntaxNode, KindSet)> = Vec::new();
    let mut entered: usize = 0;

    let mut events = root.preorder_with_tokens();
    while let Some(event) = events.next() {
        match event {
            WalkEvent::Enter(NodeOrToken::Token(token)) => visitor.visit_token(&token),
            WalkEvent::Leave(NodeOrToken::Token(_)) => {}
            WalkEvent::Enter(NodeOrToken::Node(node)) => {
                entered += 1;
                let active = scopes.last().map_or(base, |(_, set)| *set);
                let descend = match visitor.visit(&node) {
                    VisitControl::VisitChildren => true,
                    VisitControl::SkipChildren => false,
                    VisitControl::Continue => {
                        !(node.kind().is_declaration() && active.contains(node.kind()))
                    }
                    VisitControl::SkipKinds(kinds) => {
                        if options.pruning {
                            scopes.push((node.clone(), active.union(kinds)));
                        }
                        true
                    }
                };
                if !descend {
                    events.skip_subtree();
                }
            }
            WalkEvent::Leave(NodeOrToken::Node(node)) => {
                if scopes.last().is_some_and(|(scope, _)| *scope == node) {
                    scopes.pop();
                }
                visitor.visit_post(&node);
            }
        }
    }
    tracing::trace!(nodes = entered, pruning = options.pruning, "walk finished");
}
