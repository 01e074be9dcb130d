//! Rowan language implementation
//!
//! Connects [`SyntaxKind`] to Rowan's generic tree types.

use rowan::Language;

use super::SyntaxKind;

/// Language marker for the Swift source trees lintel analyses
///
/// A zero-sized type implementing `rowan::Language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwiftLanguage;

impl Language for SwiftLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Every raw kind in a tree is produced by `kind_to_raw`, so an
        // unknown value can only come from a foreign green node.
        SyntaxKind::from_raw(raw.0).unwrap_or(SyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

/// Syntax node in the lossless tree
pub type SyntaxNode = rowan::SyntaxNode<SwiftLanguage>;

/// Syntax token (leaf) in the lossless tree
pub type SyntaxToken = rowan::SyntaxToken<SwiftLanguage>;

/// Either a node or a token
pub type SyntaxElement = rowan::SyntaxElement<SwiftLanguage>;

/// Iterator over the child nodes of a node
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<SwiftLanguage>;
