//! Concrete Syntax Tree (CST) for Swift sources
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! and formatting, enabling:
//! - Exact source offsets for every reported violation
//! - Corrections that rewrite one node and keep the rest of the file intact
//!
//! ## Architecture
//!
//! The CST uses Rowan's green/red tree pattern:
//!
//! - **Green Tree**: Immutable, position-independent storage
//!   - Stores actual source text with trivia (whitespace, comments)
//!   - Shares untouched subtrees between revisions (uses Arc internally)
//!
//! - **Red Tree**: Dynamically constructed view with parent pointers
//!   - Created on-demand for traversal
//!   - Provides the typed API in [`ast`]
//!
//! ## Trivia Handling
//!
//! Trivia tokens are children of the enclosing node, placed before the
//! node they precede. Node ranges therefore start at their first significant
//! token, and `parse(source).syntax().text() == source` always holds.
//!
//! ## Example
//!
//! ```rust
//! use lintel_core::cst::{parse, SyntaxKind};
//!
//! let source = "class A {} // comment\n";
//! let parsed = parse(source);
//! assert_eq!(parsed.syntax().text().to_string(), source);
//!
//! let comments = parsed
//!     .syntax()
//!     .descendants_with_tokens()
//!     .filter(|element| element.kind() == SyntaxKind::LineComment)
//!     .count();
//! assert_eq!(comments, 1);
//! ```

mod language;
mod lexer;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod make;
pub mod trivia;

pub use language::{SwiftLanguage, SyntaxElement, SyntaxNode, SyntaxNodeChildren, SyntaxToken};
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use make::GreenElement;
pub use parser::{Parse, ParseError, parse};
pub use syntax_kind::SyntaxKind;

#[cfg(test)]
mod tests;
