//! Hierarchical parser for the Swift subset lintel understands
//!
//! Builds a lossless CST from the token stream produced by
//! [`lex_with_trivia`](super::lex_with_trivia). Trivia preceding a node is
//! attached to the enclosing node, so every node's range begins at its first
//! significant token. Tokens the grammar cannot place are wrapped in
//! [`SyntaxKind::Error`] nodes; the tree text always equals the input.
//!
//! # Example
//!
//! ```rust
//! use lintel_core::cst::parse;
//!
//! let source = "enum E { case a, b }\n";
//! let parsed = parse(source);
//! assert!(parsed.errors().is_empty());
//! assert_eq!(parsed.syntax().text().to_string(), source);
//! ```

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use super::{CstToken, SyntaxKind, SyntaxNode, lex_with_trivia};

/// A parse error with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Result of parsing one source unit
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Root of the red tree
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Green (position independent) root
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Lexer and parser errors, in source order
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

/// Parse source text into a lossless CST
pub fn parse(source: &str) -> Parse {
    let (tokens, lexer_errors) = lex_with_trivia(source);
    let mut parser = Parser::new(&tokens);
    parser.parse_source_file();

    let mut errors: Vec<ParseError> = lexer_errors
        .into_iter()
        .map(|err| ParseError::new(err.message, err.span.start))
        .collect();
    errors.append(&mut parser.errors);
    errors.sort_by_key(|err| err.offset);

    Parse {
        green: parser.builder.finish(),
        errors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockContext {
    Code,
    Members,
    EnumMembers,
}

#[derive(Debug, Clone, Copy, Default)]
struct Restrictions {
    /// `if cond {` must not read `cond {` as a trailing closure call
    no_trailing_closure: bool,
}

impl Restrictions {
    const CONDITION: Self = Self {
        no_trailing_closure: true,
    };
}

/// Nesting limit of the recursive productions
const MAX_NESTING: usize = 256;

const ACCESSOR_NAMES: &[&str] = &["get", "set", "willSet", "didSet"];

const CONTEXTUAL_MODIFIERS: &[&str] = &[
    "open",
    "final",
    "override",
    "weak",
    "unowned",
    "lazy",
    "mutating",
    "nonmutating",
    "required",
    "convenience",
    "dynamic",
    "optional",
    "indirect",
    "nonisolated",
];

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    /// Indices of the significant (non-trivia) tokens
    significant: Vec<usize>,
    /// Next significant token, as an index into `significant`
    cursor: usize,
    /// Next raw token not yet added to the tree
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
    contexts: Vec<BlockContext>,
    /// Recursive productions currently entered
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken]) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .map(|(idx, _)| idx)
            .collect();
        Self {
            tokens,
            significant,
            cursor: 0,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            contexts: Vec::new(),
            depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token stream primitives
    // ------------------------------------------------------------------

    fn nth(&self, n: usize) -> SyntaxKind {
        self.significant
            .get(self.cursor + n)
            .map_or(SyntaxKind::Eof, |&idx| self.tokens[idx].kind)
    }

    fn nth_text(&self, n: usize) -> &'a str {
        self.significant
            .get(self.cursor + n)
            .map_or("", |&idx| self.tokens[idx].text.as_str())
    }

    fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(SyntaxKind::Eof)
    }

    fn at_contextual(&self, text: &str) -> bool {
        self.at(SyntaxKind::Ident) && self.nth_text(0) == text
    }

    fn nth_is_contextual(&self, n: usize, texts: &[&str]) -> bool {
        self.nth(n) == SyntaxKind::Ident && texts.contains(&self.nth_text(n))
    }

    /// Whether the nth significant token directly follows the one before it
    fn nth_attached(&self, n: usize) -> bool {
        let idx = self.cursor + n;
        match (
            idx.checked_sub(1).and_then(|prev| self.significant.get(prev)),
            self.significant.get(idx),
        ) {
            (Some(&prev), Some(&next)) => next == prev + 1,
            _ => false,
        }
    }

    fn attached(&self) -> bool {
        self.nth_attached(0)
    }

    /// Whether a line break separates the previous and the next significant token
    fn newline_before(&self) -> bool {
        let end = self
            .significant
            .get(self.cursor)
            .copied()
            .unwrap_or(self.tokens.len());
        let start = self
            .cursor
            .checked_sub(1)
            .and_then(|prev| self.significant.get(prev))
            .map_or(0, |&idx| idx + 1);
        self.tokens[start..end]
            .iter()
            .any(|token| token.kind == SyntaxKind::Newline)
    }

    fn current_offset(&self) -> usize {
        self.significant
            .get(self.cursor)
            .map_or_else(
                || self.tokens.last().map_or(0, |token| token.span.end),
                |&idx| self.tokens[idx].span.start,
            )
    }

    /// Add pending trivia tokens to the current node
    fn skip_trivia(&mut self) {
        let end = self
            .significant
            .get(self.cursor)
            .copied()
            .unwrap_or(self.tokens.len());
        while self.pos < end {
            let token = &self.tokens[self.pos];
            self.builder.token(token.kind.into(), &token.text);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        let kind = self.current();
        self.bump_remap(kind);
    }

    /// Add the current token under a different kind (contextual keywords)
    fn bump_remap(&mut self, kind: SyntaxKind) {
        if self.at_eof() {
            return;
        }
        self.skip_trivia();
        let token = &self.tokens[self.pos];
        self.builder.token(kind.into(), &token.text);
        self.pos += 1;
        self.cursor += 1;
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia();
        self.builder.checkpoint()
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        let offset = self.current_offset();
        self.errors.push(ParseError::new(message, offset));
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error(format!("expected {kind}, found {}", self.current()));
            false
        }
    }

    /// Wrap the current token in an error node
    fn error_and_bump(&mut self, message: &str) {
        self.error(message);
        self.start_node(SyntaxKind::Error);
        self.bump();
        self.finish_node();
    }

    /// Run a recursive production under the nesting limit
    ///
    /// Past the limit the current group is wrapped in an error node without
    /// recursing. Returns whether `f` parsed something, or whether tokens
    /// were wrapped.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        if self.depth >= MAX_NESTING {
            let before = self.cursor;
            self.error("nesting too deep");
            self.start_node(SyntaxKind::Error);
            match self.current() {
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => {
                    self.bump_balanced()
                }
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace | SyntaxKind::Eof => {}
                _ => self.bump(),
            }
            self.finish_node();
            return self.cursor != before;
        }
        self.depth += 1;
        let parsed = f(self);
        self.depth -= 1;
        parsed
    }

    fn in_enum(&self) -> bool {
        self.contexts.last() == Some(&BlockContext::EnumMembers)
    }

    fn with_context(&mut self, context: BlockContext, f: impl FnOnce(&mut Self)) {
        self.contexts.push(context);
        f(self);
        self.contexts.pop();
    }

    fn is_name_like(kind: SyntaxKind) -> bool {
        matches!(kind, SyntaxKind::Ident | SyntaxKind::Underscore) || kind.is_keyword()
    }

    /// Add tokens until the matching close delimiter of the current open one
    fn bump_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                SyntaxKind::Eof => return,
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// Add tokens until `stop` matches at nesting depth zero
    fn bump_until(&mut self, stop: impl Fn(&Self) -> bool) {
        let mut depth = 0usize;
        while !self.at_eof() {
            if depth == 0 && stop(self) {
                return;
            }
            match self.current() {
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
    }

    // ------------------------------------------------------------------
    // Lookahead
    // ------------------------------------------------------------------

    fn is_decl_keyword_at(&self, n: usize) -> bool {
        matches!(
            self.nth(n),
            SyntaxKind::ClassKw
                | SyntaxKind::StructKw
                | SyntaxKind::EnumKw
                | SyntaxKind::ProtocolKw
                | SyntaxKind::ExtensionKw
                | SyntaxKind::FuncKw
                | SyntaxKind::InitKw
                | SyntaxKind::DeinitKw
                | SyntaxKind::SubscriptKw
                | SyntaxKind::VarKw
                | SyntaxKind::LetKw
                | SyntaxKind::CaseKw
                | SyntaxKind::ImportKw
                | SyntaxKind::TypealiasKw
                | SyntaxKind::AssociatedtypeKw
        ) || self.is_actor_at(n)
    }

    fn is_actor_at(&self, n: usize) -> bool {
        self.nth_is_contextual(n, &["actor"]) && self.nth(n + 1) == SyntaxKind::Ident
    }

    fn is_modifier_at(&self, n: usize) -> bool {
        match self.nth(n) {
            SyntaxKind::StaticKw
            | SyntaxKind::PublicKw
            | SyntaxKind::PrivateKw
            | SyntaxKind::FileprivateKw
            | SyntaxKind::InternalKw => true,
            SyntaxKind::ClassKw => {
                matches!(
                    self.nth(n + 1),
                    SyntaxKind::FuncKw | SyntaxKind::VarKw | SyntaxKind::LetKw | SyntaxKind::SubscriptKw
                ) || self.is_modifier_at(n + 1)
            }
            SyntaxKind::Ident if CONTEXTUAL_MODIFIERS.contains(&self.nth_text(n)) => {
                let next = n + 1;
                self.is_decl_keyword_at(next)
                    || self.is_modifier_at(next)
                    || (self.nth(next) == SyntaxKind::LParen && self.nth_attached(next))
            }
            _ => false,
        }
    }

    /// The declaration keyword that follows any attributes and modifiers
    fn decl_keyword_ahead(&self) -> Option<SyntaxKind> {
        let mut n = 0;
        loop {
            match self.nth(n) {
                SyntaxKind::At => {
                    n += 2;
                    if self.nth(n) == SyntaxKind::LParen && self.nth_attached(n) {
                        n = self.skip_balanced_ahead(n)?;
                    }
                }
                _ if self.is_modifier_at(n) => {
                    n += 1;
                    if self.nth(n) == SyntaxKind::LParen && self.nth_attached(n) {
                        n = self.skip_balanced_ahead(n)?;
                    }
                }
                _ if self.is_actor_at(n) => return Some(SyntaxKind::ActorKw),
                kind if self.is_decl_keyword_at(n) => return Some(kind),
                _ => return None,
            }
        }
    }

    /// Index just past the delimiter group opened at `n`
    fn skip_balanced_ahead(&self, mut n: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            match self.nth(n) {
                SyntaxKind::Eof => return None,
                SyntaxKind::LParen | SyntaxKind::LBracket => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(n + 1);
                    }
                }
                _ => {}
            }
            n += 1;
        }
    }

    fn accessor_block_ahead(&self) -> bool {
        let mut n = 0;
        loop {
            match self.nth(n) {
                SyntaxKind::At => n += 2,
                SyntaxKind::Ident if ACCESSOR_NAMES.contains(&self.nth_text(n)) => return true,
                SyntaxKind::Ident
                    if matches!(self.nth_text(n), "mutating" | "nonmutating") =>
                {
                    n += 1
                }
                _ => return false,
            }
        }
    }

    /// Whether a closure body starts with a signature terminated by `in`
    fn closure_signature_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            let kind = self.nth(n);
            match kind {
                SyntaxKind::Eof | SyntaxKind::LBrace | SyntaxKind::RBrace => return false,
                SyntaxKind::InKw if depth == 0 => return true,
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LAngle => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RAngle => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                _ if depth > 0 => {}
                SyntaxKind::Ident
                | SyntaxKind::Underscore
                | SyntaxKind::Comma
                | SyntaxKind::Colon
                | SyntaxKind::Arrow
                | SyntaxKind::Question
                | SyntaxKind::Bang
                | SyntaxKind::Dot
                | SyntaxKind::At
                | SyntaxKind::ThrowsKw
                | SyntaxKind::InoutKw
                | SyntaxKind::SelfTypeKw => {}
                _ => return false,
            }
            n += 1;
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::RBrace
                | SyntaxKind::Semicolon
                | SyntaxKind::Eof
                | SyntaxKind::CaseKw
                | SyntaxKind::DefaultKw
        ) || self.newline_before()
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn parse_source_file(&mut self) {
        self.builder.start_node(SyntaxKind::SourceFile.into());
        self.with_context(BlockContext::Code, |p| {
            while !p.at_eof() {
                p.parse_code_block_item();
            }
        });
        self.skip_trivia();
        self.builder.finish_node();
    }

    fn parse_code_block_item(&mut self) {
        let before = self.cursor;
        self.nested(|p| {
            p.parse_code_block_item_body();
            true
        });
        if self.cursor == before && !self.at_eof() {
            self.error_and_bump("unexpected token");
        }
    }

    fn parse_code_block_item_body(&mut self) {
        self.start_node(SyntaxKind::CodeBlockItem);
        let before = self.cursor;
        self.parse_item();
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
        }
        if self.cursor == before {
            self.error_and_bump("unexpected token");
        }
        self.finish_node();
    }

    fn parse_item(&mut self) {
        if self.at(SyntaxKind::PoundKeyword)
            && matches!(self.nth_text(0), "#if" | "#elseif" | "#else" | "#endif")
        {
            self.parse_if_config_directive();
            return;
        }

        match self.decl_keyword_ahead() {
            Some(SyntaxKind::CaseKw) if !self.in_enum() => self.parse_statement(),
            Some(_) => self.parse_decl(),
            None => self.parse_statement(),
        }
    }

    fn parse_if_config_directive(&mut self) {
        self.start_node(SyntaxKind::IfConfigDirective);
        let has_condition = matches!(self.nth_text(0), "#if" | "#elseif");
        self.bump();
        if has_condition {
            while !self.at_eof() && !self.newline_before() {
                self.bump();
            }
        }
        self.finish_node();
    }

    fn parse_code_block(&mut self) {
        self.start_node(SyntaxKind::CodeBlock);
        if self.expect(SyntaxKind::LBrace) {
            self.with_context(BlockContext::Code, |p| {
                while !p.at(SyntaxKind::RBrace) && !p.at_eof() {
                    p.parse_code_block_item();
                }
            });
            self.expect(SyntaxKind::RBrace);
        }
        self.finish_node();
    }

    fn parse_member_block(&mut self, context: BlockContext) {
        self.start_node(SyntaxKind::MemberBlock);
        if self.expect(SyntaxKind::LBrace) {
            self.with_context(context, |p| {
                while !p.at(SyntaxKind::RBrace) && !p.at_eof() {
                    p.parse_code_block_item();
                }
            });
            self.expect(SyntaxKind::RBrace);
        }
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_decl(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_attributes();
        self.parse_modifiers();

        match self.current() {
            SyntaxKind::ClassKw => self.parse_nominal_decl(checkpoint, SyntaxKind::ClassDecl),
            SyntaxKind::StructKw => self.parse_nominal_decl(checkpoint, SyntaxKind::StructDecl),
            SyntaxKind::EnumKw => self.parse_nominal_decl(checkpoint, SyntaxKind::EnumDecl),
            SyntaxKind::ProtocolKw => {
                self.parse_nominal_decl(checkpoint, SyntaxKind::ProtocolDecl)
            }
            SyntaxKind::ExtensionKw => {
                self.parse_nominal_decl(checkpoint, SyntaxKind::ExtensionDecl)
            }
            SyntaxKind::Ident if self.is_actor_at(0) => {
                self.parse_nominal_decl(checkpoint, SyntaxKind::ActorDecl)
            }
            SyntaxKind::FuncKw => self.parse_function_decl(checkpoint),
            SyntaxKind::InitKw => self.parse_initializer_decl(checkpoint),
            SyntaxKind::DeinitKw => {
                self.start_node_at(checkpoint, SyntaxKind::DeinitDecl);
                self.bump();
                if self.at(SyntaxKind::LBrace) {
                    self.parse_code_block();
                }
                self.finish_node();
            }
            SyntaxKind::SubscriptKw => self.parse_subscript_decl(checkpoint),
            SyntaxKind::VarKw | SyntaxKind::LetKw => self.parse_variable_decl(checkpoint),
            SyntaxKind::CaseKw => self.parse_enum_case_decl(checkpoint),
            SyntaxKind::ImportKw => self.parse_import_decl(checkpoint),
            SyntaxKind::TypealiasKw => self.parse_typealias_decl(checkpoint),
            SyntaxKind::AssociatedtypeKw => self.parse_associatedtype_decl(checkpoint),
            _ => {
                self.start_node_at(checkpoint, SyntaxKind::Error);
                self.error("expected declaration");
                self.finish_node();
            }
        }
    }

    fn parse_attributes(&mut self) {
        while self.at(SyntaxKind::At) {
            self.start_node(SyntaxKind::Attribute);
            self.bump();
            if Self::is_name_like(self.current()) {
                self.bump();
            } else {
                self.error("expected attribute name");
            }
            if self.at(SyntaxKind::LParen) && self.attached() {
                self.start_node(SyntaxKind::AttributeArguments);
                self.bump_balanced();
                self.finish_node();
            }
            self.finish_node();
        }
    }

    fn parse_modifiers(&mut self) {
        while self.is_modifier_at(0) {
            self.start_node(SyntaxKind::Modifier);
            let kind = match self.current() {
                SyntaxKind::Ident => SyntaxKind::from_contextual_keyword(self.nth_text(0))
                    .unwrap_or(SyntaxKind::Ident),
                kind => kind,
            };
            self.bump_remap(kind);
            if self.at(SyntaxKind::LParen) && self.attached() {
                self.parse_modifier_detail();
            }
            self.finish_node();
        }
    }

    /// `(set)` in `private(set)`, `(unsafe)` in `unowned(unsafe)`
    fn parse_modifier_detail(&mut self) {
        self.start_node(SyntaxKind::ModifierDetail);
        self.bump();
        if self.at(SyntaxKind::Ident) {
            let kind = SyntaxKind::from_contextual_keyword(self.nth_text(0))
                .unwrap_or(SyntaxKind::Ident);
            self.bump_remap(kind);
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_nominal_decl(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.start_node_at(checkpoint, kind);
        if kind == SyntaxKind::ActorDecl {
            self.bump_remap(SyntaxKind::ActorKw);
        } else {
            self.bump();
        }

        if kind == SyntaxKind::ExtensionDecl {
            self.parse_type();
        } else {
            self.expect(SyntaxKind::Ident);
        }

        if self.at(SyntaxKind::LAngle) {
            self.parse_generic_parameter_clause();
        }
        if self.at(SyntaxKind::Colon) {
            self.parse_inheritance_clause();
        }
        if self.at(SyntaxKind::WhereKw) {
            self.parse_generic_where_clause();
        }

        let context = if kind == SyntaxKind::EnumDecl {
            BlockContext::EnumMembers
        } else {
            BlockContext::Members
        };
        self.parse_member_block(context);
        self.finish_node();
    }

    fn parse_function_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::FunctionDecl);
        self.bump();
        if matches!(self.current(), SyntaxKind::Ident | SyntaxKind::Operator) {
            self.bump();
        } else {
            self.error("expected function name");
        }
        if self.at(SyntaxKind::LAngle) {
            self.parse_generic_parameter_clause();
        }
        self.parse_function_signature();
        if self.at(SyntaxKind::WhereKw) {
            self.parse_generic_where_clause();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_code_block();
        }
        self.finish_node();
    }

    fn parse_initializer_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::InitializerDecl);
        self.bump();
        let failable = matches!(self.current(), SyntaxKind::Question | SyntaxKind::Bang)
            || (self.at(SyntaxKind::Operator) && matches!(self.nth_text(0), "?" | "!"));
        if failable {
            self.bump();
        }
        if self.at(SyntaxKind::LAngle) {
            self.parse_generic_parameter_clause();
        }
        self.parse_function_signature();
        if self.at(SyntaxKind::WhereKw) {
            self.parse_generic_where_clause();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_code_block();
        }
        self.finish_node();
    }

    fn parse_subscript_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::SubscriptDecl);
        self.bump();
        if self.at(SyntaxKind::LAngle) {
            self.parse_generic_parameter_clause();
        }
        self.parse_function_signature();
        if self.at(SyntaxKind::LBrace) {
            self.parse_accessor_block();
        }
        self.finish_node();
    }

    fn parse_function_signature(&mut self) {
        self.start_node(SyntaxKind::FunctionSignature);
        if self.at(SyntaxKind::LParen) {
            self.parse_parameter_clause();
        } else {
            self.error("expected parameter clause");
        }
        self.parse_effect_specifiers();
        if self.at(SyntaxKind::Arrow) {
            self.parse_return_clause();
        }
        self.finish_node();
    }

    fn parse_effect_specifiers(&mut self) {
        if !self.at_effect_specifier() {
            return;
        }
        self.start_node(SyntaxKind::EffectSpecifiers);
        while self.at_effect_specifier() {
            if self.at(SyntaxKind::Ident) {
                self.bump_remap(SyntaxKind::AsyncKw);
            } else {
                self.bump();
            }
        }
        self.finish_node();
    }

    fn at_effect_specifier(&self) -> bool {
        self.at_contextual("async")
            || matches!(self.current(), SyntaxKind::ThrowsKw | SyntaxKind::RethrowsKw)
    }

    fn parse_return_clause(&mut self) {
        self.start_node(SyntaxKind::ReturnClause);
        self.bump();
        self.parse_type();
        self.finish_node();
    }

    fn parse_parameter_clause(&mut self) {
        self.start_node(SyntaxKind::ParameterClause);
        self.bump();
        while !self.at(SyntaxKind::RParen) && !self.at_eof() {
            let before = self.cursor;
            self.parse_function_parameter();
            if self.cursor == before {
                self.error_and_bump("unexpected token in parameter list");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_function_parameter(&mut self) {
        if !Self::is_name_like(self.current()) && !self.at(SyntaxKind::At) {
            return;
        }
        self.start_node(SyntaxKind::FunctionParameter);
        self.parse_attributes();
        let mut names = 0;
        while names < 2 && Self::is_name_like(self.current()) && !self.at(SyntaxKind::Colon) {
            self.bump();
            names += 1;
        }
        if self.expect(SyntaxKind::Colon) {
            self.parse_type();
            if self.at(SyntaxKind::Operator) && self.nth_text(0) == "..." {
                self.bump();
            }
            if self.at(SyntaxKind::Equals) {
                self.parse_initializer_clause(Restrictions::default());
            }
        }
        self.finish_node();
    }

    fn parse_variable_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::VariableDecl);
        self.bump();
        loop {
            self.parse_pattern_binding();
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.finish_node();
    }

    fn parse_pattern_binding(&mut self) {
        self.start_node(SyntaxKind::PatternBinding);
        self.parse_pattern();
        if self.at(SyntaxKind::Colon) {
            self.parse_type_annotation();
        }
        let has_initializer = self.at(SyntaxKind::Equals);
        if has_initializer {
            self.parse_initializer_clause(Restrictions::default());
        }
        if self.at(SyntaxKind::LBrace) && (!has_initializer || !self.newline_before()) {
            self.parse_accessor_block();
        }
        self.finish_node();
    }

    fn parse_pattern(&mut self) {
        self.nested(|p| {
            p.parse_pattern_body();
            true
        });
    }

    fn parse_pattern_body(&mut self) {
        match self.current() {
            SyntaxKind::Underscore => {
                self.start_node(SyntaxKind::WildcardPattern);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::TuplePattern);
                self.bump();
                while !self.at(SyntaxKind::RParen) && !self.at_eof() {
                    let before = self.cursor;
                    self.parse_pattern();
                    if self.cursor == before {
                        self.error_and_bump("unexpected token in tuple pattern");
                    }
                    if !self.at(SyntaxKind::Comma) {
                        break;
                    }
                    self.bump();
                }
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            kind if Self::is_name_like(kind) => {
                self.start_node(SyntaxKind::IdentifierPattern);
                self.bump();
                self.finish_node();
            }
            _ => self.error("expected pattern"),
        }
    }

    fn parse_type_annotation(&mut self) {
        self.start_node(SyntaxKind::TypeAnnotation);
        self.bump();
        self.parse_type();
        self.finish_node();
    }

    fn parse_initializer_clause(&mut self, restrictions: Restrictions) {
        self.start_node(SyntaxKind::InitializerClause);
        self.bump();
        if !self.parse_expr(restrictions) {
            self.error("expected expression");
        }
        self.finish_node();
    }

    fn parse_accessor_block(&mut self) {
        self.start_node(SyntaxKind::AccessorBlock);
        self.bump();
        if self.accessor_block_ahead() {
            while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
                let before = self.cursor;
                self.parse_accessor_decl();
                if self.cursor == before {
                    self.error_and_bump("expected accessor");
                }
            }
        } else {
            self.with_context(BlockContext::Code, |p| {
                while !p.at(SyntaxKind::RBrace) && !p.at_eof() {
                    p.parse_code_block_item();
                }
            });
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_accessor_decl(&mut self) {
        if !self.accessor_block_ahead() {
            return;
        }
        self.start_node(SyntaxKind::AccessorDecl);
        self.parse_attributes();
        while self.nth_is_contextual(0, &["mutating", "nonmutating"]) {
            self.start_node(SyntaxKind::Modifier);
            let kind = SyntaxKind::from_contextual_keyword(self.nth_text(0))
                .unwrap_or(SyntaxKind::Ident);
            self.bump_remap(kind);
            self.finish_node();
        }
        let kind =
            SyntaxKind::from_contextual_keyword(self.nth_text(0)).unwrap_or(SyntaxKind::Ident);
        self.bump_remap(kind);
        if self.at(SyntaxKind::LParen) {
            self.start_node(SyntaxKind::AccessorParameter);
            self.bump();
            self.expect(SyntaxKind::Ident);
            self.expect(SyntaxKind::RParen);
            self.finish_node();
        }
        self.parse_effect_specifiers();
        if self.at(SyntaxKind::LBrace) {
            self.parse_code_block();
        }
        self.finish_node();
    }

    fn parse_enum_case_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::EnumCaseDecl);
        self.bump();
        loop {
            self.start_node(SyntaxKind::EnumCaseElement);
            if Self::is_name_like(self.current()) {
                self.bump();
            } else {
                self.error("expected case name");
            }
            if self.at(SyntaxKind::LParen) {
                self.parse_enum_case_parameter_clause();
            }
            if self.at(SyntaxKind::Equals) {
                self.parse_initializer_clause(Restrictions::default());
            }
            self.finish_node();
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.finish_node();
    }

    fn parse_enum_case_parameter_clause(&mut self) {
        self.start_node(SyntaxKind::EnumCaseParameterClause);
        self.bump();
        while !self.at(SyntaxKind::RParen) && !self.at_eof() {
            let before = self.cursor;
            self.start_node(SyntaxKind::EnumCaseParameter);
            let first = self.current();
            if Self::is_name_like(first) && self.nth(1) == SyntaxKind::Colon {
                self.bump();
                self.bump();
            } else if Self::is_name_like(first)
                && Self::is_name_like(self.nth(1))
                && self.nth(2) == SyntaxKind::Colon
            {
                self.bump();
                self.bump();
                self.bump();
            }
            self.parse_type();
            if self.at(SyntaxKind::Equals) {
                self.parse_initializer_clause(Restrictions::default());
            }
            self.finish_node();
            if self.cursor == before {
                self.error_and_bump("unexpected token in case parameters");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_import_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::ImportDecl);
        self.bump();
        if matches!(
            self.current(),
            SyntaxKind::StructKw
                | SyntaxKind::ClassKw
                | SyntaxKind::EnumKw
                | SyntaxKind::ProtocolKw
                | SyntaxKind::TypealiasKw
                | SyntaxKind::FuncKw
                | SyntaxKind::VarKw
                | SyntaxKind::LetKw
        ) {
            self.bump();
        }
        self.expect(SyntaxKind::Ident);
        while self.at(SyntaxKind::Dot) && self.attached() {
            self.bump();
            if Self::is_name_like(self.current()) {
                self.bump();
            }
        }
        self.finish_node();
    }

    fn parse_typealias_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::TypealiasDecl);
        self.bump();
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::LAngle) {
            self.parse_generic_parameter_clause();
        }
        if self.expect(SyntaxKind::Equals) {
            self.parse_type();
        }
        self.finish_node();
    }

    fn parse_associatedtype_decl(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SyntaxKind::AssociatedtypeDecl);
        self.bump();
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Colon) {
            self.parse_inheritance_clause();
        }
        if self.at(SyntaxKind::Equals) {
            self.bump();
            self.parse_type();
        }
        self.finish_node();
    }

    fn parse_generic_parameter_clause(&mut self) {
        self.start_node(SyntaxKind::GenericParameterClause);
        self.bump();
        while !self.at(SyntaxKind::RAngle) && !self.at_eof() {
            let before = self.cursor;
            self.start_node(SyntaxKind::GenericParameter);
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::Colon) {
                self.bump();
                self.parse_type();
            }
            self.finish_node();
            if self.cursor == before {
                self.error_and_bump("unexpected token in generic parameters");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RAngle);
        self.finish_node();
    }

    fn parse_generic_argument_clause(&mut self) {
        self.start_node(SyntaxKind::GenericArgumentClause);
        self.bump();
        while !self.at(SyntaxKind::RAngle) && !self.at_eof() {
            let before = self.cursor;
            self.parse_type();
            if self.cursor == before {
                self.error_and_bump("unexpected token in generic arguments");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RAngle);
        self.finish_node();
    }

    fn parse_inheritance_clause(&mut self) {
        self.start_node(SyntaxKind::InheritanceClause);
        self.bump();
        loop {
            self.start_node(SyntaxKind::InheritedType);
            self.parse_type();
            self.finish_node();
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.finish_node();
    }

    fn parse_generic_where_clause(&mut self) {
        self.start_node(SyntaxKind::GenericWhereClause);
        self.bump();
        self.bump_until(|p| p.at(SyntaxKind::LBrace) || p.newline_before());
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> bool {
        self.nested(Self::parse_type_body)
    }

    fn parse_type_body(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        match self.current() {
            SyntaxKind::At | SyntaxKind::InoutKw => {
                self.start_node_at(checkpoint, SyntaxKind::AttributedType);
                self.parse_attributes();
                if self.at(SyntaxKind::InoutKw) {
                    self.bump();
                }
                self.parse_type();
                self.finish_node();
                return true;
            }
            SyntaxKind::Ident
                if matches!(self.nth_text(0), "some" | "any")
                    && matches!(
                        self.nth(1),
                        SyntaxKind::Ident | SyntaxKind::LParen | SyntaxKind::SelfTypeKw
                    ) =>
            {
                self.start_node_at(checkpoint, SyntaxKind::SomeOrAnyType);
                let kind = SyntaxKind::from_contextual_keyword(self.nth_text(0))
                    .unwrap_or(SyntaxKind::Ident);
                self.bump_remap(kind);
                self.parse_type();
                self.finish_node();
                return true;
            }
            SyntaxKind::LParen => {
                self.parse_tuple_type();
                if self.at_effect_specifier() || self.at(SyntaxKind::Arrow) {
                    self.start_node_at(checkpoint, SyntaxKind::FunctionType);
                    self.parse_effect_specifiers();
                    self.expect(SyntaxKind::Arrow);
                    self.parse_type();
                    self.finish_node();
                }
            }
            SyntaxKind::LBracket => {
                self.bump();
                self.parse_type();
                let kind = if self.at(SyntaxKind::Colon) {
                    self.bump();
                    self.parse_type();
                    SyntaxKind::DictionaryType
                } else {
                    SyntaxKind::ArrayType
                };
                self.expect(SyntaxKind::RBracket);
                self.start_node_at(checkpoint, kind);
                self.finish_node();
            }
            SyntaxKind::Ident | SyntaxKind::SelfTypeKw => {
                self.start_node(SyntaxKind::IdentifierType);
                self.bump();
                if self.at(SyntaxKind::LAngle) && self.attached() {
                    self.parse_generic_argument_clause();
                }
                self.finish_node();
            }
            _ => {
                self.error("expected type");
                return false;
            }
        }

        loop {
            match self.current() {
                SyntaxKind::Dot if Self::is_name_like(self.nth(1)) => {
                    self.start_node_at(checkpoint, SyntaxKind::MemberType);
                    self.bump();
                    self.bump();
                    if self.at(SyntaxKind::LAngle) && self.attached() {
                        self.parse_generic_argument_clause();
                    }
                    self.finish_node();
                }
                SyntaxKind::Question => {
                    self.start_node_at(checkpoint, SyntaxKind::OptionalType);
                    self.bump();
                    self.finish_node();
                }
                SyntaxKind::Bang => {
                    self.start_node_at(checkpoint, SyntaxKind::ImplicitlyUnwrappedOptionalType);
                    self.bump();
                    self.finish_node();
                }
                _ => break,
            }
        }
        true
    }

    fn parse_tuple_type(&mut self) {
        self.start_node(SyntaxKind::TupleType);
        self.bump();
        while !self.at(SyntaxKind::RParen) && !self.at_eof() {
            let before = self.cursor;
            self.start_node(SyntaxKind::TupleTypeElement);
            if Self::is_name_like(self.current()) && self.nth(1) == SyntaxKind::Colon {
                self.bump();
                self.bump();
            } else if Self::is_name_like(self.current())
                && Self::is_name_like(self.nth(1))
                && self.nth(2) == SyntaxKind::Colon
            {
                self.bump();
                self.bump();
                self.bump();
            }
            self.parse_type();
            if self.at(SyntaxKind::Operator) && self.nth_text(0) == "..." {
                self.bump();
            }
            self.finish_node();
            if self.cursor == before {
                self.error_and_bump("unexpected token in tuple type");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) {
        match self.current() {
            SyntaxKind::ReturnKw => {
                self.start_node(SyntaxKind::ReturnStmt);
                self.bump();
                if !self.at_statement_end() {
                    self.parse_expr(Restrictions::default());
                }
                self.finish_node();
            }
            SyntaxKind::IfKw => self.parse_if_stmt(),
            SyntaxKind::GuardKw => {
                self.start_node(SyntaxKind::GuardStmt);
                self.bump();
                self.parse_condition_list();
                self.expect(SyntaxKind::ElseKw);
                self.parse_code_block();
                self.finish_node();
            }
            SyntaxKind::ForKw => self.parse_for_stmt(),
            SyntaxKind::WhileKw => {
                self.start_node(SyntaxKind::WhileStmt);
                self.bump();
                self.parse_condition_list();
                self.parse_code_block();
                self.finish_node();
            }
            SyntaxKind::RepeatKw => {
                self.start_node(SyntaxKind::RepeatStmt);
                self.bump();
                self.parse_code_block();
                if self.expect(SyntaxKind::WhileKw) {
                    self.parse_expr(Restrictions::default());
                }
                self.finish_node();
            }
            SyntaxKind::SwitchKw => self.parse_switch_stmt(),
            SyntaxKind::DeferKw => {
                self.start_node(SyntaxKind::DeferStmt);
                self.bump();
                self.parse_code_block();
                self.finish_node();
            }
            SyntaxKind::DoKw => self.parse_do_stmt(),
            SyntaxKind::ThrowKw => {
                self.start_node(SyntaxKind::ThrowStmt);
                self.bump();
                self.parse_expr(Restrictions::default());
                self.finish_node();
            }
            SyntaxKind::BreakKw | SyntaxKind::ContinueKw => {
                let kind = if self.at(SyntaxKind::BreakKw) {
                    SyntaxKind::BreakStmt
                } else {
                    SyntaxKind::ContinueStmt
                };
                self.start_node(kind);
                self.bump();
                if self.at(SyntaxKind::Ident) && !self.newline_before() {
                    self.bump();
                }
                self.finish_node();
            }
            SyntaxKind::FallthroughKw => {
                self.start_node(SyntaxKind::FallthroughStmt);
                self.bump();
                self.finish_node();
            }
            _ => {
                self.parse_expr(Restrictions::default());
            }
        }
    }

    fn parse_if_stmt(&mut self) {
        self.start_node(SyntaxKind::IfStmt);
        self.bump();
        self.parse_condition_list();
        self.parse_code_block();
        if self.at(SyntaxKind::ElseKw) {
            self.bump();
            if self.at(SyntaxKind::IfKw) {
                self.parse_if_stmt();
            } else {
                self.parse_code_block();
            }
        }
        self.finish_node();
    }

    fn parse_for_stmt(&mut self) {
        self.start_node(SyntaxKind::ForStmt);
        self.bump();
        if self.at(SyntaxKind::CaseKw) {
            self.bump();
        }
        self.parse_pattern();
        if self.at(SyntaxKind::Colon) {
            self.parse_type_annotation();
        }
        if self.expect(SyntaxKind::InKw) {
            self.parse_expr(Restrictions::CONDITION);
        }
        if self.at(SyntaxKind::WhereKw) {
            self.bump();
            self.parse_expr(Restrictions::CONDITION);
        }
        self.parse_code_block();
        self.finish_node();
    }

    fn parse_switch_stmt(&mut self) {
        self.start_node(SyntaxKind::SwitchStmt);
        self.bump();
        self.parse_expr(Restrictions::CONDITION);
        if self.expect(SyntaxKind::LBrace) {
            while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
                if self.at_switch_case_start() {
                    self.parse_switch_case();
                } else {
                    self.error_and_bump("expected 'case' or 'default'");
                }
            }
            self.expect(SyntaxKind::RBrace);
        }
        self.finish_node();
    }

    /// `case`, `default` or an attributed label such as `@unknown default`
    fn at_switch_case_start(&self) -> bool {
        match self.current() {
            SyntaxKind::CaseKw | SyntaxKind::DefaultKw => true,
            SyntaxKind::At => matches!(self.nth(2), SyntaxKind::CaseKw | SyntaxKind::DefaultKw),
            _ => false,
        }
    }

    fn parse_switch_case(&mut self) {
        self.start_node(SyntaxKind::SwitchCase);
        self.parse_attributes();
        if self.at(SyntaxKind::DefaultKw) {
            self.start_node(SyntaxKind::SwitchDefaultLabel);
            self.bump();
            self.expect(SyntaxKind::Colon);
            self.finish_node();
        } else {
            self.start_node(SyntaxKind::SwitchCaseLabel);
            self.expect(SyntaxKind::CaseKw);
            self.bump_until(|p| p.at(SyntaxKind::Colon));
            self.expect(SyntaxKind::Colon);
            self.finish_node();
        }
        self.with_context(BlockContext::Code, |p| {
            while !p.at_switch_case_start() && !p.at(SyntaxKind::RBrace) && !p.at_eof() {
                p.parse_code_block_item();
            }
        });
        self.finish_node();
    }

    fn parse_do_stmt(&mut self) {
        self.start_node(SyntaxKind::DoStmt);
        self.bump();
        self.parse_code_block();
        while self.at(SyntaxKind::CatchKw) {
            self.start_node(SyntaxKind::CatchClause);
            self.bump();
            self.bump_until(|p| p.at(SyntaxKind::LBrace));
            self.parse_code_block();
            self.finish_node();
        }
        self.finish_node();
    }

    fn parse_condition_list(&mut self) {
        self.start_node(SyntaxKind::ConditionList);
        loop {
            match self.current() {
                SyntaxKind::LetKw | SyntaxKind::VarKw => {
                    self.start_node(SyntaxKind::OptionalBindingCondition);
                    self.bump();
                    self.parse_pattern();
                    if self.at(SyntaxKind::Colon) {
                        self.parse_type_annotation();
                    }
                    if self.at(SyntaxKind::Equals) {
                        self.parse_initializer_clause(Restrictions::CONDITION);
                    }
                    self.finish_node();
                }
                SyntaxKind::CaseKw => {
                    self.start_node(SyntaxKind::ConditionElement);
                    self.bump();
                    self.bump_until(|p| p.at(SyntaxKind::Equals) || p.at(SyntaxKind::LBrace));
                    if self.at(SyntaxKind::Equals) {
                        self.bump();
                        self.parse_expr(Restrictions::CONDITION);
                    }
                    self.finish_node();
                }
                _ => {
                    self.start_node(SyntaxKind::ConditionElement);
                    if !self.parse_expr(Restrictions::CONDITION) {
                        self.error("expected condition");
                    }
                    self.finish_node();
                }
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Parse a (possibly unfolded) sequence expression
    ///
    /// Binary operators are kept flat inside a `SequenceExpr`; no precedence
    /// folding takes place.
    fn parse_expr(&mut self, restrictions: Restrictions) -> bool {
        self.nested(|p| p.parse_expr_body(restrictions))
    }

    fn parse_expr_body(&mut self, restrictions: Restrictions) -> bool {
        let checkpoint = self.checkpoint();
        if !self.parse_unary_expr(restrictions) {
            return false;
        }

        let mut is_sequence = false;
        let mut open_ternaries = 0usize;
        loop {
            match self.current() {
                SyntaxKind::Operator | SyntaxKind::LAngle | SyntaxKind::RAngle => {
                    if self.nth_text(0) == "?" {
                        open_ternaries += 1;
                    }
                    self.start_node(SyntaxKind::BinaryOperatorExpr);
                    self.bump();
                    self.finish_node();
                    if !self.parse_unary_expr(restrictions) {
                        self.error("expected expression after operator");
                    }
                }
                SyntaxKind::Colon if open_ternaries > 0 => {
                    open_ternaries -= 1;
                    self.start_node(SyntaxKind::BinaryOperatorExpr);
                    self.bump();
                    self.finish_node();
                    if !self.parse_unary_expr(restrictions) {
                        self.error("expected expression after ':'");
                    }
                }
                SyntaxKind::Equals => {
                    self.start_node(SyntaxKind::AssignmentExpr);
                    self.bump();
                    self.finish_node();
                    if !self.parse_unary_expr(restrictions) {
                        self.error("expected expression after '='");
                    }
                }
                SyntaxKind::AsKw => {
                    self.start_node(SyntaxKind::AsExpr);
                    self.bump();
                    let marker = matches!(self.current(), SyntaxKind::Question | SyntaxKind::Bang)
                        || (self.at(SyntaxKind::Operator) && matches!(self.nth_text(0), "?" | "!"));
                    if marker {
                        self.bump();
                    }
                    self.parse_type();
                    self.finish_node();
                }
                SyntaxKind::IsKw => {
                    self.start_node(SyntaxKind::IsExpr);
                    self.bump();
                    self.parse_type();
                    self.finish_node();
                }
                _ => break,
            }
            is_sequence = true;
        }

        if is_sequence {
            self.start_node_at(checkpoint, SyntaxKind::SequenceExpr);
            self.finish_node();
        }
        true
    }

    fn parse_unary_expr(&mut self, restrictions: Restrictions) -> bool {
        self.nested(|p| p.parse_unary_expr_body(restrictions))
    }

    fn parse_unary_expr_body(&mut self, restrictions: Restrictions) -> bool {
        match self.current() {
            SyntaxKind::TryKw => {
                self.start_node(SyntaxKind::TryExpr);
                self.bump();
                let marker = matches!(self.current(), SyntaxKind::Question | SyntaxKind::Bang)
                    || (self.at(SyntaxKind::Operator)
                        && matches!(self.nth_text(0), "?" | "!")
                        && self.attached());
                if marker {
                    self.bump();
                }
                if !self.parse_unary_expr(restrictions) {
                    self.error("expected expression after 'try'");
                }
                self.finish_node();
                true
            }
            SyntaxKind::Ident
                if self.nth_text(0) == "await"
                    && !matches!(
                        self.nth(1),
                        SyntaxKind::Dot
                            | SyntaxKind::LParen
                            | SyntaxKind::Equals
                            | SyntaxKind::Colon
                            | SyntaxKind::Comma
                            | SyntaxKind::RParen
                            | SyntaxKind::Eof
                    ) =>
            {
                self.start_node(SyntaxKind::AwaitExpr);
                self.bump_remap(SyntaxKind::AwaitKw);
                if !self.parse_unary_expr(restrictions) {
                    self.error("expected expression after 'await'");
                }
                self.finish_node();
                true
            }
            SyntaxKind::Operator if self.nth_attached(1) && !self.at_operator_reference() => {
                self.start_node(SyntaxKind::PrefixOperatorExpr);
                self.bump();
                if !self.parse_unary_expr(restrictions) {
                    self.error("expected operand");
                }
                self.finish_node();
                true
            }
            _ => self.parse_postfix_expr(restrictions),
        }
    }

    /// An operator passed as a value, `+` in `reduce(0, +)`
    fn at_operator_reference(&self) -> bool {
        self.at(SyntaxKind::Operator)
            && matches!(
                self.nth(1),
                SyntaxKind::RParen | SyntaxKind::Comma | SyntaxKind::RBracket
            )
    }

    fn parse_postfix_expr(&mut self, restrictions: Restrictions) -> bool {
        let checkpoint = self.checkpoint();
        let Some(mut last) = self.parse_primary_expr() else {
            return false;
        };

        loop {
            match self.current() {
                SyntaxKind::Dot => {
                    self.start_node_at(checkpoint, SyntaxKind::MemberAccessExpr);
                    self.bump();
                    if Self::is_name_like(self.current()) || self.at(SyntaxKind::IntegerLiteral) {
                        self.bump();
                    } else {
                        self.error("expected member name");
                    }
                    self.finish_node();
                    last = SyntaxKind::MemberAccessExpr;
                }
                SyntaxKind::LParen if !self.newline_before() => {
                    self.start_node_at(checkpoint, SyntaxKind::FunctionCallExpr);
                    self.parse_arguments(SyntaxKind::RParen);
                    if !restrictions.no_trailing_closure
                        && self.at(SyntaxKind::LBrace)
                        && !self.newline_before()
                    {
                        self.parse_closure_expr();
                    }
                    self.finish_node();
                    last = SyntaxKind::FunctionCallExpr;
                }
                SyntaxKind::LBracket if !self.newline_before() => {
                    self.start_node_at(checkpoint, SyntaxKind::SubscriptCallExpr);
                    self.parse_arguments(SyntaxKind::RBracket);
                    self.finish_node();
                    last = SyntaxKind::SubscriptCallExpr;
                }
                SyntaxKind::Question => {
                    self.start_node_at(checkpoint, SyntaxKind::OptionalChainingExpr);
                    self.bump();
                    self.finish_node();
                    last = SyntaxKind::OptionalChainingExpr;
                }
                SyntaxKind::Bang => {
                    self.start_node_at(checkpoint, SyntaxKind::ForceUnwrapExpr);
                    self.bump();
                    self.finish_node();
                    last = SyntaxKind::ForceUnwrapExpr;
                }
                SyntaxKind::LBrace
                    if !restrictions.no_trailing_closure
                        && !self.newline_before()
                        && matches!(
                            last,
                            SyntaxKind::DeclReferenceExpr
                                | SyntaxKind::MemberAccessExpr
                                | SyntaxKind::SelfExpr
                                | SyntaxKind::SubscriptCallExpr
                                | SyntaxKind::OptionalChainingExpr
                                | SyntaxKind::ForceUnwrapExpr
                        ) =>
                {
                    self.start_node_at(checkpoint, SyntaxKind::FunctionCallExpr);
                    self.parse_closure_expr();
                    self.finish_node();
                    last = SyntaxKind::FunctionCallExpr;
                }
                _ => break,
            }
        }
        true
    }

    /// Parse a primary expression, returning the kind of node produced
    fn parse_primary_expr(&mut self) -> Option<SyntaxKind> {
        let kind = match self.current() {
            SyntaxKind::Ident | SyntaxKind::Underscore | SyntaxKind::SelfTypeKw => {
                self.start_node(SyntaxKind::DeclReferenceExpr);
                self.bump();
                if self.at(SyntaxKind::LAngle) && self.attached() {
                    self.parse_generic_argument_clause();
                }
                self.finish_node();
                SyntaxKind::DeclReferenceExpr
            }
            SyntaxKind::Operator if self.at_operator_reference() => {
                self.single_token_expr(SyntaxKind::DeclReferenceExpr)
            }
            SyntaxKind::SelfKw => self.single_token_expr(SyntaxKind::SelfExpr),
            SyntaxKind::SuperKw => self.single_token_expr(SyntaxKind::SuperExpr),
            SyntaxKind::IntegerLiteral => self.single_token_expr(SyntaxKind::IntegerLiteralExpr),
            SyntaxKind::FloatLiteral => self.single_token_expr(SyntaxKind::FloatLiteralExpr),
            SyntaxKind::StringLiteral => self.single_token_expr(SyntaxKind::StringLiteralExpr),
            SyntaxKind::TrueKw | SyntaxKind::FalseKw => {
                self.single_token_expr(SyntaxKind::BooleanLiteralExpr)
            }
            SyntaxKind::NilKw => self.single_token_expr(SyntaxKind::NilLiteralExpr),
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::TupleExpr);
                self.parse_arguments(SyntaxKind::RParen);
                self.finish_node();
                SyntaxKind::TupleExpr
            }
            SyntaxKind::LBracket => self.parse_collection_expr(),
            SyntaxKind::LBrace => {
                self.parse_closure_expr();
                SyntaxKind::ClosureExpr
            }
            SyntaxKind::Dot => {
                // Implicit member: `.foo`
                self.start_node(SyntaxKind::MemberAccessExpr);
                self.bump();
                if Self::is_name_like(self.current()) {
                    self.bump();
                } else {
                    self.error("expected member name");
                }
                self.finish_node();
                SyntaxKind::MemberAccessExpr
            }
            SyntaxKind::PoundKeyword => {
                self.start_node(SyntaxKind::MacroExpansionExpr);
                self.bump();
                if self.at(SyntaxKind::LParen) && self.attached() {
                    self.parse_arguments(SyntaxKind::RParen);
                }
                self.finish_node();
                SyntaxKind::MacroExpansionExpr
            }
            SyntaxKind::IfKw => {
                self.parse_if_stmt();
                SyntaxKind::IfStmt
            }
            SyntaxKind::SwitchKw => {
                self.parse_switch_stmt();
                SyntaxKind::SwitchStmt
            }
            _ => return None,
        };
        Some(kind)
    }

    fn single_token_expr(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.start_node(kind);
        self.bump();
        self.finish_node();
        kind
    }

    fn parse_collection_expr(&mut self) -> SyntaxKind {
        let checkpoint = self.checkpoint();
        self.bump();

        let kind = if self.at(SyntaxKind::Colon) && self.nth(1) == SyntaxKind::RBracket {
            self.bump();
            SyntaxKind::DictionaryExpr
        } else if self.at(SyntaxKind::RBracket) {
            SyntaxKind::ArrayExpr
        } else {
            let first = self.checkpoint();
            self.parse_expr(Restrictions::default());
            let is_dictionary = self.at(SyntaxKind::Colon);
            if is_dictionary {
                self.start_node_at(first, SyntaxKind::DictionaryElement);
                self.bump();
                self.parse_expr(Restrictions::default());
                self.finish_node();
            }
            while self.at(SyntaxKind::Comma) {
                self.bump();
                if self.at(SyntaxKind::RBracket) {
                    break;
                }
                let before = self.cursor;
                if is_dictionary {
                    self.start_node(SyntaxKind::DictionaryElement);
                    self.parse_expr(Restrictions::default());
                    self.expect(SyntaxKind::Colon);
                    self.parse_expr(Restrictions::default());
                    self.finish_node();
                } else {
                    self.parse_expr(Restrictions::default());
                }
                if self.cursor == before {
                    self.error_and_bump("unexpected token in collection literal");
                }
            }
            if is_dictionary {
                SyntaxKind::DictionaryExpr
            } else {
                SyntaxKind::ArrayExpr
            }
        };

        self.expect(SyntaxKind::RBracket);
        self.start_node_at(checkpoint, kind);
        self.finish_node();
        kind
    }

    /// Parse `( args )` or `[ args ]`, the argument list node sits between the delimiters
    fn parse_arguments(&mut self, close: SyntaxKind) {
        self.bump();
        self.start_node(SyntaxKind::ArgumentList);
        while !self.at(close) && !self.at_eof() {
            let before = self.cursor;
            self.start_node(SyntaxKind::LabeledExpr);
            if Self::is_name_like(self.current()) && self.nth(1) == SyntaxKind::Colon {
                self.bump();
                self.bump();
            }
            self.parse_expr(Restrictions::default());
            self.finish_node();
            if self.cursor == before {
                self.error_and_bump("unexpected token in argument list");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.finish_node();
        self.expect(close);
    }

    fn parse_closure_expr(&mut self) {
        self.start_node(SyntaxKind::ClosureExpr);
        self.bump();
        if self.closure_signature_ahead() {
            self.parse_closure_signature();
        }
        self.with_context(BlockContext::Code, |p| {
            while !p.at(SyntaxKind::RBrace) && !p.at_eof() {
                p.parse_code_block_item();
            }
        });
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_closure_signature(&mut self) {
        self.start_node(SyntaxKind::ClosureSignature);
        self.parse_attributes();
        if self.at(SyntaxKind::LBracket) {
            self.parse_closure_capture_clause();
        }
        if self.at(SyntaxKind::LParen) {
            self.start_node(SyntaxKind::ClosureParameterClause);
            self.bump();
            while !self.at(SyntaxKind::RParen) && !self.at_eof() {
                let before = self.cursor;
                self.start_node(SyntaxKind::ClosureParameter);
                let mut names = 0;
                while names < 2 && Self::is_name_like(self.current()) && !self.at(SyntaxKind::Colon) {
                    self.bump();
                    names += 1;
                }
                if self.at(SyntaxKind::Colon) {
                    self.bump();
                    self.parse_type();
                }
                self.finish_node();
                if self.cursor == before {
                    self.error_and_bump("unexpected token in closure parameters");
                }
                if !self.at(SyntaxKind::Comma) {
                    break;
                }
                self.bump();
            }
            self.expect(SyntaxKind::RParen);
            self.finish_node();
        } else if matches!(self.current(), SyntaxKind::Ident | SyntaxKind::Underscore) {
            self.start_node(SyntaxKind::ClosureParameterClause);
            loop {
                self.start_node(SyntaxKind::ClosureParameter);
                self.bump();
                self.finish_node();
                if !self.at(SyntaxKind::Comma) {
                    break;
                }
                self.bump();
            }
            self.finish_node();
        }
        self.parse_effect_specifiers();
        if self.at(SyntaxKind::Arrow) {
            self.parse_return_clause();
        }
        self.expect(SyntaxKind::InKw);
        self.finish_node();
    }

    fn parse_closure_capture_clause(&mut self) {
        self.start_node(SyntaxKind::ClosureCaptureClause);
        self.bump();
        while !self.at(SyntaxKind::RBracket) && !self.at_eof() {
            let before = self.cursor;
            self.start_node(SyntaxKind::ClosureCapture);
            let has_specifier = self.nth_is_contextual(0, &["weak", "unowned"])
                && !matches!(
                    self.nth(1),
                    SyntaxKind::Equals | SyntaxKind::Comma | SyntaxKind::RBracket
                );
            if has_specifier {
                self.start_node(SyntaxKind::ClosureCaptureSpecifier);
                let kind = SyntaxKind::from_contextual_keyword(self.nth_text(0))
                    .unwrap_or(SyntaxKind::Ident);
                self.bump_remap(kind);
                if self.at(SyntaxKind::LParen) && self.attached() {
                    self.parse_modifier_detail();
                }
                self.finish_node();
            }
            if Self::is_name_like(self.current()) && self.nth(1) == SyntaxKind::Equals {
                self.bump();
                self.bump();
            }
            self.parse_expr(Restrictions::default());
            self.finish_node();
            if self.cursor == before {
                self.error_and_bump("unexpected token in capture list");
            }
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RBracket);
        self.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SyntaxNode {
        let parsed = parse(source);
        assert!(
            parsed.errors().is_empty(),
            "unexpected errors for {source:?}: {:?}",
            parsed.errors()
        );
        let root = parsed.syntax();
        assert_eq!(root.text().to_string(), source);
        root
    }

    fn kinds_of(root: &SyntaxNode) -> Vec<SyntaxKind> {
        root.descendants().map(|node| node.kind()).collect()
    }

    #[test]
    fn test_enum_with_associated_values() {
        let root = parse_ok("enum E { case add(x: Int); case other; case add(y: Int) }");
        let kinds = kinds_of(&root);
        assert_eq!(
            kinds.iter().filter(|k| **k == SyntaxKind::EnumCaseElement).count(),
            3
        );
        assert!(kinds.contains(&SyntaxKind::EnumCaseParameterClause));
    }

    #[test]
    fn test_closure_with_capture_list() {
        let root = parse_ok("foo { [unowned self] in bar() }");
        let specifier = root
            .descendants()
            .find(|node| node.kind() == SyntaxKind::ClosureCaptureSpecifier)
            .expect("capture specifier");
        let token = specifier.first_token().expect("token");
        assert_eq!(token.kind(), SyntaxKind::UnownedKw);
        assert_eq!(usize::from(token.text_range().start()), 7);
    }

    #[test]
    fn test_attributes_and_modifiers() {
        let root = parse_ok("@IBOutlet weak var label: UILabel?");
        let decl = root
            .descendants()
            .find(|node| node.kind() == SyntaxKind::VariableDecl)
            .expect("variable decl");
        let children: Vec<_> = decl.children().map(|n| n.kind()).collect();
        assert_eq!(
            children,
            vec![
                SyntaxKind::Attribute,
                SyntaxKind::Modifier,
                SyntaxKind::PatternBinding
            ]
        );
        assert!(kinds_of(&root).contains(&SyntaxKind::OptionalType));
    }

    #[test]
    fn test_contextual_identifiers_stay_identifiers() {
        let root = parse_ok("let weak = optional\nvar lazy: Int = 1");
        assert!(!kinds_of(&root).contains(&SyntaxKind::Modifier));
    }

    #[test]
    fn test_class_with_members() {
        let source = "\
private class FooTest: XCTestCase {
    override func setUp() {
        super.setUp()
    }

    private func test1() throws -> String { \"\" }
    static var shared: FooTest? = nil
}
";
        let root = parse_ok(source);
        let kinds = kinds_of(&root);
        assert!(kinds.contains(&SyntaxKind::ClassDecl));
        assert!(kinds.contains(&SyntaxKind::InheritanceClause));
        assert_eq!(
            kinds.iter().filter(|k| **k == SyntaxKind::FunctionDecl).count(),
            2
        );
        assert!(kinds.contains(&SyntaxKind::EffectSpecifiers));
        assert!(kinds.contains(&SyntaxKind::ReturnClause));
    }

    #[test]
    fn test_accessor_blocks() {
        parse_ok("var myVar: String? = nil {\n    didSet { print(\"didSet\") }\n}");
        parse_ok("var foo: Int? {\n  if bar != nil { }\n  return 0\n}");
        parse_ok("var foo: Int? = {\n  if bar != nil { }\n  return 0\n}()");
    }

    #[test]
    fn test_statements() {
        let source = "\
func f(b: Bool) {
    guard let x = y else { return }
    for item in items where item > 0 {
        continue
    }
    switch value {
    case .a, .b:
        break
    default:
        fallthrough
    }
    do {
        try foo()
    } catch {
        print(error)
    }
    if b {
        return g()
    } else if c {
        x = a ? 1 : 2
    }
}
";
        let root = parse_ok(source);
        let kinds = kinds_of(&root);
        for kind in [
            SyntaxKind::GuardStmt,
            SyntaxKind::ForStmt,
            SyntaxKind::SwitchStmt,
            SyntaxKind::DoStmt,
            SyntaxKind::CatchClause,
            SyntaxKind::IfStmt,
            SyntaxKind::ReturnStmt,
            SyntaxKind::SequenceExpr,
            SyntaxKind::OptionalBindingCondition,
        ] {
            assert!(kinds.contains(&kind), "missing {kind}");
        }
    }

    #[test]
    fn test_if_condition_does_not_take_trailing_closure() {
        let root = parse_ok("if foo { bar() }");
        let kinds = kinds_of(&root);
        assert!(kinds.contains(&SyntaxKind::IfStmt));
        assert!(!kinds.contains(&SyntaxKind::ClosureExpr));
    }

    #[test]
    fn test_node_ranges_start_at_significant_tokens() {
        let root = parse_ok("\n\n    // comment\n    class A {}\n");
        let class = root
            .descendants()
            .find(|node| node.kind() == SyntaxKind::ClassDecl)
            .expect("class");
        assert_eq!(usize::from(class.text_range().start()), 21);
    }

    #[test]
    fn test_garbage_is_preserved_in_error_nodes() {
        let source = "} let x = 1 )";
        let parsed = parse(source);
        assert!(!parsed.errors().is_empty());
        assert_eq!(parsed.syntax().text().to_string(), source);
        assert!(
            parsed
                .syntax()
                .descendants()
                .any(|node| node.kind() == SyntaxKind::Error)
        );
    }

    #[test]
    fn test_moderate_nesting_parses_cleanly() {
        let source = format!("let x = {}1{}", "(".repeat(100), ")".repeat(100));
        parse_ok(&source);
    }

    #[test]
    fn test_deep_nesting_is_cut_off_losslessly() {
        let sources = [
            format!("let x = {}1{}\nlet y = 2", "(".repeat(5000), ")".repeat(5000)),
            format!("let x: {}Int{}", "[".repeat(5000), "]".repeat(5000)),
            format!("let x = {}y", "try ".repeat(5000)),
            format!("func f() {}{}", "{ g { ".repeat(3000), "} }".repeat(3000)),
        ];
        for source in &sources {
            let parsed = parse(source);
            assert_eq!(parsed.syntax().text().to_string(), *source);
            assert!(
                parsed
                    .errors()
                    .iter()
                    .any(|error| error.message == "nesting too deep")
            );
            assert!(
                parsed
                    .syntax()
                    .descendants()
                    .any(|node| node.kind() == SyntaxKind::Error)
            );
        }
    }

    #[test]
    fn test_statements_after_deep_nesting_still_parse() {
        let source = format!("let x = {}1{}\nlet y = 2\n", "(".repeat(5000), ")".repeat(5000));
        let root = parse(&source).syntax();
        let declarations = root
            .children()
            .filter_map(|item| item.first_child())
            .filter(|node| node.kind() == SyntaxKind::VariableDecl)
            .count();
        assert_eq!(declarations, 2);
    }
}
