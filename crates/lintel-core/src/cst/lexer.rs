//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! Every byte of the input ends up in exactly one token, so concatenating the
//! token texts reproduces the source. The parser relies on this to build a
//! lossless tree.

use std::ops::Range;

use super::SyntaxKind;

/// Simple span representing a byte range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

const OPERATOR_CHARS: &[char] = &[
    '/', '=', '-', '+', '!', '*', '%', '<', '>', '&', '|', '^', '~', '?',
];

/// Lex input preserving ALL trivia for CST construction
///
/// - Whitespace runs become `Whitespace` tokens
/// - Each line break becomes a `Newline` token
/// - Comments become `LineComment` / `BlockComment` tokens
///
/// Contextual keywords (`weak`, `lazy`, `didSet`, ...) are produced as
/// `Ident`; the parser remaps them where the grammar gives them meaning.
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
    /// Open `<` generic brackets awaiting a `>`
    angle_depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            angle_depth: 0,
        }
    }

    fn run(mut self) -> CstLexResult {
        while let Some(current) = self.peek_char(0) {
            let start = self.pos;
            match current {
                '\n' => self.push(SyntaxKind::Newline, start, start + 1),
                '\r' => {
                    let end = if self.peek_char(1) == Some('\n') {
                        start + 2
                    } else {
                        start + 1
                    };
                    self.push(SyntaxKind::Newline, start, end);
                }
                ' ' | '\t' => {
                    let end = self.scan_while(start, |c| c == ' ' || c == '\t');
                    self.push(SyntaxKind::Whitespace, start, end);
                }
                '/' if self.peek_char(1) == Some('/') => {
                    let end = self.scan_while(start, |c| c != '\n' && c != '\r');
                    self.push(SyntaxKind::LineComment, start, end);
                }
                '/' if self.peek_char(1) == Some('*') => {
                    let end = self.lex_block_comment(start);
                    self.push(SyntaxKind::BlockComment, start, end);
                }
                '"' => {
                    let end = self.lex_string(start);
                    self.push(SyntaxKind::StringLiteral, start, end);
                }
                '`' => {
                    let end = match self.input[start + 1..].find('`') {
                        Some(idx) => start + idx + 2,
                        None => {
                            self.errors.push(LexerError::new(
                                "Unterminated backtick identifier",
                                start..self.input.len(),
                            ));
                            self.input.len()
                        }
                    };
                    self.push(SyntaxKind::Ident, start, end);
                }
                '$' => {
                    let end = self.scan_while(start + 1, is_ident_continue);
                    self.push(SyntaxKind::Ident, start, end);
                }
                '#' => {
                    let end = self.scan_while(start + 1, is_ident_continue);
                    self.push(SyntaxKind::PoundKeyword, start, end);
                }
                c if c.is_ascii_digit() => self.lex_number(start),
                c if is_ident_start(c) => self.lex_identifier(start),
                '(' => self.push_punct(SyntaxKind::LParen, start),
                ')' => self.push_punct(SyntaxKind::RParen, start),
                '{' => {
                    self.angle_depth = 0;
                    self.push_punct(SyntaxKind::LBrace, start);
                }
                '}' => {
                    self.angle_depth = 0;
                    self.push_punct(SyntaxKind::RBrace, start);
                }
                '[' => self.push_punct(SyntaxKind::LBracket, start),
                ']' => self.push_punct(SyntaxKind::RBracket, start),
                ',' => self.push_punct(SyntaxKind::Comma, start),
                ':' => self.push_punct(SyntaxKind::Colon, start),
                ';' => self.push_punct(SyntaxKind::Semicolon, start),
                '@' => self.push_punct(SyntaxKind::At, start),
                '.' => {
                    if self.peek_char(1) == Some('.') {
                        let end = self.scan_while(start, |c| c == '.' || c == '<');
                        self.push(SyntaxKind::Operator, start, end);
                    } else {
                        self.push_punct(SyntaxKind::Dot, start);
                    }
                }
                '\\' => self.push_punct(SyntaxKind::Operator, start),
                c if OPERATOR_CHARS.contains(&c) => self.lex_operator(start),
                other => {
                    let end = start + other.len_utf8();
                    self.errors.push(LexerError::new(
                        format!("Unexpected character '{other}'"),
                        start..end,
                    ));
                    self.push(SyntaxKind::Error, start, end);
                }
            }
        }

        (self.tokens, self.errors)
    }

    fn peek_char(&self, nth: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(nth)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.input.get(offset..).and_then(|rest| rest.chars().next())
    }

    fn scan_while(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        let mut end = from;
        for c in self.input[from..].chars() {
            if !pred(c) {
                break;
            }
            end += c.len_utf8();
        }
        end
    }

    fn push(&mut self, kind: SyntaxKind, start: usize, end: usize) {
        self.tokens
            .push(CstToken::new(kind, &self.input[start..end], start..end));
        self.pos = end;
    }

    fn push_punct(&mut self, kind: SyntaxKind, start: usize) {
        self.push(kind, start, start + 1);
    }

    /// Whether the token being lexed touches the previous significant token
    fn is_attached(&self) -> bool {
        self.tokens.last().is_some_and(|token| {
            !token.kind.is_trivia()
                && token.span.end == self.pos
                && matches!(
                    token.kind,
                    SyntaxKind::Ident
                        | SyntaxKind::RParen
                        | SyntaxKind::RBracket
                        | SyntaxKind::RAngle
                        | SyntaxKind::Question
                        | SyntaxKind::Bang
                        | SyntaxKind::SelfKw
                        | SyntaxKind::SelfTypeKw
                        | SyntaxKind::StringLiteral
                        | SyntaxKind::IntegerLiteral
                )
        })
    }

    fn lex_identifier(&mut self, start: usize) {
        let end = self.scan_while(start, is_ident_continue);
        let text = &self.input[start..end];
        let kind = if text == "_" {
            SyntaxKind::Underscore
        } else {
            SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Ident)
        };
        self.push(kind, start, end);
    }

    fn lex_number(&mut self, start: usize) {
        let is_radix = self.peek_char(0) == Some('0')
            && matches!(self.peek_char(1), Some('x' | 'o' | 'b'));
        if is_radix {
            let end = self.scan_while(start + 2, |c| c.is_ascii_hexdigit() || c == '_');
            self.push(SyntaxKind::IntegerLiteral, start, end);
            return;
        }

        let mut end = self.scan_while(start, |c| c.is_ascii_digit() || c == '_');
        let mut kind = SyntaxKind::IntegerLiteral;

        let fraction_follows = self.char_at(end) == Some('.')
            && self.char_at(end + 1).is_some_and(|c| c.is_ascii_digit());
        if fraction_follows {
            end = self.scan_while(end + 1, |c| c.is_ascii_digit() || c == '_');
            kind = SyntaxKind::FloatLiteral;
        }

        if matches!(self.char_at(end), Some('e' | 'E')) {
            let mut exponent = end + 1;
            if matches!(self.char_at(exponent), Some('+' | '-')) {
                exponent += 1;
            }
            if self.char_at(exponent).is_some_and(|c| c.is_ascii_digit()) {
                end = self.scan_while(exponent, |c| c.is_ascii_digit());
                kind = SyntaxKind::FloatLiteral;
            }
        }

        self.push(kind, start, end);
    }

    fn lex_block_comment(&mut self, start: usize) -> usize {
        let bytes = self.input.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i + 1 < bytes.len() {
            match (bytes[i], bytes[i + 1]) {
                (b'/', b'*') => {
                    depth += 1;
                    i += 2;
                }
                (b'*', b'/') => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => i += 1,
            }
        }
        self.errors.push(LexerError::new(
            "Unterminated block comment",
            start..self.input.len(),
        ));
        self.input.len()
    }

    /// Lex a string literal starting at `start`, returning its end offset
    ///
    /// Interpolations (`\( ... )`) may contain nested string literals and
    /// parentheses; they stay part of the one literal token.
    fn lex_string(&mut self, start: usize) -> usize {
        let multiline = self.input[start..].starts_with("\"\"\"");
        let (open_len, close) = if multiline { (3, "\"\"\"") } else { (1, "\"") };
        match scan_string_body(self.input, start + open_len, close, multiline) {
            Some(end) => end,
            None => {
                let end = if multiline {
                    self.input.len()
                } else {
                    self.scan_while(start + 1, |c| c != '\n' && c != '\r')
                };
                self.errors
                    .push(LexerError::new("Unterminated string literal", start..end));
                end
            }
        }
    }

    fn lex_operator(&mut self, start: usize) {
        let first = self.peek_char(0).unwrap_or_default();

        // Postfix `?` / `!` bind to the preceding token.
        if (first == '?' || first == '!') && self.is_attached() {
            let kind = if first == '?' {
                SyntaxKind::Question
            } else {
                SyntaxKind::Bang
            };
            self.push_punct(kind, start);
            return;
        }

        if first == '<' && self.is_attached() && self.looks_like_generic_open(start) {
            self.angle_depth += 1;
            self.push_punct(SyntaxKind::LAngle, start);
            return;
        }

        if first == '>' && self.angle_depth > 0 {
            self.angle_depth -= 1;
            self.push_punct(SyntaxKind::RAngle, start);
            return;
        }

        let mut end = start;
        let mut chars = self.input[start..].chars().peekable();
        while let Some(c) = chars.next() {
            if !OPERATOR_CHARS.contains(&c) {
                break;
            }
            // A comment start ends the operator run.
            if c == '/' && matches!(chars.peek(), Some('/' | '*')) && end > start {
                break;
            }
            end += c.len_utf8();
        }

        let kind = match &self.input[start..end] {
            "=" => SyntaxKind::Equals,
            "->" => SyntaxKind::Arrow,
            _ => SyntaxKind::Operator,
        };
        self.push(kind, start, end);
    }

    /// `Foo<Bar>` opens a generic clause, `a<b` in expressions rarely occurs
    /// without whitespace; `<=` and `<<` are always operators.
    fn looks_like_generic_open(&self, start: usize) -> bool {
        !matches!(self.char_at(start + 1), Some('=' | '<' | ' '))
    }
}

/// Scan a string body (after the opening quotes) up to and including `close`
fn scan_string_body(input: &str, from: usize, close: &str, multiline: bool) -> Option<usize> {
    let mut i = from;
    while i < input.len() {
        let rest = &input[i..];
        if rest.starts_with(close) {
            return Some(i + close.len());
        }
        let c = rest.chars().next()?;
        if !multiline && (c == '\n' || c == '\r') {
            return None;
        }
        if c == '\\' {
            if rest[1..].starts_with('(') {
                i = scan_interpolation(input, i + 2)?;
                continue;
            }
            i += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        i += c.len_utf8();
    }
    None
}

/// Scan an interpolation body starting after `\(`, returning the offset after `)`
fn scan_interpolation(input: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;
    while i < input.len() {
        let c = input[i..].chars().next()?;
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            '"' => {
                i = scan_string_body(input, i + 1, "\"", false)?;
                continue;
            }
            _ => {}
        }
        i += c.len_utf8();
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<SyntaxKind> {
        let (tokens, errors) = lex_with_trivia(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lossless() {
        let source = "@IBOutlet weak var label: UILabel? // outlet\n/* a /* nested */ b */\r\n";
        let (tokens, errors) = lex_with_trivia(source);
        assert!(errors.is_empty());
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_keywords_and_contextual_idents() {
        assert_eq!(
            kinds("weak var x"),
            vec![SyntaxKind::Ident, SyntaxKind::VarKw, SyntaxKind::Ident]
        );
        assert_eq!(
            kinds("func _ self Self"),
            vec![
                SyntaxKind::FuncKw,
                SyntaxKind::Underscore,
                SyntaxKind::SelfKw,
                SyntaxKind::SelfTypeKw
            ]
        );
    }

    #[test]
    fn test_postfix_question_and_ternary() {
        assert_eq!(
            kinds("Int?=nil"),
            vec![
                SyntaxKind::Ident,
                SyntaxKind::Question,
                SyntaxKind::Equals,
                SyntaxKind::NilKw
            ]
        );
        assert_eq!(
            kinds("a ? b : c"),
            vec![
                SyntaxKind::Ident,
                SyntaxKind::Operator,
                SyntaxKind::Ident,
                SyntaxKind::Colon,
                SyntaxKind::Ident
            ]
        );
    }

    #[test]
    fn test_generic_angles() {
        assert_eq!(
            kinds("Optional<Set<Int>>"),
            vec![
                SyntaxKind::Ident,
                SyntaxKind::LAngle,
                SyntaxKind::Ident,
                SyntaxKind::LAngle,
                SyntaxKind::Ident,
                SyntaxKind::RAngle,
                SyntaxKind::RAngle
            ]
        );
        assert_eq!(
            kinds("a <= b"),
            vec![SyntaxKind::Ident, SyntaxKind::Operator, SyntaxKind::Ident]
        );
    }

    #[test]
    fn test_string_interpolation() {
        let source = r#""value: \(foo("x")) done""#;
        assert_eq!(kinds(source), vec![SyntaxKind::StringLiteral]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1_000 0xFF 1.5 2e10 x.0"),
            vec![
                SyntaxKind::IntegerLiteral,
                SyntaxKind::IntegerLiteral,
                SyntaxKind::FloatLiteral,
                SyntaxKind::FloatLiteral,
                SyntaxKind::Ident,
                SyntaxKind::Dot,
                SyntaxKind::IntegerLiteral
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let (tokens, errors) = lex_with_trivia("let s = \"abc\nlet t = 1");
        assert_eq!(errors.len(), 1);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, "let s = \"abc\nlet t = 1");
    }
}
