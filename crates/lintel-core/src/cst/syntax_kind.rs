//! Syntax kind enumeration for the lintel CST
//!
//! This module defines all possible node and token types in the syntax tree.
//! The numeric ranges are stable and grouped so classification is a range check:
//!
//! - `0..10`: trivia
//! - `10..70`: reserved keywords
//! - `70..100`: contextual keywords (lexed as identifiers, remapped by the parser)
//! - `100..150`: punctuation and operators
//! - `150..200`: identifiers and literals
//! - `200..400`: structural nodes
//! - `400`: error node

use std::fmt;

macro_rules! syntax_kinds {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// Syntax kind for every element of the tree
        ///
        /// Tokens and nodes share one closed enumeration so that a
        /// `rowan::SyntaxKind` can be mapped back without loss.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($(#[$meta])* $name = $value,)*
        }

        impl SyntaxKind {
            /// Every kind, in discriminant order
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$name,)*];

            /// Map a raw discriminant back to its kind
            pub const fn from_raw(raw: u16) -> Option<Self> {
                match raw {
                    $($value => Some(SyntaxKind::$name),)*
                    _ => None,
                }
            }
        }
    };
}

syntax_kinds! {
    // ==================
    // Trivia (0-9)
    // ==================
    /// Spaces and tabs
    Whitespace = 0,
    /// A single `\n` or `\r\n`
    Newline = 1,
    /// `// ...` up to the end of the line
    LineComment = 2,
    /// `/* ... */`, possibly nested
    BlockComment = 3,

    // ==================
    // Reserved keywords (10-69)
    // ==================
    ClassKw = 10,
    StructKw = 11,
    EnumKw = 12,
    ProtocolKw = 13,
    ExtensionKw = 14,
    FuncKw = 15,
    InitKw = 16,
    DeinitKw = 17,
    SubscriptKw = 18,
    VarKw = 19,
    LetKw = 20,
    CaseKw = 21,
    ImportKw = 22,
    TypealiasKw = 23,
    AssociatedtypeKw = 24,
    ReturnKw = 25,
    IfKw = 26,
    ElseKw = 27,
    GuardKw = 28,
    ForKw = 29,
    InKw = 30,
    WhileKw = 31,
    RepeatKw = 32,
    SwitchKw = 33,
    DefaultKw = 34,
    BreakKw = 35,
    ContinueKw = 36,
    FallthroughKw = 37,
    ThrowKw = 38,
    ThrowsKw = 39,
    RethrowsKw = 40,
    TryKw = 41,
    DeferKw = 42,
    DoKw = 43,
    CatchKw = 44,
    /// `self`
    SelfKw = 45,
    /// `Self`
    SelfTypeKw = 46,
    SuperKw = 47,
    NilKw = 48,
    TrueKw = 49,
    FalseKw = 50,
    AsKw = 51,
    IsKw = 52,
    WhereKw = 53,
    InoutKw = 54,
    StaticKw = 55,
    PublicKw = 56,
    PrivateKw = 57,
    FileprivateKw = 58,
    InternalKw = 59,

    // ==================
    // Contextual keywords (70-99)
    // ==================
    OpenKw = 70,
    FinalKw = 71,
    OverrideKw = 72,
    WeakKw = 73,
    UnownedKw = 74,
    LazyKw = 75,
    MutatingKw = 76,
    NonmutatingKw = 77,
    RequiredKw = 78,
    ConvenienceKw = 79,
    DynamicKw = 80,
    OptionalKw = 81,
    IndirectKw = 82,
    NonisolatedKw = 83,
    AsyncKw = 84,
    AwaitKw = 85,
    ActorKw = 86,
    SomeKw = 87,
    AnyKw = 88,
    GetKw = 89,
    SetKw = 90,
    WillSetKw = 91,
    DidSetKw = 92,
    SafeKw = 93,
    UnsafeKw = 94,

    // ==================
    // Punctuation (100-149)
    // ==================
    LParen = 100,
    RParen = 101,
    LBrace = 102,
    RBrace = 103,
    LBracket = 104,
    RBracket = 105,
    /// `<` opening a generic clause
    LAngle = 106,
    /// `>` closing a generic clause
    RAngle = 107,
    Comma = 108,
    Colon = 109,
    Semicolon = 110,
    Dot = 111,
    At = 112,
    Arrow = 113,
    /// A lone `=`
    Equals = 114,
    /// `?` attached to the preceding token (optional chaining, optional type)
    Question = 115,
    /// `!` attached to the preceding token (force unwrap)
    Bang = 116,
    Underscore = 117,
    /// Any other operator character run
    Operator = 118,
    /// `#if`, `#endif`, `#selector` and friends
    PoundKeyword = 119,
    /// End of input marker used by the parser, never stored in a tree
    Eof = 120,

    // ==================
    // Identifiers and literals (150-199)
    // ==================
    Ident = 150,
    IntegerLiteral = 151,
    FloatLiteral = 152,
    StringLiteral = 153,

    // ==================
    // Structural nodes (200-399)
    // ==================

    // File and blocks
    SourceFile = 200,
    CodeBlockItem = 201,
    CodeBlock = 202,
    MemberBlock = 203,
    IfConfigDirective = 204,

    // Declarations
    ClassDecl = 210,
    StructDecl = 211,
    EnumDecl = 212,
    ProtocolDecl = 213,
    ExtensionDecl = 214,
    ActorDecl = 215,
    FunctionDecl = 216,
    InitializerDecl = 217,
    DeinitDecl = 218,
    SubscriptDecl = 219,
    VariableDecl = 220,
    EnumCaseDecl = 221,
    ImportDecl = 222,
    TypealiasDecl = 223,
    AssociatedtypeDecl = 224,

    // Declaration parts
    Attribute = 240,
    AttributeArguments = 241,
    Modifier = 242,
    ModifierDetail = 243,
    GenericParameterClause = 244,
    GenericParameter = 245,
    GenericArgumentClause = 246,
    GenericWhereClause = 247,
    InheritanceClause = 248,
    InheritedType = 249,
    FunctionSignature = 250,
    ParameterClause = 251,
    FunctionParameter = 252,
    ReturnClause = 253,
    EffectSpecifiers = 254,
    PatternBinding = 255,
    IdentifierPattern = 256,
    TuplePattern = 257,
    WildcardPattern = 258,
    TypeAnnotation = 259,
    InitializerClause = 260,
    AccessorBlock = 261,
    AccessorDecl = 262,
    AccessorParameter = 263,
    EnumCaseElement = 264,
    EnumCaseParameterClause = 265,
    EnumCaseParameter = 266,

    // Types
    IdentifierType = 280,
    MemberType = 281,
    OptionalType = 282,
    ImplicitlyUnwrappedOptionalType = 283,
    ArrayType = 284,
    DictionaryType = 285,
    TupleType = 286,
    TupleTypeElement = 287,
    FunctionType = 288,
    AttributedType = 289,
    SomeOrAnyType = 290,

    // Statements
    ReturnStmt = 300,
    IfStmt = 301,
    GuardStmt = 302,
    ForStmt = 303,
    WhileStmt = 304,
    RepeatStmt = 305,
    SwitchStmt = 306,
    SwitchCase = 307,
    SwitchCaseLabel = 308,
    SwitchDefaultLabel = 309,
    DeferStmt = 310,
    DoStmt = 311,
    CatchClause = 312,
    ThrowStmt = 313,
    BreakStmt = 314,
    ContinueStmt = 315,
    FallthroughStmt = 316,
    ConditionList = 317,
    ConditionElement = 318,
    OptionalBindingCondition = 319,

    // Expressions
    DeclReferenceExpr = 330,
    SelfExpr = 331,
    SuperExpr = 332,
    IntegerLiteralExpr = 333,
    FloatLiteralExpr = 334,
    StringLiteralExpr = 335,
    BooleanLiteralExpr = 336,
    NilLiteralExpr = 337,
    MemberAccessExpr = 338,
    FunctionCallExpr = 339,
    ArgumentList = 340,
    LabeledExpr = 341,
    SubscriptCallExpr = 342,
    ClosureExpr = 343,
    ClosureSignature = 344,
    ClosureCaptureClause = 345,
    ClosureCapture = 346,
    ClosureCaptureSpecifier = 347,
    ClosureParameterClause = 348,
    ClosureParameter = 349,
    TupleExpr = 350,
    ArrayExpr = 351,
    DictionaryExpr = 352,
    DictionaryElement = 353,
    SequenceExpr = 354,
    BinaryOperatorExpr = 355,
    AssignmentExpr = 356,
    AsExpr = 357,
    IsExpr = 358,
    PrefixOperatorExpr = 359,
    ForceUnwrapExpr = 360,
    OptionalChainingExpr = 361,
    TryExpr = 362,
    AwaitExpr = 363,
    MacroExpansionExpr = 364,
    TypeExpr = 365,

    /// Tokens the parser could not place
    Error = 400,
}

impl SyntaxKind {
    /// Check if this is a trivia kind (whitespace, comments, newlines)
    pub const fn is_trivia(self) -> bool {
        (self as u16) < 10
    }

    /// Check if this is a comment
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    /// Check if this is a reserved or contextual keyword
    pub const fn is_keyword(self) -> bool {
        (self as u16) >= 10 && (self as u16) < 100
    }

    /// Check if this is punctuation
    pub const fn is_punct(self) -> bool {
        (self as u16) >= 100 && (self as u16) < 150
    }

    /// Check if this is a literal token
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral | Self::FloatLiteral | Self::StringLiteral
        )
    }

    /// Check if this is a structural node
    pub const fn is_node(self) -> bool {
        (self as u16) >= 200
    }

    /// Check if this is a token kind
    pub const fn is_token(self) -> bool {
        !self.is_node()
    }

    /// Check if this node kind is a declaration
    ///
    /// Declarations are where the traversal engine consults a rule's
    /// skippable declaration set.
    pub const fn is_declaration(self) -> bool {
        (self as u16) >= 210 && (self as u16) < 240
    }

    /// Check if this node kind is a type
    pub const fn is_type(self) -> bool {
        (self as u16) >= 280 && (self as u16) < 300
    }

    /// Check if this node kind is an expression
    pub const fn is_expression(self) -> bool {
        (self as u16) >= 330 && (self as u16) < 400
    }

    /// Check if this kind is a declaration or access-control modifier keyword
    pub const fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            Self::StaticKw
                | Self::ClassKw
                | Self::PublicKw
                | Self::PrivateKw
                | Self::FileprivateKw
                | Self::InternalKw
                | Self::OpenKw
                | Self::FinalKw
                | Self::OverrideKw
                | Self::WeakKw
                | Self::UnownedKw
                | Self::LazyKw
                | Self::MutatingKw
                | Self::NonmutatingKw
                | Self::RequiredKw
                | Self::ConvenienceKw
                | Self::DynamicKw
                | Self::OptionalKw
                | Self::IndirectKw
                | Self::NonisolatedKw
        )
    }

    /// Text of a reserved keyword
    pub const fn keyword_text(self) -> Option<&'static str> {
        Some(match self {
            Self::ClassKw => "class",
            Self::StructKw => "struct",
            Self::EnumKw => "enum",
            Self::ProtocolKw => "protocol",
            Self::ExtensionKw => "extension",
            Self::FuncKw => "func",
            Self::InitKw => "init",
            Self::DeinitKw => "deinit",
            Self::SubscriptKw => "subscript",
            Self::VarKw => "var",
            Self::LetKw => "let",
            Self::CaseKw => "case",
            Self::ImportKw => "import",
            Self::TypealiasKw => "typealias",
            Self::AssociatedtypeKw => "associatedtype",
            Self::ReturnKw => "return",
            Self::IfKw => "if",
            Self::ElseKw => "else",
            Self::GuardKw => "guard",
            Self::ForKw => "for",
            Self::InKw => "in",
            Self::WhileKw => "while",
            Self::RepeatKw => "repeat",
            Self::SwitchKw => "switch",
            Self::DefaultKw => "default",
            Self::BreakKw => "break",
            Self::ContinueKw => "continue",
            Self::FallthroughKw => "fallthrough",
            Self::ThrowKw => "throw",
            Self::ThrowsKw => "throws",
            Self::RethrowsKw => "rethrows",
            Self::TryKw => "try",
            Self::DeferKw => "defer",
            Self::DoKw => "do",
            Self::CatchKw => "catch",
            Self::SelfKw => "self",
            Self::SelfTypeKw => "Self",
            Self::SuperKw => "super",
            Self::NilKw => "nil",
            Self::TrueKw => "true",
            Self::FalseKw => "false",
            Self::AsKw => "as",
            Self::IsKw => "is",
            Self::WhereKw => "where",
            Self::InoutKw => "inout",
            Self::StaticKw => "static",
            Self::PublicKw => "public",
            Self::PrivateKw => "private",
            Self::FileprivateKw => "fileprivate",
            Self::InternalKw => "internal",
            _ => return None,
        })
    }

    /// Look up a reserved keyword by its text
    pub fn from_keyword(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .take_while(|kind| (**kind as u16) < 70)
            .copied()
            .find(|kind| kind.keyword_text() == Some(text))
    }

    /// Look up a contextual keyword by its text
    pub fn from_contextual_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "open" => Self::OpenKw,
            "final" => Self::FinalKw,
            "override" => Self::OverrideKw,
            "weak" => Self::WeakKw,
            "unowned" => Self::UnownedKw,
            "lazy" => Self::LazyKw,
            "mutating" => Self::MutatingKw,
            "nonmutating" => Self::NonmutatingKw,
            "required" => Self::RequiredKw,
            "convenience" => Self::ConvenienceKw,
            "dynamic" => Self::DynamicKw,
            "optional" => Self::OptionalKw,
            "indirect" => Self::IndirectKw,
            "nonisolated" => Self::NonisolatedKw,
            "async" => Self::AsyncKw,
            "await" => Self::AwaitKw,
            "actor" => Self::ActorKw,
            "some" => Self::SomeKw,
            "any" => Self::AnyKw,
            "get" => Self::GetKw,
            "set" => Self::SetKw,
            "willSet" => Self::WillSetKw,
            "didSet" => Self::DidSetKw,
            "safe" => Self::SafeKw,
            "unsafe" => Self::UnsafeKw,
            _ => return None,
        })
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}
