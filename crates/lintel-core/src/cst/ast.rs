//! Typed AST layer over the CST
//!
//! Ergonomic, type-safe wrappers over raw syntax nodes. Each wrapper is a
//! thin newtype around a [`SyntaxNode`]; accessors walk the children lazily
//! and never allocate a second tree.
//!
//! # Example
//!
//! ```rust
//! use lintel_core::cst::{parse, ast::{AstNode, VariableDecl}};
//!
//! let root = parse("var name: String? = nil").syntax();
//! let decl = root.descendants().find_map(VariableDecl::cast).unwrap();
//! let binding = decl.bindings().next().unwrap();
//!
//! assert_eq!(binding.name().as_deref(), Some("name"));
//! assert!(binding.type_annotation().unwrap().is_optional());
//! ```

use rowan::NodeOrToken;

use super::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then_some(Self { syntax: node })
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

/// First child node of a specific kind
fn child_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// First direct child token of a specific kind
fn token_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .find(|t| t.kind() == kind)
}

/// First direct child token that is not trivia
fn first_significant_token(parent: &SyntaxNode) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .find(|t| !t.kind().is_trivia())
}

/// Identifier text with backticks removed
fn ident_text(token: &SyntaxToken) -> String {
    token.text().trim_matches('`').to_string()
}

// ============================================================================
// Declaration parts
// ============================================================================

ast_node!(
    /// `@name` or `@name(arguments)`
    Attribute => Attribute
);

impl Attribute {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|t| !t.kind().is_trivia())
            .nth(1)
            .map(|t| ident_text(&t))
    }
}

ast_node!(
    /// A declaration modifier such as `private`, `weak` or `private(set)`
    Modifier => Modifier
);

impl Modifier {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }

    pub fn kind(&self) -> Option<SyntaxKind> {
        self.token().map(|t| t.kind())
    }

    /// Text inside the parenthesized detail, `set` in `private(set)`
    pub fn detail(&self) -> Option<String> {
        child_of_kind(&self.syntax, SyntaxKind::ModifierDetail).and_then(|detail| {
            detail
                .children_with_tokens()
                .filter_map(NodeOrToken::into_token)
                .find(|t| !t.kind().is_trivia() && !t.kind().is_punct())
                .map(|t| t.text().to_string())
        })
    }
}

/// Shared accessors of declarations carrying attributes and modifiers
pub trait HasModifiers: AstNode {
    fn attributes(&self) -> impl Iterator<Item = Attribute> {
        self.syntax().children().filter_map(Attribute::cast)
    }

    fn modifiers(&self) -> impl Iterator<Item = Modifier> {
        self.syntax().children().filter_map(Modifier::cast)
    }

    fn modifier(&self, kind: SyntaxKind) -> Option<Modifier> {
        self.modifiers().find(|m| m.kind() == Some(kind))
    }

    fn has_modifier(&self, kind: SyntaxKind) -> bool {
        self.modifier(kind).is_some()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes().any(|a| a.name().as_deref() == Some(name))
    }

    /// The introducing keyword (`class`, `func`, `var`, ...)
    fn keyword(&self) -> Option<SyntaxToken> {
        first_significant_token(self.syntax())
    }
}

ast_node!(TypeAnnotation => TypeAnnotation);

impl TypeAnnotation {
    pub fn ty(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_type())
    }

    /// `T?`, `Optional<T>` or `Swift.Optional<T>`
    pub fn is_optional(&self) -> bool {
        self.ty().is_some_and(|ty| is_optional_type(&ty))
    }
}

/// Whether a type node spells an optional type
pub fn is_optional_type(ty: &SyntaxNode) -> bool {
    match ty.kind() {
        SyntaxKind::OptionalType => true,
        SyntaxKind::IdentifierType | SyntaxKind::MemberType => {
            let name = ty
                .children_with_tokens()
                .filter_map(NodeOrToken::into_token)
                .filter(|t| t.kind() == SyntaxKind::Ident)
                .last();
            let qualifier_ok = ty.kind() == SyntaxKind::IdentifierType
                || ty
                    .first_child()
                    .is_some_and(|q| q.kind() == SyntaxKind::IdentifierType && q.text() == "Swift");
            let single_argument = child_of_kind(ty, SyntaxKind::GenericArgumentClause)
                .is_some_and(|args| args.children().filter(|n| n.kind().is_type()).count() == 1);
            qualifier_ok && single_argument && name.is_some_and(|n| n.text() == "Optional")
        }
        _ => false,
    }
}

ast_node!(InitializerClause => InitializerClause);

impl InitializerClause {
    pub fn value(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_expression())
    }
}

ast_node!(AccessorBlock => AccessorBlock);

ast_node!(PatternBinding => PatternBinding);

impl PatternBinding {
    pub fn pattern(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| {
            matches!(
                n.kind(),
                SyntaxKind::IdentifierPattern | SyntaxKind::TuplePattern | SyntaxKind::WildcardPattern
            )
        })
    }

    /// Bound name for `IdentifierPattern` bindings
    pub fn name(&self) -> Option<String> {
        self.pattern()
            .filter(|p| p.kind() == SyntaxKind::IdentifierPattern)
            .and_then(|p| first_significant_token(&p))
            .map(|t| ident_text(&t))
    }

    pub fn type_annotation(&self) -> Option<TypeAnnotation> {
        self.syntax.children().find_map(TypeAnnotation::cast)
    }

    pub fn initializer(&self) -> Option<InitializerClause> {
        self.syntax.children().find_map(InitializerClause::cast)
    }

    pub fn accessor_block(&self) -> Option<AccessorBlock> {
        self.syntax.children().find_map(AccessorBlock::cast)
    }
}

ast_node!(FunctionParameter => FunctionParameter);

ast_node!(FunctionSignature => FunctionSignature);

impl FunctionSignature {
    pub fn parameters(&self) -> impl Iterator<Item = FunctionParameter> + use<> {
        child_of_kind(&self.syntax, SyntaxKind::ParameterClause)
            .into_iter()
            .flat_map(|clause| clause.children().filter_map(FunctionParameter::cast))
    }

    /// The type after `->`
    pub fn return_type(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::ReturnClause)
            .and_then(|clause| clause.children().find(|n| n.kind().is_type()))
    }
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(
    /// `class Name: Parent { ... }`
    ClassDecl => ClassDecl
);

impl HasModifiers for ClassDecl {}

impl ClassDecl {
    pub fn name(&self) -> Option<String> {
        token_of_kind(&self.syntax, SyntaxKind::Ident).map(|t| ident_text(&t))
    }

    /// Names of the inherited types, `Foo` for `class A: Foo`
    pub fn inherited_type_names(&self) -> Vec<String> {
        child_of_kind(&self.syntax, SyntaxKind::InheritanceClause)
            .into_iter()
            .flat_map(|clause| clause.children())
            .filter(|n| n.kind() == SyntaxKind::InheritedType)
            .map(|n| n.text().to_string().trim().to_string())
            .collect()
    }

    pub fn members(&self) -> impl Iterator<Item = Decl> + use<> {
        child_of_kind(&self.syntax, SyntaxKind::MemberBlock)
            .into_iter()
            .flat_map(|block| block.children())
            .filter_map(|item| item.children().find_map(Decl::cast))
    }
}

ast_node!(EnumDecl => EnumDecl);

impl HasModifiers for EnumDecl {}

impl EnumDecl {
    /// Case elements declared directly in this enum, nested types excluded
    pub fn case_elements(&self) -> impl Iterator<Item = EnumCaseElement> + use<> {
        child_of_kind(&self.syntax, SyntaxKind::MemberBlock)
            .into_iter()
            .flat_map(|block| block.children())
            .filter_map(|item| item.children().find_map(EnumCaseDecl::cast))
            .flat_map(|decl| decl.elements())
    }
}

ast_node!(EnumCaseDecl => EnumCaseDecl);

impl HasModifiers for EnumCaseDecl {}

impl EnumCaseDecl {
    pub fn elements(&self) -> impl Iterator<Item = EnumCaseElement> + use<> {
        self.syntax.children().filter_map(EnumCaseElement::cast)
    }
}

ast_node!(EnumCaseElement => EnumCaseElement);

impl EnumCaseElement {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| ident_text(&t))
    }
}

ast_node!(FunctionDecl => FunctionDecl);

impl HasModifiers for FunctionDecl {}

impl FunctionDecl {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::Operator))
            .map(|t| ident_text(&t))
    }

    pub fn signature(&self) -> Option<FunctionSignature> {
        self.syntax.children().find_map(FunctionSignature::cast)
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::CodeBlock)
    }
}

ast_node!(
    /// `var`/`let` declaration with one or more bindings
    VariableDecl => VariableDecl
);

impl HasModifiers for VariableDecl {}

impl VariableDecl {
    pub fn binding_keyword(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|t| matches!(t.kind(), SyntaxKind::VarKw | SyntaxKind::LetKw))
    }

    pub fn is_var(&self) -> bool {
        self.binding_keyword()
            .is_some_and(|t| t.kind() == SyntaxKind::VarKw)
    }

    pub fn bindings(&self) -> impl Iterator<Item = PatternBinding> + use<> {
        self.syntax.children().filter_map(PatternBinding::cast)
    }
}

/// Any declaration node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decl {
    Class(ClassDecl),
    Enum(EnumDecl),
    EnumCase(EnumCaseDecl),
    Function(FunctionDecl),
    Variable(VariableDecl),
    /// Declarations without a dedicated wrapper
    Other(SyntaxNode),
}

impl AstNode for Decl {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_declaration()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        let decl = match node.kind() {
            SyntaxKind::ClassDecl => Self::Class(ClassDecl { syntax: node }),
            SyntaxKind::EnumDecl => Self::Enum(EnumDecl { syntax: node }),
            SyntaxKind::EnumCaseDecl => Self::EnumCase(EnumCaseDecl { syntax: node }),
            SyntaxKind::FunctionDecl => Self::Function(FunctionDecl { syntax: node }),
            SyntaxKind::VariableDecl => Self::Variable(VariableDecl { syntax: node }),
            kind if kind.is_declaration() => Self::Other(node),
            _ => return None,
        };
        Some(decl)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Class(it) => it.syntax(),
            Self::Enum(it) => it.syntax(),
            Self::EnumCase(it) => it.syntax(),
            Self::Function(it) => it.syntax(),
            Self::Variable(it) => it.syntax(),
            Self::Other(node) => node,
        }
    }
}

impl HasModifiers for Decl {}

// ============================================================================
// Statements and expressions
// ============================================================================

ast_node!(ReturnStmt => ReturnStmt);

impl ReturnStmt {
    pub fn return_keyword(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::ReturnKw)
    }

    pub fn expr(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_expression() || n.kind() == SyntaxKind::IfStmt)
    }
}

ast_node!(
    /// One statement or declaration in a statement list, with its optional `;`
    CodeBlockItem => CodeBlockItem
);

impl CodeBlockItem {
    pub fn item(&self) -> Option<SyntaxNode> {
        self.syntax.first_child()
    }

    pub fn semicolon(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Semicolon)
    }
}

ast_node!(FunctionCallExpr => FunctionCallExpr);

impl FunctionCallExpr {
    pub fn callee(&self) -> Option<SyntaxNode> {
        self.syntax.first_child()
    }

    pub fn arguments(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::ArgumentList)
    }

    pub fn argument_count(&self) -> usize {
        self.arguments()
            .map_or(0, |args| args.children().filter(|n| n.kind() == SyntaxKind::LabeledExpr).count())
    }

    pub fn trailing_closure(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .skip(1)
            .find(|n| n.kind() == SyntaxKind::ClosureExpr)
    }
}

ast_node!(ClosureCaptureSpecifier => ClosureCaptureSpecifier);

impl ClosureCaptureSpecifier {
    /// `weak` or `unowned`
    pub fn specifier(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }

    pub fn detail(&self) -> Option<String> {
        child_of_kind(&self.syntax, SyntaxKind::ModifierDetail).map(|d| {
            d.text()
                .to_string()
                .trim_matches(|c| c == '(' || c == ')')
                .trim()
                .to_string()
        })
    }
}
