use rowan::Language;

/// Unified syntax kind for both tokens and AST nodes.
///
/// The set covers the Java-flavoured host language the postfix engine edits:
/// classes, methods (including `async` methods and `yield return` iterators),
/// statements and the full expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Trivia ---
    Whitespace,
    LineComment,
    BlockComment,

    // --- Identifiers & literals ---
    Identifier,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,

    // --- Keywords (reserved) ---
    AbstractKw,
    BooleanKw,
    BreakKw,
    ByteKw,
    CatchKw,
    CharKw,
    ClassKw,
    ContinueKw,
    DoKw,
    DoubleKw,
    ElseKw,
    ExtendsKw,
    FinalKw,
    FinallyKw,
    FloatKw,
    ForKw,
    IfKw,
    ImplementsKw,
    InstanceofKw,
    IntKw,
    InterfaceKw,
    LongKw,
    NewKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReturnKw,
    ShortKw,
    StaticKw,
    SuperKw,
    ThisKw,
    ThrowKw,
    ThrowsKw,
    TryKw,
    VoidKw,
    WhileKw,

    // Literal keywords.
    TrueKw,
    FalseKw,
    NullKw,

    // --- Contextual keywords ---
    AsyncKw,
    VarKw,
    YieldKw,

    // --- Operators / punctuation ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Question,
    Colon,
    Arrow,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Bang,

    Eq,
    EqEq,
    BangEq,

    Less,
    LessEq,
    Greater,
    GreaterEq,

    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,

    PlusPlus,
    MinusMinus,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    LeftShift,
    RightShift,
    UnsignedRightShift,
    LeftShiftEq,
    RightShiftEq,
    UnsignedRightShiftEq,

    // --- Special ---
    Error,
    Eof,

    // --- Nodes ---
    CompilationUnit,
    StatementFragment,
    ExpressionFragment,
    Modifiers,

    ClassDeclaration,
    InterfaceDeclaration,
    ClassBody,
    InterfaceBody,
    ExtendsClause,
    ImplementsClause,
    ThrowsClause,

    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    EmptyDeclaration,
    ParameterList,
    Parameter,
    TypeParameters,
    TypeParameter,

    Block,
    IfStatement,
    ForStatement,
    ForHeader,
    WhileStatement,
    DoWhileStatement,
    TryStatement,
    CatchClause,
    FinallyClause,
    ReturnStatement,
    ThrowStatement,
    YieldStatement,
    BreakStatement,
    ContinueStatement,
    LocalVariableDeclarationStatement,
    ExpressionStatement,
    EmptyStatement,

    VariableDeclaratorList,
    VariableDeclarator,

    Type,
    PrimitiveType,
    NamedType,
    TypeArguments,
    TypeArgument,
    WildcardType,

    ArgumentList,

    // Expressions
    LiteralExpression,
    NameExpression,
    ThisExpression,
    SuperExpression,
    ParenthesizedExpression,
    NewExpression,
    MethodCallExpression,
    FieldAccessExpression,
    ArrayAccessExpression,
    UnaryExpression,
    BinaryExpression,
    InstanceofExpression,
    AssignmentExpression,
    ConditionalExpression,
    LambdaExpression,
    CastExpression,

    __Last,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::AsyncKw | SyntaxKind::VarKw | SyntaxKind::YieldKw
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == SyntaxKind::Identifier || self.is_contextual_keyword()
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::LongLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::DoubleLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::NullKw
        )
    }

    /// Node kinds that produce a value.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::LiteralExpression
                | SyntaxKind::NameExpression
                | SyntaxKind::ThisExpression
                | SyntaxKind::SuperExpression
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::NewExpression
                | SyntaxKind::MethodCallExpression
                | SyntaxKind::FieldAccessExpression
                | SyntaxKind::ArrayAccessExpression
                | SyntaxKind::UnaryExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::InstanceofExpression
                | SyntaxKind::AssignmentExpression
                | SyntaxKind::ConditionalExpression
                | SyntaxKind::LambdaExpression
                | SyntaxKind::CastExpression
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoWhileStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::YieldStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::LocalVariableDeclarationStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::EmptyStatement
        )
    }

    /// Declarations that own a body of statements.
    pub fn is_function(self) -> bool {
        matches!(
            self,
            SyntaxKind::MethodDeclaration
                | SyntaxKind::ConstructorDeclaration
                | SyntaxKind::LambdaExpression
        )
    }

    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            // Reserved keywords.
            "abstract" => SyntaxKind::AbstractKw,
            "boolean" => SyntaxKind::BooleanKw,
            "break" => SyntaxKind::BreakKw,
            "byte" => SyntaxKind::ByteKw,
            "catch" => SyntaxKind::CatchKw,
            "char" => SyntaxKind::CharKw,
            "class" => SyntaxKind::ClassKw,
            "continue" => SyntaxKind::ContinueKw,
            "do" => SyntaxKind::DoKw,
            "double" => SyntaxKind::DoubleKw,
            "else" => SyntaxKind::ElseKw,
            "extends" => SyntaxKind::ExtendsKw,
            "final" => SyntaxKind::FinalKw,
            "finally" => SyntaxKind::FinallyKw,
            "float" => SyntaxKind::FloatKw,
            "for" => SyntaxKind::ForKw,
            "if" => SyntaxKind::IfKw,
            "implements" => SyntaxKind::ImplementsKw,
            "instanceof" => SyntaxKind::InstanceofKw,
            "int" => SyntaxKind::IntKw,
            "interface" => SyntaxKind::InterfaceKw,
            "long" => SyntaxKind::LongKw,
            "new" => SyntaxKind::NewKw,
            "private" => SyntaxKind::PrivateKw,
            "protected" => SyntaxKind::ProtectedKw,
            "public" => SyntaxKind::PublicKw,
            "return" => SyntaxKind::ReturnKw,
            "short" => SyntaxKind::ShortKw,
            "static" => SyntaxKind::StaticKw,
            "super" => SyntaxKind::SuperKw,
            "this" => SyntaxKind::ThisKw,
            "throw" => SyntaxKind::ThrowKw,
            "throws" => SyntaxKind::ThrowsKw,
            "try" => SyntaxKind::TryKw,
            "void" => SyntaxKind::VoidKw,
            "while" => SyntaxKind::WhileKw,

            // Literal keywords.
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            "null" => SyntaxKind::NullKw,

            // Contextual.
            "async" => SyntaxKind::AsyncKw,
            "var" => SyntaxKind::VarKw,
            "yield" => SyntaxKind::YieldKw,

            _ => return None,
        })
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(value: SyntaxKind) -> Self {
        rowan::SyntaxKind(value as u16)
    }
}

/// Rowan language marker for the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JavaLanguage {}

impl Language for JavaLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        if raw.0 < SyntaxKind::__Last as u16 {
            // SAFETY: We've verified the numeric value is within the enum range.
            unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
        } else {
            SyntaxKind::Error
        }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}
