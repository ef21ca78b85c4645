//! Typed views over the untyped rowan tree.

use crate::parser::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(syntax: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

pub mod support {
    use crate::ast::AstNode;
    use crate::parser::{SyntaxNode, SyntaxToken};
    use crate::syntax_kind::SyntaxKind;

    pub fn child<N: AstNode>(node: &SyntaxNode) -> Option<N> {
        node.children().find_map(N::cast)
    }

    pub fn children<'a, N: AstNode + 'a>(node: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
        node.children().filter_map(N::cast)
    }

    pub fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| tok.kind() == kind)
    }

    /// Returns an identifier-like token among the node's direct children.
    pub fn ident_token(node: &SyntaxNode) -> Option<SyntaxToken> {
        // Contextual keywords (`var`, `async`, `yield`) are lexed as dedicated kinds but
        // are valid names; the declared name is the last one among direct children.
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|tok| tok.kind().is_identifier_like())
            .last()
    }

    /// First non-trivia token among the node's direct children.
    pub fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| !tok.kind().is_trivia())
    }
}

macro_rules! ast_node {
    ($name:ident, $($kind:ident)|+) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                Self::can_cast(syntax.kind()).then_some(Self { syntax })
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

ast_node!(CompilationUnit, CompilationUnit);
ast_node!(ClassDeclaration, ClassDeclaration | InterfaceDeclaration);
ast_node!(Modifiers, Modifiers);
ast_node!(MethodDeclaration, MethodDeclaration);
ast_node!(ConstructorDeclaration, ConstructorDeclaration);
ast_node!(FieldDeclaration, FieldDeclaration);
ast_node!(ParameterList, ParameterList);
ast_node!(Parameter, Parameter);
ast_node!(TypeParameters, TypeParameters);
ast_node!(TypeParameter, TypeParameter);
ast_node!(Type, Type);
ast_node!(NamedType, NamedType);
ast_node!(TypeArguments, TypeArguments);
ast_node!(Block, Block);
ast_node!(LocalVariableDeclarationStatement, LocalVariableDeclarationStatement);
ast_node!(VariableDeclarator, VariableDeclarator);
ast_node!(ExpressionStatement, ExpressionStatement);
ast_node!(ReturnStatement, ReturnStatement);
ast_node!(ArgumentList, ArgumentList);
ast_node!(NameExpression, NameExpression);
ast_node!(FieldAccessExpression, FieldAccessExpression);
ast_node!(MethodCallExpression, MethodCallExpression);
ast_node!(NewExpression, NewExpression);
ast_node!(CastExpression, CastExpression);
ast_node!(BinaryExpression, BinaryExpression);
ast_node!(UnaryExpression, UnaryExpression);
ast_node!(AssignmentExpression, AssignmentExpression);
ast_node!(LiteralExpression, LiteralExpression);
ast_node!(
    Expression,
    LiteralExpression
        | NameExpression
        | ThisExpression
        | SuperExpression
        | ParenthesizedExpression
        | NewExpression
        | MethodCallExpression
        | FieldAccessExpression
        | ArrayAccessExpression
        | UnaryExpression
        | BinaryExpression
        | InstanceofExpression
        | AssignmentExpression
        | ConditionalExpression
        | LambdaExpression
        | CastExpression
);

impl CompilationUnit {
    pub fn classes(&self) -> impl Iterator<Item = ClassDeclaration> + '_ {
        self.syntax.descendants().filter_map(ClassDeclaration::cast)
    }
}

impl ClassDeclaration {
    pub fn name(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn is_interface(&self) -> bool {
        self.syntax.kind() == SyntaxKind::InterfaceDeclaration
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers().map_or(false, |m| m.has(SyntaxKind::AbstractKw))
    }

    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    /// The first type of the `extends` clause.
    pub fn extends(&self) -> Option<Type> {
        self.syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::ExtendsClause)
            .and_then(|clause| support::child(&clause))
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .find(|n| matches!(n.kind(), SyntaxKind::ClassBody | SyntaxKind::InterfaceBody))
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodDeclaration> {
        self.body()
            .into_iter()
            .flat_map(|body| body.children().filter_map(MethodDeclaration::cast))
    }

    pub fn constructors(&self) -> impl Iterator<Item = ConstructorDeclaration> {
        self.body()
            .into_iter()
            .flat_map(|body| body.children().filter_map(ConstructorDeclaration::cast))
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDeclaration> {
        self.body()
            .into_iter()
            .flat_map(|body| body.children().filter_map(FieldDeclaration::cast))
    }
}

impl Modifiers {
    pub fn has(&self, kind: SyntaxKind) -> bool {
        support::token(&self.syntax, kind).is_some()
    }
}

impl MethodDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn is_async(&self) -> bool {
        self.modifiers().map_or(false, |m| m.has(SyntaxKind::AsyncKw))
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().map_or(false, |m| m.has(SyntaxKind::StaticKw))
    }

    pub fn type_parameters(&self) -> Option<TypeParameters> {
        support::child(&self.syntax)
    }

    /// Declared return type, `void` included.
    pub fn return_type(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(&self.syntax)
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        self.parameter_list()
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
    }

    pub fn body(&self) -> Option<Block> {
        support::child(&self.syntax)
    }

    /// A method whose body contains `yield return`/`yield break` produces a sequence.
    pub fn is_iterator(&self) -> bool {
        let Some(body) = self.body() else {
            return false;
        };
        let mut preorder = body.syntax().preorder();
        while let Some(event) = preorder.next() {
            let rowan::WalkEvent::Enter(node) = event else {
                continue;
            };
            match node.kind() {
                SyntaxKind::YieldStatement => return true,
                // Nested functions own their own yields.
                SyntaxKind::LambdaExpression | SyntaxKind::ClassDeclaration => {
                    preorder.skip_subtree()
                }
                _ => {}
            }
        }
        false
    }
}

impl ConstructorDeclaration {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        support::child::<ParameterList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
    }

    pub fn is_private(&self) -> bool {
        support::child::<Modifiers>(&self.syntax).map_or(false, |m| m.has(SyntaxKind::PrivateKw))
    }
}

impl FieldDeclaration {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn is_static(&self) -> bool {
        support::child::<Modifiers>(&self.syntax).map_or(false, |m| m.has(SyntaxKind::StaticKw))
    }

    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> {
        declarators_of(&self.syntax)
    }
}

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        support::children(&self.syntax)
    }
}

impl Parameter {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl TypeParameters {
    pub fn parameters(&self) -> impl Iterator<Item = TypeParameter> + '_ {
        support::children(&self.syntax)
    }

    /// The closing `>` token.
    pub fn r_angle(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::Greater)
    }
}

impl TypeParameter {
    pub fn name(&self) -> Option<SyntaxToken> {
        support::first_significant_token(&self.syntax).filter(|t| t.kind().is_identifier_like())
    }

    pub fn bounds(&self) -> impl Iterator<Item = Type> + '_ {
        support::children(&self.syntax)
    }
}

impl Type {
    pub fn is_void(&self) -> bool {
        self.primitive_keyword() == Some(SyntaxKind::VoidKw)
    }

    pub fn primitive_keyword(&self) -> Option<SyntaxKind> {
        let primitive = self
            .syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::PrimitiveType)?;
        support::first_significant_token(&primitive).map(|t| t.kind())
    }

    pub fn named(&self) -> Option<NamedType> {
        support::child(&self.syntax)
    }

    pub fn array_dimensions(&self) -> usize {
        self.syntax
            .children_with_tokens()
            .filter(|it| it.kind() == SyntaxKind::LBracket)
            .count()
    }
}

impl NamedType {
    /// Dotted name without type arguments, e.g. `java.util.List`.
    pub fn name(&self) -> String {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind().is_identifier_like() || t.kind() == SyntaxKind::Dot)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn type_arguments(&self) -> Vec<Type> {
        support::child::<TypeArguments>(&self.syntax)
            .map(|args| {
                args.syntax
                    .children()
                    .filter(|n| n.kind() == SyntaxKind::TypeArgument)
                    .filter_map(|arg| support::child::<Type>(&arg))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl LocalVariableDeclarationStatement {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> {
        declarators_of(&self.syntax)
    }
}

fn declarators_of(node: &SyntaxNode) -> impl Iterator<Item = VariableDeclarator> {
    node.children()
        .filter(|n| n.kind() == SyntaxKind::VariableDeclaratorList)
        .flat_map(|list| list.children().filter_map(VariableDeclarator::cast).collect::<Vec<_>>())
}

impl VariableDeclarator {
    pub fn name(&self) -> Option<SyntaxToken> {
        support::first_significant_token(&self.syntax).filter(|t| t.kind().is_identifier_like())
    }

    pub fn initializer(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ExpressionStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ReturnStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ArgumentList {
    pub fn arguments(&self) -> impl Iterator<Item = Expression> + '_ {
        support::children(&self.syntax)
    }

    pub fn l_paren(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::LParen)
    }

    pub fn r_paren(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::RParen)
    }
}

impl NameExpression {
    pub fn name(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl FieldAccessExpression {
    pub fn receiver(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl MethodCallExpression {
    pub fn callee(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        support::child(&self.syntax)
    }
}

impl NewExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        support::child(&self.syntax)
    }
}

impl CastExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl BinaryExpression {
    pub fn lhs(&self) -> Option<Expression> {
        support::children(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<Expression> {
        support::children(&self.syntax).nth(1)
    }

    pub fn op(&self) -> Option<SyntaxKind> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .map(|t| t.kind())
            .find(|k| !k.is_trivia())
    }
}

impl UnaryExpression {
    pub fn op(&self) -> Option<SyntaxKind> {
        support::first_significant_token(&self.syntax).map(|t| t.kind())
    }

    pub fn operand(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl AssignmentExpression {
    pub fn lhs(&self) -> Option<Expression> {
        support::children(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<Expression> {
        support::children(&self.syntax).nth(1)
    }
}

impl LiteralExpression {
    pub fn token(&self) -> Option<SyntaxToken> {
        support::first_significant_token(&self.syntax)
    }
}

impl Expression {
    pub fn kind(&self) -> SyntaxKind {
        self.syntax.kind()
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> Expression {
        let mut current = self.clone();
        while current.kind() == SyntaxKind::ParenthesizedExpression {
            match support::child::<Expression>(&current.syntax) {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }
}
