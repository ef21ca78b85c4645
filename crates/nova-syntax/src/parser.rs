use std::collections::VecDeque;

#[cfg(test)]
use rowan::NodeOrToken;
use rowan::{GreenNode, GreenNodeBuilder};
use text_size::{TextRange, TextSize};

use crate::lexer::{lex, Token};
use crate::syntax_kind::{JavaLanguage, SyntaxKind};
use crate::ParseError;

pub type SyntaxNode = rowan::SyntaxNode<JavaLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<JavaLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<JavaLanguage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaParseResult {
    pub green: GreenNode,
    pub errors: Vec<ParseError>,
}

impl JavaParseResult {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn token_at_offset(&self, offset: u32) -> rowan::TokenAtOffset<SyntaxToken> {
        self.syntax().token_at_offset(TextSize::from(offset))
    }

    pub fn covering_element(&self, range: TextRange) -> SyntaxElement {
        self.syntax().covering_element(range)
    }
}

/// Result of parsing a snippet that is not a whole compilation unit.
///
/// Error ranges are shifted by `offset` so callers can report them relative
/// to the text the fragment was cut from; the tree itself starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaFragmentParseResult {
    pub parse: JavaParseResult,
    pub offset: u32,
}

pub fn parse_java(input: &str) -> JavaParseResult {
    Parser::new(input).parse()
}

/// Parse a single statement. Trailing tokens are kept under an `Error` node.
pub fn parse_java_statement_fragment(input: &str, offset: u32) -> JavaFragmentParseResult {
    let parse = Parser::new(input).parse_fragment(SyntaxKind::StatementFragment, |p| {
        p.parse_statement();
    });
    JavaFragmentParseResult {
        parse: shift_errors(parse, offset),
        offset,
    }
}

/// Parse a single expression. Trailing tokens are kept under an `Error` node.
pub fn parse_java_expression_fragment(input: &str, offset: u32) -> JavaFragmentParseResult {
    let parse = Parser::new(input).parse_fragment(SyntaxKind::ExpressionFragment, |p| {
        p.parse_expression(0);
    });
    JavaFragmentParseResult {
        parse: shift_errors(parse, offset),
        offset,
    }
}

fn shift_errors(mut parse: JavaParseResult, offset: u32) -> JavaParseResult {
    if offset != 0 {
        for error in &mut parse.errors {
            error.range += TextSize::from(offset);
        }
    }
    parse
}

struct Parser<'a> {
    input: &'a str,
    tokens: VecDeque<Token>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: VecDeque::from(lex(input)),
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> JavaParseResult {
        self.builder.start_node(SyntaxKind::CompilationUnit.into());
        self.eat_trivia();

        while !self.at(SyntaxKind::Eof) {
            if self.at_type_decl_start() {
                self.parse_type_declaration();
            } else {
                self.recover_top_level();
            }
        }

        self.eat_trivia();
        self.expect(SyntaxKind::Eof, "expected end of file");
        self.builder.finish_node();

        JavaParseResult {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    fn parse_fragment(mut self, root: SyntaxKind, f: impl FnOnce(&mut Self)) -> JavaParseResult {
        self.builder.start_node(root.into());
        self.eat_trivia();
        f(&mut self);
        if !self.at(SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::Error.into());
            self.error_here("unexpected tokens after fragment");
            self.recover_to(&[SyntaxKind::Eof]);
            self.builder.finish_node();
        }
        self.eat_trivia();
        self.bump_any(); // Eof
        self.builder.finish_node();

        JavaParseResult {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    fn parse_type_declaration(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.parse_modifiers();
        self.parse_type_declaration_inner(checkpoint);
    }

    fn parse_type_declaration_inner(&mut self, checkpoint: rowan::Checkpoint) {
        match self.current() {
            SyntaxKind::ClassKw => {
                self.parse_class_decl(checkpoint, SyntaxKind::ClassDeclaration, SyntaxKind::ClassBody)
            }
            SyntaxKind::InterfaceKw => self.parse_class_decl(
                checkpoint,
                SyntaxKind::InterfaceDeclaration,
                SyntaxKind::InterfaceBody,
            ),
            SyntaxKind::Semicolon => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::EmptyDeclaration.into());
                self.bump();
                self.builder.finish_node();
            }
            _ => {
                self.builder.start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected type declaration");
                self.recover_to(&[SyntaxKind::ClassKw, SyntaxKind::InterfaceKw, SyntaxKind::Eof]);
                self.builder.finish_node();
            }
        }
    }

    fn parse_class_decl(
        &mut self,
        checkpoint: rowan::Checkpoint,
        decl_kind: SyntaxKind,
        body_kind: SyntaxKind,
    ) {
        self.builder.start_node_at(checkpoint, decl_kind.into());
        // `class`/`interface` keyword already in current()
        self.bump();
        self.expect_ident_like("expected name");
        if self.at(SyntaxKind::Less) {
            self.parse_type_parameters();
        }

        if self.at(SyntaxKind::ExtendsKw) {
            self.builder.start_node(SyntaxKind::ExtendsClause.into());
            self.bump();
            self.parse_type_list();
            self.builder.finish_node();
        }
        if self.at(SyntaxKind::ImplementsKw) {
            self.builder.start_node(SyntaxKind::ImplementsClause.into());
            self.bump();
            self.parse_type_list();
            self.builder.finish_node();
        }

        self.parse_class_body(body_kind);
        self.builder.finish_node();
    }

    fn parse_type_list(&mut self) {
        self.parse_type();
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.parse_type();
        }
    }

    fn parse_class_body(&mut self, body_kind: SyntaxKind) {
        self.builder.start_node(body_kind.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.parse_class_member();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    fn parse_class_member(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.parse_modifiers();

        // Empty declaration.
        if self.at(SyntaxKind::Semicolon) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::EmptyDeclaration.into());
            self.bump();
            self.builder.finish_node();
            return;
        }

        // Nested types.
        if matches!(self.current(), SyntaxKind::ClassKw | SyntaxKind::InterfaceKw) {
            self.parse_type_declaration_inner(checkpoint);
            return;
        }

        // Generic methods: `<T> T pick(T a)`.
        let generic = self.at(SyntaxKind::Less);
        if generic {
            self.parse_type_parameters();
        }

        // Constructor: Ident '('
        if !generic && self.at_ident_like() && self.nth(1) == Some(SyntaxKind::LParen) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ConstructorDeclaration.into());
            self.bump(); // name
            self.parse_parameter_list();
            self.parse_throws_opt();
            self.parse_block();
            self.builder.finish_node();
            return;
        }

        if self.at_type_start() || self.at(SyntaxKind::VoidKw) {
            self.parse_type();
            if !self.at_ident_like() {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected member name");
                self.recover_to_class_member_boundary();
                self.builder.finish_node();
                return;
            }

            // After type + identifier: method if '(' follows, else field.
            if generic || self.nth(1) == Some(SyntaxKind::LParen) {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::MethodDeclaration.into());
                self.bump(); // name
                self.parse_parameter_list();
                self.parse_throws_opt();
                if self.at(SyntaxKind::LBrace) {
                    self.parse_block();
                } else {
                    self.expect(SyntaxKind::Semicolon, "expected `;` or method body");
                }
                self.builder.finish_node();
            } else {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::FieldDeclaration.into());
                self.parse_variable_declarator_list();
                self.expect(SyntaxKind::Semicolon, "expected `;` after field declaration");
                self.builder.finish_node();
            }
            return;
        }

        // Give up: recover.
        self.builder.start_node_at(checkpoint, SyntaxKind::Error.into());
        self.error_here("unexpected token in class body");
        self.recover_to_class_member_boundary();
        self.builder.finish_node();
    }

    fn parse_throws_opt(&mut self) {
        if !self.at(SyntaxKind::ThrowsKw) {
            return;
        }
        self.builder.start_node(SyntaxKind::ThrowsClause.into());
        self.bump();
        self.parse_type_list();
        self.builder.finish_node();
    }

    fn parse_modifiers(&mut self) {
        self.builder.start_node(SyntaxKind::Modifiers.into());
        loop {
            self.eat_trivia();
            match self.current() {
                SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::StaticKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::FinalKw => {
                    self.bump();
                }
                // `async` is only a modifier when a declaration follows it.
                SyntaxKind::AsyncKw if self.nth(1).map_or(false, starts_member_after_async) => {
                    self.bump();
                }
                _ => break,
            }
        }
        self.builder.finish_node();
    }

    fn parse_type_parameters(&mut self) {
        self.builder.start_node(SyntaxKind::TypeParameters.into());
        self.expect(SyntaxKind::Less, "expected `<`");
        while !matches!(self.current(), SyntaxKind::Greater | SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::TypeParameter.into());
            self.expect_ident_like("expected type parameter name");
            if self.at(SyntaxKind::ExtendsKw) {
                self.bump();
                self.parse_type();
                while self.at(SyntaxKind::Amp) {
                    self.bump();
                    self.parse_type();
                }
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect_gt();
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.builder.start_node(SyntaxKind::ParameterList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::Parameter.into());
            self.parse_modifiers();
            if self.at_type_start() {
                self.parse_type();
            } else {
                self.error_here("expected parameter type");
            }
            self.expect_ident_like("expected parameter name");
            self.builder.finish_node();

            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RParen, "expected `)`");
        self.builder.finish_node();
    }

    fn parse_argument_list(&mut self) {
        self.builder.start_node(SyntaxKind::ArgumentList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.parse_expression(0);
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RParen, "expected `)`");
        self.builder.finish_node();
    }

    fn parse_block(&mut self) {
        self.builder.start_node(SyntaxKind::Block.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.parse_statement();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    fn parse_statement(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        match self.current() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::IfKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::IfStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after if");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_embedded_statement();
                if self.at(SyntaxKind::ElseKw) {
                    self.bump();
                    self.parse_embedded_statement();
                }
                self.builder.finish_node();
            }
            SyntaxKind::ForKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ForStatement.into());
                self.bump();
                self.builder.start_node(SyntaxKind::ForHeader.into());
                self.expect(SyntaxKind::LParen, "expected `(` after for");
                self.parse_for_header_contents();
                self.expect(SyntaxKind::RParen, "expected `)` after for header");
                self.builder.finish_node(); // ForHeader
                self.parse_embedded_statement();
                self.builder.finish_node();
            }
            SyntaxKind::WhileKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::WhileStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after while");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_embedded_statement();
                self.builder.finish_node();
            }
            SyntaxKind::DoKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::DoWhileStatement.into());
                self.bump();
                self.parse_embedded_statement();
                self.expect(SyntaxKind::WhileKw, "expected `while` after `do` body");
                self.expect(SyntaxKind::LParen, "expected `(` after while");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.expect(SyntaxKind::Semicolon, "expected `;` after do-while");
                self.builder.finish_node();
            }
            SyntaxKind::TryKw => self.parse_try_statement(checkpoint),
            SyntaxKind::ReturnKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ReturnStatement.into());
                self.bump();
                if !self.at(SyntaxKind::Semicolon) {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after return");
                self.builder.finish_node();
            }
            SyntaxKind::YieldKw
                if matches!(self.nth(1), Some(SyntaxKind::ReturnKw | SyntaxKind::BreakKw)) =>
            {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::YieldStatement.into());
                self.bump(); // yield
                if self.at(SyntaxKind::ReturnKw) {
                    self.bump();
                    self.parse_expression(0);
                } else {
                    self.bump(); // break
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after yield");
                self.builder.finish_node();
            }
            SyntaxKind::BreakKw | SyntaxKind::ContinueKw => {
                let kind = if self.at(SyntaxKind::BreakKw) {
                    SyntaxKind::BreakStatement
                } else {
                    SyntaxKind::ContinueStatement
                };
                self.builder.start_node_at(checkpoint, kind.into());
                self.bump();
                // Optional label.
                if self.at_ident_like() {
                    self.bump();
                }
                self.expect(SyntaxKind::Semicolon, "expected `;`");
                self.builder.finish_node();
            }
            SyntaxKind::ThrowKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ThrowStatement.into());
                self.bump();
                self.parse_expression(0);
                self.expect(SyntaxKind::Semicolon, "expected `;` after throw");
                self.builder.finish_node();
            }
            SyntaxKind::Semicolon => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::EmptyStatement.into());
                self.bump();
                self.builder.finish_node();
            }
            _ => {
                if self.at_local_var_decl_start() {
                    self.builder.start_node_at(
                        checkpoint,
                        SyntaxKind::LocalVariableDeclarationStatement.into(),
                    );
                    self.parse_modifiers();
                    self.parse_type();
                    self.parse_variable_declarator_list();
                    self.expect(
                        SyntaxKind::Semicolon,
                        "expected `;` after local variable declaration",
                    );
                    self.builder.finish_node();
                } else {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ExpressionStatement.into());
                    self.parse_expression(0);
                    self.expect(SyntaxKind::Semicolon, "expected `;` after expression");
                    self.builder.finish_node();
                }
            }
        }
    }

    /// Body of `if`/`while`/`for`/`do`. A missing body is reported but leaves no node.
    fn parse_embedded_statement(&mut self) {
        if matches!(self.current(), SyntaxKind::Eof | SyntaxKind::RBrace) {
            self.error_here("expected statement");
            return;
        }
        self.parse_statement();
    }

    fn parse_try_statement(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::TryStatement.into());
        self.expect(SyntaxKind::TryKw, "expected `try`");
        self.parse_block();
        while self.at(SyntaxKind::CatchKw) {
            self.builder.start_node(SyntaxKind::CatchClause.into());
            self.bump();
            self.expect(SyntaxKind::LParen, "expected `(` after catch");
            self.builder.start_node(SyntaxKind::Parameter.into());
            self.parse_modifiers();
            // Multi-catch: `catch (A | B e)`.
            if self.at_type_start() {
                self.parse_type();
                while self.at(SyntaxKind::Pipe) {
                    self.bump();
                    self.parse_type();
                }
            }
            self.expect_ident_like("expected catch parameter name");
            self.builder.finish_node();
            self.expect(SyntaxKind::RParen, "expected `)` after catch parameter");
            self.parse_block();
            self.builder.finish_node();
        }
        if self.at(SyntaxKind::FinallyKw) {
            self.builder.start_node(SyntaxKind::FinallyClause.into());
            self.bump();
            self.parse_block();
            self.builder.finish_node();
        }
        self.builder.finish_node();
    }

    fn parse_for_header_contents(&mut self) {
        // Enhanced-for and classic-for share the same outer structure: `for ( ... )`.
        if self.at_local_var_decl_start() {
            self.parse_modifiers();
            self.parse_type();
            self.parse_variable_declarator_list();

            if self.at(SyntaxKind::Colon) {
                // Enhanced for: `for (T x : expr)`.
                self.bump();
                self.parse_expression(0);
                return;
            }
        } else if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression_list();
        }

        self.expect(SyntaxKind::Semicolon, "expected `;` in for header");
        if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression(0);
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` in for header");
        if !self.at(SyntaxKind::RParen) {
            self.parse_expression_list();
        }
    }

    fn parse_expression_list(&mut self) {
        self.parse_expression(0);
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.parse_expression(0);
        }
    }

    fn parse_variable_declarator_list(&mut self) {
        self.builder
            .start_node(SyntaxKind::VariableDeclaratorList.into());
        self.parse_variable_declarator();
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.parse_variable_declarator();
        }
        self.builder.finish_node();
    }

    fn parse_variable_declarator(&mut self) {
        self.builder
            .start_node(SyntaxKind::VariableDeclarator.into());
        self.expect_ident_like("expected variable name");
        if self.at(SyntaxKind::Eq) {
            self.bump();
            if self.at(SyntaxKind::Semicolon) || self.at(SyntaxKind::Comma) {
                self.error_here("expected initializer expression");
            } else {
                self.parse_expression(0);
            }
        }
        self.builder.finish_node();
    }

    fn parse_type(&mut self) {
        self.builder.start_node(SyntaxKind::Type.into());
        self.eat_trivia();
        if self.at_primitive_type() || self.at(SyntaxKind::VoidKw) {
            self.builder.start_node(SyntaxKind::PrimitiveType.into());
            self.bump();
            self.builder.finish_node();
        } else {
            self.builder.start_node(SyntaxKind::NamedType.into());
            self.expect_ident_like("expected type name");
            while self.at(SyntaxKind::Dot) && self.nth(1).map_or(false, |k| k.is_identifier_like()) {
                self.bump();
                self.expect_ident_like("expected type name segment");
            }
            if self.at(SyntaxKind::Less) {
                self.parse_type_arguments();
            }
            self.builder.finish_node();
        }
        while self.at(SyntaxKind::LBracket) && self.nth(1) == Some(SyntaxKind::RBracket) {
            self.bump();
            self.bump();
        }
        self.builder.finish_node();
    }

    fn parse_type_arguments(&mut self) {
        self.builder.start_node(SyntaxKind::TypeArguments.into());
        self.expect(SyntaxKind::Less, "expected `<`");
        while !matches!(
            self.current(),
            SyntaxKind::Greater | SyntaxKind::RightShift | SyntaxKind::UnsignedRightShift | SyntaxKind::Eof
        ) {
            self.builder.start_node(SyntaxKind::TypeArgument.into());
            if self.at(SyntaxKind::Question) {
                self.builder.start_node(SyntaxKind::WildcardType.into());
                self.bump();
                if self.at(SyntaxKind::ExtendsKw) || self.at(SyntaxKind::SuperKw) {
                    self.bump();
                    self.parse_type();
                }
                self.builder.finish_node();
            } else {
                self.parse_type();
            }
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect_gt();
        self.builder.finish_node();
    }

    fn expect_gt(&mut self) {
        self.eat_trivia();
        match self.current() {
            SyntaxKind::Greater => {
                self.bump();
            }
            SyntaxKind::RightShift | SyntaxKind::UnsignedRightShift => {
                self.split_shift_as_greater();
                self.bump();
            }
            _ => {
                self.error_here("expected `>`");
            }
        }
    }

    fn split_shift_as_greater(&mut self) {
        let tok = match self.tokens.pop_front() {
            Some(tok) => tok,
            None => return,
        };
        let width = match tok.kind {
            SyntaxKind::RightShift => 2u32,
            SyntaxKind::UnsignedRightShift => 3,
            _ => {
                self.tokens.push_front(tok);
                return;
            }
        };
        // Push the trailing `>`s first so the leading one ends up in front.
        for i in (0..width).rev() {
            let start = tok.range.start() + TextSize::from(i);
            self.tokens.push_front(Token {
                kind: SyntaxKind::Greater,
                range: TextRange::at(start, TextSize::from(1)),
            });
        }
    }

    fn parse_expression(&mut self, min_bp: u8) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();

        // Prefix / primary.
        match self.current() {
            kind if kind.is_literal() => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::LiteralExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::ThisKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ThisExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::SuperKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::SuperExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::NewKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::NewExpression.into());
                self.bump();
                self.parse_type();
                if self.at(SyntaxKind::LParen) {
                    self.parse_argument_list();
                }
                self.builder.finish_node();
            }
            SyntaxKind::Plus
            | SyntaxKind::Minus
            | SyntaxKind::Bang
            | SyntaxKind::Tilde
            | SyntaxKind::PlusPlus
            | SyntaxKind::MinusMinus => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::UnaryExpression.into());
                self.bump();
                self.parse_expression(100);
                self.builder.finish_node();
            }
            kind if kind.is_identifier_like() => {
                if self.nth(1) == Some(SyntaxKind::Arrow) {
                    self.parse_lambda_expression(checkpoint);
                } else {
                    // Qualified names become nested field accesses below, so every
                    // prefix of `a.b.c` is a node of its own.
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::NameExpression.into());
                    self.bump();
                    self.builder.finish_node();
                }
            }
            SyntaxKind::LParen => {
                if self.is_lambda_paren() {
                    self.parse_lambda_expression(checkpoint);
                } else if self.is_cast_expression() {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::CastExpression.into());
                    self.bump();
                    self.parse_type();
                    self.expect(SyntaxKind::RParen, "expected `)` in cast");
                    self.parse_expression(100);
                    self.builder.finish_node();
                } else {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ParenthesizedExpression.into());
                    self.bump();
                    self.parse_expression(0);
                    self.expect(SyntaxKind::RParen, "expected `)`");
                    self.builder.finish_node();
                }
            }
            _ => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected expression");
                // Consume one token to ensure progress.
                if !self.at(SyntaxKind::Eof) {
                    self.bump_any();
                }
                self.builder.finish_node();
            }
        }

        loop {
            self.eat_trivia();
            let op = self.current();

            // Postfix: call, field access, array access.
            match op {
                SyntaxKind::LParen => {
                    if min_bp > 120 {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::MethodCallExpression.into());
                    self.parse_argument_list();
                    self.builder.finish_node();
                    continue;
                }
                SyntaxKind::Dot => {
                    if min_bp > 120 {
                        break;
                    }
                    if self.nth(1).map_or(false, |k| k.is_identifier_like()) {
                        self.builder
                            .start_node_at(checkpoint, SyntaxKind::FieldAccessExpression.into());
                        self.bump();
                        self.bump();
                        self.builder.finish_node();
                        continue;
                    }
                    break;
                }
                SyntaxKind::LBracket => {
                    if min_bp > 120 {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ArrayAccessExpression.into());
                    self.bump();
                    if !self.at(SyntaxKind::RBracket) {
                        self.parse_expression(0);
                    }
                    self.expect(SyntaxKind::RBracket, "expected `]`");
                    self.builder.finish_node();
                    continue;
                }
                SyntaxKind::InstanceofKw => {
                    if 50 < min_bp {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::InstanceofExpression.into());
                    self.bump();
                    self.parse_type();
                    self.builder.finish_node();
                    continue;
                }
                _ => {}
            }

            if let Some((l_bp, r_bp, expr_kind)) = infix_binding_power(op) {
                if l_bp < min_bp {
                    break;
                }
                self.builder.start_node_at(checkpoint, expr_kind.into());
                self.bump();
                self.parse_expression(r_bp);
                self.builder.finish_node();
                continue;
            }

            // Conditional.
            if op == SyntaxKind::Question {
                let (l_bp, r_bp) = (2, 1);
                if l_bp < min_bp {
                    break;
                }
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ConditionalExpression.into());
                self.bump(); // ?
                self.parse_expression(0);
                self.expect(SyntaxKind::Colon, "expected `:` in conditional expression");
                self.parse_expression(r_bp);
                self.builder.finish_node();
                continue;
            }

            break;
        }
    }

    fn parse_lambda_expression(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::LambdaExpression.into());
        // Params.
        if self.at(SyntaxKind::LParen) {
            self.bump();
            while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
                self.bump_any();
            }
            self.expect(SyntaxKind::RParen, "expected `)` in lambda parameters");
        } else {
            self.expect_ident_like("expected lambda parameter");
        }
        self.expect(SyntaxKind::Arrow, "expected `->` in lambda");
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expression(0);
        }
        self.builder.finish_node();
    }

    fn is_lambda_paren(&mut self) -> bool {
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let close = skip_balanced_parens(&self.tokens, skip_trivia(&self.tokens, 0));
        let next = skip_trivia(&self.tokens, close);
        self.tokens.get(next).map(|t| t.kind) == Some(SyntaxKind::Arrow)
    }

    fn is_cast_expression(&mut self) -> bool {
        // `(Type) expr`: the parenthesised tokens must look like a type, and something
        // that can start an operand has to follow the `)`.
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let open = skip_trivia(&self.tokens, 0);
        let first = skip_trivia(&self.tokens, open + 1);
        let Some(first_kind) = self.tokens.get(first).map(|t| t.kind) else {
            return false;
        };
        let primitive = is_primitive_type(first_kind);
        let Some(after_type) = skip_type(&self.tokens, first) else {
            return false;
        };
        let close = skip_trivia(&self.tokens, after_type);
        if self.tokens.get(close).map(|t| t.kind) != Some(SyntaxKind::RParen) {
            return false;
        }
        let next = skip_trivia(&self.tokens, close + 1);
        let Some(next_kind) = self.tokens.get(next).map(|t| t.kind) else {
            return false;
        };
        if primitive {
            return can_start_expression(next_kind);
        }
        // `(a) + b` and `(a) - b` are binary expressions, not casts.
        can_start_expression(next_kind)
            && !matches!(
                next_kind,
                SyntaxKind::Plus | SyntaxKind::Minus | SyntaxKind::PlusPlus | SyntaxKind::MinusMinus
            )
    }

    fn at_local_var_decl_start(&mut self) -> bool {
        let mut i = skip_trivia(&self.tokens, 0);

        // Local variable modifiers.
        while self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::FinalKw) {
            i = skip_trivia(&self.tokens, i + 1);
        }

        let Some(first) = self.tokens.get(i).map(|t| t.kind) else {
            return false;
        };

        if first == SyntaxKind::VarKw {
            let j = skip_trivia(&self.tokens, i + 1);
            return self
                .tokens
                .get(j)
                .map_or(false, |t| t.kind.is_identifier_like());
        }

        if !is_primitive_type(first) && !first.is_identifier_like() {
            return false;
        }
        let Some(after_type) = skip_type(&self.tokens, i) else {
            return false;
        };
        let name = skip_trivia(&self.tokens, after_type);
        if !self
            .tokens
            .get(name)
            .map_or(false, |t| t.kind.is_identifier_like())
        {
            return false;
        }
        // `a b` followed by `=`, `;`, `,` or `:` is a declaration.
        let after_name = skip_trivia(&self.tokens, name + 1);
        matches!(
            self.tokens.get(after_name).map(|t| t.kind),
            Some(SyntaxKind::Eq | SyntaxKind::Semicolon | SyntaxKind::Comma | SyntaxKind::Colon)
                | Some(SyntaxKind::Eof | SyntaxKind::RBrace)
        )
    }

    fn recover_top_level(&mut self) {
        self.builder.start_node(SyntaxKind::Error.into());
        self.error_here("unexpected token at top level");
        self.bump_any();
        self.recover_to(&[
            SyntaxKind::ClassKw,
            SyntaxKind::InterfaceKw,
            SyntaxKind::PublicKw,
            SyntaxKind::AbstractKw,
            SyntaxKind::FinalKw,
            SyntaxKind::Eof,
        ]);
        self.builder.finish_node();
    }

    fn recover_to_class_member_boundary(&mut self) {
        self.recover_to(&[
            SyntaxKind::Semicolon,
            SyntaxKind::RBrace,
            SyntaxKind::ClassKw,
            SyntaxKind::InterfaceKw,
            SyntaxKind::PublicKw,
            SyntaxKind::PrivateKw,
            SyntaxKind::ProtectedKw,
            SyntaxKind::StaticKw,
            SyntaxKind::FinalKw,
            SyntaxKind::AbstractKw,
        ]);
        // If we stopped at `;`, consume it to avoid loops.
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
        }
    }

    fn recover_to(&mut self, recovery: &[SyntaxKind]) {
        while !self.at(SyntaxKind::Eof) {
            if recovery.contains(&self.current()) {
                break;
            }
            self.bump_any();
        }
    }

    fn at_type_decl_start(&mut self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::ClassKw
                | SyntaxKind::InterfaceKw
                | SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::StaticKw
                | SyntaxKind::FinalKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::Semicolon
        )
    }

    fn at_type_start(&mut self) -> bool {
        self.at_primitive_type() || self.at_ident_like()
    }

    fn at_primitive_type(&mut self) -> bool {
        is_primitive_type(self.current())
    }

    fn current(&mut self) -> SyntaxKind {
        self.eat_trivia();
        self.tokens.front().map(|t| t.kind).unwrap_or(SyntaxKind::Eof)
    }

    fn nth(&mut self, n: usize) -> Option<SyntaxKind> {
        let mut idx = 0usize;
        let mut remaining = n;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.kind.is_trivia() {
                idx += 1;
                continue;
            }
            if remaining == 0 {
                return Some(tok.kind);
            }
            remaining -= 1;
            idx += 1;
        }
        None
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_ident_like(&mut self) -> bool {
        self.current().is_identifier_like()
    }

    fn eat_trivia(&mut self) {
        while self.tokens.front().map_or(false, |t| t.kind.is_trivia()) {
            self.bump_any();
        }
    }

    fn bump(&mut self) {
        self.eat_trivia();
        self.bump_any();
    }

    fn bump_any(&mut self) {
        if let Some(tok) = self.tokens.pop_front() {
            let text = tok.text(self.input);
            self.builder.token(tok.kind.into(), text);
        }
    }

    fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error_here(message);
            false
        }
    }

    fn expect_ident_like(&mut self, message: &str) {
        if self.at_ident_like() {
            self.bump();
        } else {
            self.error_here(message);
        }
    }

    fn error_here(&mut self, message: &str) {
        let range = self.current_range();
        self.errors.push(ParseError {
            message: message.to_string(),
            range,
        });
    }

    fn current_range(&mut self) -> TextRange {
        self.eat_trivia();
        self.tokens
            .front()
            .map(|t| t.range)
            .unwrap_or_else(|| TextRange::empty(TextSize::of(self.input)))
    }
}

fn starts_member_after_async(kind: SyntaxKind) -> bool {
    kind.is_identifier_like()
        || is_primitive_type(kind)
        || matches!(
            kind,
            SyntaxKind::VoidKw
                | SyntaxKind::Less
                | SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::StaticKw
                | SyntaxKind::FinalKw
                | SyntaxKind::AbstractKw
        )
}

fn skip_trivia(tokens: &VecDeque<Token>, mut idx: usize) -> usize {
    while tokens.get(idx).map_or(false, |t| t.kind.is_trivia()) {
        idx += 1;
    }
    idx
}

fn skip_balanced_parens(tokens: &VecDeque<Token>, mut idx: usize) -> usize {
    // Assumes `tokens[idx]` is `(`.
    let mut depth = 0usize;
    while let Some(tok) = tokens.get(idx) {
        if tok.kind.is_trivia() {
            idx += 1;
            continue;
        }
        match tok.kind {
            SyntaxKind::LParen => {
                depth += 1;
            }
            SyntaxKind::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    idx += 1;
                    break;
                }
            }
            SyntaxKind::Eof => {
                break;
            }
            _ => {}
        }
        idx += 1;
    }
    idx
}

/// Skip a probable type starting at `idx`; returns the index after it.
fn skip_type(tokens: &VecDeque<Token>, idx: usize) -> Option<usize> {
    let first = tokens.get(idx)?.kind;
    let mut i = idx + 1;
    if first.is_identifier_like() {
        // Qualified name.
        loop {
            let dot = skip_trivia(tokens, i);
            if tokens.get(dot).map(|t| t.kind) != Some(SyntaxKind::Dot) {
                break;
            }
            let seg = skip_trivia(tokens, dot + 1);
            if !tokens.get(seg).map_or(false, |t| t.kind.is_identifier_like()) {
                break;
            }
            i = seg + 1;
        }
        let lt = skip_trivia(tokens, i);
        if tokens.get(lt).map(|t| t.kind) == Some(SyntaxKind::Less) {
            i = skip_type_arguments(tokens, lt)?;
        }
    } else if !is_primitive_type(first) {
        return None;
    }

    // Array dims: `[]`*
    loop {
        let j = skip_trivia(tokens, i);
        if tokens.get(j).map(|t| t.kind) != Some(SyntaxKind::LBracket) {
            break;
        }
        let after_l = skip_trivia(tokens, j + 1);
        if tokens.get(after_l).map(|t| t.kind) != Some(SyntaxKind::RBracket) {
            break;
        }
        i = after_l + 1;
    }
    Some(i)
}

fn skip_type_arguments(tokens: &VecDeque<Token>, mut idx: usize) -> Option<usize> {
    // Assumes `tokens[idx]` is `<`. Only tokens that may appear inside type
    // arguments are accepted, so `a < b && c > d` is not mistaken for one.
    let mut depth: i32 = 0;
    while let Some(tok) = tokens.get(idx) {
        match tok.kind {
            kind if kind.is_trivia() => {}
            SyntaxKind::Less => depth += 1,
            SyntaxKind::Greater => depth -= 1,
            SyntaxKind::RightShift => depth -= 2,
            SyntaxKind::UnsignedRightShift => depth -= 3,
            SyntaxKind::Comma
            | SyntaxKind::Dot
            | SyntaxKind::Question
            | SyntaxKind::ExtendsKw
            | SyntaxKind::SuperKw
            | SyntaxKind::LBracket
            | SyntaxKind::RBracket
            | SyntaxKind::Amp => {}
            kind if kind.is_identifier_like() || is_primitive_type(kind) => {}
            _ => return None,
        }
        idx += 1;
        if depth <= 0 {
            return (depth == 0).then_some(idx);
        }
    }
    None
}

fn is_primitive_type(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BooleanKw
            | SyntaxKind::ByteKw
            | SyntaxKind::ShortKw
            | SyntaxKind::IntKw
            | SyntaxKind::LongKw
            | SyntaxKind::CharKw
            | SyntaxKind::FloatKw
            | SyntaxKind::DoubleKw
    )
}

fn can_start_expression(kind: SyntaxKind) -> bool {
    kind.is_identifier_like()
        || kind.is_literal()
        || matches!(
            kind,
            SyntaxKind::ThisKw
                | SyntaxKind::SuperKw
                | SyntaxKind::NewKw
                | SyntaxKind::LParen
                | SyntaxKind::Plus
                | SyntaxKind::Minus
                | SyntaxKind::Bang
                | SyntaxKind::Tilde
                | SyntaxKind::PlusPlus
                | SyntaxKind::MinusMinus
        )
}

fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8, SyntaxKind)> {
    // Returns (left_bp, right_bp, node_kind).
    // Larger = tighter binding.
    let (l, r, kind) = match op {
        SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => (70, 71, SyntaxKind::BinaryExpression),
        SyntaxKind::Plus | SyntaxKind::Minus => (60, 61, SyntaxKind::BinaryExpression),
        SyntaxKind::LeftShift | SyntaxKind::RightShift | SyntaxKind::UnsignedRightShift => {
            (55, 56, SyntaxKind::BinaryExpression)
        }
        SyntaxKind::Less | SyntaxKind::LessEq | SyntaxKind::Greater | SyntaxKind::GreaterEq => {
            (50, 51, SyntaxKind::BinaryExpression)
        }
        SyntaxKind::EqEq | SyntaxKind::BangEq => (45, 46, SyntaxKind::BinaryExpression),
        SyntaxKind::Amp => (40, 41, SyntaxKind::BinaryExpression),
        SyntaxKind::Caret => (39, 40, SyntaxKind::BinaryExpression),
        SyntaxKind::Pipe => (38, 39, SyntaxKind::BinaryExpression),
        SyntaxKind::AmpAmp => (30, 31, SyntaxKind::BinaryExpression),
        SyntaxKind::PipePipe => (20, 21, SyntaxKind::BinaryExpression),

        // Assignment (right-associative).
        SyntaxKind::Eq
        | SyntaxKind::PlusEq
        | SyntaxKind::MinusEq
        | SyntaxKind::StarEq
        | SyntaxKind::SlashEq
        | SyntaxKind::PercentEq
        | SyntaxKind::AmpEq
        | SyntaxKind::PipeEq
        | SyntaxKind::CaretEq
        | SyntaxKind::LeftShiftEq
        | SyntaxKind::RightShiftEq
        | SyntaxKind::UnsignedRightShiftEq => (1, 0, SyntaxKind::AssignmentExpression),

        _ => return None,
    };
    Some((l, r, kind))
}

// --- debug helpers used by tests ---

#[cfg(test)]
pub fn debug_dump(node: &SyntaxNode) -> String {
    fn go(node: &SyntaxNode, indent: usize, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{:indent$}{:?}", "", node.kind(), indent = indent);
        for child in node.children_with_tokens() {
            match child {
                NodeOrToken::Node(n) => go(&n, indent + 2, out),
                NodeOrToken::Token(t) => {
                    if t.kind().is_trivia() {
                        continue;
                    }
                    let _ = writeln!(
                        out,
                        "{:indent$}{:?} {:?}",
                        "",
                        t.kind(),
                        t.text(),
                        indent = indent + 2
                    );
                }
            }
        }
    }

    let mut out = String::new();
    go(node, 0, &mut out);
    out
}
