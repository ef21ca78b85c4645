//! Shape checks shared by the bundled templates.

use nova_syntax::{
    AstNode, BinaryExpression, Expression, FieldAccessExpression, LiteralExpression,
    NameExpression, SyntaxKind, UnaryExpression,
};

use crate::context::PrefixExpressionContext;
use crate::template::TemplateQuery;

/// Looks like it produces a boolean without consulting types: comparisons,
/// logical operators, negation, `instanceof` and the boolean literals.
pub(crate) fn is_boolean_shaped(expr: &Expression) -> bool {
    let expr = expr.unparenthesized();
    match expr.kind() {
        SyntaxKind::InstanceofExpression => true,
        SyntaxKind::BinaryExpression => BinaryExpression::cast(expr.syntax().clone())
            .and_then(|binary| binary.op())
            .is_some_and(|op| {
                matches!(
                    op,
                    SyntaxKind::EqEq
                        | SyntaxKind::BangEq
                        | SyntaxKind::Less
                        | SyntaxKind::LessEq
                        | SyntaxKind::Greater
                        | SyntaxKind::GreaterEq
                        | SyntaxKind::AmpAmp
                        | SyntaxKind::PipePipe
                )
            }),
        SyntaxKind::UnaryExpression => UnaryExpression::cast(expr.syntax().clone())
            .and_then(|unary| unary.op())
            == Some(SyntaxKind::Bang),
        SyntaxKind::LiteralExpression => LiteralExpression::cast(expr.syntax().clone())
            .and_then(|literal| literal.token())
            .is_some_and(|token| matches!(token.kind(), SyntaxKind::TrueKw | SyntaxKind::FalseKw)),
        _ => false,
    }
}

/// Boolean-typed, or (soft mode only) boolean-shaped with no type to say otherwise.
pub(crate) fn is_boolean(ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> bool {
    if ctx.ty.is_boolean() {
        return true;
    }
    !query.is_precise() && !ctx.ty.is_resolved() && is_boolean_shaped(&ctx.expression)
}

/// `a`, `a.b`, `a.b.c`: names joined by member access and nothing else.
pub(crate) fn is_reference_chain(expr: &Expression) -> bool {
    let mut current = expr.clone();
    loop {
        match current.kind() {
            SyntaxKind::NameExpression => return true,
            SyntaxKind::FieldAccessExpression => {
                let Some(receiver) = FieldAccessExpression::cast(current.syntax().clone())
                    .and_then(|access| access.receiver())
                else {
                    return false;
                };
                current = receiver;
            }
            _ => return false,
        }
    }
}

/// Last identifier of a reference chain.
pub(crate) fn last_segment(expr: &Expression) -> Option<String> {
    let token = match expr.kind() {
        SyntaxKind::NameExpression => NameExpression::cast(expr.syntax().clone())?.name()?,
        SyntaxKind::FieldAccessExpression => {
            FieldAccessExpression::cast(expr.syntax().clone())?.name()?
        }
        _ => return None,
    };
    Some(token.text().to_string())
}

/// A reference chain whose last name starts with an uppercase letter, the
/// usual spelling of a type that did not resolve.
pub(crate) fn is_capitalized_chain(expr: &Expression) -> bool {
    is_reference_chain(expr)
        && last_segment(expr)
            .and_then(|name| name.chars().next())
            .is_some_and(char::is_uppercase)
}

/// Whether a prefix operator applied to `expr` must be wrapped in parentheses.
pub(crate) fn needs_parentheses(expr: &Expression) -> bool {
    !matches!(
        expr.kind(),
        SyntaxKind::LiteralExpression
            | SyntaxKind::NameExpression
            | SyntaxKind::ThisExpression
            | SyntaxKind::ParenthesizedExpression
            | SyntaxKind::MethodCallExpression
            | SyntaxKind::FieldAccessExpression
            | SyntaxKind::ArrayAccessExpression
            | SyntaxKind::UnaryExpression
    )
}

/// Outermost context that can become a statement of its own.
pub(crate) fn outermost_statement_context<'a>(
    query: &TemplateQuery<'a>,
) -> Option<(usize, &'a PrefixExpressionContext)> {
    query.contexts().rev().find(|(_, ctx)| ctx.can_be_statement)
}

/// Proposal shared by `if` and `while`: the outermost statement-eligible
/// context, when it is a boolean value.
pub(crate) fn boolean_statement_context(query: &TemplateQuery<'_>) -> Option<usize> {
    let (idx, ctx) = outermost_statement_context(query)?;
    (!ctx.is_type_usage && is_boolean(ctx, query)).then_some(idx)
}
