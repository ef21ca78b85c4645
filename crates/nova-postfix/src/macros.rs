//! Hotspot default macros.

use nova_syntax::{
    parse_java, significant_range, AssignmentExpression, AstNode, Expression,
    FieldDeclaration, LocalVariableDeclarationStatement, SyntaxKind, SyntaxNode,
};

use crate::hotspot::{HotspotMacro, MacroContext};
use crate::local_semantics::lower_type;
use crate::semantics::{effective_return_type, Type};

/// Guesses the type the surrounding code expects from the expansion:
/// the declared type of the variable it initializes, the type of the
/// variable it is assigned to, or the return type of the enclosing function.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpectedTypeMacro;

impl HotspotMacro for ExpectedTypeMacro {
    fn evaluate(&self, ctx: &MacroContext<'_>) -> Option<String> {
        let parse = parse_java(ctx.text);
        let root = parse.syntax();
        let expansion = root
            .descendants()
            .filter(|node| Expression::can_cast(node.kind()))
            .find(|node| significant_range(node) == ctx.expansion)?;

        let ty = expected_type(&expansion, ctx)?;
        let text = ty.to_string();
        tracing::trace!(target = "nova.postfix", ty = %text, "guessed expected type");
        Some(text)
    }
}

/// A fixed suggestion, worked out when the template was expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantMacro(pub String);

impl ConstantMacro {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl HotspotMacro for ConstantMacro {
    fn evaluate(&self, _ctx: &MacroContext<'_>) -> Option<String> {
        Some(self.0.clone())
    }
}

fn expected_type(expression: &SyntaxNode, ctx: &MacroContext<'_>) -> Option<Type> {
    let mut child = expression.clone();
    for parent in expression.ancestors().skip(1) {
        match parent.kind() {
            SyntaxKind::ParenthesizedExpression => {}
            SyntaxKind::VariableDeclarator => {
                let declaration = parent
                    .ancestors()
                    .skip(1)
                    .find(|node| node.kind() != SyntaxKind::VariableDeclaratorList)?;
                let ty = LocalVariableDeclarationStatement::cast(declaration.clone())
                    .and_then(|local| local.ty())
                    .or_else(|| FieldDeclaration::cast(declaration).and_then(|field| field.ty()))?;
                // `var` takes its type from the initializer, which is us.
                let ty = lower_type(&ty);
                return (ty.is_resolved() && ty.simple_name() != Some("var")).then_some(ty);
            }
            SyntaxKind::AssignmentExpression => {
                let assignment = AssignmentExpression::cast(parent)?;
                let rhs = assignment.rhs()?;
                if rhs.syntax() != &child {
                    return None;
                }
                let ty = ctx.model.type_of(&assignment.lhs()?);
                return ty.is_resolved().then_some(ty);
            }
            SyntaxKind::ReturnStatement => {
                let function = parent.ancestors().find(|node| node.kind().is_function())?;
                let signature = ctx.model.function_signature(&function)?;
                return effective_return_type(ctx.model, &signature).filter(Type::is_resolved);
            }
            _ => return None,
        }
        child = parent;
    }
    None
}
