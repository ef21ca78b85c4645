use std::sync::Arc;

use nova_syntax::{
    AstNode, ClassDeclaration, Expression, MethodCallExpression, MethodDeclaration, SyntaxKind,
    SyntaxNode,
};

use crate::context::PrefixExpressionContext;
use crate::macros::ConstantMacro;
use crate::rewrite::Behavior;
use crate::semantics::Type;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::{last_segment, outermost_statement_context};

/// `expr.field` → `this.name = expr;` plus `private Type name;` in the class.
pub struct IntroduceFieldTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for IntroduceFieldTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "field",
                "Introduces field for expression",
                "this.name = expr;",
            ),
        }
    }
}

/// The method or constructor whose body holds the expression, when it
/// belongs to a class rather than an interface.
fn enclosing_member(ctx: &PrefixExpressionContext) -> Option<SyntaxNode> {
    let member = ctx.expression.syntax().ancestors().find(|node| {
        matches!(
            node.kind(),
            SyntaxKind::MethodDeclaration | SyntaxKind::ConstructorDeclaration
        )
    })?;
    let class = member.ancestors().find_map(ClassDeclaration::cast)?;
    (!class.is_interface()).then_some(member)
}

fn is_static_member(member: &SyntaxNode) -> bool {
    MethodDeclaration::cast(member.clone()).is_some_and(|method| method.is_static())
}

impl IntroduceFieldTemplate {
    fn accepts(ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> bool {
        if ctx.is_type_usage || ctx.expression.kind() == SyntaxKind::AssignmentExpression {
            return false;
        }
        if enclosing_member(ctx).is_none() {
            return false;
        }
        match &ctx.ty {
            Type::Void => false,
            Type::Unresolved | Type::Null => !query.is_precise(),
            _ => true,
        }
    }
}

impl PostfixTemplate for IntroduceFieldTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let (idx, ctx) = outermost_statement_context(query)?;
        // Declaring the field needs the class text itself.
        if ctx.statement_range.is_none() {
            return None;
        }
        Self::accepts(ctx, query).then(|| {
            TemplateProposal::single(&self.descriptor.name, idx, TargetKind::Expression)
        })
    }

    fn create_behavior(&self, proposal: &TemplateProposal, query: &TemplateQuery<'_>) -> Behavior {
        let ctx = proposal
            .contexts
            .first()
            .and_then(|idx| query.context.contexts.get(*idx));
        let (ty, suggestion, is_static) = match ctx {
            Some(ctx) => {
                let ty = match &ctx.ty {
                    Type::Unresolved | Type::Null => "Object".to_string(),
                    ty => ty.to_string(),
                };
                let is_static = enclosing_member(ctx).is_some_and(|member| is_static_member(&member));
                (ty, suggest_name(&ctx.expression, &ctx.ty), is_static)
            }
            None => ("Object".to_string(), "value".to_string(), false),
        };
        let (statement, member) = if is_static {
            ("$name$ = $0;", format!("private static {ty} $name$;"))
        } else {
            ("this.$name$ = $0;", format!("private {ty} $name$;"))
        };
        Behavior::statement(statement)
            .declare_member(member, is_static)
            .default_for("name", Arc::new(ConstantMacro::new(suggestion)))
    }
}

/// A field name for `expr`: the property a getter reads, the name a
/// reference already uses, or the type's name.
fn suggest_name(expr: &Expression, ty: &Type) -> String {
    let expr = expr.unparenthesized();
    let from_expression = match expr.kind() {
        SyntaxKind::MethodCallExpression => MethodCallExpression::cast(expr.syntax().clone())
            .and_then(|call| call.callee())
            .and_then(|callee| last_segment(&callee))
            .map(|name| strip_accessor_prefix(&name)),
        SyntaxKind::NameExpression | SyntaxKind::FieldAccessExpression => last_segment(&expr),
        _ => None,
    };
    from_expression
        .filter(|name| !name.is_empty())
        .or_else(|| ty.simple_name().map(lower_first))
        .unwrap_or_else(|| "value".to_string())
}

fn strip_accessor_prefix(name: &str) -> String {
    for prefix in ["get", "is"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(char::is_uppercase) {
                return lower_first(rest);
            }
        }
    }
    name.to_string()
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
