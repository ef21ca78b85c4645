use nova_syntax::{AstNode, SyntaxKind};

use crate::context::PrefixExpressionContext;
use crate::rewrite::Behavior;
use crate::semantics::effective_return_type;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::outermost_statement_context;

/// `expr.return` → `return expr;`
pub struct ReturnStatementTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for ReturnStatementTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "return",
                "Returns expression from current function",
                "return expr;",
            ),
        }
    }
}

impl ReturnStatementTemplate {
    fn accepts(&self, ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> bool {
        if ctx.is_type_usage {
            return false;
        }
        let Some(function) = &ctx.function else {
            return false;
        };
        let Some(signature) = query.model.function_signature(function) else {
            return false;
        };
        if function.kind() == SyntaxKind::LambdaExpression {
            // Lambdas infer their return type from the body.
            return !query.is_precise() || ctx.ty.is_resolved();
        }
        if signature.return_type.as_ref().is_some_and(|ty| ty.is_void()) {
            return false;
        }
        if !query.is_precise() {
            return true;
        }

        let Some(expected) = effective_return_type(query.model, &signature) else {
            return false;
        };
        ctx.ty.is_resolved()
            && query
                .model
                .is_implicitly_convertible(&ctx.ty, &expected, ctx.expression.syntax())
    }
}

impl PostfixTemplate for ReturnStatementTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let (idx, ctx) = outermost_statement_context(query)?;
        self.accepts(ctx, query).then(|| {
            TemplateProposal::single(&self.descriptor.name, idx, TargetKind::Expression)
        })
    }

    fn create_behavior(&self, _proposal: &TemplateProposal, _query: &TemplateQuery<'_>) -> Behavior {
        Behavior::statement("return $0;")
    }
}
