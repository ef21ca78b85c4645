use nova_syntax::AstNode;

use crate::context::PrefixExpressionContext;
use crate::rewrite::{Behavior, CaretPlacement};
use crate::semantics::CanInstantiate;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::outermost_statement_context;

/// `ex.throw` → `throw ex;`, `IllegalStateException.throw` → `throw new IllegalStateException();`
pub struct ThrowStatementTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for ThrowStatementTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "throw",
                "Throws expression of 'Exception' type",
                "throw expr;",
            )
            .works_on_type_names(),
        }
    }
}

impl ThrowStatementTemplate {
    fn target(&self, ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> Option<TargetKind> {
        let scope = ctx.expression.syntax();
        let exception = query.model.exception_type();
        let throwable = ctx.ty.is_resolved()
            && query
                .model
                .is_implicitly_convertible(&ctx.ty, &exception, scope);

        if ctx.is_type_usage {
            let accepted = !query.is_precise()
                || (throwable && query.model.can_instantiate(&ctx.ty, scope) != CanInstantiate::No);
            return accepted.then_some(TargetKind::TypeUsage);
        }

        let accepted = if query.is_precise() {
            throwable
        } else {
            !ctx.ty.is_resolved() || throwable
        };
        accepted.then_some(TargetKind::Expression)
    }
}

impl PostfixTemplate for ThrowStatementTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let (idx, ctx) = outermost_statement_context(query)?;
        let target = self.target(ctx, query)?;
        Some(TemplateProposal::single(&self.descriptor.name, idx, target))
    }

    fn create_behavior(&self, proposal: &TemplateProposal, query: &TemplateQuery<'_>) -> Behavior {
        match proposal.target {
            TargetKind::Expression => Behavior::statement("throw $0;"),
            TargetKind::TypeUsage => {
                let needs_arguments = proposal
                    .contexts
                    .first()
                    .and_then(|idx| query.context.contexts.get(*idx))
                    .map_or(true, |ctx| {
                        query.model.can_instantiate(&ctx.ty, ctx.expression.syntax())
                            != CanInstantiate::Default
                    });
                let caret = if needs_arguments {
                    CaretPlacement::BeforeClosingParen
                } else {
                    CaretPlacement::End
                };
                Behavior::statement("throw new $0();")
                    .caret(caret)
                    .with_parameter_info()
            }
        }
    }
}
