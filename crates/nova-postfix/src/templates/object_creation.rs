use nova_syntax::{AstNode, MethodCallExpression};

use crate::context::PrefixExpressionContext;
use crate::rewrite::{Behavior, CaretPlacement};
use crate::semantics::{CanInstantiate, Resolution, Type};
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::{is_capitalized_chain, is_reference_chain};

/// `Foo.new` → `new Foo()`, `Foo(1).new` → `new Foo(1)`
pub struct ObjectCreationTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for ObjectCreationTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "new",
                "Produces instantiation expression for type",
                "new SomeType()",
            )
            .works_on_type_names(),
        }
    }
}

impl ObjectCreationTemplate {
    fn creatable(&self, ty: &Type, ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> bool {
        let scope = ctx.expression.syntax();
        query.model.is_useful_to_create_with_new(ty, scope)
            && query.model.can_instantiate(ty, scope) != CanInstantiate::No
    }

    fn target(&self, ctx: &PrefixExpressionContext, query: &TemplateQuery<'_>) -> Option<TargetKind> {
        if ctx.is_type_usage {
            // Interfaces, abstract types and types without an accessible
            // constructor are never offered; precise mode also drops the ones
            // that are only used statically.
            let scope = ctx.expression.syntax();
            let accepted = query.model.can_instantiate(&ctx.ty, scope) != CanInstantiate::No
                && (!query.is_precise() || query.model.is_useful_to_create_with_new(&ctx.ty, scope));
            return accepted.then_some(TargetKind::TypeUsage);
        }

        if let Some(call) = MethodCallExpression::cast(ctx.expression.syntax().clone()) {
            let callee = call.callee().filter(is_reference_chain)?;
            return match query.model.resolve_reference(&callee) {
                Resolution::Type(ty) if self.creatable(&ty, ctx, query) => {
                    Some(TargetKind::Expression)
                }
                Resolution::Type(_) | Resolution::Unresolved if !query.is_precise() => {
                    Some(TargetKind::Expression)
                }
                _ => None,
            };
        }

        // A capitalized name that resolves to nothing is most likely a type
        // the user has not imported yet.
        let unresolved_type_name = !query.is_precise()
            && ctx.resolution == Resolution::Unresolved
            && is_capitalized_chain(&ctx.expression);
        unresolved_type_name.then_some(TargetKind::TypeUsage)
    }
}

impl PostfixTemplate for ObjectCreationTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        query.contexts().find_map(|(idx, ctx)| {
            let target = self.target(ctx, query)?;
            Some(TemplateProposal::single(&self.descriptor.name, idx, target))
        })
    }

    fn create_behavior(&self, proposal: &TemplateProposal, query: &TemplateQuery<'_>) -> Behavior {
        match proposal.target {
            TargetKind::Expression => Behavior::expression("new $0"),
            TargetKind::TypeUsage => {
                let instantiation = proposal
                    .contexts
                    .first()
                    .and_then(|idx| query.context.contexts.get(*idx))
                    .map_or(CanInstantiate::No, |ctx| {
                        query.model.can_instantiate(&ctx.ty, ctx.expression.syntax())
                    });
                let caret = match instantiation {
                    CanInstantiate::Default => CaretPlacement::End,
                    CanInstantiate::CtorWithParameters | CanInstantiate::No => {
                        CaretPlacement::BeforeClosingParen
                    }
                };
                Behavior::expression("new $0()")
                    .caret(caret)
                    .with_parameter_info()
            }
        }
    }
}
