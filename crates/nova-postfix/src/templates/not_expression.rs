use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::{is_boolean, needs_parentheses};

/// `cond.not` → `!cond`
pub struct NotExpressionTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for NotExpressionTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "not",
                "Negates boolean expression",
                "!expr",
            ),
        }
    }
}

impl PostfixTemplate for NotExpressionTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let contexts: Vec<usize> = query
            .contexts()
            .filter(|(_, ctx)| !ctx.is_type_usage && is_boolean(ctx, query))
            .map(|(idx, _)| idx)
            .collect();
        if contexts.is_empty() {
            return None;
        }
        Some(TemplateProposal::new(
            &self.descriptor.name,
            contexts,
            TargetKind::Expression,
        ))
    }

    fn create_behavior(&self, proposal: &TemplateProposal, query: &TemplateQuery<'_>) -> Behavior {
        let parenthesize = proposal
            .contexts
            .first()
            .and_then(|idx| query.context.contexts.get(*idx))
            .is_some_and(|ctx| needs_parentheses(&ctx.expression));
        if parenthesize {
            Behavior::expression("!($0)")
        } else {
            Behavior::expression("!$0")
        }
    }
}
