use std::sync::Arc;

use crate::hotspot::{EscapePolicy, OnClose};
use crate::macros::ExpectedTypeMacro;
use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

/// `expr.cast` → `((SomeType) expr)`
pub struct CastExpressionTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for CastExpressionTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "cast",
                "Surrounds expression with cast",
                "((SomeType) expr)",
            ),
        }
    }
}

impl PostfixTemplate for CastExpressionTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        // Offered while typing only; there is nothing to check precisely.
        if query.is_precise() {
            return None;
        }
        let contexts: Vec<usize> = query
            .contexts()
            .filter(|(_, ctx)| !ctx.is_type_usage)
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

    fn create_behavior(&self, _proposal: &TemplateProposal, _query: &TemplateQuery<'_>) -> Behavior {
        Behavior::expression("(($T$) $0)")
            .default_for("T", Arc::new(ExpectedTypeMacro))
            .escape(EscapePolicy::LeaveTextAndCaret)
            .on_close(OnClose::new(|ctx| {
                let end = ctx.expansion.end();
                ctx.control.move_caret(end);
            }))
    }
}
