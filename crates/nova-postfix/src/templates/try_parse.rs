use std::sync::Arc;

use crate::context::PrefixExpressionContext;
use crate::hotspot::{EscapePolicy, OnClose};
use crate::macros::ConstantMacro;
use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

/// `expr.tryparse` → `Integer.tryParse(expr, value)`
pub struct TryParseTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for TryParseTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "tryparse",
                "Parses string as value of some type",
                "Integer.tryParse(expr, value)",
            ),
        }
    }
}

/// Only values known to be strings; an unresolved type is not enough, even
/// while typing.
fn is_string_value(ctx: &PrefixExpressionContext) -> bool {
    !ctx.is_type_usage && ctx.ty.simple_name() == Some("String")
}

impl PostfixTemplate for TryParseTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let (idx, _) = query.contexts().find(|(_, ctx)| is_string_value(ctx))?;
        Some(TemplateProposal::single(
            &self.descriptor.name,
            idx,
            TargetKind::Expression,
        ))
    }

    fn create_behavior(&self, _proposal: &TemplateProposal, _query: &TemplateQuery<'_>) -> Behavior {
        Behavior::expression("$Type$.tryParse($0, $value$)")
            .default_for("Type", Arc::new(ConstantMacro::new("Integer")))
            .escape(EscapePolicy::LeaveTextAndCaret)
            .on_close(OnClose::new(|ctx| {
                let end = ctx.expansion.end();
                ctx.control.move_caret(end);
            }))
    }
}
