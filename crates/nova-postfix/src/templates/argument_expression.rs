use nova_syntax::{parse_java, significant_range, AstNode, MethodCallExpression};

use crate::hotspot::{CloseContext, EscapePolicy, OnClose};
use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

/// `expr.arg` → `Method(expr)`
pub struct ArgumentExpressionTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for ArgumentExpressionTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "arg",
                "Surrounds expression with invocation",
                "Method(expr)",
            ),
        }
    }
}

impl PostfixTemplate for ArgumentExpressionTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        if !query.is_precise() {
            return None;
        }
        // Typing `.arg` inside the method name of a running `arg` session
        // would otherwise nest a second one.
        if query.active_session == Some(self.descriptor.name.as_str()) {
            return None;
        }
        let (idx, _) = query.contexts().rev().find(|(_, ctx)| !ctx.is_type_usage)?;
        Some(TemplateProposal::single(
            &self.descriptor.name,
            idx,
            TargetKind::Expression,
        ))
    }

    fn create_behavior(&self, _proposal: &TemplateProposal, _query: &TemplateQuery<'_>) -> Behavior {
        Behavior::expression("$Method$($0)")
            .escape(EscapePolicy::RestoreOriginalText)
            .on_close(OnClose::new(place_caret_after_call))
    }
}

/// Puts the caret after the call when it resolves, otherwise right after the
/// argument so the user can keep typing the real method name's arguments.
fn place_caret_after_call(ctx: &mut CloseContext<'_>) {
    let text = ctx.control.text();
    let parse = parse_java(&text);
    let call = parse
        .syntax()
        .descendants()
        .filter_map(MethodCallExpression::cast)
        .find(|call| significant_range(call.syntax()) == ctx.expansion);
    let Some(call) = call else {
        ctx.control.move_caret(ctx.expansion.end());
        return;
    };
    let Some(arguments) = call.argument_list() else {
        ctx.control.move_caret(ctx.expansion.end());
        return;
    };

    let caret = if ctx.model.resolves_invocation(&call) {
        ctx.expansion.end()
    } else {
        arguments
            .arguments()
            .last()
            .map(|arg| significant_range(arg.syntax()).end())
            .unwrap_or(ctx.expansion.end())
    };
    ctx.control.move_caret(caret);
    if ctx.show_parameter_info {
        ctx.parameter_info.show(significant_range(arguments.syntax()));
    }
}
