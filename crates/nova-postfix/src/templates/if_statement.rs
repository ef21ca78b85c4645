use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::boolean_statement_context;

/// `cond.if` → `if (cond) { }`
pub struct IfStatementTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for IfStatementTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "if",
                "Checks boolean expression to be 'true'",
                "if (expr)",
            ),
        }
    }
}

impl PostfixTemplate for IfStatementTemplate {
    fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal> {
        let idx = boolean_statement_context(query)?;
        Some(TemplateProposal::single(
            &self.descriptor.name,
            idx,
            TargetKind::Expression,
        ))
    }

    fn create_behavior(&self, _proposal: &TemplateProposal, _query: &TemplateQuery<'_>) -> Behavior {
        Behavior::embedded_statement("if ($0)")
    }
}
