use crate::rewrite::Behavior;
use crate::template::{
    PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal, TemplateQuery,
};

use super::util::boolean_statement_context;

/// `cond.while` → `while (cond) { }`
pub struct WhileLoopTemplate {
    descriptor: TemplateDescriptor,
}

impl Default for WhileLoopTemplate {
    fn default() -> Self {
        Self {
            descriptor: TemplateDescriptor::new(
                "while",
                "Iterating while boolean statement is 'true'",
                "while (expr)",
            ),
        }
    }
}

impl PostfixTemplate for WhileLoopTemplate {
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
        Behavior::embedded_statement("while ($0)")
    }
}
