//! Asking every registered template whether it applies.

use crate::registry::TemplateRegistry;
use crate::template::{TemplateProposal, TemplateQuery};

/// Collects the proposals of all enabled templates whose name starts with
/// `marker` (ignoring case).
///
/// Templates are queried independently. The result keeps registry order for
/// proposals on the same context and otherwise runs innermost first.
pub fn dispatch(
    registry: &TemplateRegistry,
    marker: &str,
    query: &TemplateQuery<'_>,
) -> Vec<TemplateProposal> {
    let type_usage = query
        .context
        .innermost()
        .is_some_and(|ctx| ctx.is_type_usage);
    let marker = marker.to_lowercase();

    let mut proposals: Vec<TemplateProposal> = registry
        .iter()
        .filter(|template| {
            let descriptor = template.descriptor();
            query.settings.is_enabled(descriptor)
                && descriptor.name.to_lowercase().starts_with(&marker)
                && (!type_usage || descriptor.works_on_type_names)
        })
        .filter_map(|template| {
            let proposal = template.try_propose(query);
            tracing::trace!(
                target = "nova.postfix",
                template = %template.descriptor().name,
                mode = ?query.mode,
                applicable = proposal.is_some(),
                "queried postfix template"
            );
            proposal
        })
        .filter(|proposal| !proposal.contexts.is_empty())
        .collect();
    proposals.sort_by_key(|proposal| proposal.contexts.iter().min().copied());

    tracing::debug!(
        target = "nova.postfix",
        marker = %marker,
        mode = ?query.mode,
        proposals = proposals.len(),
        "dispatched postfix templates"
    );
    proposals
}
