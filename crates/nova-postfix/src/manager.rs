//! Entry points the editor shell calls into.
//!
//! Failures never escape from here: a resolution miss is
//! [`Outcome::NotApplicable`], a dismissed chooser is [`Outcome::Cancelled`]
//! and a rolled back expansion is [`Outcome::Aborted`].

use std::sync::Arc;

use lsp_types::{CompletionItem, CompletionItemKind, Documentation};
use parking_lot::RwLock;

use crate::chooser;
use crate::completion;
use crate::context::{self, PostfixContext, PrefixExpressionContext};
use crate::dispatch::dispatch;
use crate::document::TextControl;
use crate::hotspot::{Session, SessionGuards};
use crate::registry::TemplateRegistry;
use crate::rewrite::{expand, ExpansionResult};
use crate::semantics::{EmbeddedHost, NoEmbeddedHost, SemanticModel};
use crate::settings::PostfixSettings;
use crate::template::{DispatchMode, TemplateDescriptor, TemplateProposal, TemplateQuery};
use crate::ui::UiServices;

#[derive(Debug)]
pub enum Outcome {
    /// No marker, no context or no template; the document is untouched.
    NotApplicable,
    /// The user dismissed the expression chooser.
    Cancelled,
    /// The expansion was rolled back.
    Aborted,
    Expanded {
        expansion: ExpansionResult,
        /// Open when the expansion left fields to fill in.
        session: Option<Session>,
    },
}

impl Outcome {
    pub fn is_expanded(&self) -> bool {
        matches!(self, Outcome::Expanded { .. })
    }
}

pub struct PostfixTemplatesManager {
    registry: TemplateRegistry,
    settings: RwLock<PostfixSettings>,
    model: Arc<dyn SemanticModel>,
    host: Arc<dyn EmbeddedHost>,
    guards: SessionGuards,
}

impl PostfixTemplatesManager {
    pub fn new(model: Arc<dyn SemanticModel>) -> Self {
        Self {
            registry: TemplateRegistry::with_builtin_templates(),
            settings: RwLock::new(PostfixSettings::default()),
            model,
            host: Arc::new(NoEmbeddedHost),
            guards: SessionGuards::new(),
        }
    }

    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_settings(self, settings: PostfixSettings) -> Self {
        *self.settings.write() = settings;
        self
    }

    pub fn with_embedded_host(mut self, host: Arc<dyn EmbeddedHost>) -> Self {
        self.host = host;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn settings(&self) -> PostfixSettings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut PostfixSettings)) {
        f(&mut self.settings.write());
    }

    pub fn model(&self) -> &Arc<dyn SemanticModel> {
        &self.model
    }

    pub fn guards(&self) -> &SessionGuards {
        &self.guards
    }

    /// Contexts for the marker before the caret of `control`.
    pub fn resolve(&self, control: &TextControl) -> Option<PostfixContext> {
        let caret = control.caret();
        control.read(|doc| {
            context::resolve(
                doc.text(),
                caret,
                doc.version(),
                doc.source_map(),
                self.model.as_ref(),
            )
        })
    }

    /// Resolves and dispatches in one go. Only templates whose name starts
    /// with `filter` are asked; without a filter the typed marker is used.
    pub fn proposals(
        &self,
        control: &TextControl,
        filter: Option<&str>,
        mode: DispatchMode,
    ) -> Option<(PostfixContext, Vec<TemplateProposal>)> {
        let context = self.resolve(control)?;
        let settings = self.settings();
        let active = self.guards.active_template(control.id());
        let query = TemplateQuery {
            context: &context,
            mode,
            model: self.model.as_ref(),
            settings: &settings,
            active_session: active.as_deref(),
        };
        let filter = filter.unwrap_or(context.marker.name.as_str());
        let proposals = dispatch(&self.registry, filter, &query);
        Some((context, proposals))
    }

    /// Postfix items for the completion list at the caret of `control`.
    pub fn completion_items(&self, control: &TextControl) -> Vec<CompletionItem> {
        if !self.settings.read().show_postfix_items {
            return Vec::new();
        }
        let Some((_, proposals)) = self.proposals(control, None, DispatchMode::Soft) else {
            return Vec::new();
        };
        proposals
            .iter()
            .filter_map(|proposal| self.registry.get(&proposal.template))
            .map(|template| completion_item(template.descriptor()))
            .collect()
    }

    /// See [`completion::add_length_count_alias`].
    pub fn add_length_count_alias(&self, items: &mut Vec<CompletionItem>) -> bool {
        completion::add_length_count_alias(items, &self.settings.read())
    }

    /// See [`completion::type_parameter_item`].
    pub fn type_parameter_item(&self, control: &TextControl) -> Option<CompletionItem> {
        let caret = control.caret();
        let settings = self.settings();
        control.read(|doc| {
            completion::type_parameter_item(doc.text(), caret, self.model.as_ref(), &settings)
        })
    }

    /// See [`completion::accept_type_parameter`].
    pub fn accept_type_parameter(
        &self,
        control: &mut TextControl,
        item: &CompletionItem,
        accepted_with_space: bool,
    ) -> Option<Session> {
        completion::accept_type_parameter(
            control,
            item,
            accepted_with_space,
            Arc::clone(&self.model),
            &self.guards,
            &self.settings(),
        )
    }

    /// Expands the item the user picked from [`Self::completion_items`].
    pub fn accept(&self, control: &mut TextControl, item: &CompletionItem, ui: UiServices<'_>) -> Outcome {
        let name = item
            .data
            .as_ref()
            .and_then(|data| data.as_str())
            .unwrap_or(&item.label)
            .to_string();
        self.execute(control, &name, DispatchMode::Soft, ui)
    }

    /// Runs the template called `name` on the marker before the caret.
    pub fn execute(
        &self,
        control: &mut TextControl,
        name: &str,
        mode: DispatchMode,
        ui: UiServices<'_>,
    ) -> Outcome {
        let Some((context, proposals)) = self.proposals(control, Some(name), mode) else {
            return Outcome::NotApplicable;
        };
        let Some(proposal) = proposals.into_iter().find(|p| p.template == name) else {
            tracing::debug!(target = "nova.postfix", template = %name, "template not applicable");
            return Outcome::NotApplicable;
        };
        self.run(control, context, proposal, mode, ui)
    }

    /// Disambiguates, re-validates and expands `proposal`.
    pub(crate) fn run(
        &self,
        control: &mut TextControl,
        context: PostfixContext,
        proposal: TemplateProposal,
        mode: DispatchMode,
        ui: UiServices<'_>,
    ) -> Outcome {
        let Some(template) = self.registry.get(&proposal.template) else {
            return Outcome::NotApplicable;
        };
        let candidates: Vec<&PrefixExpressionContext> = proposal
            .contexts
            .iter()
            .filter_map(|idx| context.contexts.get(*idx))
            .collect();
        let Some(chosen) = chooser::choose(&candidates, &context.marker.name, ui.popup, ui.highlighter)
            .and_then(|choice| candidates.get(choice))
            .map(|ctx| ctx.range)
        else {
            return Outcome::Cancelled;
        };

        // The chooser hands control to the user; the document may have moved on.
        let context = if control.version() == context.version {
            context
        } else {
            tracing::debug!(
                target = "nova.postfix",
                from = context.version,
                to = control.version(),
                "document changed while choosing; resolving again"
            );
            match self.resolve(control) {
                Some(fresh) => fresh,
                None => return Outcome::NotApplicable,
            }
        };
        let Some(idx) = context.position_of(chosen) else {
            tracing::warn!(target = "nova.postfix", range = ?chosen, "chosen expression is gone");
            return Outcome::NotApplicable;
        };

        let PostfixContext {
            marker,
            anchor,
            mut contexts,
            version,
        } = context;
        let narrowed = PostfixContext {
            marker,
            anchor,
            contexts: vec![contexts.swap_remove(idx)],
            version,
        };

        let settings = self.settings();
        let active = self.guards.active_template(control.id());
        let query = TemplateQuery {
            context: &narrowed,
            mode,
            model: self.model.as_ref(),
            settings: &settings,
            active_session: active.as_deref(),
        };
        let Some(proposal) = template.try_propose(&query) else {
            tracing::debug!(
                target = "nova.postfix",
                template = %template.descriptor().name,
                "template no longer applies to the chosen expression"
            );
            return Outcome::NotApplicable;
        };
        let behavior = template.create_behavior(&proposal, &query);

        let expansion = match expand(
            control,
            &narrowed,
            &proposal,
            &behavior,
            &settings,
            self.host.as_ref(),
        ) {
            Ok(expansion) => expansion,
            Err(_) => return Outcome::Aborted,
        };

        let session = if expansion.fields.is_empty() {
            if let Some(range) = expansion.parameter_info {
                ui.parameter_info.show(range);
            }
            None
        } else {
            match Session::open(
                control,
                &expansion,
                Arc::clone(&self.model),
                &self.guards,
                settings.show_parameter_info,
            ) {
                Ok(session) => Some(session),
                Err(err) => {
                    tracing::warn!(target = "nova.postfix", error = %err, "failed to open hotspot session");
                    None
                }
            }
        };
        Outcome::Expanded { expansion, session }
    }
}

fn completion_item(descriptor: &TemplateDescriptor) -> CompletionItem {
    CompletionItem {
        label: descriptor.name.to_string(),
        kind: Some(CompletionItemKind::SNIPPET),
        detail: Some(descriptor.description.clone()),
        documentation: Some(Documentation::String(descriptor.example.clone())),
        data: Some(serde_json::Value::String(descriptor.name.to_string())),
        ..CompletionItem::default()
    }
}
