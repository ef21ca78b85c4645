//! Expanding a fully typed template name with the Tab key.

use crate::document::TextControl;
use crate::manager::{Outcome, PostfixTemplatesManager};
use crate::template::DispatchMode;
use crate::ui::UiServices;

/// Watches the trigger key on behalf of one manager.
#[derive(Clone, Copy)]
pub struct TabTracker<'a> {
    manager: &'a PostfixTemplatesManager,
}

impl<'a> TabTracker<'a> {
    pub fn new(manager: &'a PostfixTemplatesManager) -> Self {
        Self { manager }
    }

    /// Handles Tab at the caret of `control`.
    ///
    /// Returns `None` when the key is not ours, so the editor's own Tab action
    /// runs. That includes every surface with an open postfix session: there
    /// the key belongs to the session.
    pub fn on_tab(&self, control: &mut TextControl, ui: UiServices<'_>) -> Option<Outcome> {
        if self.manager.guards().is_guarded(control.id()) {
            tracing::trace!(target = "nova.postfix", surface = ?control.id(), "postfix session active; tab not handled");
            return None;
        }
        let (context, proposals) = self.manager.proposals(control, None, DispatchMode::Precise)?;
        let name = context.marker.name.clone();
        self.manager.registry().get(&name)?;

        let mut matching = proposals.into_iter().filter(|p| p.template == name);
        let proposal = matching.next()?;
        if matching.next().is_some() {
            return None;
        }
        tracing::debug!(target = "nova.postfix", template = %name, "expanding on tab");
        Some(
            self.manager
                .run(control, context, proposal, DispatchMode::Precise, ui),
        )
    }
}
