//! Editor UI the engine talks to. Implementations live in the editor shell.

use nova_core::TextRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupItem {
    pub label: String,
    pub range: TextRange,
}

pub trait PopupMenu {
    /// Shows `items` and blocks until the user picks one (`Some(index)`) or
    /// dismisses the popup (`None`). `on_selection_changed` runs whenever the
    /// highlighted entry changes.
    fn show(
        &self,
        caption: &str,
        items: &[PopupItem],
        on_selection_changed: &mut dyn FnMut(Option<usize>),
    ) -> Option<usize>;
}

pub trait Highlighter {
    /// Highlights `range`, or clears the highlight for `None`.
    fn highlight(&self, range: Option<TextRange>);
}

pub trait ParameterInfoPresenter {
    fn show(&self, range: TextRange);
    fn hide(&self);
}

/// The UI collaborators of one editing surface.
#[derive(Clone, Copy)]
pub struct UiServices<'a> {
    pub popup: &'a dyn PopupMenu,
    pub highlighter: &'a dyn Highlighter,
    pub parameter_info: &'a dyn ParameterInfoPresenter,
}

/// UI for headless callers: popups are dismissed and nothing is shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUi;

impl PopupMenu for NoUi {
    fn show(
        &self,
        _caption: &str,
        _items: &[PopupItem],
        _on_selection_changed: &mut dyn FnMut(Option<usize>),
    ) -> Option<usize> {
        None
    }
}

impl Highlighter for NoUi {
    fn highlight(&self, _range: Option<TextRange>) {}
}

impl ParameterInfoPresenter for NoUi {
    fn show(&self, _range: TextRange) {}

    fn hide(&self) {}
}

impl NoUi {
    pub fn services(&self) -> UiServices<'_> {
        UiServices {
            popup: self,
            highlighter: self,
            parameter_info: self,
        }
    }
}
