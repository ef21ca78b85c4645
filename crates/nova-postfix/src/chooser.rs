//! Picking one expression when a template applies to several.

use crate::context::PrefixExpressionContext;
use crate::ui::{Highlighter, PopupItem, PopupMenu};

/// Longest expression text shown in the chooser, in characters.
pub const PRESENTATION_LIMIT: usize = 30;

/// Chooser label for an expression: the postfix marker is dropped, lines are
/// joined and long text is cut off with an ellipsis.
pub fn present_expression(text: &str, marker: &str) -> String {
    let mut text = text;
    let suffix = format!(".{marker}");
    if let Some(split) = text.len().checked_sub(suffix.len()) {
        if text.is_char_boundary(split) && text[split..].eq_ignore_ascii_case(&suffix) {
            text = &text[..split];
        }
    }

    let joined = text
        .trim_end()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.chars().count() <= PRESENTATION_LIMIT {
        return joined;
    }
    let mut truncated: String = joined.chars().take(PRESENTATION_LIMIT).collect();
    truncated.push('…');
    truncated
}

/// Clears the highlight however the chooser is left.
struct HighlightGuard<'a>(&'a dyn Highlighter);

impl Drop for HighlightGuard<'_> {
    fn drop(&mut self) {
        self.0.highlight(None);
    }
}

/// Lets the user pick one of `contexts`. Returns its position in `contexts`,
/// or `None` if the popup was dismissed.
///
/// A single candidate is picked without showing anything.
pub fn choose(
    contexts: &[&PrefixExpressionContext],
    marker: &str,
    popup: &dyn PopupMenu,
    highlighter: &dyn Highlighter,
) -> Option<usize> {
    match contexts.len() {
        0 => return None,
        1 => return Some(0),
        _ => {}
    }

    let items: Vec<PopupItem> = contexts
        .iter()
        .map(|ctx| PopupItem {
            label: present_expression(&ctx.text, marker),
            range: ctx.range,
        })
        .collect();

    let _guard = HighlightGuard(highlighter);
    let mut on_selection_changed = |selected: Option<usize>| {
        highlighter.highlight(selected.and_then(|idx| items.get(idx)).map(|item| item.range));
    };
    let choice = popup
        .show("Expressions", &items, &mut on_selection_changed)
        .filter(|idx| *idx < items.len());
    tracing::debug!(target = "nova.postfix", candidates = items.len(), choice = ?choice, "expression chooser closed");
    choice
}
