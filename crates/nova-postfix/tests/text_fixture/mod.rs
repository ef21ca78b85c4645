//! Shared fixtures for `nova-postfix` integration tests.
//!
//! Sources mark the caret with [`CARET`]; the recording UI fakes keep every
//! call so tests can assert on what the engine showed.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use nova_core::{TextRange, TextSize};
use nova_postfix::{
    Document, Highlighter, LocalSemanticModel, ParameterInfoPresenter, PopupItem, PopupMenu,
    PostfixTemplatesManager, SurfaceId, TextControl, UiServices,
};

pub const CARET: &str = "<|>";

/// Removes the caret marker from `fixture` and returns the text and offset.
pub fn extract_caret(fixture: &str) -> (String, TextSize) {
    let offset = fixture.find(CARET).expect("fixture must contain <|> caret marker");
    let text = fixture.replacen(CARET, "", 1);
    (text, TextSize::from(offset as u32))
}

/// A surface over a fresh document with the caret placed at [`CARET`].
pub fn control(fixture: &str) -> TextControl {
    control_on(SurfaceId(1), fixture)
}

pub fn control_on(surface: SurfaceId, fixture: &str) -> TextControl {
    let (text, caret) = extract_caret(fixture);
    let mut control = TextControl::new(surface, Document::shared(text));
    control.move_caret(caret);
    control
}

/// Renders the document of `control` with the caret marker put back in.
pub fn with_caret(control: &TextControl) -> String {
    let mut text = control.text();
    let caret = u32::from(control.caret()) as usize;
    text.insert_str(caret, CARET);
    text
}

pub fn manager() -> PostfixTemplatesManager {
    PostfixTemplatesManager::new(Arc::new(LocalSemanticModel::new()))
}

#[allow(dead_code)]
pub fn range_of(text: &str, needle: &str) -> TextRange {
    let start = text.find(needle).expect("needle present in text");
    TextRange::at(
        TextSize::from(start as u32),
        TextSize::from(needle.len() as u32),
    )
}

/// Popup that records what it was shown, walks the selection over every item
/// and then answers with a scripted choice.
#[derive(Default)]
pub struct RecordingPopup {
    pub choice: Cell<Option<usize>>,
    pub captions: RefCell<Vec<String>>,
    pub shown: RefCell<Vec<Vec<PopupItem>>>,
    /// Runs after the selection walk, before the choice is returned.
    #[allow(clippy::type_complexity)]
    pub before_choice: RefCell<Option<Box<dyn FnMut()>>>,
}

impl RecordingPopup {
    pub fn choosing(choice: Option<usize>) -> Self {
        let popup = Self::default();
        popup.choice.set(choice);
        popup
    }
}

impl PopupMenu for RecordingPopup {
    fn show(
        &self,
        caption: &str,
        items: &[PopupItem],
        on_selection_changed: &mut dyn FnMut(Option<usize>),
    ) -> Option<usize> {
        self.captions.borrow_mut().push(caption.to_string());
        self.shown.borrow_mut().push(items.to_vec());
        for idx in 0..items.len() {
            on_selection_changed(Some(idx));
        }
        if let Some(hook) = self.before_choice.borrow_mut().as_mut() {
            hook();
        }
        self.choice.get()
    }
}

#[derive(Default)]
pub struct RecordingHighlighter {
    pub calls: RefCell<Vec<Option<TextRange>>>,
}

impl Highlighter for RecordingHighlighter {
    fn highlight(&self, range: Option<TextRange>) {
        self.calls.borrow_mut().push(range);
    }
}

#[derive(Default)]
pub struct RecordingParameterInfo {
    pub shown: RefCell<Vec<TextRange>>,
    pub hidden: Cell<usize>,
}

impl ParameterInfoPresenter for RecordingParameterInfo {
    fn show(&self, range: TextRange) {
        self.shown.borrow_mut().push(range);
    }

    fn hide(&self) {
        self.hidden.set(self.hidden.get() + 1);
    }
}

/// All recording fakes of one surface.
#[derive(Default)]
pub struct RecordingUi {
    pub popup: RecordingPopup,
    pub highlighter: RecordingHighlighter,
    pub parameter_info: RecordingParameterInfo,
}

impl RecordingUi {
    pub fn choosing(choice: Option<usize>) -> Self {
        Self {
            popup: RecordingPopup::choosing(choice),
            ..Self::default()
        }
    }

    pub fn services(&self) -> UiServices<'_> {
        UiServices {
            popup: &self.popup,
            highlighter: &self.highlighter,
            parameter_info: &self.parameter_info,
        }
    }
}
