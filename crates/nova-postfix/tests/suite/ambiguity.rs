use std::sync::Arc;

use nova_core::{TextEdit, TextSize};
use pretty_assertions::assert_eq;

use nova_postfix::{DispatchMode, Outcome};

use crate::text_fixture::{control, manager, range_of, with_caret, RecordingUi};

const AMBIGUOUS: &str = "class A { void m(boolean flag, int a) { f(flag == a > 0.not<|>, b); } }";

#[test]
fn chooser_lists_every_candidate_innermost_first() {
    let manager = manager();
    let ui = RecordingUi::choosing(Some(0));
    let mut control = control(AMBIGUOUS);

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, ui.services());

    assert!(outcome.is_expanded());
    assert_eq!(*ui.popup.captions.borrow(), vec!["Expressions".to_string()]);
    let shown = ui.popup.shown.borrow();
    let labels: Vec<&str> = shown[0].iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, vec!["a > 0", "flag == a > 0"]);
    assert_eq!(
        with_caret(&control),
        "class A { void m(boolean flag, int a) { f(flag == !(a > 0)<|>, b); } }"
    );
}

#[test]
fn choosing_the_outer_expression() {
    let manager = manager();
    let ui = RecordingUi::choosing(Some(1));
    let mut control = control(AMBIGUOUS);

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, ui.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { void m(boolean flag, int a) { f(!(flag == a > 0)<|>, b); } }"
    );
}

#[test]
fn selection_is_highlighted_and_cleared() {
    let manager = manager();
    let ui = RecordingUi::choosing(Some(0));
    let mut control = control(AMBIGUOUS);
    let text = control.text();

    manager.execute(&mut control, "not", DispatchMode::Soft, ui.services());

    assert_eq!(
        *ui.highlighter.calls.borrow(),
        vec![
            Some(range_of(&text, "a > 0")),
            Some(range_of(&text, "flag == a > 0")),
            None,
        ]
    );
}

#[test]
fn dismissing_the_chooser_cancels() {
    let manager = manager();
    let ui = RecordingUi::choosing(None);
    let mut control = control(AMBIGUOUS);
    let before = control.text();

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, ui.services());

    assert!(matches!(outcome, Outcome::Cancelled));
    assert_eq!(control.text(), before);
    assert_eq!(control.version(), 0);
    assert_eq!(ui.highlighter.calls.borrow().last(), Some(&None));
}

#[test]
fn edits_while_choosing_are_picked_up() {
    let manager = manager();
    let ui = RecordingUi::choosing(Some(0));
    let mut control = control(AMBIGUOUS);
    let document = Arc::clone(control.document());
    *ui.popup.before_choice.borrow_mut() = Some(Box::new(move || {
        let mut document = document.write();
        let end = TextSize::of(document.text());
        document
            .apply(&TextEdit::insert(end, "\n// edited"))
            .expect("append to document");
    }));

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, ui.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        control.text(),
        "class A { void m(boolean flag, int a) { f(flag == !(a > 0), b); } }\n// edited"
    );
}
