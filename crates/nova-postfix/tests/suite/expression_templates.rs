use pretty_assertions::assert_eq;

use nova_postfix::{DispatchMode, NoUi, Outcome, SessionState};

use crate::text_fixture::{control, manager, with_caret, RecordingUi};

#[test]
fn not_of_a_name_needs_no_parentheses() {
    let manager = manager();
    let mut control = control("class A { boolean m(boolean done) { return done.not<|>; } }");

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { boolean m(boolean done) { return !done<|>; } }"
    );
}

#[test]
fn not_of_a_comparison_is_parenthesized() {
    let manager = manager();
    let mut control = control("class A { boolean m(int a, int b) { return a == b.not<|>; } }");
    // Only the comparison is boolean, so no chooser is needed.
    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { boolean m(int a, int b) { return !(a == b)<|>; } }"
    );
}

#[test]
fn not_rejects_non_boolean_values() {
    let manager = manager();
    let mut control = control("class A { void m(int count) { f(count.not<|>); } }");

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
}

#[test]
fn cast_fills_in_the_expected_type() {
    let manager = manager();
    let ui = RecordingUi::default();
    let mut control = control("class A { void m(Object o) { String s = o.cast<|>; } }");

    let Outcome::Expanded {
        expansion,
        session: Some(mut session),
    } = manager.execute(&mut control, "cast", DispatchMode::Soft, ui.services())
    else {
        panic!("expected a session");
    };

    assert_eq!(expansion.text, "((T) o)");
    assert_eq!(
        with_caret(&control),
        "class A { void m(Object o) { String s = ((String<|>) o); } }"
    );

    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Completed);
    assert_eq!(
        with_caret(&control),
        "class A { void m(Object o) { String s = ((String) o)<|>; } }"
    );
}

#[test]
fn cast_leaves_the_text_when_cancelled() {
    let manager = manager();
    let mut control = control("class A { void m(Object o) { f(o.cast<|>); } }");

    let Outcome::Expanded {
        session: Some(mut session),
        ..
    } = manager.execute(&mut control, "cast", DispatchMode::Soft, NoUi.services())
    else {
        panic!("expected a session");
    };

    // No expected type for an argument, so the placeholder stays.
    assert_eq!(with_caret(&control), "class A { void m(Object o) { f(((T<|>) o)); } }");
    assert_eq!(session.cancel(&mut control), SessionState::Cancelled);
    assert_eq!(control.text(), "class A { void m(Object o) { f(((T) o)); } }");
    assert!(!manager.guards().is_guarded(control.id()));
}

#[test]
fn cast_is_a_soft_mode_template() {
    let manager = manager();
    let mut control = control("class A { void m(Object o) { String s = o.cast<|>; } }");

    let outcome = manager.execute(&mut control, "cast", DispatchMode::Precise, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
}

#[test]
fn tryparse_suggests_integer_and_then_the_out_value() {
    let manager = manager();
    let ui = RecordingUi::default();
    let mut control = control("class A { void m(String text) { f(text.tryparse<|>); } }");

    let Outcome::Expanded {
        expansion,
        session: Some(mut session),
    } = manager.execute(&mut control, "tryparse", DispatchMode::Soft, ui.services())
    else {
        panic!("expected a session");
    };

    assert_eq!(expansion.text, "Type.tryParse(text, value)");
    assert_eq!(
        with_caret(&control),
        "class A { void m(String text) { f(Integer<|>.tryParse(text, value)); } }"
    );

    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Active);
    session.type_text(&mut control, "parsed").unwrap();
    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Completed);
    assert_eq!(
        with_caret(&control),
        "class A { void m(String text) { f(Integer.tryParse(text, parsed)<|>); } }"
    );
}

#[test]
fn tryparse_needs_a_string() {
    let manager = manager();
    for mode in [DispatchMode::Soft, DispatchMode::Precise] {
        let mut control = control("class A { void m(int count) { f(count.tryparse<|>); } }");

        let outcome = manager.execute(&mut control, "tryparse", mode, NoUi.services());

        assert!(matches!(outcome, Outcome::NotApplicable), "{mode:?}");
        assert_eq!(control.version(), 0);
    }
}
