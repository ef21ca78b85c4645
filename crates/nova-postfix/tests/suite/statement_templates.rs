use nova_core::TextRange;
use pretty_assertions::assert_eq;

use nova_postfix::{DispatchMode, NoUi, Outcome, SessionState};

use crate::text_fixture::{control, manager, with_caret, RecordingUi};

#[test]
fn if_statement_wraps_the_expression_in_braces() {
    let manager = manager();
    let mut control = control("class A { void m(boolean list) {\n    list.if<|>\n} }");

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { void m(boolean list) {\n    if (list) { <|>}\n} }"
    );
}

#[test]
fn if_statement_without_braces_trims_the_trailing_space() {
    let manager = manager();
    manager.update_settings(|settings| settings.braces_for_embedded_statements = false);
    let mut control = control("class A { void m(boolean list) {\n    list.if<|>\n} }");

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { void m(boolean list) {\n    if (list)<|>\n} }"
    );
}

#[test]
fn while_loop_reports_its_expansion() {
    let manager = manager();
    let mut control = control("class A { void m(int a) { a > 0.while<|> } }");

    let Outcome::Expanded { expansion, session } =
        manager.execute(&mut control, "while", DispatchMode::Soft, NoUi.services())
    else {
        panic!("expected an expansion");
    };

    assert!(session.is_none());
    assert_eq!(expansion.template, "while");
    assert_eq!(expansion.text, "while (a > 0) { }");
    assert_eq!(expansion.original_text, "a > 0.while");
    assert_eq!(with_caret(&control), "class A { void m(int a) { while (a > 0) { <|>} } }");
}

#[test]
fn return_in_precise_mode_checks_the_return_type() {
    let manager = manager();
    let mut control = control("class A { int m(int count) { count.return<|> } }");

    let outcome = manager.execute(&mut control, "return", DispatchMode::Precise, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(with_caret(&control), "class A { int m(int count) { return count;<|> } }");
}

#[test]
fn return_is_not_offered_in_void_methods() {
    let manager = manager();
    let mut control = control("class A { void m(int count) { count.return<|> } }");

    let outcome = manager.execute(&mut control, "return", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
    assert_eq!(control.version(), 0);
}

#[test]
fn throw_of_an_exception_value() {
    let manager = manager();
    let mut control = control("class A { void m(RuntimeException ex) { ex.throw<|> } }");

    let outcome = manager.execute(&mut control, "throw", DispatchMode::Precise, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { void m(RuntimeException ex) { throw ex;<|> } }"
    );
}

#[test]
fn throw_of_an_exception_type_leaves_the_caret_in_the_arguments() {
    let manager = manager();
    manager.update_settings(|settings| settings.show_parameter_info = true);
    let ui = RecordingUi::default();
    let mut control = control("class A { void m() { IllegalStateException.throw<|> } }");

    let Outcome::Expanded { expansion, .. } =
        manager.execute(&mut control, "throw", DispatchMode::Precise, ui.services())
    else {
        panic!("expected an expansion");
    };

    assert_eq!(
        with_caret(&control),
        "class A { void m() { throw new IllegalStateException(<|>); } }"
    );
    assert_eq!(expansion.parameter_info, Some(TextRange::empty(control.caret())));
    assert_eq!(*ui.parameter_info.shown.borrow(), vec![TextRange::empty(control.caret())]);
}

#[test]
fn throw_rejects_values_that_are_not_throwable() {
    let manager = manager();
    let mut control = control("class A { void m(String text) { text.throw<|> } }");

    let outcome = manager.execute(&mut control, "throw", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
}

#[test]
fn statement_templates_need_statement_position() {
    let manager = manager();
    let mut control = control("class A { void m(boolean ok) { f(ok.if<|>); } }");

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
    assert_eq!(control.text(), "class A { void m(boolean ok) { f(ok.if); } }");
}

#[test]
fn parameter_info_stays_hidden_by_default() {
    let manager = manager();
    let ui = RecordingUi::default();
    let mut control = control("class A { void m() { IllegalStateException.throw<|> } }");

    let Outcome::Expanded { expansion, .. } =
        manager.execute(&mut control, "throw", DispatchMode::Precise, ui.services())
    else {
        panic!("expected an expansion");
    };

    assert_eq!(expansion.parameter_info, None);
    assert!(ui.parameter_info.shown.borrow().is_empty());
}

#[test]
fn field_declares_the_member_next_to_existing_fields() {
    let manager = manager();
    let ui = RecordingUi::default();
    let mut control =
        control("class A { Object o; void m(Exception e) { e.getMessage().field<|> } }");

    let Outcome::Expanded {
        expansion,
        session: Some(mut session),
    } = manager.execute(&mut control, "field", DispatchMode::Precise, ui.services())
    else {
        panic!("expected a session");
    };

    assert_eq!(
        expansion.text,
        " private String name; void m(Exception e) { this.name = e.getMessage();"
    );
    assert_eq!(
        expansion.original_text,
        " void m(Exception e) { e.getMessage().field"
    );
    // The suggested name fills the declaration and the assignment together.
    assert_eq!(
        with_caret(&control),
        "class A { Object o; private String message; void m(Exception e) { this.message<|> = e.getMessage(); } }"
    );

    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Completed);
    assert_eq!(
        with_caret(&control),
        "class A { Object o; private String message; void m(Exception e) { this.message = e.getMessage();<|> } }"
    );
}

#[test]
fn field_in_a_static_method_is_static() {
    let manager = manager();
    let mut control = control(
        "class A {\n    int count;\n\n    static void m(String text) {\n        text.length().field<|>\n    }\n}",
    );

    let outcome = manager.execute(&mut control, "field", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A {\n    private static int length;\n    int count;\n\n    static void m(String text) {\n        length<|> = text.length();\n    }\n}"
    );
}

#[test]
fn field_falls_back_to_object_only_in_soft_mode() {
    let manager = manager();
    let fixture = "class A { void m() { value.field<|> } }";

    let mut precise = control(fixture);
    let outcome = manager.execute(&mut precise, "field", DispatchMode::Precise, NoUi.services());
    assert!(matches!(outcome, Outcome::NotApplicable));

    let mut soft = control(fixture);
    let outcome = manager.execute(&mut soft, "field", DispatchMode::Soft, NoUi.services());
    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&soft),
        "class A { private Object value; void m() { this.value<|> = value; } }"
    );
}

#[test]
fn field_skips_assignments() {
    let manager = manager();
    let mut control = control("class A { void m(int a) { a = 1.field<|> } }");

    let outcome = manager.execute(&mut control, "field", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
    assert_eq!(control.version(), 0);
}
