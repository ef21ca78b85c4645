use std::sync::Arc;

use nova_core::{TextRange, TextSize};
use pretty_assertions::assert_eq;

use nova_postfix::{
    DispatchMode, Document, NoUi, Outcome, PostfixTemplatesManager, Session, SessionState,
    SurfaceId, TabTracker, TextControl,
};

use crate::text_fixture::{control, manager, range_of, with_caret, RecordingUi};

fn arg_session(control: &mut TextControl, manager: &PostfixTemplatesManager) -> Session {
    match TabTracker::new(manager).on_tab(control, NoUi.services()) {
        Some(Outcome::Expanded {
            session: Some(session),
            ..
        }) => session,
        other => panic!("expected an arg session, got {other:?}"),
    }
}

#[test]
fn arg_opens_a_session_on_the_method_name() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");

    let session = arg_session(&mut control, &manager);

    assert_eq!(with_caret(&control), "class A { void m(String foo) { Method<|>(foo) } }");
    assert_eq!(session.template(), "arg");
    let (name, range) = session.current_field(&control).expect("active field");
    assert_eq!(name, "Method");
    assert_eq!(range, range_of(&control.text(), "Method"));
    assert_eq!(
        manager.guards().active_template(control.id()).as_deref(),
        Some("arg")
    );
}

#[test]
fn unresolved_call_leaves_the_caret_after_the_argument() {
    let manager = manager();
    manager.update_settings(|settings| settings.show_parameter_info = true);
    let ui = RecordingUi::default();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let mut session = arg_session(&mut control, &manager);

    assert_eq!(session.type_text(&mut control, "pri").unwrap(), SessionState::Active);
    assert_eq!(session.type_text(&mut control, "nt").unwrap(), SessionState::Active);
    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Completed);

    assert_eq!(with_caret(&control), "class A { void m(String foo) { print(foo<|>) } }");
    assert_eq!(
        *ui.parameter_info.shown.borrow(),
        vec![range_of(&control.text(), "(foo)")]
    );
    assert!(!manager.guards().is_guarded(control.id()));
}

#[test]
fn resolved_call_moves_the_caret_past_the_parenthesis() {
    let manager = manager();
    let ui = RecordingUi::default();
    let mut control =
        control("class A { void print(String s) {} void m(String foo) { foo.arg<|> } }");
    let mut session = arg_session(&mut control, &manager);

    session.type_text(&mut control, "print").unwrap();
    assert_eq!(session.advance(&mut control, &ui.parameter_info), SessionState::Completed);

    assert_eq!(
        with_caret(&control),
        "class A { void print(String s) {} void m(String foo) { print(foo)<|> } }"
    );
    assert!(ui.parameter_info.shown.borrow().is_empty());
}

#[test]
fn cancelling_arg_restores_the_original_text() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let mut session = arg_session(&mut control, &manager);
    session.type_text(&mut control, "print").unwrap();

    assert_eq!(session.cancel(&mut control), SessionState::Cancelled);

    assert_eq!(with_caret(&control), "class A { void m(String foo) { foo.arg<|> } }");
    assert!(!session.is_active());
    assert!(!manager.guards().is_guarded(control.id()));
    assert_eq!(control.read(|doc| doc.live_markers()), 0);
}

#[test]
fn dropping_an_active_session_releases_its_markers() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let session = arg_session(&mut control, &manager);
    assert!(control.read(|doc| doc.live_markers()) > 0);

    drop(session);

    assert_eq!(control.read(|doc| doc.live_markers()), 0);
    assert!(!manager.guards().is_guarded(control.id()));
    control.type_text("x").expect("type into document");
    assert_eq!(control.text(), "class A { void m(String foo) { Method(foo)x } }");
}

#[test]
fn arg_does_not_nest_inside_its_own_session() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let _session = arg_session(&mut control, &manager);

    control.type_text(".arg").expect("type into document");
    let (_, proposals) = manager
        .proposals(&control, Some("arg"), DispatchMode::Precise)
        .expect("marker present");

    assert!(proposals.is_empty());
}

#[test]
fn sessions_are_tracked_per_surface() {
    let manager = manager();
    let mut first = control("class A { void m(String foo) { foo.arg<|> } }");
    let _session = arg_session(&mut first, &manager);

    let mut second = TextControl::new(
        SurfaceId(2),
        Document::shared("class B { void m(boolean ok) { ok.if } }"),
    );
    second.move_caret(TextSize::from(36));

    let outcome = TabTracker::new(&manager).on_tab(&mut second, NoUi.services());
    assert!(outcome.is_some_and(|outcome| outcome.is_expanded()));
    assert!(manager.guards().is_guarded(first.id()));
}

#[test]
fn overlapping_edit_from_another_surface_desynchronizes() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let mut session = arg_session(&mut control, &manager);

    let mut other = TextControl::new(SurfaceId(9), Arc::clone(control.document()));
    let method = range_of(&control.text(), "Method");
    let across = TextRange::new(
        method.start() - TextSize::from(2),
        method.start() + TextSize::from(3),
    );
    other.delete(across).expect("delete across the field start");
    let after_edit = control.text();

    assert_eq!(session.type_text(&mut control, "print").unwrap(), SessionState::Desynchronized);
    assert_eq!(control.text(), after_edit);
    assert_eq!(session.state(), SessionState::Desynchronized);
    assert!(!manager.guards().is_guarded(control.id()));
    assert_eq!(session.cancel(&mut control), SessionState::Desynchronized);
}

#[test]
fn edits_elsewhere_keep_the_session_alive() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");
    let mut session = arg_session(&mut control, &manager);

    let mut other = TextControl::new(SurfaceId(9), Arc::clone(control.document()));
    other
        .insert(TextSize::from(0), "// header\n")
        .expect("insert before the expansion");

    assert_eq!(session.type_text(&mut control, "print").unwrap(), SessionState::Active);
    assert_eq!(control.text(), "// header\nclass A { void m(String foo) { print(foo) } }");
}

#[test]
fn execute_reports_expansion_fields() {
    let manager = manager();
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");

    let Outcome::Expanded { expansion, session } =
        manager.execute(&mut control, "arg", DispatchMode::Precise, NoUi.services())
    else {
        panic!("expected an expansion");
    };

    assert!(session.is_some());
    assert_eq!(expansion.text, "Method(foo)");
    assert_eq!(expansion.fields.len(), 1);
    assert_eq!(expansion.fields[0].name, "Method");
    assert_eq!(expansion.fields[0].ranges, vec![range_of(&control.text(), "Method")]);
}
