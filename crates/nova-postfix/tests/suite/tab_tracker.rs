use pretty_assertions::assert_eq;

use nova_postfix::{NoUi, Outcome, TabTracker};

use crate::text_fixture::{control, manager, with_caret};

#[test]
fn tab_expands_a_fully_typed_template() {
    let manager = manager();
    let tracker = TabTracker::new(&manager);
    let mut control = control("class A { void m(boolean ok) { ok.if<|> } }");

    let outcome = tracker.on_tab(&mut control, NoUi.services());

    assert!(outcome.is_some_and(|outcome| outcome.is_expanded()));
    assert_eq!(with_caret(&control), "class A { void m(boolean ok) { if (ok) { <|>} } }");
}

#[test]
fn tab_ignores_partial_names() {
    let manager = manager();
    let tracker = TabTracker::new(&manager);
    let mut control = control("class A { void m(boolean ok) { ok.i<|> } }");

    assert!(tracker.on_tab(&mut control, NoUi.services()).is_none());
    assert_eq!(control.version(), 0);
}

#[test]
fn tab_ignores_unknown_names_and_plain_text() {
    let manager = manager();
    let tracker = TabTracker::new(&manager);

    let mut unknown = control("class A { void m(boolean ok) { ok.iff<|> } }");
    assert!(tracker.on_tab(&mut unknown, NoUi.services()).is_none());

    let mut plain = control("class A { void m(boolean ok) { ok<|> } }");
    assert!(tracker.on_tab(&mut plain, NoUi.services()).is_none());
}

#[test]
fn tab_uses_precise_checks() {
    let manager = manager();
    let tracker = TabTracker::new(&manager);
    // `value` does not resolve, so only the soft heuristics would accept it.
    let mut control = control("class A { void m() { value.if<|> } }");

    assert!(tracker.on_tab(&mut control, NoUi.services()).is_none());
    assert_eq!(control.text(), "class A { void m() { value.if } }");
}

#[test]
fn tab_respects_disabled_templates() {
    let manager = manager();
    manager.update_settings(|settings| settings.set_template_enabled("if", false));
    let tracker = TabTracker::new(&manager);
    let mut control = control("class A { void m(boolean ok) { ok.if<|> } }");

    assert!(tracker.on_tab(&mut control, NoUi.services()).is_none());
}

#[test]
fn tab_leaves_open_sessions_alone() {
    let manager = manager();
    let tracker = TabTracker::new(&manager);
    let mut control = control("class A { void m(String foo) { foo.arg<|> } }");

    let Some(Outcome::Expanded {
        session: Some(session),
        ..
    }) = tracker.on_tab(&mut control, NoUi.services())
    else {
        panic!("expected an arg session");
    };
    assert!(session.is_active());

    control.type_text(".if").expect("type into document");
    assert!(tracker.on_tab(&mut control, NoUi.services()).is_none());

    drop(session);
    assert!(!manager.guards().is_guarded(control.id()));
}
