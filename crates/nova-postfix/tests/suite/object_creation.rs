use pretty_assertions::assert_eq;

use nova_postfix::{DispatchMode, NoUi, Outcome, TargetKind};

use crate::text_fixture::{control, manager, with_caret};

#[test]
fn unresolved_type_name_gets_an_argument_list() {
    let manager = manager();
    let mut control = control("class A { void m() { Foo.new<|> } }");

    let outcome = manager.execute(&mut control, "new", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(with_caret(&control), "class A { void m() { new Foo(<|>) } }");
}

#[test]
fn default_constructor_puts_the_caret_after_the_call() {
    let manager = manager();
    let mut control = control("class Foo {} class A { void m() { Foo.new<|> } }");

    let outcome = manager.execute(&mut control, "new", DispatchMode::Precise, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class Foo {} class A { void m() { new Foo()<|> } }"
    );
}

#[test]
fn constructor_with_parameters_keeps_the_caret_inside() {
    let manager = manager();
    let mut control =
        control("class Foo { Foo(int size) {} } class A { void m() { Foo.new<|> } }");

    let outcome = manager.execute(&mut control, "new", DispatchMode::Precise, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class Foo { Foo(int size) {} } class A { void m() { new Foo(<|>) } }"
    );
}

#[test]
fn call_shaped_expression_becomes_a_creation() {
    let manager = manager();
    let mut control =
        control("class Foo { Foo(int size) {} } class A { void m() { Foo(1).new<|> } }");

    let Some((_, proposals)) = manager.proposals(&control, Some("new"), DispatchMode::Soft) else {
        panic!("expected a marker");
    };
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].target, TargetKind::Expression);

    let outcome = manager.execute(&mut control, "new", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class Foo { Foo(int size) {} } class A { void m() { new Foo(1)<|> } }"
    );
}

#[test]
fn precise_mode_skips_unresolved_names() {
    let manager = manager();
    let mut control = control("class A { void m() { Foo.new<|> } }");

    let outcome = manager.execute(&mut control, "new", DispatchMode::Precise, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
    assert_eq!(control.text(), "class A { void m() { Foo.new } }");
}

#[test]
fn static_only_and_interface_types_are_not_created_in_precise_mode() {
    let manager = manager();
    for fixture in [
        "class A { void m() { Math.new<|> } }",
        "class A { void m() { List.new<|> } }",
    ] {
        let mut control = control(fixture);
        let outcome = manager.execute(&mut control, "new", DispatchMode::Precise, NoUi.services());
        assert!(matches!(outcome, Outcome::NotApplicable), "{fixture}");
    }
}

#[test]
fn types_that_cannot_be_instantiated_are_skipped_in_soft_mode() {
    let manager = manager();
    for fixture in [
        "class A { void m() { List.new<|> } }",
        "abstract class Shape {} class A { void m() { Shape.new<|> } }",
        "class A { void m() { Math.new<|> } }",
    ] {
        let mut control = control(fixture);
        let outcome = manager.execute(&mut control, "new", DispatchMode::Soft, NoUi.services());
        assert!(matches!(outcome, Outcome::NotApplicable), "{fixture}");
        assert_eq!(control.version(), 0, "{fixture}");
    }
}

#[test]
fn lowercase_unresolved_names_are_left_alone() {
    let manager = manager();
    let mut control = control("class A { void m() { foo.new<|> } }");

    let outcome = manager.execute(&mut control, "new", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::NotApplicable));
}
