use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use nova_postfix::DispatchMode;

use crate::text_fixture::{control, manager};

const FIXTURES: &[&str] = &[
    "class A { void m(boolean ok) {\n    ok.<|>\n} }",
    "class A { void m(int a) { a > 0.<|> } }",
    "class A { int m(int count) { count.<|> } }",
    "class A { void m() { value.<|> } }",
    "class Foo {} class A { void m() { Foo.<|> } }",
    "class A { void m() { Bar.<|> } }",
    "class A { void m() { IllegalStateException.<|> } }",
    "class A { void m(RuntimeException ex) { ex.<|> } }",
    "class A { void m(Object o) { String s = o.<|>; } }",
    "class A { int size() { return 0; } int m() { x = size().<|> } }",
    "class A { void m(boolean flag, int a) { f(flag == a > 0.<|>, b); } }",
];

fn proposed(fixture: &str, mode: DispatchMode) -> BTreeSet<String> {
    let manager = manager();
    let control = control(fixture);
    let (_, proposals) = manager
        .proposals(&control, None, mode)
        .expect("marker present");
    proposals
        .into_iter()
        .map(|proposal| proposal.template.to_string())
        .collect()
}

#[test]
fn precise_proposals_are_a_subset_of_soft_ones() {
    for fixture in FIXTURES {
        let soft = proposed(fixture, DispatchMode::Soft);
        let precise = proposed(fixture, DispatchMode::Precise);
        // `arg` only ever runs on an explicit request.
        let extra: Vec<_> = precise
            .iter()
            .filter(|name| *name != "arg" && !soft.contains(*name))
            .collect();
        assert!(extra.is_empty(), "{fixture}: precise-only {extra:?}");
    }
}

#[test]
fn unresolved_names_only_get_soft_proposals() {
    let soft = proposed("class A { void m() { value.<|> } }", DispatchMode::Soft);
    let precise = proposed("class A { void m() { value.<|> } }", DispatchMode::Precise);

    assert!(soft.contains("throw"));
    assert!(soft.contains("cast"));
    // A bare name is not shaped like a condition.
    assert!(!soft.contains("if"));
    assert_eq!(precise, BTreeSet::from(["arg".to_string()]));
}

#[test]
fn dispatch_does_not_touch_the_document() {
    let manager = manager();
    for fixture in FIXTURES {
        let control = control(fixture);
        let before = control.text();
        for mode in [DispatchMode::Soft, DispatchMode::Precise] {
            manager.proposals(&control, None, mode);
        }
        assert_eq!(control.text(), before);
        assert_eq!(control.version(), 0);
    }
}
