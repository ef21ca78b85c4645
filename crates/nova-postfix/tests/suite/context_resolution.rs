use nova_postfix::context::resolve;
use nova_postfix::{LocalSemanticModel, PostfixContext, SourceMap};
use pretty_assertions::assert_eq;

use crate::text_fixture::{control, extract_caret, manager};

const FIXTURES: &[&str] = &[
    "class A { void m(boolean flag, int a) { f(flag == a > 0.not<|>, b); } }",
    "class A { int size() { return 0; } void m() { x = size().return<|> } }",
    "class A { void m(String text) { text.length().arg<|> } }",
    "class A { void m(boolean ok) {\n    ok.<|>\n} }",
    "class Foo {} class A { void m() { Foo.new<|> } }",
    "class A { void m(Object o) { String s = o.cast<|>; } }",
];

fn resolve_fixture(fixture: &str) -> PostfixContext {
    let (text, caret) = extract_caret(fixture);
    resolve(&text, caret, 0, &SourceMap::Identity, &LocalSemanticModel::new())
        .expect("marker present")
}

fn summary(ctx: &PostfixContext) -> Vec<(String, nova_core::TextRange, bool)> {
    ctx.contexts
        .iter()
        .map(|c| (c.text.clone(), c.range, c.can_be_statement))
        .collect()
}

#[test]
fn resolution_is_repeatable() {
    for fixture in FIXTURES {
        let first = resolve_fixture(fixture);
        let second = resolve_fixture(fixture);
        assert_eq!(summary(&first), summary(&second), "{fixture}");
        assert_eq!(first.marker, second.marker, "{fixture}");
    }
}

#[test]
fn contexts_nest_and_end_at_the_anchor() {
    for fixture in FIXTURES {
        let (text, _) = extract_caret(fixture);
        let ctx = resolve_fixture(fixture);
        assert!(!ctx.contexts.is_empty(), "{fixture}");
        for pair in ctx.contexts.windows(2) {
            assert!(pair[1].range.contains_range(pair[0].range), "{fixture}");
            assert_ne!(pair[1].range, pair[0].range, "{fixture}");
        }
        for context in &ctx.contexts {
            assert_eq!(context.range.end(), ctx.anchor, "{fixture}");
            assert_eq!(context.range.end(), ctx.marker.range.start(), "{fixture}");
            let start = u32::from(context.range.start()) as usize;
            let end = u32::from(context.range.end()) as usize;
            assert_eq!(&text[start..end], context.text, "{fixture}");
        }
    }
}

#[test]
fn only_an_expression_statement_body_is_statement_eligible() {
    for fixture in FIXTURES {
        let ctx = resolve_fixture(fixture);
        let eligible = ctx.contexts.iter().filter(|c| c.can_be_statement).count();
        assert!(eligible <= 1, "{fixture}");
        if let Some(position) = ctx.contexts.iter().position(|c| c.can_be_statement) {
            assert_eq!(position, ctx.contexts.len() - 1, "{fixture}");
        }
    }
}

#[test]
fn resolving_through_the_manager_leaves_the_document_alone() {
    let manager = manager();
    let control = control(FIXTURES[0]);

    let ctx = manager.resolve(&control).expect("marker present");

    assert_eq!(ctx.version, 0);
    assert_eq!(ctx.marker.name, "not");
    assert_eq!(control.version(), 0);
    assert_eq!(control.read(|doc| doc.live_markers()), 0);
}

#[test]
fn no_marker_no_context() {
    let manager = manager();
    assert!(manager
        .resolve(&control("class A { void m(boolean ok) { ok<|> } }"))
        .is_none());
    assert!(manager
        .resolve(&control("class A { void m(boolean ok) { ok .if<|> } }"))
        .is_some());
}
