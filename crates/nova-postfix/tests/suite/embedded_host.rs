use std::sync::Arc;

use nova_core::{TextRange, TextSize};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use nova_postfix::document::{DocumentError, Transaction};
use nova_postfix::{
    DispatchMode, EmbeddedHost, NoUi, Outcome, SourceMap, StatementReplacement, TextControl,
};

use crate::text_fixture::{control, manager, range_of, with_caret};

/// Host that owns the statement terminator: it swallows a `;` right after the
/// operand along with it.
#[derive(Default)]
struct TerminatorHost {
    statements: Mutex<Vec<String>>,
}

impl EmbeddedHost for TerminatorHost {
    fn replace_statement(
        &self,
        tx: &mut Transaction<'_>,
        expression: TextRange,
        statement: &str,
    ) -> Result<Option<StatementReplacement>, DocumentError> {
        self.statements.lock().push(statement.to_string());
        let terminator = TextRange::at(expression.end(), TextSize::from(1));
        let range = if tx.slice(terminator) == Some(";") {
            expression.cover(terminator)
        } else {
            expression
        };
        let original_text = tx.slice(range).unwrap_or_default().to_string();
        tx.replace(range, statement)?;
        Ok(Some(StatementReplacement {
            range: TextRange::at(range.start(), TextSize::of(statement)),
            original_text,
        }))
    }
}

fn embedded(fixture: &str, physical: &str) -> TextControl {
    let control = control(fixture);
    let segment = range_of(&control.text(), physical);
    control
        .document()
        .write()
        .set_source_map(SourceMap::Segments(vec![segment]));
    control
}

const EMBEDDED: &str = "class A { void m(boolean ok) { ok.if<|>; } }";

#[test]
fn statements_outside_physical_code_go_through_the_host() {
    let host = Arc::new(TerminatorHost::default());
    let manager = manager().with_embedded_host(host.clone());
    let mut control = embedded(EMBEDDED, "ok.if");

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    let Outcome::Expanded { expansion, .. } = outcome else {
        panic!("expected an expansion");
    };
    assert_eq!(expansion.original_text, "ok.if;");
    assert_eq!(
        *host.statements.lock(),
        vec!["if (ok) { __postfix_caret__;}".to_string()]
    );
    assert_eq!(with_caret(&control), "class A { void m(boolean ok) { if (ok) { <|>} } }");
}

#[test]
fn without_a_host_the_expansion_is_rolled_back() {
    let manager = manager();
    let mut control = embedded(EMBEDDED, "ok.if");
    let caret = control.caret();

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    assert!(matches!(outcome, Outcome::Aborted));
    assert_eq!(control.text(), "class A { void m(boolean ok) { ok.if; } }");
    assert_eq!(control.version(), 0);
    assert_eq!(control.caret(), caret);
    assert_eq!(control.read(|doc| doc.live_markers()), 0);
}

#[test]
fn expression_templates_do_not_need_the_host() {
    let host = Arc::new(TerminatorHost::default());
    let manager = manager().with_embedded_host(host.clone());
    let mut control = embedded("class A { void m(boolean ok) { f(ok.not<|>); } }", "ok.not");

    let outcome = manager.execute(&mut control, "not", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert!(host.statements.lock().is_empty());
    assert_eq!(with_caret(&control), "class A { void m(boolean ok) { f(!ok<|>); } }");
}

#[test]
fn physical_statements_skip_the_host() {
    let host = Arc::new(TerminatorHost::default());
    let manager = manager().with_embedded_host(host.clone());
    let mut control = embedded(EMBEDDED, "ok.if;");

    let outcome = manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services());

    assert!(outcome.is_expanded());
    assert!(host.statements.lock().is_empty());
    assert_eq!(with_caret(&control), "class A { void m(boolean ok) { if (ok) { <|>} } }");
}
