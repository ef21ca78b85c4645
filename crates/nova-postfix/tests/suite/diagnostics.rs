use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{field::Visit, Event, Level};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

use nova_postfix::{DispatchMode, NoUi, Outcome, SourceMap};

use crate::text_fixture::{control, manager, range_of};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    fields: HashMap<String, String>,
}

#[derive(Clone)]
struct CapturingLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CapturingLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(CapturedEvent {
                level: *event.metadata().level(),
                fields: visitor.fields,
            });
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = CapturingLayer {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().expect("events mutex poisoned").clone();
    (result, events)
}

fn messages(events: &[CapturedEvent], level: Level) -> Vec<String> {
    events
        .iter()
        .filter(|event| event.level == level)
        .filter(|event| event.fields.get("target").map(String::as_str) == Some("nova.postfix"))
        .filter_map(|event| event.fields.get("message").cloned())
        .collect()
}

#[test]
fn aborted_expansions_are_logged_as_errors() {
    let manager = manager();
    let mut control = control("class A { void m(boolean ok) { ok.if<|>; } }");
    let segment = range_of(&control.text(), "ok.if");
    control
        .document()
        .write()
        .set_source_map(SourceMap::Segments(vec![segment]));

    let (outcome, events) =
        capture(|| manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services()));

    assert!(matches!(outcome, Outcome::Aborted));
    assert_eq!(
        messages(&events, Level::ERROR),
        vec!["postfix expansion aborted".to_string()]
    );
    let error = events
        .iter()
        .find(|event| event.level == Level::ERROR)
        .expect("error event");
    assert_eq!(error.fields.get("template").map(String::as_str), Some("if"));
}

#[test]
fn successful_expansions_log_nothing_above_debug() {
    let manager = manager();
    let mut control = control("class A { void m(boolean ok) { ok.if<|> } }");

    let (outcome, events) =
        capture(|| manager.execute(&mut control, "if", DispatchMode::Soft, NoUi.services()));

    assert!(outcome.is_expanded());
    assert!(events
        .iter()
        .all(|event| event.level != Level::ERROR && event.level != Level::WARN));
    assert!(messages(&events, Level::DEBUG).contains(&"expanded postfix template".to_string()));
}
