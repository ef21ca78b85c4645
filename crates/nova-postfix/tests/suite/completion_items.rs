use lsp_types::{CompletionItem, CompletionItemKind};
use pretty_assertions::assert_eq;

use nova_postfix::{NoUi, PostfixSettings, SessionState};

use crate::text_fixture::{control, manager, with_caret};

fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

#[test]
fn empty_marker_lists_every_applicable_template() {
    let manager = manager();
    let control = control("class A { void m(boolean ok) {\n    ok.<|>\n} }");

    let items = manager.completion_items(&control);

    assert_eq!(labels(&items), vec!["if", "while", "not", "cast", "field"]);
    assert!(items.iter().all(|item| item.kind == Some(CompletionItemKind::SNIPPET)));
}

#[test]
fn precise_only_templates_stay_out_of_the_list() {
    let manager = manager();
    let control = control("class A { void m(String foo) { foo.ar<|> } }");

    assert!(manager.completion_items(&control).is_empty());
}

#[test]
fn settings_from_toml_drive_the_list() {
    let settings = PostfixSettings::from_toml_str("[templates]\nwhile = false\ncast = false\n")
        .expect("valid settings");
    let manager = manager().with_settings(settings);
    let control = control("class A { void m(boolean ok) {\n    ok.<|>\n} }");

    assert_eq!(labels(&manager.completion_items(&control)), vec!["if", "not", "field"]);
}

#[test]
fn accepting_a_listed_item_uses_its_template() {
    let manager = manager();
    let mut control = control("class A { void m(boolean ok) {\n    ok.wh<|>\n} }");
    let items = manager.completion_items(&control);
    assert_eq!(labels(&items), vec!["while"]);

    let outcome = manager.accept(&mut control, &items[0], NoUi.services());

    assert!(outcome.is_expanded());
    assert_eq!(
        with_caret(&control),
        "class A { void m(boolean ok) {\n    while (ok) { <|>}\n} }"
    );
}

fn member(label: &str, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        detail: Some("int".to_string()),
        ..CompletionItem::default()
    }
}

#[test]
fn count_alias_for_length() {
    let manager = manager();
    let mut items = vec![
        member("Length", CompletionItemKind::PROPERTY),
        member("Clone", CompletionItemKind::METHOD),
    ];

    assert!(manager.add_length_count_alias(&mut items));

    assert_eq!(labels(&items), vec!["Length", "Clone", "Count"]);
    let alias = &items[2];
    assert_eq!(alias.insert_text.as_deref(), Some("Length"));
    assert_eq!(alias.filter_text.as_deref(), Some("Count"));
}

#[test]
fn no_alias_when_both_exist_or_the_setting_is_off() {
    let manager = manager();
    let mut both = vec![
        member("Length", CompletionItemKind::PROPERTY),
        member("Count", CompletionItemKind::FIELD),
    ];
    assert!(!manager.add_length_count_alias(&mut both));
    assert_eq!(both.len(), 2);

    manager.update_settings(|settings| settings.show_length_count_items = false);
    let mut only_length = vec![member("Length", CompletionItemKind::PROPERTY)];
    assert!(!manager.add_length_count_alias(&mut only_length));
    assert_eq!(only_length.len(), 1);
}

#[test]
fn type_parameter_for_an_unresolved_parameter_type() {
    let manager = manager();
    let mut control = control("class A { void put(Key<|> key, String value) {} }");

    let item = manager.type_parameter_item(&control).expect("type parameter offered");
    assert_eq!(item.label, "T");
    assert_eq!(item.kind, Some(CompletionItemKind::TYPE_PARAMETER));

    let mut session = manager
        .accept_type_parameter(&mut control, &item, false)
        .expect("linked session");
    assert_eq!(
        with_caret(&control),
        "class A { <T> void put(T<|> key, String value) {} }"
    );

    session.type_text(&mut control, "K").unwrap();
    assert_eq!(session.advance(&mut control, &NoUi), SessionState::Completed);
    assert_eq!(control.text(), "class A { <K> void put(K key, String value) {} }");
    assert!(!manager.guards().is_guarded(control.id()));
}

#[test]
fn type_parameter_joins_an_existing_list() {
    let manager = manager();
    let mut control = control("class A { <T> T convert(Source<|> value) { return null; } }");

    let item = manager.type_parameter_item(&control).expect("type parameter offered");
    assert_eq!(item.label, "T2");

    let session = manager.accept_type_parameter(&mut control, &item, true);
    assert!(session.is_none());
    assert_eq!(
        control.text(),
        "class A { <T, T2> T convert(T2 value) { return null; } }"
    );
}
