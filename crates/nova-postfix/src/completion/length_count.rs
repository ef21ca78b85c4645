use lsp_types::{CompletionItem, CompletionItemKind, CompletionItemLabelDetails};

use crate::settings::PostfixSettings;

const LENGTH: &str = "Length";
const COUNT: &str = "Count";

fn is_size_member(item: &CompletionItem) -> bool {
    matches!(
        item.kind,
        Some(CompletionItemKind::PROPERTY) | Some(CompletionItemKind::FIELD)
    ) && item.detail.as_deref() == Some("int")
}

/// Offers `Count` where only `Length` exists and the other way around.
///
/// The alias is a copy of the real item that only differs in what the list
/// shows, so accepting it inserts exactly what the real item would. Returns
/// whether an alias was added.
pub fn add_length_count_alias(items: &mut Vec<CompletionItem>, settings: &PostfixSettings) -> bool {
    if !settings.show_length_count_items {
        return false;
    }
    let has = |name: &str| items.iter().any(|item| item.label == name);
    let (real, alias) = match (has(LENGTH), has(COUNT)) {
        (true, false) => (LENGTH, COUNT),
        (false, true) => (COUNT, LENGTH),
        _ => return false,
    };
    let Some(item) = items
        .iter()
        .find(|item| item.label == real && is_size_member(item))
    else {
        return false;
    };

    let mut aliased = item.clone();
    aliased.label = alias.to_string();
    aliased.filter_text = Some(alias.to_string());
    if aliased.insert_text.is_none() && aliased.text_edit.is_none() {
        aliased.insert_text = Some(real.to_string());
    }
    aliased.label_details = Some(CompletionItemLabelDetails {
        detail: None,
        description: Some(format!("→ {real}")),
    });
    tracing::trace!(target = "nova.postfix", real, alias, "added length/count alias");
    items.push(aliased);
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn member(label: &str, kind: CompletionItemKind, detail: &str) -> CompletionItem {
        CompletionItem {
            label: label.to_string(),
            kind: Some(kind),
            detail: Some(detail.to_string()),
            data: Some(serde_json::json!({ "member": label })),
            ..CompletionItem::default()
        }
    }

    #[test]
    fn count_is_offered_for_length() {
        let mut items = vec![
            member("Length", CompletionItemKind::PROPERTY, "int"),
            member("charAt", CompletionItemKind::METHOD, "char"),
        ];
        assert!(add_length_count_alias(&mut items, &PostfixSettings::default()));
        assert_eq!(items.len(), 3);

        let alias = &items[2];
        assert_eq!(alias.label, "Count");
        assert_eq!(alias.insert_text.as_deref(), Some("Length"));
        assert_eq!(alias.data, items[0].data);
    }

    #[test]
    fn nothing_is_added_when_both_exist() {
        let mut items = vec![
            member("Length", CompletionItemKind::PROPERTY, "int"),
            member("Count", CompletionItemKind::FIELD, "int"),
        ];
        assert!(!add_length_count_alias(&mut items, &PostfixSettings::default()));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn only_int_members_are_aliased() {
        let mut items = vec![member("Count", CompletionItemKind::METHOD, "int")];
        assert!(!add_length_count_alias(&mut items, &PostfixSettings::default()));

        let mut items = vec![member("Count", CompletionItemKind::FIELD, "long")];
        assert!(!add_length_count_alias(&mut items, &PostfixSettings::default()));
    }

    #[test]
    fn setting_turns_aliases_off() {
        let mut settings = PostfixSettings::default();
        settings.show_length_count_items = false;
        let mut items = vec![member("Count", CompletionItemKind::FIELD, "int")];
        assert!(!add_length_count_alias(&mut items, &settings));
    }
}
