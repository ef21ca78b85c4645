//! Declaring a method type parameter from an unresolved name in its signature.
//!
//! Typing `Foo get()` where `Foo` does not resolve offers `T`; accepting it
//! turns the signature into `<T> T get()` and links both occurrences in a
//! hotspot session so the name can be changed in one go.

use std::sync::Arc;

use lsp_types::{CompletionItem, CompletionItemKind};
use nova_core::{TextRange, TextSize};
use nova_syntax::{
    parse_java, significant_range, AstNode, MethodDeclaration, SyntaxKind, SyntaxNode,
    SyntaxToken,
};
use smol_str::SmolStr;

use crate::document::{DocumentError, TextControl};
use crate::hotspot::{EscapePolicy, HotspotField, Session, SessionGuards};
use crate::rewrite::ExpansionResult;
use crate::semantics::SemanticModel;
use crate::settings::PostfixSettings;

/// Template name the linked session is registered under.
pub const TYPE_PARAMETER_TEMPLATE: &str = "typeParameter";

struct Usage {
    token: SyntaxToken,
    method: MethodDeclaration,
}

/// The identifier ending at `caret`, when it is a simple type name in the
/// return type, a parameter type or a type parameter bound of a method.
fn find_usage(root: &SyntaxNode, caret: TextSize) -> Option<Usage> {
    let token = root.token_at_offset(caret).left_biased()?;
    if !token.kind().is_identifier_like() || token.text_range().end() != caret {
        return None;
    }
    let named = token.parent()?;
    if named.kind() != SyntaxKind::NamedType {
        return None;
    }
    let owner = named.ancestors().find(|node| {
        !matches!(
            node.kind(),
            SyntaxKind::NamedType | SyntaxKind::Type | SyntaxKind::TypeArguments | SyntaxKind::TypeArgument
        )
    })?;
    let method = match owner.kind() {
        SyntaxKind::MethodDeclaration => owner,
        SyntaxKind::Parameter => {
            let list = owner.parent().filter(|n| n.kind() == SyntaxKind::ParameterList)?;
            list.parent()?
        }
        SyntaxKind::TypeParameter => {
            let list = owner.parent().filter(|n| n.kind() == SyntaxKind::TypeParameters)?;
            list.parent()?
        }
        _ => return None,
    };
    let method = MethodDeclaration::cast(method)?;
    Some(Usage { token, method })
}

/// First of `T`, `T2`, `T3`, ... that does not already name a type at `scope`.
fn free_name(model: &dyn SemanticModel, scope: &SyntaxNode, limit: u32) -> Option<String> {
    (1..=limit)
        .map(|n| if n == 1 { "T".to_string() } else { format!("T{n}") })
        .find(|name| model.resolve_type_name(name, scope).is_none())
}

/// Completion item for a new type parameter at `caret`, if the name being
/// typed there is an unresolved type in a method signature.
pub fn type_parameter_item(
    text: &str,
    caret: TextSize,
    model: &dyn SemanticModel,
    settings: &PostfixSettings,
) -> Option<CompletionItem> {
    let parse = parse_java(text);
    let usage = find_usage(&parse.syntax(), caret)?;
    if model
        .resolve_type_name(usage.token.text(), usage.method.syntax())
        .is_some()
    {
        return None;
    }
    let Some(name) = free_name(model, usage.method.syntax(), settings.type_parameter_name_limit) else {
        tracing::debug!(
            target = "nova.postfix",
            limit = settings.type_parameter_name_limit,
            "no free type parameter name"
        );
        return None;
    };
    Some(CompletionItem {
        label: name.clone(),
        kind: Some(CompletionItemKind::TYPE_PARAMETER),
        detail: Some("type parameter".to_string()),
        data: Some(serde_json::json!({ "typeParameter": name })),
        ..CompletionItem::default()
    })
}

/// Applies `item` at the caret of `control`: the typed name is replaced and
/// the type parameter is declared on the method.
///
/// Unless the item was accepted with the space key, both occurrences are
/// linked in a session that restores the original signature on cancel.
pub fn accept_type_parameter(
    control: &mut TextControl,
    item: &CompletionItem,
    accepted_with_space: bool,
    model: Arc<dyn SemanticModel>,
    guards: &SessionGuards,
    settings: &PostfixSettings,
) -> Option<Session> {
    let name = item
        .data
        .as_ref()
        .and_then(|data| data.get("typeParameter"))
        .and_then(|name| name.as_str())
        .unwrap_or(&item.label)
        .to_string();
    let expansion = match declare(control, &name) {
        Ok(Some(expansion)) => expansion,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(target = "nova.postfix", error = %err, "failed to declare type parameter");
            return None;
        }
    };
    if accepted_with_space {
        return None;
    }
    match Session::open(control, &expansion, model, guards, settings.show_parameter_info) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(target = "nova.postfix", error = %err, "failed to open type parameter session");
            None
        }
    }
}

fn declare(control: &mut TextControl, name: &str) -> Result<Option<ExpansionResult>, DocumentError> {
    let caret = control.caret();
    let text = control.text();
    let version = control.version();
    let parse = parse_java(&text);
    let Some(usage) = find_usage(&parse.syntax(), caret) else {
        return Ok(None);
    };

    let usage_range = usage.token.text_range();
    let (declaration_at, declaration) = match usage.method.type_parameters() {
        Some(params) => {
            let Some(r_angle) = params.r_angle() else {
                return Ok(None);
            };
            (r_angle.text_range().start(), format!(", {name}"))
        }
        None => {
            let Some(return_type) = usage.method.return_type() else {
                return Ok(None);
            };
            (significant_range(return_type.syntax()).start(), format!("<{name}> "))
        }
    };
    let name_len = TextSize::of(name);
    let prefix = if declaration.starts_with('<') { 1 } else { 2 };
    let declared = TextRange::at(declaration_at + TextSize::from(prefix), name_len);
    let whole = TextRange::new(declaration_at, usage_range.end());

    control.transaction("declare type parameter", |tx| {
        if tx.version() != version {
            return Ok(None);
        }
        let original_text = tx.slice(whole).unwrap_or_default().to_string();
        // The usage comes after the declaration, so edit it first.
        tx.replace(usage_range, name)?;
        tx.replace(TextRange::empty(declaration_at), &declaration)?;

        let shift = TextSize::of(declaration.as_str());
        let usage = TextRange::at(usage_range.start() + shift, name_len);
        tx.set_caret(usage.end());
        let range = TextRange::new(whole.start(), usage.end());
        Ok(Some(ExpansionResult {
            template: SmolStr::new(TYPE_PARAMETER_TEMPLATE),
            range,
            text: tx.slice(range).unwrap_or_default().to_string(),
            original_text,
            fields: vec![HotspotField {
                name: SmolStr::new(name),
                ranges: vec![usage, declared],
                default: None,
            }],
            caret: usage.end(),
            escape: EscapePolicy::RestoreOriginalText,
            on_close: None,
            parameter_info: None,
        }))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::{Document, SurfaceId};
    use crate::hotspot::SessionState;
    use crate::local_semantics::LocalSemanticModel;

    fn caret_after(text: &str, needle: &str) -> TextSize {
        TextSize::from((text.find(needle).expect("needle present") + needle.len()) as u32)
    }

    #[test]
    fn offered_for_unresolved_return_type() {
        let text = "class A { Foo get() { return null; } }";
        let item = type_parameter_item(
            text,
            caret_after(text, "Foo"),
            &LocalSemanticModel::new(),
            &PostfixSettings::default(),
        )
        .expect("item offered");
        assert_eq!(item.label, "T");
        assert_eq!(item.kind, Some(CompletionItemKind::TYPE_PARAMETER));
    }

    #[test]
    fn not_offered_for_known_types_or_bodies() {
        let model = LocalSemanticModel::new();
        let settings = PostfixSettings::default();
        let text = "class A { String get() { Foo x; return null; } }";
        assert_eq!(type_parameter_item(text, caret_after(text, "String"), &model, &settings), None);
        assert_eq!(type_parameter_item(text, caret_after(text, "Foo"), &model, &settings), None);
    }

    #[test]
    fn skips_names_already_declared() {
        let text = "class A { <T> void put(T a, Foo b) {} }";
        let item = type_parameter_item(
            text,
            caret_after(text, "Foo"),
            &LocalSemanticModel::new(),
            &PostfixSettings::default(),
        )
        .expect("item offered");
        assert_eq!(item.label, "T2");
    }

    #[test]
    fn limit_bounds_the_search() {
        let text = "class A { <T> void put(T a, Foo b) {} }";
        let settings = PostfixSettings {
            type_parameter_name_limit: 1,
            ..PostfixSettings::default()
        };
        let item = type_parameter_item(
            text,
            caret_after(text, "Foo"),
            &LocalSemanticModel::new(),
            &settings,
        );
        assert_eq!(item, None);
    }

    #[test]
    fn accepting_declares_and_links() {
        let text = "class A { public Foo get() { return null; } }";
        let model: Arc<dyn SemanticModel> = Arc::new(LocalSemanticModel::new());
        let settings = PostfixSettings::default();
        let mut control = TextControl::new(SurfaceId(1), Document::shared(text));
        control.move_caret(caret_after(text, "Foo"));
        let item = type_parameter_item(text, control.caret(), model.as_ref(), &settings).unwrap();
        let guards = SessionGuards::new();

        let mut session =
            accept_type_parameter(&mut control, &item, false, model, &guards, &settings).unwrap();
        assert_eq!(control.text(), "class A { public <T> T get() { return null; } }");
        assert!(guards.is_guarded(SurfaceId(1)));

        session.type_text(&mut control, "Item").unwrap();
        assert_eq!(control.text(), "class A { public <Item> Item get() { return null; } }");

        assert_eq!(session.cancel(&mut control), SessionState::Cancelled);
        assert_eq!(control.text(), text);
        assert!(!guards.is_guarded(SurfaceId(1)));
    }

    #[test]
    fn space_accept_skips_the_session() {
        let text = "class A { void put(Foo value) {} }";
        let model: Arc<dyn SemanticModel> = Arc::new(LocalSemanticModel::new());
        let settings = PostfixSettings::default();
        let mut control = TextControl::new(SurfaceId(1), Document::shared(text));
        control.move_caret(caret_after(text, "Foo"));
        let item = type_parameter_item(text, control.caret(), model.as_ref(), &settings).unwrap();
        let guards = SessionGuards::new();

        let session = accept_type_parameter(&mut control, &item, true, model, &guards, &settings);
        assert!(session.is_none());
        assert_eq!(control.text(), "class A { <T> void put(T value) {} }");
        assert!(!guards.is_guarded(SurfaceId(1)));
    }
}
