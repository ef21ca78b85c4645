//! Textual skeletons for synthesized code.
//!
//! A skeleton is host-language text with placeholders:
//! - `$0` is replaced with the text of the matched expression,
//! - `$END$` marks where the caret goes once the expansion is done,
//! - `$Name$` is a hotspot field whose initial text is `Name`.
//!
//! Statement skeletons keep the caret position as a sentinel statement in the
//! text, so the result still parses as a statement and the sentinel survives
//! until the text is in the document.

use nova_core::{TextRange, TextSize};
use nova_syntax::{parse_java, parse_java_expression_fragment, parse_java_statement_fragment};
use smol_str::SmolStr;

use crate::error::SkeletonError;

/// Placeholder statement marking the caret inside synthesized statements.
pub const CARET_SENTINEL: &str = "__postfix_caret__;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skeleton {
    /// Replaces the matched expression only, e.g. `!$0`.
    Expression(String),
    /// Replaces the enclosing statement, e.g. `return $0;`.
    Statement(String),
    /// Header of a compound statement, e.g. `if ($0)`. The body is added
    /// according to the braces setting.
    EmbeddedStatement(String),
}

impl Skeleton {
    pub fn is_statement(&self) -> bool {
        !matches!(self, Skeleton::Expression(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSkeleton {
    pub text: String,
    /// Field ranges relative to the start of `text`, in order of first use.
    pub fields: Vec<(SmolStr, Vec<TextRange>)>,
    /// `$END$` offset in expression skeletons. Statement skeletons carry
    /// [`CARET_SENTINEL`] in `text` instead.
    pub end: Option<TextSize>,
}

pub fn render(
    skeleton: &Skeleton,
    expression: &str,
    braces: bool,
) -> Result<RenderedSkeleton, SkeletonError> {
    let (template, statement) = match skeleton {
        Skeleton::Expression(text) => (text.clone(), false),
        Skeleton::Statement(text) => (text.clone(), true),
        Skeleton::EmbeddedStatement(header) if braces => (format!("{header} {{ $END$}}"), true),
        Skeleton::EmbeddedStatement(header) => (format!("{header} $END$"), true),
    };
    let rendered = substitute(&template, expression, statement)?;
    validate(&rendered.text, statement)?;
    Ok(rendered)
}

/// Renders a class member declaration, e.g. `private int $name$;`.
pub fn render_member(template: &str) -> Result<RenderedSkeleton, SkeletonError> {
    let rendered = substitute(template, "", false)?;
    let parse = parse_java(&format!("class __Member {{ {} }}", rendered.text));
    match parse.errors.first() {
        None => Ok(rendered),
        Some(error) => Err(SkeletonError::InvalidSyntax {
            text: rendered.text,
            message: error.message.clone(),
        }),
    }
}

fn substitute(
    template: &str,
    expression: &str,
    statement: bool,
) -> Result<RenderedSkeleton, SkeletonError> {
    let mut rendered = RenderedSkeleton {
        text: String::with_capacity(template.len() + expression.len()),
        fields: Vec::new(),
        end: None,
    };
    let mut rest = template;
    let mut consumed = 0;
    while let Some(dollar) = rest.find('$') {
        rendered.text.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        if let Some(tail) = after.strip_prefix('0') {
            rendered.text.push_str(expression);
            consumed += dollar + 2;
            rest = tail;
            continue;
        }
        let Some(close) = after.find('$') else {
            return Err(SkeletonError::UnterminatedPlaceholder(consumed + dollar));
        };
        let name = &after[..close];
        if name == "END" {
            if statement {
                rendered.text.push_str(CARET_SENTINEL);
            } else {
                rendered.end = Some(TextSize::of(rendered.text.as_str()));
            }
        } else {
            if name.is_empty() || !name.chars().all(nova_syntax::is_ident_continue) {
                return Err(SkeletonError::InvalidPlaceholder(name.to_string()));
            }
            let range = TextRange::at(TextSize::of(rendered.text.as_str()), TextSize::of(name));
            rendered.text.push_str(name);
            match rendered.fields.iter_mut().find(|(field, _)| field == name) {
                Some((_, ranges)) => ranges.push(range),
                None => rendered.fields.push((SmolStr::new(name), vec![range])),
            }
        }
        consumed += dollar + close + 2;
        rest = &after[close + 1..];
    }
    rendered.text.push_str(rest);
    Ok(rendered)
}

fn validate(text: &str, statement: bool) -> Result<(), SkeletonError> {
    let fragment = if statement {
        parse_java_statement_fragment(text, 0)
    } else {
        parse_java_expression_fragment(text, 0)
    };
    match fragment.parse.errors.first() {
        None => Ok(()),
        Some(error) => Err(SkeletonError::InvalidSyntax {
            text: text.to_string(),
            message: error.message.clone(),
        }),
    }
}
