//! The expansion transaction.
//!
//! [`expand`] renders the template's skeleton, validates it, and then writes
//! it into the document inside a single [`TextControl::transaction`]: either
//! the expression (or its enclosing statement) is replaced, any member the
//! template declares is added to the enclosing class, and the caret placed,
//! or the document is left exactly as it was.

use std::sync::Arc;

use nova_core::{text, TextRange, TextSize};
use nova_syntax::{parse_java, significant_range, AstNode, ClassDeclaration, SyntaxKind};
use smol_str::SmolStr;

use crate::context::PostfixContext;
use crate::document::{DocumentError, MarkerId, TextControl, Transaction};
use crate::error::ExpandError;
use crate::hotspot::{EscapePolicy, HotspotField, HotspotMacro, OnClose};
use crate::semantics::EmbeddedHost;
use crate::settings::PostfixSettings;
use crate::skeleton::{self, Skeleton, CARET_SENTINEL};
use crate::template::TemplateProposal;

/// Where the caret goes when the skeleton has no `$END$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPlacement {
    End,
    /// Inside the last pair of parentheses, for constructor arguments.
    BeforeClosingParen,
}

/// A class member declared next to the rewritten statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeclaration {
    /// Member skeleton, e.g. `private int $name$;`. Fields are linked with
    /// the fields of the statement skeleton by name.
    pub skeleton: String,
    /// Goes after the last field with the same staticness.
    pub is_static: bool,
}

/// How a template rewrites the code it matched.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub skeleton: Skeleton,
    pub caret: CaretPlacement,
    pub escape: EscapePolicy,
    /// Defaults for the `$Name$` fields of the skeleton.
    pub defaults: Vec<(SmolStr, Arc<dyn HotspotMacro>)>,
    pub on_close: Option<OnClose>,
    /// Offer parameter info when the caret ends up inside an argument list.
    pub parameter_info: bool,
    pub member: Option<MemberDeclaration>,
}

impl Behavior {
    fn with_skeleton(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            caret: CaretPlacement::End,
            escape: EscapePolicy::LeaveTextAndCaret,
            defaults: Vec::new(),
            on_close: None,
            parameter_info: false,
            member: None,
        }
    }

    pub fn expression(skeleton: impl Into<String>) -> Self {
        Self::with_skeleton(Skeleton::Expression(skeleton.into()))
    }

    pub fn statement(skeleton: impl Into<String>) -> Self {
        Self::with_skeleton(Skeleton::Statement(skeleton.into()))
    }

    pub fn embedded_statement(header: impl Into<String>) -> Self {
        Self::with_skeleton(Skeleton::EmbeddedStatement(header.into()))
    }

    pub fn caret(mut self, caret: CaretPlacement) -> Self {
        self.caret = caret;
        self
    }

    pub fn escape(mut self, escape: EscapePolicy) -> Self {
        self.escape = escape;
        self
    }

    pub fn default_for(mut self, field: &str, value: Arc<dyn HotspotMacro>) -> Self {
        self.defaults.push((SmolStr::new(field), value));
        self
    }

    pub fn on_close(mut self, on_close: OnClose) -> Self {
        self.on_close = Some(on_close);
        self
    }

    pub fn with_parameter_info(mut self) -> Self {
        self.parameter_info = true;
        self
    }

    pub fn declare_member(mut self, skeleton: impl Into<String>, is_static: bool) -> Self {
        self.member = Some(MemberDeclaration {
            skeleton: skeleton.into(),
            is_static,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExpansionResult {
    pub template: SmolStr,
    /// Document range of the synthesized code.
    pub range: TextRange,
    pub text: String,
    /// Text the expansion replaced, marker included.
    pub original_text: String,
    pub fields: Vec<HotspotField>,
    pub caret: TextSize,
    pub escape: EscapePolicy,
    pub on_close: Option<OnClose>,
    /// The caret was left inside an argument list and the template asked for
    /// parameter info there.
    pub parameter_info: Option<TextRange>,
}

/// Applies `behavior` to the first context of `proposal`.
pub fn expand(
    control: &mut TextControl,
    context: &PostfixContext,
    proposal: &TemplateProposal,
    behavior: &Behavior,
    settings: &PostfixSettings,
    host: &dyn EmbeddedHost,
) -> Result<ExpansionResult, ExpandError> {
    let target = proposal
        .contexts
        .first()
        .and_then(|idx| context.contexts.get(*idx))
        .ok_or_else(|| ExpandError::InvalidState("proposal has no context".into()))?;

    // Everything that can fail without touching the document happens first.
    let rendered = skeleton::render(
        &behavior.skeleton,
        &target.text,
        settings.braces_for_embedded_statements,
    )
    .map_err(|source| ExpandError::Construction {
        template: proposal.template.clone(),
        source,
    })?;
    let member = behavior
        .member
        .as_ref()
        .map(|member| {
            skeleton::render_member(&member.skeleton).map(|rendered| (rendered, member.is_static))
        })
        .transpose()
        .map_err(|source| ExpandError::Construction {
            template: proposal.template.clone(),
            source,
        })?;
    let is_statement = behavior.skeleton.is_statement();
    if is_statement && !target.can_be_statement {
        return Err(ExpandError::InvalidState(format!(
            "`{}` is not in statement position",
            target.text
        )));
    }
    let expression_range = target.range.cover(context.marker.range);
    let physical = if is_statement {
        target
            .statement_range
            .map(|range| range.cover(context.marker.range))
    } else {
        Some(expression_range)
    };
    if member.is_some() && physical.is_none() {
        return Err(ExpandError::InvalidState(format!(
            "`{}` declares a member outside physical code",
            proposal.template
        )));
    }

    let result = control.transaction("postfix expansion", |tx| {
        if tx.version() != context.version {
            return Err(ExpandError::InvalidState(format!(
                "document changed from version {} to {}",
                context.version,
                tx.version()
            )));
        }
        if tx.slice(target.range) != Some(target.text.as_str()) {
            return Err(ExpandError::InvalidState(format!(
                "`{}` is no longer at {:?}",
                target.text, target.range
            )));
        }

        // Worked out on the text as it was; the anchor follows the rewrite.
        let before = member.as_ref().map(|_| tx.text().to_string());
        let member_anchor = match &member {
            Some((rendered, is_static)) => {
                let (offset, separator) =
                    member_placement(tx.text(), expression_range.start(), *is_static).ok_or_else(|| {
                        ExpandError::InvalidState(format!("`{}` is not inside a class body", target.text))
                    })?;
                let anchor = tx.create_marker(TextRange::empty(offset))?;
                Some((anchor, offset, separator, rendered))
            }
            None => None,
        };

        let (range, mut original_text) = match physical {
            Some(range) => {
                let original = slice(tx, range)?;
                tx.replace(range, &rendered.text)?;
                (TextRange::at(range.start(), TextSize::of(rendered.text.as_str())), original)
            }
            None => {
                let placed = host
                    .replace_statement(tx, expression_range, &rendered.text)?
                    .ok_or_else(|| {
                        ExpandError::Internal(format!(
                            "embedded host could not place `{}`",
                            proposal.template
                        ))
                    })?;
                (placed.range, placed.original_text)
            }
        };

        let whole = tx.create_marker(range)?;
        let mut field_markers = Vec::with_capacity(rendered.fields.len());
        for (name, ranges) in &rendered.fields {
            let markers = ranges
                .iter()
                .map(|rel| tx.create_marker(*rel + range.start()))
                .collect::<Result<Vec<_>, _>>()?;
            field_markers.push((name.clone(), markers));
        }

        let caret = place_caret(tx, whole, range, rendered.end, behavior.caret)?;
        tx.set_caret(caret);

        let mut member_range = None;
        if let Some((anchor, original_offset, separator, declaration)) = member_anchor {
            let offset = tx.marker_range(anchor)?.start();
            tx.release_marker(anchor);
            let inserted = format!("{separator}{}", declaration.text);
            tx.replace(TextRange::empty(offset), &inserted)?;
            let start = offset + TextSize::of(separator.as_str());
            for (name, ranges) in &declaration.fields {
                let markers = ranges
                    .iter()
                    .map(|rel| tx.create_marker(*rel + start))
                    .collect::<Result<Vec<_>, _>>()?;
                match field_markers.iter_mut().find(|(field, _)| field == name) {
                    Some((_, existing)) => existing.extend(markers),
                    None => field_markers.push((name.clone(), markers)),
                }
            }
            member_range = Some((original_offset, TextRange::at(offset, TextSize::of(inserted.as_str()))));
        }

        let mut range = tx.marker_range(whole)?;
        if let (Some((original_offset, inserted)), Some(before), Some(replaced)) =
            (member_range, &before, physical)
        {
            // The expansion spans both edits, and so does the text it replaced.
            let replaced = replaced.cover(TextRange::empty(original_offset));
            original_text = text::slice(before, replaced)
                .map(str::to_string)
                .ok_or_else(|| ExpandError::InvalidState(format!("range {replaced:?} is outside the document")))?;
            range = range.cover(inserted);
        }
        let mut fields = Vec::with_capacity(field_markers.len());
        for (name, markers) in field_markers {
            let ranges = markers
                .iter()
                .map(|marker| tx.marker_range(*marker))
                .collect::<Result<Vec<_>, _>>()?;
            markers.iter().for_each(|marker| tx.release_marker(*marker));
            let default = behavior
                .defaults
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| Arc::clone(value));
            fields.push(HotspotField {
                name,
                ranges,
                default,
            });
        }
        tx.release_marker(whole);

        let text = slice(tx, range)?;
        let caret = tx.caret();
        let parameter_info = (behavior.parameter_info
            && settings.show_parameter_info
            && behavior.caret == CaretPlacement::BeforeClosingParen)
            .then(|| TextRange::empty(caret));
        Ok(ExpansionResult {
            template: proposal.template.clone(),
            range,
            text,
            original_text,
            fields,
            caret,
            escape: behavior.escape,
            on_close: behavior.on_close.clone(),
            parameter_info,
        })
    });

    match &result {
        Ok(expansion) => tracing::debug!(
            target = "nova.postfix",
            template = %proposal.template,
            range = ?expansion.range,
            "expanded postfix template"
        ),
        // Stale contexts and host failures are defects in the caller, not user errors.
        Err(err @ (ExpandError::InvalidState(_) | ExpandError::Internal(_))) => tracing::error!(
            target = "nova.postfix",
            template = %proposal.template,
            error = %err,
            "postfix expansion aborted"
        ),
        Err(err) => tracing::debug!(
            target = "nova.postfix",
            template = %proposal.template,
            error = %err,
            "postfix expansion not applied"
        ),
    }
    result
}

fn slice(tx: &Transaction<'_>, range: TextRange) -> Result<String, ExpandError> {
    tx.slice(range)
        .map(str::to_string)
        .ok_or_else(|| ExpandError::InvalidState(format!("range {range:?} is outside the document")))
}

/// Where a new member of the class around `at` goes, and the text that
/// separates it from the code before it.
fn member_placement(source: &str, at: TextSize, is_static: bool) -> Option<(TextSize, String)> {
    let parse = parse_java(source);
    let root = parse.syntax();
    let class = root
        .descendants()
        .filter_map(ClassDeclaration::cast)
        .filter(|class| class.syntax().text_range().contains(at))
        .last()?;
    let body = class.body()?;
    let (offset, line_of) = match class.fields().filter(|field| field.is_static() == is_static).last() {
        Some(field) => {
            let range = significant_range(field.syntax());
            (range.end(), range.start())
        }
        None => {
            let brace = body
                .children_with_tokens()
                .find(|element| element.kind() == SyntaxKind::LBrace)?
                .text_range();
            let first = body.children().next().map(|member| significant_range(&member).start());
            (brace.end(), first.unwrap_or(brace.start()))
        }
    };
    let multiline = text::slice(source, significant_range(&body)).is_some_and(|body| body.contains('\n'));
    let separator = if multiline {
        format!("\n{}", line_indent(source, line_of))
    } else {
        " ".to_string()
    };
    Some((offset, separator))
}

fn line_indent(text: &str, offset: TextSize) -> &str {
    let offset = usize::from(offset).min(text.len());
    let line_start = text[..offset].rfind('\n').map_or(0, |pos| pos + 1);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Removes the caret sentinel if the synthesized code still carries one and
/// trims a single trailing space left behind by template substitution.
fn place_caret(
    tx: &mut Transaction<'_>,
    whole: MarkerId,
    inserted: TextRange,
    end: Option<TextSize>,
    placement: CaretPlacement,
) -> Result<TextSize, DocumentError> {
    let text = tx.slice(inserted).unwrap_or_default().to_string();
    if let Some(pos) = text.find(CARET_SENTINEL) {
        let at = inserted.start() + TextSize::from(pos as u32);
        tx.replace(TextRange::at(at, TextSize::of(CARET_SENTINEL)), "")?;
        tx.set_caret(at);
        let range = tx.marker_range(whole)?;
        let current = tx.slice(range).unwrap_or_default();
        if current.ends_with(' ') && !current.ends_with("  ") {
            tx.replace(TextRange::at(range.end() - TextSize::from(1), 1.into()), "")?;
        }
        return Ok(tx.caret());
    }
    if let Some(end) = end {
        return Ok(inserted.start() + end);
    }
    let range = tx.marker_range(whole)?;
    Ok(match placement {
        CaretPlacement::End => range.end(),
        CaretPlacement::BeforeClosingParen => tx
            .slice(range)
            .and_then(|text| text.rfind(')'))
            .map_or(range.end(), |pos| range.start() + TextSize::from(pos as u32)),
    })
}
