//! Hotspot sessions: the editable fields left behind by an expansion.
//!
//! A [`Session`] tracks each field with live document markers and holds no
//! lock between calls. Every call re-validates the markers first; if an edit
//! elsewhere broke one of them the session closes as
//! [`SessionState::Desynchronized`] and leaves the document alone.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nova_core::{TextRange, TextSize};
use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::document::{DocumentError, MarkerId, SharedDocument, SurfaceId, TextControl};
use crate::error::SessionError;
use crate::rewrite::ExpansionResult;
use crate::semantics::SemanticModel;
use crate::ui::ParameterInfoPresenter;

/// What cancelling a session does to the expanded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapePolicy {
    RestoreOriginalText,
    LeaveTextAndCaret,
}

pub struct MacroContext<'a> {
    pub text: &'a str,
    /// Current range of the field being activated.
    pub field: TextRange,
    /// Current range of the whole expansion.
    pub expansion: TextRange,
    pub model: &'a dyn SemanticModel,
}

/// Computes a field's default text when the field becomes active.
pub trait HotspotMacro: fmt::Debug + Send + Sync {
    fn evaluate(&self, ctx: &MacroContext<'_>) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct HotspotField {
    pub name: SmolStr,
    /// Linked ranges; the first one is where the caret goes.
    pub ranges: Vec<TextRange>,
    pub default: Option<Arc<dyn HotspotMacro>>,
}

pub struct CloseContext<'a> {
    pub control: &'a mut TextControl,
    pub model: &'a dyn SemanticModel,
    pub parameter_info: &'a dyn ParameterInfoPresenter,
    pub show_parameter_info: bool,
    pub expansion: TextRange,
    pub fields: Vec<(SmolStr, TextRange)>,
}

/// Runs when the last field is accepted. Responsible for the final caret.
#[derive(Clone)]
pub struct OnClose(Arc<dyn Fn(&mut CloseContext<'_>) + Send + Sync>);

impl OnClose {
    pub fn new(f: impl Fn(&mut CloseContext<'_>) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn run(&self, ctx: &mut CloseContext<'_>) {
        (self.0)(ctx)
    }
}

impl fmt::Debug for OnClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnClose(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completed,
    Cancelled,
    Desynchronized,
}

#[derive(Debug, Default)]
struct GuardTable {
    active: HashMap<SurfaceId, (SmolStr, u64)>,
    next_generation: u64,
}

/// Per-surface record of open postfix sessions.
///
/// While a surface is guarded the Tab-key expansion stays out of the way, so
/// the key advances the session instead of expanding again.
#[derive(Debug, Clone, Default)]
pub struct SessionGuards {
    table: Arc<Mutex<GuardTable>>,
}

impl SessionGuards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, surface: SurfaceId, template: &str) -> GuardToken {
        let mut table = self.table.lock();
        table.next_generation += 1;
        let generation = table.next_generation;
        table
            .active
            .insert(surface, (SmolStr::new(template), generation));
        GuardToken {
            table: Arc::clone(&self.table),
            surface,
            generation,
        }
    }

    pub fn is_guarded(&self, surface: SurfaceId) -> bool {
        self.table.lock().active.contains_key(&surface)
    }

    /// Template name of the session open on `surface`.
    pub fn active_template(&self, surface: SurfaceId) -> Option<SmolStr> {
        self.table
            .lock()
            .active
            .get(&surface)
            .map(|(template, _)| template.clone())
    }
}

/// Clears its guard entry when dropped, unless a newer session replaced it.
#[derive(Debug)]
pub struct GuardToken {
    table: Arc<Mutex<GuardTable>>,
    surface: SurfaceId,
    generation: u64,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        if table
            .active
            .get(&self.surface)
            .is_some_and(|(_, generation)| *generation == self.generation)
        {
            table.active.remove(&self.surface);
        }
    }
}

#[derive(Debug)]
struct ActiveField {
    name: SmolStr,
    markers: Vec<MarkerId>,
    default: Option<Arc<dyn HotspotMacro>>,
    edited: bool,
}

pub struct Session {
    template: SmolStr,
    surface: SurfaceId,
    document: SharedDocument,
    fields: Vec<ActiveField>,
    current: usize,
    escape: EscapePolicy,
    expansion: MarkerId,
    end: MarkerId,
    original_text: String,
    on_close: Option<OnClose>,
    show_parameter_info: bool,
    model: Arc<dyn SemanticModel>,
    state: SessionState,
    guard: Option<GuardToken>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("template", &self.template)
            .field("surface", &self.surface)
            .field("fields", &self.fields)
            .field("current", &self.current)
            .field("escape", &self.escape)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a session over the fields of `expansion` and activates the first one.
    pub fn open(
        control: &mut TextControl,
        expansion: &ExpansionResult,
        model: Arc<dyn SemanticModel>,
        guards: &SessionGuards,
        show_parameter_info: bool,
    ) -> Result<Session, SessionError> {
        if expansion.fields.is_empty() {
            return Err(SessionError::NoFields);
        }
        let mut fields = Vec::with_capacity(expansion.fields.len());
        for field in &expansion.fields {
            let markers = field
                .ranges
                .iter()
                .map(|range| control.create_marker(*range))
                .collect::<Result<Vec<_>, DocumentError>>()?;
            fields.push(ActiveField {
                name: field.name.clone(),
                markers,
                default: field.default.clone(),
                edited: false,
            });
        }
        let whole = control.create_marker(expansion.range)?;
        let end = control.create_marker(TextRange::empty(expansion.caret))?;

        let mut session = Session {
            template: expansion.template.clone(),
            surface: control.id(),
            document: Arc::clone(control.document()),
            fields,
            current: 0,
            escape: expansion.escape,
            expansion: whole,
            end,
            original_text: expansion.original_text.clone(),
            on_close: expansion.on_close.clone(),
            show_parameter_info,
            model,
            state: SessionState::Active,
            guard: Some(guards.acquire(control.id(), &expansion.template)),
        };
        tracing::debug!(
            target = "nova.postfix",
            template = %session.template,
            fields = session.fields.len(),
            "opened hotspot session"
        );
        if session.revalidate(control) {
            session.activate(control, 0)?;
        }
        Ok(session)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Name and primary range of the active field.
    pub fn current_field(&self, control: &TextControl) -> Option<(SmolStr, TextRange)> {
        if !self.is_active() {
            return None;
        }
        let field = self.fields.get(self.current)?;
        let range = control.marker_range(*field.markers.first()?)?;
        Some((field.name.clone(), range))
    }

    /// Replaces the active field's placeholder with `text`, or appends to what
    /// the user already typed. Linked ranges are kept in sync.
    pub fn type_text(
        &mut self,
        control: &mut TextControl,
        text: &str,
    ) -> Result<SessionState, SessionError> {
        if !self.is_active() {
            return Err(SessionError::Inactive);
        }
        if !self.revalidate(control) {
            return Ok(self.state);
        }
        let field = &self.fields[self.current];
        let value = if field.edited {
            let primary = control
                .marker_range(field.markers[0])
                .and_then(|range| control.read(|doc| doc.slice(range).map(str::to_string)))
                .unwrap_or_default();
            format!("{primary}{text}")
        } else {
            text.to_string()
        };
        self.fill_current(control, &value)?;
        self.fields[self.current].edited = true;
        Ok(self.state)
    }

    /// Moves to the next field, or finishes the session after the last one.
    pub fn advance(
        &mut self,
        control: &mut TextControl,
        parameter_info: &dyn ParameterInfoPresenter,
    ) -> SessionState {
        if !self.is_active() || !self.revalidate(control) {
            return self.state;
        }
        if self.current + 1 < self.fields.len() {
            self.current += 1;
            if let Err(err) = self.activate(control, self.current) {
                tracing::warn!(target = "nova.postfix", error = %err, "failed to activate hotspot field");
                self.close(SessionState::Desynchronized);
            }
            return self.state;
        }
        self.complete(control, parameter_info);
        self.state
    }

    /// Aborts the session, applying its escape policy.
    pub fn cancel(&mut self, control: &mut TextControl) -> SessionState {
        if !self.is_active() || !self.revalidate(control) {
            return self.state;
        }
        if self.escape == EscapePolicy::RestoreOriginalText {
            let expansion = self.expansion;
            let original = self.original_text.clone();
            let restored = control.transaction("cancel postfix session", |tx| {
                let range = tx.marker_range(expansion)?;
                tx.replace(range, &original)?;
                tx.set_caret(range.start() + TextSize::of(original.as_str()));
                Ok::<_, DocumentError>(())
            });
            if let Err(err) = restored {
                tracing::warn!(target = "nova.postfix", error = %err, "failed to restore original text");
            }
        }
        self.close(SessionState::Cancelled);
        self.state
    }

    fn complete(&mut self, control: &mut TextControl, parameter_info: &dyn ParameterInfoPresenter) {
        let expansion = control.marker_range(self.expansion);
        let end = control.marker_range(self.end);
        let fields: Vec<(SmolStr, TextRange)> = self
            .fields
            .iter()
            .filter_map(|field| {
                let range = control.marker_range(*field.markers.first()?)?;
                Some((field.name.clone(), range))
            })
            .collect();
        self.close(SessionState::Completed);

        let Some(expansion) = expansion else {
            return;
        };
        match &self.on_close {
            Some(on_close) => {
                let mut ctx = CloseContext {
                    control,
                    model: self.model.as_ref(),
                    parameter_info,
                    show_parameter_info: self.show_parameter_info,
                    expansion,
                    fields,
                };
                on_close.run(&mut ctx);
            }
            None => {
                if let Some(end) = end {
                    control.move_caret(end.start());
                }
            }
        }
    }

    fn activate(&mut self, control: &mut TextControl, index: usize) -> Result<(), DocumentError> {
        let field = &self.fields[index];
        if !field.edited {
            if let Some(default) = field.default.clone() {
                let value = {
                    let document = control.snapshot();
                    let field_range = document.marker_range(field.markers[0]);
                    let expansion = document.marker_range(self.expansion);
                    match (field_range, expansion) {
                        (Some(field), Some(expansion)) => default.evaluate(&MacroContext {
                            text: document.text(),
                            field,
                            expansion,
                            model: self.model.as_ref(),
                        }),
                        _ => None,
                    }
                };
                if let Some(value) = value {
                    self.fill_current_at(control, index, &value)?;
                }
            }
        }
        if let Some(range) = control.marker_range(self.fields[index].markers[0]) {
            control.move_caret(range.end());
        }
        Ok(())
    }

    fn fill_current(&mut self, control: &mut TextControl, value: &str) -> Result<(), DocumentError> {
        self.fill_current_at(control, self.current, value)
    }

    fn fill_current_at(
        &mut self,
        control: &mut TextControl,
        index: usize,
        value: &str,
    ) -> Result<(), DocumentError> {
        let markers = self.fields[index].markers.clone();
        control.transaction("fill hotspot field", |tx| {
            let mut ranges = markers
                .iter()
                .map(|marker| tx.marker_range(*marker))
                .collect::<Result<Vec<_>, _>>()?;
            // Back to front, so earlier ranges stay put.
            ranges.sort_by_key(|range| std::cmp::Reverse(range.start()));
            for range in ranges {
                tx.replace(range, value)?;
            }
            let primary = tx.marker_range(markers[0])?;
            tx.set_caret(primary.end());
            Ok(())
        })
    }

    /// Checks every tracked range; closes the session if one is gone.
    fn revalidate(&mut self, control: &mut TextControl) -> bool {
        let valid = control.read(|doc| {
            let Some(expansion) = doc.marker_range(self.expansion) else {
                return false;
            };
            doc.marker_range(self.end).is_some()
                && self.fields.iter().all(|field| {
                    field.markers.iter().all(|marker| {
                        doc.marker_range(*marker)
                            .is_some_and(|range| expansion.contains_range(range))
                    })
                })
        });
        if !valid {
            tracing::warn!(
                target = "nova.postfix",
                template = %self.template,
                "hotspot ranges were invalidated; closing session"
            );
            self.close(SessionState::Desynchronized);
        }
        valid
    }

    fn close(&mut self, state: SessionState) {
        self.state = state;
        self.release_markers();
        self.guard.take();
    }

    fn release_markers(&self) {
        let mut document = self.document.write();
        for marker in self
            .fields
            .iter()
            .flat_map(|field| field.markers.iter().copied())
            .chain([self.expansion, self.end])
        {
            document.release_marker(marker);
        }
    }
}

/// A session dropped while still active gives its markers back to the document.
impl Drop for Session {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::debug!(target = "nova.postfix", template = %self.template, "dropped active hotspot session");
            self.release_markers();
        }
    }
}
