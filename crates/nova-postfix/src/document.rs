//! Document buffers, live range markers and editing surfaces.
//!
//! A [`Document`] is shared between surfaces behind a `parking_lot::RwLock`.
//! Read-only work (context resolution, rendering candidates) takes the shared
//! lock; every mutation goes through the exclusive lock, and multi-step
//! rewrites go through [`TextControl::transaction`], which rolls the document
//! back when the closure fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use nova_core::{text, Bias, EditError, TextEdit, TextRange, TextSize};
use parking_lot::{RwLock, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("marker {0:?} was invalidated by an overlapping edit")]
    StaleMarker(MarkerId),
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    version: u64,
    /// `None` once an edit straddled the marker boundary.
    markers: BTreeMap<MarkerId, Option<TextRange>>,
    next_marker: u64,
    source_map: SourceMap,
}

/// Which parts of a document are physical host-language source.
///
/// Plain files are [`SourceMap::Identity`]. Documents that embed host code
/// inside another syntax (templates, notebooks) list the physical code
/// segments; ranges that are not inside a single segment cannot be edited
/// directly and go through [`crate::EmbeddedHost`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceMap {
    #[default]
    Identity,
    Segments(Vec<TextRange>),
}

impl SourceMap {
    pub fn is_physical(&self, range: TextRange) -> bool {
        match self {
            SourceMap::Identity => true,
            SourceMap::Segments(segments) => {
                segments.iter().any(|segment| segment.contains_range(range))
            }
        }
    }

    fn remap(&mut self, edit: &TextEdit) {
        if let SourceMap::Segments(segments) = self {
            *segments = segments
                .iter()
                .filter_map(|segment| edit.map_range(*segment))
                .collect();
        }
    }
}

pub type SharedDocument = Arc<RwLock<Document>>;

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn shared(text: impl Into<String>) -> SharedDocument {
        Arc::new(RwLock::new(Self::new(text)))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Incremented by every successful edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn slice(&self, range: TextRange) -> Option<&str> {
        text::slice(&self.text, range)
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn set_source_map(&mut self, source_map: SourceMap) {
        self.source_map = source_map;
    }

    pub fn apply(&mut self, edit: &TextEdit) -> Result<(), DocumentError> {
        nova_core::edit::validate_text_edit(&self.text, edit)?;
        let start = u32::from(edit.range.start()) as usize;
        let end = u32::from(edit.range.end()) as usize;
        self.text.replace_range(start..end, &edit.replacement);
        self.version += 1;
        for range in self.markers.values_mut() {
            if let Some(current) = *range {
                *range = edit.map_range(current);
            }
        }
        self.source_map.remap(edit);
        Ok(())
    }

    pub fn create_marker(&mut self, range: TextRange) -> Result<MarkerId, DocumentError> {
        let empty = TextEdit::new(range, String::new());
        nova_core::edit::validate_text_edit(&self.text, &empty)?;
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(id, Some(range));
        Ok(id)
    }

    /// Current range of a marker; `None` if it was released or invalidated.
    pub fn marker_range(&self, id: MarkerId) -> Option<TextRange> {
        self.markers.get(&id).copied().flatten()
    }

    pub fn release_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }
}

/// One editing surface (an editor tab or split) over a shared document.
#[derive(Debug)]
pub struct TextControl {
    id: SurfaceId,
    document: SharedDocument,
    caret: TextSize,
}

impl TextControl {
    pub fn new(id: SurfaceId, document: SharedDocument) -> Self {
        Self {
            id,
            document,
            caret: TextSize::from(0),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn caret(&self) -> TextSize {
        self.caret
    }

    /// Moves the caret, clamping it to the document.
    pub fn move_caret(&mut self, offset: TextSize) {
        let len = TextSize::of(self.document.read().text());
        self.caret = offset.min(len);
    }

    pub fn text(&self) -> String {
        self.document.read().text().to_string()
    }

    pub fn version(&self) -> u64 {
        self.document.read().version()
    }

    /// Copy of the document taken under the shared read lock.
    pub fn snapshot(&self) -> Document {
        self.document.read().clone()
    }

    /// Run `f` under the shared read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.document.read())
    }

    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<(), DocumentError> {
        let edit = TextEdit::new(range, text);
        self.document.write().apply(&edit)?;
        self.caret = edit.map_offset(self.caret, Bias::Right);
        Ok(())
    }

    pub fn insert(&mut self, offset: TextSize, text: &str) -> Result<(), DocumentError> {
        self.replace(TextRange::empty(offset), text)
    }

    pub fn delete(&mut self, range: TextRange) -> Result<(), DocumentError> {
        self.replace(range, "")
    }

    /// Types `text` at the caret.
    pub fn type_text(&mut self, text: &str) -> Result<(), DocumentError> {
        self.insert(self.caret, text)
    }

    pub fn create_marker(&mut self, range: TextRange) -> Result<MarkerId, DocumentError> {
        self.document.write().create_marker(range)
    }

    pub fn marker_range(&self, id: MarkerId) -> Option<TextRange> {
        self.document.read().marker_range(id)
    }

    pub fn release_marker(&mut self, id: MarkerId) {
        self.document.write().release_marker(id);
    }

    /// Run `f` with exclusive access to the document.
    ///
    /// The write lock is held until `f` returns. Unless `f` succeeds, the
    /// text, markers, version and caret are restored to their state before
    /// the call. That includes `f` panicking.
    pub fn transaction<T, E>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut tx = Transaction {
            document: self.document.write(),
            caret: &mut self.caret,
            name,
            rollback: None,
        };
        tx.rollback = Some(((*tx.document).clone(), *tx.caret));
        let result = f(&mut tx);
        if result.is_ok() {
            tx.rollback = None;
        }
        result
    }
}

/// Exclusive access to a document for the duration of [`TextControl::transaction`].
pub struct Transaction<'a> {
    document: RwLockWriteGuard<'a, Document>,
    caret: &'a mut TextSize,
    name: &'a str,
    /// Restored on drop unless the transaction committed.
    rollback: Option<(Document, TextSize)>,
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some((document, caret)) = self.rollback.take() {
            *self.document = document;
            *self.caret = caret;
            tracing::debug!(target = "nova.postfix", transaction = self.name, "rolled back document transaction");
        }
    }
}

impl Transaction<'_> {
    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn version(&self) -> u64 {
        self.document.version()
    }

    pub fn slice(&self, range: TextRange) -> Option<&str> {
        self.document.slice(range)
    }

    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<(), DocumentError> {
        let edit = TextEdit::new(range, text);
        self.document.apply(&edit)?;
        *self.caret = edit.map_offset(*self.caret, Bias::Right);
        Ok(())
    }

    pub fn create_marker(&mut self, range: TextRange) -> Result<MarkerId, DocumentError> {
        self.document.create_marker(range)
    }

    pub fn marker_range(&self, id: MarkerId) -> Result<TextRange, DocumentError> {
        self.document
            .marker_range(id)
            .ok_or(DocumentError::StaleMarker(id))
    }

    pub fn release_marker(&mut self, id: MarkerId) {
        self.document.release_marker(id);
    }

    pub fn caret(&self) -> TextSize {
        *self.caret
    }

    pub fn set_caret(&mut self, offset: TextSize) {
        *self.caret = offset.min(TextSize::of(self.document.text()));
    }
}
