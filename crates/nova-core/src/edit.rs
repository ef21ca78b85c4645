//! Text edit primitives and utilities.

use crate::text::Bias;
use crate::{TextRange, TextSize};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }

    pub fn is_insert(&self) -> bool {
        self.range.is_empty()
    }

    fn inserted_len(&self) -> TextSize {
        TextSize::of(self.replacement.as_str())
    }

    /// Map an offset in the text before this edit to the text after it.
    ///
    /// Offsets strictly inside the replaced range (or exactly at an insertion
    /// point) have no unique image; `bias` picks the side they collapse to.
    pub fn map_offset(&self, offset: TextSize, bias: Bias) -> TextSize {
        let start = self.range.start();
        let end = self.range.end();
        let new_end = start + self.inserted_len();

        if offset < start {
            return offset;
        }
        if offset > end {
            return offset - end + new_end;
        }
        if start == end {
            return match bias {
                Bias::Left => start,
                Bias::Right => new_end,
            };
        }
        if offset == start {
            return start;
        }
        if offset == end {
            return new_end;
        }
        match bias {
            Bias::Left => start,
            Bias::Right => new_end,
        }
    }

    /// Map a live range through this edit.
    ///
    /// Returns `None` when the edit straddles one of the range boundaries,
    /// i.e. it neither contains the range nor lies inside or outside it.
    pub fn map_range(&self, range: TextRange) -> Option<TextRange> {
        let (a, b) = (self.range.start(), self.range.end());
        let (s, e) = (range.start(), range.end());

        let straddles_start = a < s && s < b && b < e;
        let straddles_end = s < a && a < e && e < b;
        if straddles_start || straddles_end {
            return None;
        }

        let start = self.map_offset(s, Bias::Left);
        let end = self.map_offset(e, Bias::Right);
        Some(TextRange::new(start, end.max(start)))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("edit range {range:?} is out of bounds for text length {text_len:?}")]
    RangeOutOfBounds { range: TextRange, text_len: TextSize },
    #[error("offset {offset:?} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: TextSize },
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits { first: TextRange, second: TextRange },
}

/// Apply a list of edits to a text snapshot.
///
/// The function is deterministic: edits are first sorted by `(start, end)` and
/// applied from the end of the text backwards.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let mut out = text.to_string();
    for edit in edits.into_iter().rev() {
        let start = u32::from(edit.range.start()) as usize;
        let end = u32::from(edit.range.end()) as usize;
        debug_assert!(out.is_char_boundary(start) && out.is_char_boundary(end));
        out.replace_range(start..end, &edit.replacement);
    }
    Ok(out)
}

/// Check a single edit against `text` without applying it.
pub fn validate_text_edit(text: &str, edit: &TextEdit) -> Result<(), EditError> {
    let text_len = TextSize::of(text);
    if edit.range.end() > text_len {
        return Err(EditError::RangeOutOfBounds {
            range: edit.range,
            text_len,
        });
    }
    for offset in [edit.range.start(), edit.range.end()] {
        if !text.is_char_boundary(u32::from(offset) as usize) {
            return Err(EditError::InvalidUtf8Boundary { offset });
        }
    }
    Ok(())
}

/// Sort edits and check for overlaps / out-of-bounds.
pub fn normalize_text_edits(text: &str, edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    edits.sort_by_key(|e| (e.range.start(), e.range.end()));

    for edit in edits.iter() {
        validate_text_edit(text, edit)?;
    }

    for pair in edits.windows(2) {
        let first = &pair[0];
        let second = &pair[1];
        if first.range.end() > second.range.start()
            || (first.is_insert() && second.is_insert() && first.range.start() == second.range.start())
        {
            return Err(EditError::OverlappingEdits {
                first: first.range,
                second: second.range,
            });
        }
    }

    // Coalesce adjacent edits (e.g. two back-to-back inserts/replacements).
    let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.range.end() == edit.range.start() {
                last.range = TextRange::new(last.range.start(), edit.range.end());
                last.replacement.push_str(&edit.replacement);
                continue;
            }
        }
        merged.push(edit);
    }
    *edits = merged;

    Ok(())
}
