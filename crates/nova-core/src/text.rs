//! Text model primitives: sizes, ranges and offset arithmetic.

pub use text_size::{TextRange, TextSize};

/// Which side of an edit an offset sticks to when the edit touches it.
///
/// Live ranges map their start with [`Bias::Left`] and their end with
/// [`Bias::Right`], so text inserted at either boundary ends up inside.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Bias {
    Left,
    Right,
}

/// Returns `true` when `offset` is a valid UTF-8 boundary in `text`.
#[inline]
pub fn is_boundary(text: &str, offset: TextSize) -> bool {
    text.is_char_boundary(u32::from(offset) as usize)
}

/// Slice `text` by `range`, returning `None` for out-of-bounds or non-boundary ranges.
pub fn slice(text: &str, range: TextRange) -> Option<&str> {
    let start = u32::from(range.start()) as usize;
    let end = u32::from(range.end()) as usize;
    text.get(start..end)
}

#[inline]
pub fn text_len(text: &str) -> TextSize {
    TextSize::of(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_rejects_split_code_points() {
        let text = "aé";
        assert_eq!(slice(text, TextRange::new(0.into(), 1.into())), Some("a"));
        assert_eq!(slice(text, TextRange::new(0.into(), 2.into())), None);
        assert!(!is_boundary(text, 2.into()));
        assert_eq!(text_len(text), TextSize::from(3));
    }
}
