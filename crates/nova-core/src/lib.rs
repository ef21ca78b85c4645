//! Core shared types for Nova.
//!
//! This crate is intentionally small: text sizes and ranges, and the edit
//! primitives every other crate builds on.

pub mod edit;
pub mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use text::{Bias, TextRange, TextSize};
