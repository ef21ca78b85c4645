use smol_str::SmolStr;

use crate::document::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkeletonError {
    #[error("unterminated placeholder at offset {0}")]
    UnterminatedPlaceholder(usize),
    #[error("invalid placeholder `${0}$`")]
    InvalidPlaceholder(String),
    #[error("synthesized code does not parse: {message} in `{text}`")]
    InvalidSyntax { text: String, message: String },
}

/// Failures of a single expansion. None of these reach the user; the engine
/// logs them and leaves the document as it was.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// The captured context no longer matches the document.
    #[error("postfix context is stale: {0}")]
    InvalidState(String),
    #[error("cannot build `{template}` expansion: {source}")]
    Construction {
        template: SmolStr,
        #[source]
        source: SkeletonError,
    },
    #[error("internal expansion failure: {0}")]
    Internal(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("hotspot session is not active")]
    Inactive,
    #[error("hotspot session needs at least one field")]
    NoFields,
    #[error(transparent)]
    Document(#[from] DocumentError),
}
