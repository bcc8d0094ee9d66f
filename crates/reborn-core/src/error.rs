//! Error types for reborn-core.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core domain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A field failed registration validation.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The field that failed validation.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A review score was outside the accepted range.
    #[error("review score out of range: {0} (expected 1..=5)")]
    ScoreOutOfRange(i32),

    /// Too many review images were supplied.
    #[error("too many review images: {0} (maximum 5)")]
    TooManyImages(usize),

    /// An unknown enum label was encountered.
    #[error("unknown {kind}: {value}")]
    UnknownLabel {
        /// What kind of label was being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
}
