//! Error types for the review engine.

/// Errors produced by the review engine and its SQLite store.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The section is not actionable for this review (informational, empty, or unknown).
    #[error("section {section} is not actionable for review {review_id}")]
    InvalidSection { review_id: String, section: String },

    #[error("review {0} is already queued")]
    DuplicateReview(String),

    #[error("review not found: {0}")]
    ReviewNotFound(String),

    /// Adjudication state is frozen once the review has been retired.
    #[error("review {0} has been retired and is read-only")]
    ReviewRetired(String),

    #[error("a negative submission needs at least one rejection reason")]
    MissingRejectionReason,

    #[error("invalid section vocabulary: {0}")]
    Vocabulary(String),
}

/// Result type for engine operations.
pub type ReviewResult<T> = std::result::Result<T, ReviewError>;
