//! Typed errors for matrix construction and recommendation queries.

use thiserror::Error;

/// Result alias for recommendation queries.
pub type Result<T> = std::result::Result<T, RecommendError>;

/// Failure modes of a recommendation or similarity query.
///
/// Both variants are predictable outcomes of caller input rather than faults,
/// so the presentation layer is expected to match on them and pick its own
/// wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    /// The requested title is not a row of the rating matrix.
    #[error("book not found: {title}")]
    NotFound {
        /// Title exactly as it was requested.
        title: String,
    },
    /// The requested number of recommendations was zero or negative.
    #[error("invalid recommendation count {count}; must be at least 1")]
    InvalidCount {
        /// Count exactly as it was requested.
        count: i64,
    },
}

impl RecommendError {
    pub(crate) fn not_found(title: impl Into<String>) -> Self {
        RecommendError::NotFound {
            title: title.into(),
        }
    }

    /// Returns true for the [`RecommendError::NotFound`] variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecommendError::NotFound { .. })
    }
}

/// Errors raised while pivoting observations into a rating matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// A (title, user) pair was observed twice under [`DuplicatePolicy::Reject`].
    ///
    /// [`DuplicatePolicy::Reject`]: crate::matrix::DuplicatePolicy::Reject
    #[error("duplicate rating for '{title}' by user {user}")]
    DuplicateRating {
        /// Title of the repeated observation.
        title: String,
        /// User of the repeated observation.
        user: String,
    },
    /// A rating was NaN or infinite.
    #[error("rating for '{title}' by user {user} is not finite: {value}")]
    NonFiniteRating {
        /// Title of the offending observation.
        title: String,
        /// User of the offending observation.
        user: String,
        /// The rejected value.
        value: f64,
    },
    /// A dense row did not match the width of the first row.
    #[error("row '{title}' has {found} columns, expected {expected}")]
    RaggedRow {
        /// Title of the offending row.
        title: String,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The same title was supplied twice as a dense row.
    #[error("title '{0}' appears more than once")]
    DuplicateTitle(String),
}
