//! Plain data records shared by the matrix, similarity and ingestion layers.

use std::fmt;

use serde::Serialize;

/// Identifier of the user who produced a rating.
///
/// Source data carries numeric ids, but nothing in the pipeline depends on
/// them being numeric, so ids are kept in their textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        UserId(value.to_string())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

/// One (title, user, rating) row of the source data.
#[derive(Clone, Debug, PartialEq)]
pub struct RatingObservation {
    /// Book title; the row label in the rating matrix.
    pub title: String,
    /// User that produced the rating; the column label in the rating matrix.
    pub user: UserId,
    /// Rating value.
    pub rating: f64,
}

impl RatingObservation {
    /// Creates an observation from anything convertible into its parts.
    pub fn new(title: impl Into<String>, user: impl Into<UserId>, rating: f64) -> Self {
        Self {
            title: title.into(),
            user: user.into(),
            rating,
        }
    }
}

/// Descriptive fields joined onto a title for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    /// Author as written in the source data.
    pub author: Option<String>,
    /// Publication year, when it parses as a positive number.
    pub year: Option<u16>,
    /// Cover image URL.
    pub image_url: Option<String>,
}

/// A title paired with its similarity to the query title.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredTitle {
    /// Candidate title.
    pub title: String,
    /// Cosine similarity to the query title.
    pub score: f64,
}

/// A ranked recommendation ready for presentation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    /// One-based position in the result list.
    pub rank: usize,
    /// Recommended title.
    pub title: String,
    /// Author, if the title has metadata.
    pub author: Option<String>,
    /// Publication year, if known.
    pub year: Option<u16>,
    /// Cover image URL, if known.
    pub image_url: Option<String>,
    /// Cosine similarity to the query title.
    pub score: f64,
}
