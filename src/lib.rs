//! Item-to-item book recommendations from collaborative rating data.
//!
//! Ratings are pivoted into a dense title-by-user [`RatingMatrix`], every
//! pair of rows is scored once with cosine similarity into a
//! [`SimilarityTable`], and a [`Recommender`] answers ranked lookups joined
//! with book metadata.
//!
//! ```no_run
//! use shelfmate::{Catalog, RatingMatrix, RatingObservation, Recommender};
//!
//! let matrix = RatingMatrix::build(vec![
//!     RatingObservation::new("Dune", 1u64, 9.0),
//!     RatingObservation::new("Emma", 1u64, 7.0),
//! ])?;
//! let rec = Recommender::new(matrix, Catalog::new());
//! let top = rec.recommend("Dune", 5)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod matrix;
pub mod model;
pub mod search;
pub mod similarity;

pub use catalog::{Catalog, DataIntegrityWarning, OverrideTable};
pub use engine::{Recommender, SharedRecommender, StatsReport};
pub use error::{MatrixError, RecommendError, Result};
pub use matrix::{BuildOptions, DuplicatePolicy, RatingMatrix};
pub use model::{BookMetadata, RatingObservation, Recommendation, ScoredTitle, UserId};
pub use search::search;
pub use similarity::{cosine, SimilarityTable};
