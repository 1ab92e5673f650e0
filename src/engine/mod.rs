#![forbid(unsafe_code)]

//! The immutable recommendation context handed to the presentation layer.
//!
//! A [`Recommender`] owns the rating matrix, the similarity table computed
//! from it and the metadata catalog. It is built once and only read
//! afterwards, so a single instance can be shared across threads behind an
//! `Arc`. [`SharedRecommender`] adds the one-time initialization barrier for
//! callers that build lazily.

mod stats;

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, DataIntegrityWarning};
use crate::error::{MatrixError, RecommendError, Result};
use crate::matrix::{BuildOptions, RatingMatrix};
use crate::model::{RatingObservation, Recommendation, ScoredTitle};
use crate::search::search;
use crate::similarity::SimilarityTable;

pub use stats::StatsReport;

/// Precomputed similarity data joined with display metadata.
#[derive(Debug)]
pub struct Recommender {
    matrix: RatingMatrix,
    table: SimilarityTable,
    catalog: Catalog,
    warnings: Vec<DataIntegrityWarning>,
}

impl Recommender {
    /// Precomputes the similarity table for `matrix` and joins `catalog`.
    pub fn new(matrix: RatingMatrix, catalog: Catalog) -> Self {
        let table = SimilarityTable::precompute(&matrix);
        let warnings: Vec<DataIntegrityWarning> = matrix
            .titles()
            .iter()
            .filter(|title| catalog.get(title).is_none())
            .map(|title| DataIntegrityWarning::MissingMetadata {
                title: title.clone(),
            })
            .collect();
        for warning in &warnings {
            debug!(%warning, "data integrity");
        }
        if !warnings.is_empty() {
            warn!(
                missing = warnings.len(),
                "rated titles without metadata; recommendations will omit their details"
            );
        }
        info!(
            titles = matrix.rows(),
            users = matrix.columns(),
            metadata = catalog.len(),
            "recommender ready"
        );
        Self {
            matrix,
            table,
            catalog,
            warnings,
        }
    }

    /// Pivots `observations` and builds the recommender in one step.
    pub fn from_observations<I>(
        observations: I,
        catalog: Catalog,
        opts: &BuildOptions,
    ) -> std::result::Result<Self, MatrixError>
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        let matrix = RatingMatrix::build_with(observations, opts)?;
        Ok(Self::new(matrix, catalog))
    }

    /// Ranked recommendations for `title`, joined with metadata.
    ///
    /// `count` must be at least 1; zero or negative counts are rejected with
    /// [`RecommendError::InvalidCount`] before the title is looked up.
    pub fn recommend(&self, title: &str, count: i64) -> Result<Vec<Recommendation>> {
        let n = usize::try_from(count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(RecommendError::InvalidCount { count })?;
        let hits = self.table.query(title, n)?;
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(idx, hit)| {
                let meta = self.catalog.get(&hit.title);
                Recommendation {
                    rank: idx + 1,
                    author: meta.and_then(|m| m.author.clone()),
                    year: meta.and_then(|m| m.year),
                    image_url: meta.and_then(|m| m.image_url.clone()),
                    title: hit.title,
                    score: hit.score,
                }
            })
            .collect())
    }

    /// Bare similarity ranking for `title` without metadata.
    pub fn similar(&self, title: &str, n: usize) -> Result<Vec<ScoredTitle>> {
        self.table.query(title, n)
    }

    /// Rated titles containing `needle`, ignoring case.
    pub fn autocomplete(&self, needle: &str) -> Vec<String> {
        search(self.matrix.titles().iter().map(String::as_str), needle)
    }

    /// Row labels of the rating matrix.
    pub fn titles(&self) -> &[String] {
        self.matrix.titles()
    }

    /// The underlying rating matrix.
    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    /// The precomputed similarity table.
    pub fn table(&self) -> &SimilarityTable {
        &self.table
    }

    /// The metadata catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Inconsistencies found while joining ratings and metadata.
    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    /// Summary of the loaded data set.
    pub fn stats(&self) -> StatsReport {
        StatsReport::collect(self)
    }
}

/// Lazily built recommender shared by concurrent readers.
///
/// The first caller to [`SharedRecommender::get_or_try_build`] runs the
/// build; everyone else waits for it and then reads the same instance.
#[derive(Debug, Default)]
pub struct SharedRecommender {
    cell: OnceLock<Arc<Recommender>>,
}

impl SharedRecommender {
    /// Creates an empty, unbuilt slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The recommender, if it has already been built.
    pub fn get(&self) -> Option<Arc<Recommender>> {
        self.cell.get().cloned()
    }

    /// Returns the recommender, building it with `build` on first use.
    pub fn get_or_build<F>(&self, build: F) -> Arc<Recommender>
    where
        F: FnOnce() -> Recommender,
    {
        self.cell.get_or_init(|| Arc::new(build())).clone()
    }

    /// Fallible variant of [`SharedRecommender::get_or_build`].
    ///
    /// A failed build leaves the slot empty so a later call may retry. When
    /// two builds race, the one stored first is returned to both callers.
    pub fn get_or_try_build<F, E>(&self, build: F) -> std::result::Result<Arc<Recommender>, E>
    where
        F: FnOnce() -> std::result::Result<Recommender, E>,
    {
        if let Some(existing) = self.cell.get() {
            return Ok(existing.clone());
        }
        let built = Arc::new(build()?);
        Ok(self.cell.get_or_init(|| built).clone())
    }
}
