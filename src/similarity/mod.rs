#![forbid(unsafe_code)]

//! All-pairs cosine similarity over the rows of a [`RatingMatrix`].

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{RecommendError, Result};
use crate::matrix::RatingMatrix;
use crate::model::ScoredTitle;

/// Cosine similarity of two equal-length vectors.
///
/// Returns `0.0` when either vector has zero magnitude.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, sa, sb), (x, y)| {
            (dot + x * y, sa + x * x, sb + y * y)
        });
    scaled(dot, sq_a, sq_b)
}

// sqrt of the product keeps identical integer rows at exactly 1.0
fn scaled(dot: f64, sq_a: f64, sq_b: f64) -> f64 {
    if sq_a == 0.0 || sq_b == 0.0 {
        return 0.0;
    }
    (dot / (sq_a * sq_b).sqrt()).clamp(-1.0, 1.0)
}

/// Square, symmetric table of pairwise title similarities.
///
/// The table keeps its own copy of the row labels so queries need nothing
/// else once it has been built.
#[derive(Clone, Debug, Default)]
pub struct SimilarityTable {
    titles: Vec<String>,
    index: FxHashMap<String, usize>,
    scores: Vec<f64>,
}

impl SimilarityTable {
    /// Computes every pairwise score of `matrix`, self-pairs included.
    ///
    /// Only the upper triangle is evaluated; the lower one is mirrored so that
    /// `score(a, b) == score(b, a)` holds bit for bit. The diagonal is `1.0`
    /// for rated titles and `0.0` for titles with an all-zero row.
    pub fn precompute(matrix: &RatingMatrix) -> Self {
        let dim = matrix.rows();
        let sq_norms: Vec<f64> = (0..dim)
            .map(|i| matrix.row(i).iter().map(|v| v * v).sum::<f64>())
            .collect();

        let mut scores = vec![0.0; dim * dim];
        for i in 0..dim {
            let row_i = matrix.row(i);
            scores[i * dim + i] = if sq_norms[i] == 0.0 { 0.0 } else { 1.0 };
            for j in (i + 1)..dim {
                let dot: f64 = row_i.iter().zip(matrix.row(j)).map(|(x, y)| x * y).sum();
                let score = scaled(dot, sq_norms[i], sq_norms[j]);
                scores[i * dim + j] = score;
                scores[j * dim + i] = score;
            }
            trace!(row = i, "similarity row computed");
        }
        debug!(titles = dim, users = matrix.columns(), "similarity table precomputed");

        let titles = matrix.titles().to_vec();
        let index = titles
            .iter()
            .enumerate()
            .map(|(idx, title)| (title.clone(), idx))
            .collect();
        Self {
            titles,
            index,
            scores,
        }
    }

    /// Side length of the table.
    pub fn dim(&self) -> usize {
        self.titles.len()
    }

    /// Row labels in matrix row order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// True when `title` is a row label.
    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    /// Similarity between two titles, `None` if either is unknown.
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.score_at(i, j))
    }

    /// Similarity between rows `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn score_at(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.dim() + j]
    }

    /// Returns up to `n` titles most similar to `target`, best first.
    ///
    /// Ties keep matrix row order and `target` itself is never returned.
    /// When fewer than `n` other titles exist all of them are returned.
    pub fn query(&self, target: &str, n: usize) -> Result<Vec<ScoredTitle>> {
        if n == 0 {
            return Err(RecommendError::InvalidCount { count: 0 });
        }
        let Some(&row) = self.index.get(target) else {
            return Err(RecommendError::not_found(target));
        };

        let dim = self.dim();
        let similar = &self.scores[row * dim..(row + 1) * dim];
        let mut ranked: Vec<(usize, f64)> = similar
            .iter()
            .copied()
            .enumerate()
            .filter(|(idx, _)| *idx != row)
            .collect();
        // sort_by is stable, so equal scores stay in row order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);

        Ok(ranked
            .into_iter()
            .map(|(idx, score)| ScoredTitle {
                title: self.titles[idx].clone(),
                score,
            })
            .collect())
    }
}
