#![forbid(unsafe_code)]

//! Dense title-by-user rating matrix.
//!
//! Observations are pivoted into a row-major `Vec<f64>` with one row per
//! distinct title and one column per distinct user. Both axes keep the order
//! in which their labels were first seen, and absent cells hold `0.0`.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::MatrixError;
use crate::model::{RatingObservation, UserId};

/// How repeated (title, user) observations are folded into one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The last observation overwrites earlier ones.
    #[default]
    LastWins,
    /// The cell holds the mean of all observations for the pair.
    Mean,
    /// A repeated pair fails the build with [`MatrixError::DuplicateRating`].
    Reject,
}

/// Options controlling [`RatingMatrix::build_with`].
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Aggregation applied to duplicate observations.
    pub duplicates: DuplicatePolicy,
}

/// Book-by-user rating matrix with zero-filled gaps.
#[derive(Clone, Debug, Default)]
pub struct RatingMatrix {
    titles: Vec<String>,
    users: Vec<UserId>,
    title_index: FxHashMap<String, usize>,
    user_index: FxHashMap<UserId, usize>,
    cells: Vec<f64>,
}

impl RatingMatrix {
    /// Pivots observations using the default [`BuildOptions`].
    pub fn build<I>(observations: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        Self::build_with(observations, &BuildOptions::default())
    }

    /// Pivots observations into a dense matrix.
    ///
    /// Empty input yields an empty matrix. Ratings must be finite.
    pub fn build_with<I>(observations: I, opts: &BuildOptions) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        let mut titles = Vec::new();
        let mut users = Vec::new();
        let mut title_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut user_index: FxHashMap<UserId, usize> = FxHashMap::default();
        let mut placed: Vec<(usize, usize, f64)> = Vec::new();

        for obs in observations {
            if !obs.rating.is_finite() {
                return Err(MatrixError::NonFiniteRating {
                    title: obs.title,
                    user: obs.user.0,
                    value: obs.rating,
                });
            }
            let row = *title_index.entry(obs.title).or_insert_with_key(|title| {
                titles.push(title.clone());
                titles.len() - 1
            });
            let col = *user_index.entry(obs.user).or_insert_with_key(|user| {
                users.push(user.clone());
                users.len() - 1
            });
            placed.push((row, col, obs.rating));
        }

        let width = users.len();
        let mut cells = vec![0.0; titles.len() * width];
        let mut counts = vec![0u32; cells.len()];
        for (row, col, rating) in placed {
            let idx = row * width + col;
            let seen = counts[idx];
            match opts.duplicates {
                DuplicatePolicy::LastWins => cells[idx] = rating,
                DuplicatePolicy::Mean => {
                    // running mean keeps a single pass over the observations
                    cells[idx] += (rating - cells[idx]) / f64::from(seen + 1);
                }
                DuplicatePolicy::Reject if seen > 0 => {
                    return Err(MatrixError::DuplicateRating {
                        title: titles[row].clone(),
                        user: users[col].0.clone(),
                    });
                }
                DuplicatePolicy::Reject => cells[idx] = rating,
            }
            if seen > 0 {
                trace!(title = %titles[row], user = %users[col], "duplicate rating folded");
            }
            counts[idx] = seen + 1;
        }

        debug!(
            titles = titles.len(),
            users = users.len(),
            policy = ?opts.duplicates,
            "rating matrix built"
        );

        Ok(Self {
            titles,
            users,
            title_index,
            user_index,
            cells,
        })
    }

    /// Builds a matrix from already-dense rows, one per title.
    ///
    /// Columns are labelled `0..width` since dense rows carry no user ids.
    pub fn from_rows<I, T>(rows: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (T, Vec<f64>)>,
        T: Into<String>,
    {
        let mut titles = Vec::new();
        let mut title_index = FxHashMap::default();
        let mut cells = Vec::new();
        let mut width = None;

        for (title, row) in rows {
            let title = title.into();
            let expected = *width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(MatrixError::RaggedRow {
                    title,
                    expected,
                    found: row.len(),
                });
            }
            if let Some(value) = row.iter().copied().find(|v| !v.is_finite()) {
                return Err(MatrixError::NonFiniteRating {
                    title,
                    user: String::from("<dense>"),
                    value,
                });
            }
            if title_index.contains_key(&title) {
                return Err(MatrixError::DuplicateTitle(title));
            }
            title_index.insert(title.clone(), titles.len());
            titles.push(title);
            cells.extend(row);
        }

        let users: Vec<UserId> = (0..width.unwrap_or(0) as u64).map(UserId::from).collect();
        let user_index = users
            .iter()
            .enumerate()
            .map(|(idx, user)| (user.clone(), idx))
            .collect();

        Ok(Self {
            titles,
            users,
            title_index,
            user_index,
            cells,
        })
    }

    /// Number of rows (distinct titles).
    pub fn rows(&self) -> usize {
        self.titles.len()
    }

    /// Number of columns (distinct users).
    pub fn columns(&self) -> usize {
        self.users.len()
    }

    /// True when the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Row labels in row order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Column labels in column order.
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Row index of `title`, if present.
    pub fn row_of(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    /// Column index of `user`, if present.
    pub fn column_of(&self, user: &UserId) -> Option<usize> {
        self.user_index.get(user).copied()
    }

    /// The ratings of row `idx`, one per column.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.rows()`.
    pub fn row(&self, idx: usize) -> &[f64] {
        let width = self.columns();
        &self.cells[idx * width..(idx + 1) * width]
    }

    /// Cell value for a (title, user) pair; `None` when either label is unknown.
    pub fn get(&self, title: &str, user: &UserId) -> Option<f64> {
        let row = self.row_of(title)?;
        let col = self.column_of(user)?;
        Some(self.cells[row * self.columns() + col])
    }

    /// Count of cells holding a non-zero rating.
    pub fn nonzero_cells(&self) -> usize {
        self.cells.iter().filter(|v| **v != 0.0).count()
    }

    /// Titles whose rows are entirely zero.
    pub fn zero_rows(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows())
            .filter(|idx| self.row(*idx).iter().all(|v| *v == 0.0))
            .map(|idx| self.titles[idx].as_str())
    }
}
