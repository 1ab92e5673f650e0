use serde::Serialize;

use crate::catalog::DataIntegrityWarning;

use super::Recommender;

/// Shape and integrity summary of a loaded data set.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Matrix rows.
    pub titles: usize,
    /// Matrix columns.
    pub users: usize,
    /// Cells holding a non-zero rating.
    pub rated_cells: usize,
    /// `rated_cells` over `titles * users`, `0.0` for an empty matrix.
    pub density: f64,
    /// Titles with a catalog record.
    pub metadata_records: usize,
    /// Titles whose row is all zeros, in row order.
    pub zero_vector_titles: Vec<String>,
    /// Rated titles missing from the catalog.
    pub warnings: Vec<DataIntegrityWarning>,
}

impl StatsReport {
    pub(super) fn collect(rec: &Recommender) -> Self {
        let matrix = rec.matrix();
        let rated_cells = matrix.nonzero_cells();
        let total = matrix.rows() * matrix.columns();
        let density = if total == 0 {
            0.0
        } else {
            rated_cells as f64 / total as f64
        };
        Self {
            titles: matrix.rows(),
            users: matrix.columns(),
            rated_cells,
            density,
            metadata_records: rec.catalog().len(),
            zero_vector_titles: matrix.zero_rows().map(str::to_string).collect(),
            warnings: rec.warnings().to_vec(),
        }
    }
}
