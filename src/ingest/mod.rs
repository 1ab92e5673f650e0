#![forbid(unsafe_code)]

//! CSV ingestion of rating observations and book metadata.
//!
//! Rows without a title are dropped and counted; everything else must parse
//! or the load fails with the offending line number.

use std::io;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, OverrideTable};
use crate::model::{BookMetadata, RatingObservation, UserId};

/// Default title column of the ratings file.
pub const DEFAULT_TITLE_COLUMN: &str = "title";
/// Default user column of the ratings file.
pub const DEFAULT_USER_COLUMN: &str = "userId";
/// Default rating column of the ratings file.
pub const DEFAULT_RATING_COLUMN: &str = "rating";

/// Default title column of the books file.
pub const DEFAULT_BOOK_TITLE_COLUMN: &str = "Book-Title";
/// Default author column of the books file.
pub const DEFAULT_AUTHOR_COLUMN: &str = "Book-Author";
/// Default year column of the books file.
pub const DEFAULT_YEAR_COLUMN: &str = "Year-Of-Publication";
/// Default image column of the books file.
pub const DEFAULT_IMAGE_COLUMN: &str = "Image-URL-L";

/// Column layout of a ratings CSV.
#[derive(Debug, Clone)]
pub struct RatingsImportConfig {
    /// Path to the ratings CSV.
    pub path: PathBuf,
    /// Column holding the book title.
    pub title_column: String,
    /// Column holding the user id.
    pub user_column: String,
    /// Column holding the numeric rating.
    pub rating_column: String,
}

impl RatingsImportConfig {
    /// Layout with the default column names.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title_column: DEFAULT_TITLE_COLUMN.into(),
            user_column: DEFAULT_USER_COLUMN.into(),
            rating_column: DEFAULT_RATING_COLUMN.into(),
        }
    }
}

/// Column layout of a books metadata CSV.
#[derive(Debug, Clone)]
pub struct BooksImportConfig {
    /// Path to the books CSV.
    pub path: PathBuf,
    /// Column holding the book title.
    pub title_column: String,
    /// Column holding the author.
    pub author_column: String,
    /// Column holding the publication year.
    pub year_column: String,
    /// Column holding the cover image URL.
    pub image_column: String,
}

impl BooksImportConfig {
    /// Layout with the default column names.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title_column: DEFAULT_BOOK_TITLE_COLUMN.into(),
            author_column: DEFAULT_AUTHOR_COLUMN.into(),
            year_column: DEFAULT_YEAR_COLUMN.into(),
            image_column: DEFAULT_IMAGE_COLUMN.into(),
        }
    }
}

/// Result of loading a ratings file.
#[derive(Debug, Clone, Default)]
pub struct RatingsImport {
    /// Observations in file order.
    pub observations: Vec<RatingObservation>,
    /// Rows dropped for lacking a title.
    pub skipped_rows: u64,
}

/// Result of loading a books file.
#[derive(Debug, Clone, Default)]
pub struct BooksImport {
    /// Metadata by title with overrides applied.
    pub catalog: Catalog,
    /// Rows dropped for lacking a title.
    pub skipped_rows: u64,
    /// Later rows for a title that already had a record.
    pub duplicate_titles: u64,
    /// Records rewritten by the override table.
    pub overrides_applied: usize,
}

/// Error type for CSV ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// IO error from file operations.
    #[error("failed to open {path}: {source}")]
    Open {
        /// File that could not be opened.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A required column is absent from the header row.
    #[error("column '{0}' not found in CSV header")]
    MissingColumn(String),
    /// A required field is empty.
    #[error("line {line}: missing value for column '{column}'")]
    MissingValue {
        /// One-based line number in the file.
        line: u64,
        /// Column that was empty.
        column: String,
    },
    /// A rating did not parse as a finite number.
    #[error("line {line}: invalid rating '{value}'")]
    InvalidRating {
        /// One-based line number in the file.
        line: u64,
        /// Raw field contents.
        value: String,
    },
}

/// Loads rating observations from the file named in `cfg`.
pub fn load_ratings(cfg: &RatingsImportConfig) -> Result<RatingsImport, IngestError> {
    let reader = open_reader(&cfg.path)?;
    let import = read_ratings(reader, cfg)?;
    info!(
        path = %cfg.path.display(),
        observations = import.observations.len(),
        skipped = import.skipped_rows,
        "ratings loaded"
    );
    Ok(import)
}

/// Reads rating observations from any CSV source using the columns of `cfg`.
pub fn read_ratings<R: io::Read>(
    mut reader: Reader<R>,
    cfg: &RatingsImportConfig,
) -> Result<RatingsImport, IngestError> {
    let headers = reader.headers()?.clone();
    let title_idx = find_column(&headers, &cfg.title_column)?;
    let user_idx = find_column(&headers, &cfg.user_column)?;
    let rating_idx = find_column(&headers, &cfg.rating_column)?;

    let mut import = RatingsImport::default();
    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);
        let Some(title) = get_title(&record, title_idx) else {
            import.skipped_rows += 1;
            warn!(line, "dropping rating row without a title");
            continue;
        };
        let user = get_required(&record, user_idx, &cfg.user_column, line)?;
        let raw_rating = get_required(&record, rating_idx, &cfg.rating_column, line)?;
        let rating = parse_rating(raw_rating).ok_or_else(|| IngestError::InvalidRating {
            line,
            value: raw_rating.to_string(),
        })?;
        import
            .observations
            .push(RatingObservation::new(title, UserId::from(user), rating));
    }
    Ok(import)
}

/// Loads book metadata from the file named in `cfg` and applies `overrides`.
pub fn load_books(
    cfg: &BooksImportConfig,
    overrides: &OverrideTable,
) -> Result<BooksImport, IngestError> {
    let reader = open_reader(&cfg.path)?;
    let import = read_books(reader, cfg, overrides)?;
    info!(
        path = %cfg.path.display(),
        records = import.catalog.len(),
        skipped = import.skipped_rows,
        duplicates = import.duplicate_titles,
        overrides = import.overrides_applied,
        "book metadata loaded"
    );
    Ok(import)
}

/// Reads book metadata from any CSV source using the columns of `cfg`.
///
/// The first record for a title wins so the join with the rating matrix
/// stays one-to-one.
pub fn read_books<R: io::Read>(
    mut reader: Reader<R>,
    cfg: &BooksImportConfig,
    overrides: &OverrideTable,
) -> Result<BooksImport, IngestError> {
    let headers = reader.headers()?.clone();
    let title_idx = find_column(&headers, &cfg.title_column)?;
    let author_idx = find_column(&headers, &cfg.author_column)?;
    let year_idx = find_column(&headers, &cfg.year_column)?;
    let image_idx = find_column(&headers, &cfg.image_column)?;

    let mut import = BooksImport::default();
    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);
        let Some(title) = get_title(&record, title_idx) else {
            import.skipped_rows += 1;
            continue;
        };
        let meta = BookMetadata {
            author: get_optional(&record, author_idx).map(str::to_string),
            year: get_optional(&record, year_idx).and_then(|raw| parse_year(raw, line)),
            image_url: get_optional(&record, image_idx).map(str::to_string),
        };
        if !import.catalog.insert(title, meta) {
            import.duplicate_titles += 1;
            debug!(line, title, "duplicate metadata row ignored");
        }
    }
    if import.skipped_rows > 0 {
        warn!(
            skipped = import.skipped_rows,
            "dropped metadata rows without a title"
        );
    }
    import.overrides_applied = import.catalog.apply_overrides(overrides);
    Ok(import)
}

fn open_reader(path: &Path) -> Result<Reader<std::fs::File>, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(reader_builder().from_reader(file))
}

/// CSV reader settings shared by every loader.
pub fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.flexible(true);
    builder
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

// Titles are matrix keys and are kept byte for byte; only blank cells count
// as missing.
fn get_title(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|s| !s.trim().is_empty())
}

fn get_optional(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn get_required<'a>(
    record: &'a StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<&'a str, IngestError> {
    get_optional(record, idx).ok_or_else(|| IngestError::MissingValue {
        line,
        column: name.to_string(),
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_rating(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// The Book-Crossing export stores unknown years as 0 and has a few rows
// with publisher names shifted into this column.
fn parse_year(raw: &str, line: u64) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => None,
        Ok(year) => Some(year),
        Err(_) => {
            debug!(line, raw, "unparseable publication year");
            None
        }
    }
}
