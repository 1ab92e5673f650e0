#![forbid(unsafe_code)]

//! Book metadata keyed by title, plus the ingestion-time correction table.

use std::collections::hash_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::model::BookMetadata;

/// One-to-one mapping from title to display metadata.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    records: FxHashMap<String, BookMetadata>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metadata for `title` unless the title is already present.
    ///
    /// Returns `false` when an earlier record was kept.
    pub fn insert(&mut self, title: impl Into<String>, meta: BookMetadata) -> bool {
        match self.records.entry(title.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(meta);
                true
            }
        }
    }

    /// Metadata for `title`.
    pub fn get(&self, title: &str) -> Option<&BookMetadata> {
        self.records.get(title)
    }

    /// Number of titles with metadata.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no metadata has been loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rewrites fields named by `overrides`; returns how many records changed.
    pub fn apply_overrides(&mut self, overrides: &OverrideTable) -> usize {
        let mut applied = 0;
        for (title, url) in &overrides.image_urls {
            if let Some(meta) = self.records.get_mut(title) {
                meta.image_url = Some(url.clone());
                applied += 1;
                debug!(%title, "image url corrected");
            }
        }
        applied
    }
}

/// Per-title corrections applied to metadata while it is loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverrideTable {
    /// Replacement cover image URL by title.
    pub image_urls: BTreeMap<String, String>,
}

impl OverrideTable {
    /// The cover fixes needed by the Book-Crossing export, whose image links
    /// for these titles point at missing scans.
    pub fn default_corrections() -> Self {
        let image_urls = [
            (
                "Jacob Have I Loved",
                "http://images.amazon.com/images/P/0690040784.01.LZZZZZZZ.jpg",
            ),
            (
                "Needful Things",
                "http://images.amazon.com/images/P/0451172817.01.LZZZZZZZ.jpg",
            ),
            (
                "All Creatures Great and Small",
                "http://images.amazon.com/images/P/0312084986.01.LZZZZZZZ.jpg",
            ),
            (
                "The Kitchen God's Wife",
                "http://images.amazon.com/images/P/1590400356.01.LZZZZZZZ.jpg",
            ),
        ]
        .into_iter()
        .map(|(title, url)| (title.to_string(), url.to_string()))
        .collect();
        Self { image_urls }
    }

    /// True when no corrections are configured.
    pub fn is_empty(&self) -> bool {
        self.image_urls.is_empty()
    }
}

/// Non-fatal inconsistency between the rating data and the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    /// A rated title has no metadata record.
    MissingMetadata {
        /// The rated title.
        title: String,
    },
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIntegrityWarning::MissingMetadata { title } => {
                write!(f, "no metadata for rated title '{title}'")
            }
        }
    }
}
