use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use shelfmate::{DuplicatePolicy, OverrideTable};
use thiserror::Error;

use super::DuplicatesArg;

/// Fallback for `recommend` when neither `--count` nor the config sets one.
pub const DEFAULT_COUNT: i64 = 10;

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let config = Self { path, data };
        config.duplicate_policy()?;
        Ok(config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn ratings_path(&self) -> Option<&PathBuf> {
        self.data.dataset.ratings.as_ref()
    }

    pub fn books_path(&self) -> Option<&PathBuf> {
        self.data.dataset.books.as_ref()
    }

    pub fn default_count(&self) -> i64 {
        self.data.default_count.unwrap_or(DEFAULT_COUNT)
    }

    pub fn duplicate_policy(&self) -> Result<Option<DuplicatePolicy>, ConfigError> {
        let Some(raw) = self.data.duplicate_policy.as_deref() else {
            return Ok(None);
        };
        DuplicatesArg::from_str(raw, true)
            .map(|arg| Some(arg.into()))
            .map_err(|_| ConfigError::InvalidDuplicatePolicy {
                value: raw.to_string(),
            })
    }

    /// Built-in corrections merged with `[overrides.image_urls]`; configured
    /// entries win on conflict.
    pub fn override_table(&self) -> OverrideTable {
        let mut table = if self.data.overrides.use_defaults.unwrap_or(true) {
            OverrideTable::default_corrections()
        } else {
            OverrideTable::default()
        };
        for (title, url) in &self.data.overrides.image_urls {
            table.image_urls.insert(title.clone(), url.clone());
        }
        table
    }

    pub fn column(&self, key: ColumnKey) -> Option<&str> {
        let cols = &self.data.dataset.columns;
        match key {
            ColumnKey::Title => cols.title.as_deref(),
            ColumnKey::User => cols.user.as_deref(),
            ColumnKey::Rating => cols.rating.as_deref(),
        }
    }

    pub fn set_dataset(&mut self, ratings: Option<PathBuf>, books: Option<PathBuf>) {
        if let Some(path) = ratings {
            self.data.dataset.ratings = Some(path);
        }
        if let Some(path) = books {
            self.data.dataset.books = Some(path);
        }
    }

    pub fn set_default_count(&mut self, count: i64) -> Result<(), ConfigError> {
        if count < 1 {
            return Err(ConfigError::InvalidCount { count });
        }
        self.data.default_count = Some(count);
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.data).map_err(|source| ConfigError::Serialize { source })
    }

    pub fn persist(&self) -> Result<PathBuf, ConfigError> {
        let target = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path().ok_or(ConfigError::NoConfigPath)?,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = self.to_toml()?;
        fs::write(&target, serialized).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ColumnKey {
    Title,
    User,
    Rating,
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duplicate_policy: Option<String>,
    #[serde(default)]
    dataset: DatasetSection,
    #[serde(default)]
    overrides: OverridesSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DatasetSection {
    ratings: Option<PathBuf>,
    books: Option<PathBuf>,
    #[serde(default)]
    columns: ColumnsSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ColumnsSection {
    title: Option<String>,
    user: Option<String>,
    rating: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct OverridesSection {
    use_defaults: Option<bool>,
    #[serde(default)]
    image_urls: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize CLI config: {source}")]
    Serialize { source: toml::ser::Error },
    #[error("failed to write CLI config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("duplicate_policy '{value}' is invalid (expected last-wins, mean or reject)")]
    InvalidDuplicatePolicy { value: String },
    #[error("default_count must be at least 1, got {count}")]
    InvalidCount { count: i64 },
    #[error("no config directory found; pass --config or set SHELFMATE_CONFIG")]
    NoConfigPath,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("shelfmate").join("cli.toml"))
}
