use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{
    early_release_cutoff, late_release_cutoff, DEFAULT_MOVIES_TABLE, DEFAULT_RATINGS_CHUNK_SIZE,
    DEFAULT_RATINGS_TABLE, SPARSE_COLUMN_THRESHOLD,
};
use crate::error::{EtlError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const ENV_SCRAPED: &str = "MOVIES_ETL_SCRAPED";
pub const ENV_CATALOG: &str = "MOVIES_ETL_CATALOG";
pub const ENV_RATINGS: &str = "MOVIES_ETL_RATINGS";
pub const ENV_DATABASE: &str = "MOVIES_ETL_DATABASE";
pub const ENV_CHUNK_SIZE: &str = "MOVIES_ETL_CHUNK_SIZE";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub destination: DestinationConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub transform: TransformConfig,
}

/// Locations of the three inputs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub scraped: PathBuf,
    pub catalog: PathBuf,
    pub ratings: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            scraped: PathBuf::from("data/wikipedia-movies.json"),
            catalog: PathBuf::from("data/movies_metadata.csv"),
            ratings: PathBuf::from("data/ratings.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DestinationConfig {
    pub database: PathBuf,
    pub movies_table: String,
    pub ratings_table: String,
    pub ratings_chunk_size: usize,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("movie_data.db"),
            movies_table: DEFAULT_MOVIES_TABLE.to_string(),
            ratings_table: DEFAULT_RATINGS_TABLE.to_string(),
            ratings_chunk_size: DEFAULT_RATINGS_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Where to write the Prometheus text snapshot at the end of a run.
    pub output: Option<PathBuf>,
}

/// Tunables for the pruning and reconciliation stages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransformConfig {
    /// A scraped column survives while its missing share stays below this fraction.
    pub sparse_column_threshold: f64,
    /// A join is dropped when the scraped release falls after `late_release_cutoff` and the
    /// catalog release falls before `early_release_cutoff`.
    pub late_release_cutoff: NaiveDate,
    pub early_release_cutoff: NaiveDate,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sparse_column_threshold: SPARSE_COLUMN_THRESHOLD,
            late_release_cutoff: late_release_cutoff(),
            early_release_cutoff: early_release_cutoff(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads `path` if given (it must exist), else `config.toml` when present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    debug!("No {} found; using built-in defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Applies `MOVIES_ETL_*` overrides from the process environment, after loading `.env`.
    pub fn apply_env(&mut self) -> Result<()> {
        dotenv::dotenv().ok();
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_SCRAPED) {
            self.sources.scraped = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_CATALOG) {
            self.sources.catalog = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_RATINGS) {
            self.sources.ratings = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DATABASE) {
            self.destination.database = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_CHUNK_SIZE) {
            self.destination.ratings_chunk_size = v.trim().parse().map_err(|_| {
                EtlError::Config(format!("{ENV_CHUNK_SIZE} must be a positive integer, got {v:?}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.destination.ratings_chunk_size == 0 {
            return Err(EtlError::Config("ratings_chunk_size must be positive".to_string()));
        }
        if self.destination.movies_table.trim().is_empty() {
            return Err(EtlError::Config("movies_table must not be empty".to_string()));
        }
        if self.destination.ratings_table.trim().is_empty() {
            return Err(EtlError::Config("ratings_table must not be empty".to_string()));
        }
        if self.destination.movies_table == self.destination.ratings_table {
            return Err(EtlError::Config(
                "movies_table and ratings_table must differ".to_string(),
            ));
        }
        let threshold = self.transform.sparse_column_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(EtlError::Config(format!(
                "sparse_column_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if self.transform.early_release_cutoff > self.transform.late_release_cutoff {
            return Err(EtlError::Config(
                "early_release_cutoff must not be after late_release_cutoff".to_string(),
            ));
        }
        Ok(())
    }
}
