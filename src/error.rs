use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("{kind} source not found at {}", path.display())]
    MissingSource { kind: &'static str, path: PathBuf },

    #[error("column '{column}' row {row}: cannot coerce {value:?}")]
    TypeCoercion {
        column: &'static str,
        row: usize,
        value: String,
    },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn coercion(column: &'static str, row: usize, value: impl Into<String>) -> Self {
        EtlError::TypeCoercion {
            column,
            row,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
