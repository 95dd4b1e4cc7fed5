use std::path::PathBuf;

use lawrecon_core::ProfileError;
use thiserror::Error;

/// Failure loading a source dataset. Fatal for the session being opened.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no source files configured for legislation type '{0}'")]
    NotConfigured(String),

    #[error("source file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported source file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("no worksheet in {0}")]
    NoSheet(PathBuf),

    #[error("{path}: missing required columns {columns:?}")]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[cfg(feature = "xlsx")]
    #[error("spreadsheet error in {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        source: calamine::Error,
    },

    #[cfg(feature = "parquet")]
    #[error("parquet error in {path}: {source}")]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reading or writing persisted review state.
///
/// Recoverable: the in-memory state stays authoritative and the next
/// mutation rewrites everything.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encoding {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no verdicts to export")]
    Empty,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("{0} export requires the '{0}' feature")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("profile '{profile}': unknown field '{field}'")]
    UnknownField { profile: String, field: String },

    #[error(transparent)]
    Profile(#[from] ProfileError),
}
