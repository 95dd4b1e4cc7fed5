//! Storage layer: spreadsheet and Parquet data sources, the persisted review
//! state, and verdict export.

pub mod config;
mod error;
pub mod export;
pub mod source;
pub mod verdicts;

#[cfg(feature = "parquet")]
pub mod columnar;
#[cfg(feature = "xlsx")]
pub mod sheet;

pub use config::{Config, SourcePaths};
pub use error::{ConfigError, ExportError, PersistError, SourceError};
pub use export::{ExportFormat, export_verdicts};
pub use source::{FileSource, RecordSource, SourcePair, Table};
pub use verdicts::VerdictStore;
