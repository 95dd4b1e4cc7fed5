//! Export of the verdict log to a tabular file.
//!
//! One row per verdict. Columns are `enteredAt`, `chosenSource`, then every
//! field key seen across the log in first-seen order; verdicts lacking a key
//! leave that cell null.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Local};
use indexmap::IndexSet;
use lawrecon_core::{ReviewState, Verdict};
use tracing::info;

use crate::error::ExportError;

pub const ENTERED_AT: &str = "enteredAt";
pub const CHOSEN_SOURCE: &str = "chosenSource";

const FILE_STEM: &str = "legislation_comparison";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(format!("unknown export format '{other}' (expected csv or parquet)")),
        }
    }
}

/// Column names for a verdict log.
pub fn export_columns(verdicts: &[Verdict]) -> Vec<String> {
    let mut columns: IndexSet<String> =
        [ENTERED_AT.to_string(), CHOSEN_SOURCE.to_string()].into_iter().collect();
    for v in verdicts {
        columns.extend(v.fields.keys().cloned());
    }
    columns.into_iter().collect()
}

/// Build a string-typed batch, one row per verdict.
pub fn verdicts_to_batch(verdicts: &[Verdict]) -> Result<RecordBatch, ArrowError> {
    let columns = export_columns(verdicts);
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();

    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|name| {
            let values: Vec<Option<String>> = verdicts
                .iter()
                .map(|v| match name.as_str() {
                    ENTERED_AT => Some(v.entered_at.clone()),
                    CHOSEN_SOURCE => Some(v.chosen_source.to_string()),
                    key => v.fields.get(key).and_then(|val| val.render()),
                })
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

/// File name carrying the generation timestamp.
pub fn export_file_name(format: ExportFormat, at: DateTime<Local>) -> String {
    format!(
        "{FILE_STEM}_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write the verdict log into `out_dir`, returning the created file's path.
pub fn export_verdicts(
    state: &ReviewState,
    out_dir: &Path,
    format: ExportFormat,
    at: DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    if state.verdicts.is_empty() {
        return Err(ExportError::Empty);
    }
    let batch = verdicts_to_batch(&state.verdicts)?;
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(export_file_name(format, at));

    match format {
        ExportFormat::Csv => write_csv(&path, &batch)?,
        ExportFormat::Parquet => write_parquet(&path, &batch)?,
    }

    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "exported verdicts"
    );
    Ok(path)
}

fn write_csv(path: &Path, batch: &RecordBatch) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    // BOM so spreadsheet tools detect UTF-8 and show the Arabic text.
    out.write_all(UTF8_BOM)?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(&mut out);
    writer.write(batch)?;
    drop(writer);
    out.flush()?;
    Ok(())
}

#[cfg(feature = "parquet")]
fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = parquet::arrow::ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(not(feature = "parquet"))]
fn write_parquet(_path: &Path, _batch: &RecordBatch) -> Result<(), ExportError> {
    Err(ExportError::Unsupported("parquet"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;
    use lawrecon_core::{ChosenSource, Value};

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn state() -> ReviewState {
        let a = Verdict::new(
            ChosenSource::A,
            IndexMap::from([
                ("LegName".to_string(), Value::from("نظام أ")),
                ("Status".to_string(), Value::Int(2)),
            ]),
            at(),
        );
        let b = Verdict::new(
            ChosenSource::B,
            IndexMap::from([
                ("ByLawName".to_string(), Value::from("نظام ب")),
                ("Status".to_string(), Value::Int(1)),
            ]),
            at(),
        );
        ReviewState {
            cursor: 2,
            verdicts: vec![a, b],
        }
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        assert_eq!(
            export_columns(&state().verdicts),
            vec!["enteredAt", "chosenSource", "LegName", "Status", "ByLawName"]
        );
    }

    #[test]
    fn absent_keys_are_null() {
        let batch = verdicts_to_batch(&state().verdicts).unwrap();
        assert_eq!(batch.num_rows(), 2);
        let by_law = batch
            .column_by_name("ByLawName")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(arrow::array::Array::is_null(by_law, 0));
        assert_eq!(by_law.value(1), "نظام ب");
    }

    #[test]
    fn file_name_carries_timestamp() {
        assert_eq!(
            export_file_name(ExportFormat::Csv, at()),
            "legislation_comparison_20250102_030405.csv"
        );
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_verdicts(&state(), dir.path(), ExportFormat::Csv, at()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "enteredAt,chosenSource,LegName,Status,ByLawName");
        assert_eq!(lines[1], "2025-01-02 03:04:05,A,نظام أ,2,");
        assert_eq!(lines[2], "2025-01-02 03:04:05,B,,1,نظام ب");
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn parquet_export_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_verdicts(&state(), dir.path(), ExportFormat::Parquet, at()).unwrap();
        let table = crate::columnar::read_parquet(&path).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].value(CHOSEN_SOURCE), &Value::from("B"));
    }

    #[test]
    fn empty_log_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_verdicts(&ReviewState::default(), dir.path(), ExportFormat::Csv, at());
        assert!(matches!(err, Err(ExportError::Empty)));
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("parquet".parse::<ExportFormat>(), Ok(ExportFormat::Parquet));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
