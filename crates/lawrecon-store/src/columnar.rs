//! Parquet reader for source files.
//!
//! Each column is cast once to a small set of Arrow types and then read row
//! by row into [`Value`]s.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use lawrecon_core::{Record, Value};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use crate::error::SourceError;
use crate::source::Table;

pub fn read_parquet(path: &Path) -> Result<Table, SourceError> {
    let parquet_err = |source| SourceError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(parquet_err)?
        .build()
        .map_err(parquet_err)?;

    let header: Vec<String> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(batch_records(&batch?)?);
    }

    debug!(path = %path.display(), rows = rows.len(), "read parquet");
    Ok(Table { header, rows })
}

/// Convert every row of a batch into a [`Record`].
pub fn batch_records(batch: &RecordBatch) -> Result<Vec<Record>, ArrowError> {
    let schema = batch.schema();
    let columns: Vec<Vec<Value>> = batch
        .columns()
        .iter()
        .map(column_values)
        .collect::<Result<_, _>>()?;

    Ok((0..batch.num_rows())
        .map(|row| {
            schema
                .fields()
                .iter()
                .zip(&columns)
                .map(|(field, values)| (field.name().clone(), values[row].clone()))
                .collect()
        })
        .collect())
}

fn column_values(col: &ArrayRef) -> Result<Vec<Value>, ArrowError> {
    let len = col.len();
    match col.data_type() {
        DataType::Null => Ok(vec![Value::Empty; len]),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let cast_col = cast(col, &DataType::Utf8)?;
            let arr = downcast::<StringArray>(&cast_col)?;
            Ok((0..len)
                .map(|i| cell(arr, i, |a, i| Value::Text(a.value(i).to_string())))
                .collect())
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let cast_col = cast(col, &DataType::Int64)?;
            let arr = downcast::<Int64Array>(&cast_col)?;
            Ok((0..len).map(|i| cell(arr, i, |a, i| Value::Int(a.value(i)))).collect())
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let cast_col = cast(col, &DataType::Float64)?;
            let arr = downcast::<Float64Array>(&cast_col)?;
            Ok((0..len)
                .map(|i| cell(arr, i, |a, i| Value::from(a.value(i))))
                .collect())
        }
        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(col)?;
            Ok((0..len)
                .map(|i| {
                    cell(arr, i, |a, i| {
                        Value::Text(if a.value(i) { "True" } else { "False" }.to_string())
                    })
                })
                .collect())
        }
        // Dates, timestamps, decimals: use Arrow's display formatting.
        _ => {
            let fmt = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
            Ok((0..len)
                .map(|i| {
                    if col.is_null(i) {
                        Value::Empty
                    } else {
                        Value::Text(fmt.value(i).to_string())
                    }
                })
                .collect())
        }
    }
}

fn cell<A: Array>(arr: &A, i: usize, read: impl Fn(&A, usize) -> Value) -> Value {
    if arr.is_null(i) {
        Value::Empty
    } else {
        read(arr, i)
    }
}

fn downcast<T: 'static>(col: &ArrayRef) -> Result<&T, ArrowError> {
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        ArrowError::CastError(format!("unexpected array type {}", col.data_type()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Int32Array};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("LegName", DataType::Utf8, true),
            Field::new("LegNumber", DataType::Int32, true),
            Field::new("Status", DataType::Float64, true),
            Field::new("ActiveDate", DataType::Date32, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("نظام أ"), None])),
                Arc::new(Int32Array::from(vec![Some(7), Some(8)])),
                Arc::new(Float64Array::from(vec![Some(2.0), Some(f64::NAN)])),
                Arc::new(Date32Array::from(vec![Some(0), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn batch_rows_become_records() {
        let records = batch_records(&sample_batch()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("LegName"), &Value::from("نظام أ"));
        assert_eq!(records[0].value("LegNumber"), &Value::Int(7));
        assert_eq!(records[0].value("Status"), &Value::Float(2.0));
        assert_eq!(records[0].value("ActiveDate"), &Value::from("1970-01-01"));
        assert_eq!(records[1].value("LegName"), &Value::Empty);
        assert_eq!(records[1].value("Status"), &Value::Empty);
        assert_eq!(records[1].value("ActiveDate"), &Value::Empty);
    }

    #[test]
    fn parquet_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qis.parquet");
        let batch = sample_batch();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = read_parquet(&path).unwrap();
        assert_eq!(table.header, vec!["LegName", "LegNumber", "Status", "ActiveDate"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].value("LegNumber"), &Value::Int(8));
    }
}
