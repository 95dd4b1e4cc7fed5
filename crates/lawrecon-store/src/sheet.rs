//! Spreadsheet reader (XLSX/XLS/ODS) for source files.
//!
//! Reads the first worksheet; its first row is the header. Integral numeric
//! cells become integers so that a `Year` of 2020 reads as `2020`, matching
//! how the reviewers' spreadsheet tooling shows it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use lawrecon_core::{Record, Value};
use tracing::debug;

use crate::error::SourceError;
use crate::source::Table;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn read_sheet(path: &Path) -> Result<Table, SourceError> {
    let spreadsheet_err = |source| SourceError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::NoSheet(path.to_path_buf()))?
        .map_err(spreadsheet_err)?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(SourceError::NoSheet(path.to_path_buf()));
    };
    let header = header_names(header_row);

    let mut records: Vec<Record> = rows
        .map(|cells| {
            header
                .iter()
                .zip(cells)
                .map(|(name, cell)| (name.clone(), cell_value(cell)))
                .collect()
        })
        .collect();

    // Trailing blank rows are formatting residue, not records.
    while records
        .last()
        .is_some_and(|r| r.iter().all(|(_, v)| v.is_missing()))
    {
        records.pop();
    }

    debug!(path = %path.display(), rows = records.len(), "read worksheet");
    Ok(Table {
        header,
        rows: records,
    })
}

/// Header cells as column names.
///
/// Blank headers get positional names. A repeated name keeps its first
/// column; later ones become `name.1`, `name.2`, ...
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(cells.len());
    let mut repeats: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = cell_value(cell)
                .render()
                .unwrap_or_else(|| format!("Unnamed: {i}"));
            let mut name = base.clone();
            while seen.contains(&name) {
                let n = repeats.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{base}.{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Int(*f as i64)
            } else {
                Value::from(*f)
            }
        }
        Data::Bool(b) => Value::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Value::Text(ndt.format(DATETIME_FORMAT).to_string()),
            None => Value::Text(dt.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_ints() {
        assert_eq!(cell_value(&Data::Float(2020.0)), Value::Int(2020));
        assert_eq!(cell_value(&Data::Float(1.5)), Value::Float(1.5));
        assert_eq!(cell_value(&Data::Float(f64::NAN)), Value::Empty);
    }

    #[test]
    fn text_and_blank_cells() {
        assert_eq!(cell_value(&Data::String("غير ساري".into())), Value::from("غير ساري"));
        assert_eq!(cell_value(&Data::Empty), Value::Empty);
        assert_eq!(cell_value(&Data::Bool(true)), Value::from("True"));
    }

    #[test]
    fn blank_header_gets_positional_name() {
        let names = header_names(&[Data::String("LegName".into()), Data::Empty]);
        assert_eq!(names, vec!["LegName".to_string(), "Unnamed: 1".to_string()]);
    }

    #[test]
    fn repeated_header_keeps_first_column() {
        let names = header_names(&[
            Data::String("Status".into()),
            Data::String("Year".into()),
            Data::String("Status".into()),
            Data::String("Status".into()),
        ]);
        assert_eq!(names, vec!["Status", "Year", "Status.1", "Status.2"]);
    }

    #[test]
    fn nonexistent_file_errors() {
        assert!(read_sheet(Path::new("/nonexistent/qis.xlsx")).is_err());
    }
}
