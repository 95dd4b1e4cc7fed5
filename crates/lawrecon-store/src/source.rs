//! Data sources yielding the two ordered record sequences for a type.

use std::path::Path;

use lawrecon_core::{LegislationTypeProfile, Record, ReviewQueue, Side};
use tracing::info;

use crate::config::Config;
use crate::error::SourceError;

/// Column that, when present, orders each source before pairing.
pub const GROUP_KEY: &str = "GroupKey";

/// A header plus the rows read from one file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }
}

/// Both sides of one legislation type, ready for pairing.
#[derive(Debug, Clone, Default)]
pub struct SourcePair {
    pub a: Vec<Record>,
    pub b: Vec<Record>,
}

impl SourcePair {
    pub fn into_queue(self) -> ReviewQueue {
        ReviewQueue::new(self.a, self.b)
    }
}

/// Anything that can produce both record sequences for a legislation type.
pub trait RecordSource {
    fn load(&self, profile: &LegislationTypeProfile) -> Result<SourcePair, SourceError>;
}

/// Reads each side from a file, choosing the reader by extension.
#[derive(Debug, Clone)]
pub struct FileSource {
    config: Config,
}

impl FileSource {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn load_side(
        &self,
        path: &Path,
        side: Side,
        profile: &LegislationTypeProfile,
    ) -> Result<Vec<Record>, SourceError> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let table = read_table(path)?;
        prepare(table, path, side, profile)
    }
}

impl RecordSource for FileSource {
    fn load(&self, profile: &LegislationTypeProfile) -> Result<SourcePair, SourceError> {
        let paths = self
            .config
            .source_paths(&profile.key)
            .ok_or_else(|| SourceError::NotConfigured(profile.key.clone()))?;
        let a = self.load_side(&paths.a, Side::A, profile)?;
        let b = self.load_side(&paths.b, Side::B, profile)?;
        info!(
            kind = %profile.key,
            a = a.len(),
            b = b.len(),
            paired = a.len().min(b.len()),
            "loaded sources"
        );
        Ok(SourcePair { a, b })
    }
}

/// Read a file into a [`Table`], dispatching on its extension.
pub fn read_table(path: &Path) -> Result<Table, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => crate::sheet::read_sheet(path),
        #[cfg(feature = "parquet")]
        "parquet" => crate::columnar::read_parquet(path),
        _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Check required columns, then order rows by [`GROUP_KEY`] when present.
pub fn prepare(
    table: Table,
    path: &Path,
    side: Side,
    profile: &LegislationTypeProfile,
) -> Result<Vec<Record>, SourceError> {
    let header: Vec<&str> = table.header.iter().map(String::as_str).collect();
    let missing = profile.missing_required_columns(side, &header);
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing.into_iter().map(str::to_string).collect(),
        });
    }

    let sort = table.has_column(GROUP_KEY);
    let mut rows = table.rows;
    if sort {
        rows.sort_by(|x, y| x.value(GROUP_KEY).sort_cmp(y.value(GROUP_KEY)));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawrecon_core::{FieldMapper, Value};

    fn table(header: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|vals| header.iter().copied().zip(vals).collect())
                .collect(),
        }
    }

    fn bylaw() -> LegislationTypeProfile {
        FieldMapper::builtin().resolve("bylaw").unwrap().clone()
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let t = table(&["LegName", "Status"], vec![]);
        let err = prepare(t, Path::new("qis.xlsx"), Side::A, &bylaw()).unwrap_err();
        match err {
            SourceError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["LegNumber".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rows_sorted_by_group_key_stably() {
        let header = ["LegName", "LegNumber", "Status", GROUP_KEY];
        let t = table(
            &header,
            vec![
                vec!["c".into(), Value::Int(1), Value::Int(1), Value::Int(3)],
                vec!["none".into(), Value::Int(2), Value::Int(1), Value::Empty],
                vec!["a".into(), Value::Int(3), Value::Int(1), Value::Int(1)],
                vec!["a2".into(), Value::Int(4), Value::Int(1), Value::Int(1)],
            ],
        );
        let rows = prepare(t, Path::new("qis.xlsx"), Side::A, &bylaw()).unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.value("LegName").to_string()).collect();
        assert_eq!(names, vec!["a", "a2", "c", "none"]);
    }

    #[test]
    fn rows_keep_file_order_without_group_key() {
        let header = ["ByLawName", "ByLawNumber", "Status"];
        let t = table(
            &header,
            vec![
                vec!["z".into(), Value::Int(1), Value::Int(1)],
                vec!["a".into(), Value::Int(2), Value::Int(1)],
            ],
        );
        let rows = prepare(t, Path::new("diwan.xlsx"), Side::B, &bylaw()).unwrap();
        assert_eq!(rows[0].value("ByLawName").to_string(), "z");
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            read_table(Path::new("data.txt")),
            Err(SourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let source = FileSource::new(config);
        let err = source.load(&bylaw()).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn unconfigured_type_is_fatal() {
        let mut config = Config::default();
        config.sources.clear();
        let err = FileSource::new(config).load(&bylaw()).unwrap_err();
        assert!(matches!(err, SourceError::NotConfigured(k) if k == "bylaw"));
    }
}
