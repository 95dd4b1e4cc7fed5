//! Durable review state: the verdict log and the queue cursor.
//!
//! Two human-readable JSON documents live in the state directory:
//! `comparison_data.json` holds the verdict log and `progress_data.json` the
//! cursor. Every mutation rewrites both through a temp file and rename, so a
//! crash mid-write leaves the previous version intact. The verdict log is
//! written first; a crash between the two writes at worst replays one pair.
//!
//! The in-memory [`ReviewState`] is authoritative. Write failures are
//! returned to the caller and counted, and the next mutation rewrites the
//! full state. A state file that cannot be read or parsed is renamed to
//! `<name>.corrupt-<timestamp>` before the store starts empty.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use lawrecon_core::{ReviewState, Verdict};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::PersistError;

pub const VERDICTS_FILE: &str = "comparison_data.json";
pub const CURSOR_FILE: &str = "progress_data.json";

const QUARANTINE_SUFFIX: &str = ".corrupt-";

pub struct VerdictStore {
    dir: PathBuf,
    state: ReviewState,
    failures: usize,
    last_error: Option<String>,
}

impl VerdictStore {
    /// Open the store in `dir`, loading any persisted state.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let state = Self::load(&dir);
        info!(
            dir = %dir.display(),
            cursor = state.cursor,
            verdicts = state.verdicts.len(),
            "opened verdict store"
        );
        Self {
            dir,
            state,
            failures: 0,
            last_error: None,
        }
    }

    /// Read persisted state from `dir`.
    ///
    /// Missing files read as empty. Unreadable or corrupt files are logged,
    /// moved aside, and also read as empty; this never fails.
    pub fn load(dir: &Path) -> ReviewState {
        let verdicts = read_json::<Vec<Verdict>>(&dir.join(VERDICTS_FILE)).unwrap_or_default();
        let cursor = read_json::<usize>(&dir.join(CURSOR_FILE)).unwrap_or_default();
        ReviewState { cursor, verdicts }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> &ReviewState {
        &self.state
    }

    /// Append a verdict and persist.
    pub fn append(&mut self, verdict: Verdict) -> Result<(), PersistError> {
        self.state.verdicts.push(verdict);
        self.persist()
    }

    /// Append a verdict together with the cursor it advanced to, as one save.
    pub fn append_and_seek(&mut self, verdict: Verdict, cursor: usize) -> Result<(), PersistError> {
        self.state.verdicts.push(verdict);
        self.state.cursor = cursor;
        self.persist()
    }

    /// Record a cursor move.
    pub fn set_cursor(&mut self, cursor: usize) -> Result<(), PersistError> {
        self.state.cursor = cursor;
        self.persist()
    }

    /// Drop every verdict and reset the cursor.
    ///
    /// Memory is reset before touching storage. If the empty state cannot be
    /// written, the files are removed instead so a later load still starts
    /// fresh; the write error is returned either way.
    pub fn clear_all(&mut self) -> Result<(), PersistError> {
        self.state = ReviewState::default();
        let result = self.persist();
        if let Err(e) = &result {
            warn!(error = %e, "clearing state failed, removing state files");
            for name in [VERDICTS_FILE, CURSOR_FILE] {
                let path = self.dir.join(name);
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => warn!(path = %path.display(), error = %err, "remove failed"),
                }
            }
        } else {
            info!("cleared review state");
        }
        result
    }

    /// Write the whole state to disk.
    pub fn persist(&mut self) -> Result<(), PersistError> {
        let result = self.write_state();
        match &result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                self.failures += 1;
                self.last_error = Some(e.to_string());
                warn!(error = %e, failures = self.failures, "failed to persist review state");
            }
        }
        result
    }

    /// Number of failed saves since the store was opened.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Error of the most recent save, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn write_state(&self) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Write {
            path: self.dir.clone(),
            source,
        })?;
        write_json(&self.dir.join(VERDICTS_FILE), &self.state.verdicts)?;
        write_json(&self.dir.join(CURSOR_FILE), &self.state.cursor)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable state file, starting empty");
            quarantine(path);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt state file, starting empty");
            quarantine(path);
            None
        }
    }
}

/// Rename an unusable state file so the next save cannot replace it.
fn quarantine(path: &Path) {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(
        "{QUARANTINE_SUFFIX}{}",
        Local::now().format("%Y%m%d_%H%M%S%3f")
    ));
    let aside = path.with_file_name(name);
    match fs::rename(path, &aside) {
        Ok(()) => warn!(path = %path.display(), moved_to = %aside.display(), "kept unusable state file"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not move unusable state file aside"),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
