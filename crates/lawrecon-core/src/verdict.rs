//! Reviewer decisions and the persisted review state.

use std::fmt;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::Value;

/// Format of [`Verdict::entered_at`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which source the reviewer judged authoritative.
///
/// Older verdict logs used the Arabic source names; they are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChosenSource {
    #[serde(rename = "A", alias = "قسطاس")]
    A,
    #[serde(rename = "B", alias = "الديوان")]
    B,
    #[serde(rename = "custom", alias = "مصدر آخر")]
    Custom,
}

impl ChosenSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChosenSource::A => "A",
            ChosenSource::B => "B",
            ChosenSource::Custom => "custom",
        }
    }
}

impl fmt::Display for ChosenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded decision.
///
/// Serialises flat: `enteredAt` and `chosenSource` sit alongside the
/// chosen record's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "enteredAt", alias = "تاريخ الإدخال")]
    pub entered_at: String,
    #[serde(rename = "chosenSource", alias = "المصدر الصحيح")]
    pub chosen_source: ChosenSource,
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Verdict {
    pub fn new(
        chosen_source: ChosenSource,
        fields: IndexMap<String, Value>,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            entered_at: at.format(TIMESTAMP_FORMAT).to_string(),
            chosen_source,
            fields,
        }
    }

    /// A verdict stamped with the current local time.
    pub fn now(chosen_source: ChosenSource, fields: IndexMap<String, Value>) -> Self {
        Self::new(chosen_source, fields, Local::now())
    }
}

/// Everything that survives a restart: the cursor and the verdict log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub cursor: usize,
    pub verdicts: Vec<Verdict>,
}

impl ReviewState {
    /// Count of verdicts per chosen source, in A, B, custom order.
    pub fn tally(&self) -> [(ChosenSource, usize); 3] {
        let count = |s: ChosenSource| {
            self.verdicts
                .iter()
                .filter(|v| v.chosen_source == s)
                .count()
        };
        [
            (ChosenSource::A, count(ChosenSource::A)),
            (ChosenSource::B, count(ChosenSource::B)),
            (ChosenSource::Custom, count(ChosenSource::Custom)),
        ]
    }
}
