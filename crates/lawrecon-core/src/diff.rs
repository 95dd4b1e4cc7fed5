//! Field-by-field comparison of a paired record.
//!
//! Rows are emitted in a fixed canonical order. The three conditional fields
//! (canceled by, end date, replaced by) only appear when source A's status is
//! inactive, and only when at least one side has a value.
//!
//! Values are compared as trimmed strings with no numeric coercion: `"5"` and
//! `"5.0"` differ. A value missing on either side never counts as a
//! difference.

use crate::profile::{ALWAYS_SHOWN, CONDITIONAL, CanonicalField, LegislationTypeProfile};
use crate::record::{MISSING_MARKER, Record, Side};
use crate::status::is_inactive;

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub field: CanonicalField,
    pub label: &'static str,
    pub value_a: Option<String>,
    pub value_b: Option<String>,
    pub differs: bool,
}

impl DiffRow {
    fn new(field: CanonicalField, value_a: Option<String>, value_b: Option<String>) -> Self {
        let differs = matches!((&value_a, &value_b), (Some(a), Some(b)) if a != b);
        Self {
            field,
            label: field.label(),
            value_a,
            value_b,
            differs,
        }
    }

    /// Source A value, or the missing marker.
    pub fn display_a(&self) -> &str {
        self.value_a.as_deref().unwrap_or(MISSING_MARKER)
    }

    /// Source B value, or the missing marker.
    pub fn display_b(&self) -> &str {
        self.value_b.as_deref().unwrap_or(MISSING_MARKER)
    }

    pub fn both_missing(&self) -> bool {
        self.value_a.is_none() && self.value_b.is_none()
    }
}

/// Build the comparison rows for one pair.
pub fn build_rows(
    record_a: &Record,
    record_b: &Record,
    profile: &LegislationTypeProfile,
) -> Vec<DiffRow> {
    let row = |field: CanonicalField| {
        DiffRow::new(
            field,
            lookup(record_a, profile, field, Side::A),
            lookup(record_b, profile, field, Side::B),
        )
    };

    let mut rows: Vec<DiffRow> = ALWAYS_SHOWN.iter().map(|&f| row(f)).collect();

    let inactive = profile
        .column(CanonicalField::Status, Side::A)
        .is_some_and(|col| is_inactive(record_a.value(col)));
    if inactive {
        rows.extend(
            CONDITIONAL
                .iter()
                .map(|&f| row(f))
                .filter(|r| !r.both_missing()),
        );
    }

    rows
}

/// Number of rows flagged as differing.
pub fn count_differences(rows: &[DiffRow]) -> usize {
    rows.iter().filter(|r| r.differs).count()
}

fn lookup(
    record: &Record,
    profile: &LegislationTypeProfile,
    field: CanonicalField,
    side: Side,
) -> Option<String> {
    profile
        .column(field, side)
        .and_then(|col| record.value(col).render())
}
