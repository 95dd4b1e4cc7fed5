//! Core types for reconciling two legislation datasets: records, field
//! profiles, status parsing, the diff engine, and the review queue.

pub mod diff;
pub mod profile;
pub mod queue;
pub mod record;
pub mod status;
pub mod verdict;

pub use diff::{DiffRow, build_rows, count_differences};
pub use profile::{CanonicalField, ColumnPair, FieldMapper, LegislationTypeProfile, ProfileError};
pub use queue::{PairedRecord, Progress, QueueError, ReviewQueue, StepState};
pub use record::{MISSING_MARKER, Record, Side, Value};
pub use status::parse_status;
pub use verdict::{ChosenSource, ReviewState, Verdict};
