//! Positional pairing of the two sources and the review cursor.
//!
//! Record `i` of source A is judged against record `i` of source B. Records
//! beyond the shorter source are never reviewed. The queue has no durability
//! of its own: callers persist the cursor after every move.

use thiserror::Error;

use crate::record::Record;

/// Number of steps shown in the progress strip.
pub const STEP_WINDOW: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("cursor {cursor} is past the last pair (paired count {paired_count})")]
    OutOfRange { cursor: usize, paired_count: usize },
}

/// The unit a reviewer judges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedRecord<'a> {
    pub index: usize,
    pub record_a: &'a Record,
    pub record_b: &'a Record,
}

/// Position summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the current pair (capped at `total`).
    pub position: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Done,
    Current,
    Upcoming,
}

/// Ordered pairs of records plus the review cursor.
#[derive(Debug, Clone)]
pub struct ReviewQueue {
    source_a: Vec<Record>,
    source_b: Vec<Record>,
    cursor: usize,
}

impl ReviewQueue {
    pub fn new(source_a: Vec<Record>, source_b: Vec<Record>) -> Self {
        Self {
            source_a,
            source_b,
            cursor: 0,
        }
    }

    pub fn paired_count(&self) -> usize {
        self.source_a.len().min(self.source_b.len())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_current(&self) -> bool {
        self.cursor < self.paired_count()
    }

    pub fn is_complete(&self) -> bool {
        !self.has_current()
    }

    pub fn current(&self) -> Result<PairedRecord<'_>, QueueError> {
        self.get(self.cursor)
    }

    /// The pair at `index`, independent of the cursor.
    pub fn get(&self, index: usize) -> Result<PairedRecord<'_>, QueueError> {
        match (self.source_a.get(index), self.source_b.get(index)) {
            (Some(record_a), Some(record_b)) => Ok(PairedRecord {
                index,
                record_a,
                record_b,
            }),
            _ => Err(QueueError::OutOfRange {
                cursor: index,
                paired_count: self.paired_count(),
            }),
        }
    }

    /// Move to the next pair. Stepping off the last pair completes the
    /// queue; advancing a complete queue does nothing.
    pub fn advance(&mut self) {
        if self.cursor < self.paired_count() {
            self.cursor += 1;
        }
    }

    pub fn retreat(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Jump to a persisted cursor, clamped to the paired count.
    pub fn seek(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.paired_count());
    }

    pub fn progress(&self) -> Progress {
        let total = self.paired_count();
        if total == 0 {
            return Progress {
                position: 0,
                total,
                percent: 0,
            };
        }
        let position = (self.cursor + 1).min(total);
        Progress {
            position,
            total,
            percent: (position * 100 / total) as u8,
        }
    }

    /// Indices of the progress strip around the cursor.
    ///
    /// Shows the first `width` pairs at the start, the last `width` near the
    /// end, and otherwise keeps the cursor in the middle.
    pub fn step_window(&self, width: usize) -> Vec<(usize, StepState)> {
        let total = self.paired_count();
        let width = width.min(total);
        let half = width / 2;
        let start = if total <= width || self.cursor < half {
            0
        } else if self.cursor + (width - half) >= total {
            total - width
        } else {
            self.cursor - half
        };
        (start..start + width)
            .map(|i| {
                let state = match i.cmp(&self.cursor) {
                    std::cmp::Ordering::Less => StepState::Done,
                    std::cmp::Ordering::Equal => StepState::Current,
                    std::cmp::Ordering::Greater => StepState::Upcoming,
                };
                (i, state)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize, prefix: &str) -> Vec<Record> {
        (0..n)
            .map(|i| [("LegName", format!("{prefix}{i}"))].into_iter().collect())
            .collect()
    }

    fn queue(a: usize, b: usize) -> ReviewQueue {
        ReviewQueue::new(records(a, "a"), records(b, "b"))
    }

    #[test]
    fn paired_count_is_shorter_source() {
        assert_eq!(queue(3, 5).paired_count(), 3);
        assert_eq!(queue(5, 3).paired_count(), 3);
        assert_eq!(queue(0, 5).paired_count(), 0);
    }

    #[test]
    fn pairing_is_positional() {
        let q = queue(3, 5);
        let pair = q.get(2).unwrap();
        assert_eq!(pair.index, 2);
        assert_eq!(pair.record_a.value("LegName").to_string(), "a2");
        assert_eq!(pair.record_b.value("LegName").to_string(), "b2");
    }

    #[test]
    fn retreat_at_zero_is_noop() {
        let mut q = queue(3, 3);
        q.retreat();
        assert_eq!(q.cursor(), 0);
    }

    #[test]
    fn advance_off_last_pair_completes() {
        let mut q = queue(3, 3);
        q.advance();
        q.advance();
        assert_eq!(q.cursor(), 2);
        assert!(!q.is_complete());
        q.advance();
        assert!(q.is_complete());
        assert_eq!(q.cursor(), 3);
        q.advance();
        q.advance();
        assert_eq!(q.cursor(), 3);
    }

    #[test]
    fn current_out_of_range_when_complete() {
        let mut q = queue(1, 1);
        q.advance();
        assert_eq!(
            q.current(),
            Err(QueueError::OutOfRange {
                cursor: 1,
                paired_count: 1
            })
        );
    }

    #[test]
    fn empty_queue_is_complete() {
        let q = queue(0, 0);
        assert!(q.is_complete());
        assert!(q.current().is_err());
        assert_eq!(q.progress().percent, 0);
        assert!(q.step_window(STEP_WINDOW).is_empty());
    }

    #[test]
    fn seek_clamps_to_paired_count() {
        let mut q = queue(3, 4);
        q.seek(10);
        assert_eq!(q.cursor(), 3);
        q.seek(1);
        assert_eq!(q.cursor(), 1);
        q.reset();
        assert_eq!(q.cursor(), 0);
    }

    #[test]
    fn progress_percent() {
        let mut q = queue(4, 4);
        assert_eq!(
            q.progress(),
            Progress {
                position: 1,
                total: 4,
                percent: 25
            }
        );
        q.seek(4);
        assert_eq!(q.progress().percent, 100);
        assert_eq!(q.progress().position, 4);
    }

    #[test]
    fn step_window_short_queue_shows_all() {
        let mut q = queue(3, 3);
        q.advance();
        let steps = q.step_window(STEP_WINDOW);
        assert_eq!(
            steps,
            vec![
                (0, StepState::Done),
                (1, StepState::Current),
                (2, StepState::Upcoming)
            ]
        );
    }

    #[test]
    fn step_window_slides_with_cursor() {
        let mut q = queue(10, 10);
        let idx = |q: &ReviewQueue| -> Vec<usize> {
            q.step_window(STEP_WINDOW).into_iter().map(|(i, _)| i).collect()
        };
        assert_eq!(idx(&q), vec![0, 1, 2, 3, 4]);
        q.seek(1);
        assert_eq!(idx(&q), vec![0, 1, 2, 3, 4]);
        q.seek(5);
        assert_eq!(idx(&q), vec![3, 4, 5, 6, 7]);
        q.seek(7);
        assert_eq!(idx(&q), vec![5, 6, 7, 8, 9]);
        q.seek(9);
        assert_eq!(idx(&q), vec![5, 6, 7, 8, 9]);
        q.seek(10);
        let steps = q.step_window(STEP_WINDOW);
        assert!(steps.iter().all(|(_, s)| *s == StepState::Done));
    }
}
