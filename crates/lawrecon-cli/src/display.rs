//! Terminal rendering for the review loop and the reporting commands.
//!
//! Everything writes to a caller-supplied `Write` so the interactive loop can
//! be driven from tests.

use std::io::{self, Write};

use anyhow::Context;
use arrow::util::pretty::pretty_format_batches;
use lawrecon_core::queue::STEP_WINDOW;
use lawrecon_core::{DiffRow, ReviewQueue, ReviewState, Side, StepState, count_differences};
use lawrecon_store::export::verdicts_to_batch;

const LABEL_WIDTH: usize = 14;
const VALUE_WIDTH: usize = 36;
const DIFF_MARK: &str = "≠";

// ── Diff table ──

/// Print the comparison rows, marking those that differ.
pub fn write_diff(out: &mut impl Write, rows: &[DiffRow]) -> io::Result<()> {
    writeln!(
        out,
        "  {:<lw$} {:<vw$} {}",
        "",
        Side::A.domain_name(),
        Side::B.domain_name(),
        lw = LABEL_WIDTH,
        vw = VALUE_WIDTH,
    )?;
    for row in rows {
        let mark = if row.differs { DIFF_MARK } else { " " };
        writeln!(
            out,
            "{mark} {:<lw$} {:<vw$} {}",
            row.label,
            row.display_a(),
            row.display_b(),
            lw = LABEL_WIDTH,
            vw = VALUE_WIDTH,
        )?;
    }
    match count_differences(rows) {
        0 => writeln!(out, "  sources agree on every shown field"),
        1 => writeln!(out, "  1 field differs"),
        n => writeln!(out, "  {n} fields differ"),
    }
}

// ── Progress ──

/// One-line progress: position, percentage and the step strip.
pub fn write_progress(out: &mut impl Write, queue: &ReviewQueue) -> io::Result<()> {
    let p = queue.progress();
    let strip: Vec<String> = queue
        .step_window(STEP_WINDOW)
        .into_iter()
        .map(|(i, state)| match state {
            StepState::Done => format!("✓{}", i + 1),
            StepState::Current => format!("[{}]", i + 1),
            StepState::Upcoming => (i + 1).to_string(),
        })
        .collect();
    writeln!(
        out,
        "Record {} of {} ({}%)   {}",
        p.position,
        p.total,
        p.percent,
        strip.join(" ")
    )
}

// ── Verdicts ──

pub fn write_tally(out: &mut impl Write, state: &ReviewState) -> io::Result<()> {
    let parts: Vec<String> = state
        .tally()
        .iter()
        .map(|(source, n)| format!("{source}: {n}"))
        .collect();
    writeln!(
        out,
        "{} verdicts ({})",
        state.verdicts.len(),
        parts.join(", ")
    )
}

/// The verdict log as a bordered table, one row per verdict.
pub fn format_verdicts(state: &ReviewState) -> anyhow::Result<String> {
    let batch = verdicts_to_batch(&state.verdicts).context("building verdict table")?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting verdict table")?
        .to_string())
}
