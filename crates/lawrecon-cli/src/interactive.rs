//! Line-driven review loop.
//!
//! Reads one key per line: `a`/`b` pick a source, `n` opens the custom form,
//! `p` goes back, `r` restarts once every pair is reviewed, `q` quits. End of
//! input quits as well.

use std::io::{self, BufRead, Write};

use indexmap::IndexMap;
use lawrecon_core::{Side, Value};
use lawrecon_review::{Action, Outcome, ReviewSession, SessionState};

use crate::display;

/// Typed at any custom-form field to abandon the form.
const CANCEL: &str = "-";

enum Form {
    Submit(IndexMap<String, Value>),
    Cancel,
    Eof,
}

pub fn run<R: BufRead, W: Write>(
    session: &mut ReviewSession,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()> {
    loop {
        let action = match session.state() {
            SessionState::Reviewing(_) => {
                show_current(session, out)?;
                let menu = format!(
                    "[a] {}  [b] {}  [n] neither  [p] previous  [q] quit > ",
                    Side::A.domain_name(),
                    Side::B.domain_name()
                );
                let Some(key) = ask(input, out, &menu)? else {
                    break;
                };
                match key.to_lowercase().as_str() {
                    "a" => Action::ChooseA,
                    "b" => Action::ChooseB,
                    "n" => Action::ChooseNeither,
                    "p" => Action::Back,
                    "q" => break,
                    other => {
                        writeln!(out, "unknown key '{other}'")?;
                        continue;
                    }
                }
            }
            SessionState::AwaitingCustomInput(_) => match custom_form(session, input, out)? {
                Form::Submit(fields) => Action::Submit(fields),
                Form::Cancel => Action::Cancel,
                Form::Eof => break,
            },
            SessionState::Complete => {
                writeln!(out, "All records reviewed.")?;
                display::write_tally(out, session.snapshot())?;
                let Some(key) = ask(input, out, "[r] restart  [q] quit > ")? else {
                    break;
                };
                match key.to_lowercase().as_str() {
                    "r" => Action::Restart,
                    "q" => break,
                    other => {
                        writeln!(out, "unknown key '{other}'")?;
                        continue;
                    }
                }
            }
        };

        match session.apply(action) {
            Ok(outcome) => report(out, &outcome)?,
            Err(e) => writeln!(out, "{e}")?,
        }
    }
    out.flush()?;
    Ok(())
}

fn show_current(session: &ReviewSession, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    display::write_progress(out, session.queue())?;
    if let Some(rows) = session.rows() {
        display::write_diff(out, &rows)?;
    }
    Ok(())
}

/// Walk every field of source A's record, blank keeps the shown value.
fn custom_form<R: BufRead, W: Write>(
    session: &ReviewSession,
    input: &mut R,
    out: &mut W,
) -> io::Result<Form> {
    let Some(template) = session.custom_template() else {
        return Ok(Form::Cancel);
    };
    writeln!(
        out,
        "Enter the correct values. Blank keeps the shown value, '{CANCEL}' cancels."
    )?;
    let mut fields = IndexMap::with_capacity(template.len());
    for (name, shown) in template {
        let Some(answer) = ask(input, out, &format!("  {name} [{shown}]: "))? else {
            return Ok(Form::Eof);
        };
        if answer == CANCEL {
            return Ok(Form::Cancel);
        }
        let text = if answer.is_empty() { shown } else { answer };
        let value = if text.is_empty() {
            Value::Empty
        } else {
            Value::Text(text)
        };
        fields.insert(name, value);
    }
    Ok(Form::Submit(fields))
}

fn report(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    if let Some(warning) = &outcome.persist_warning {
        writeln!(out, "warning: progress not saved ({warning}); it will be retried on the next step")?;
    }
    Ok(())
}

/// Prompt and read one trimmed line; `None` at end of input.
fn ask<R: BufRead>(input: &mut R, out: &mut impl Write, prompt: &str) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    use lawrecon_core::{FieldMapper, Record, ReviewQueue};
    use lawrecon_store::VerdictStore;

    fn records(n: usize, name_col: &str, prefix: &str) -> Vec<Record> {
        (0..n)
            .map(|i| {
                [
                    (name_col, Value::from(format!("{prefix}{i}"))),
                    ("Status", Value::Int(1)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn session(dir: &Path, a: usize, b: usize) -> ReviewSession {
        let profile = FieldMapper::builtin().resolve("bylaw").unwrap().clone();
        let queue = ReviewQueue::new(records(a, "LegName", "a"), records(b, "ByLawName", "b"));
        ReviewSession::new(queue, profile, VerdictStore::open(dir))
    }

    fn drive(session: &mut ReviewSession, script: &str) -> String {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        run(session, &mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn full_review_with_custom_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), 3, 5);
        let out = drive(&mut s, "a\nB\nn\ncorrected\n\nq\n");

        let log = &s.snapshot().verdicts;
        let sources: Vec<&str> = log.iter().map(|v| v.chosen_source.as_str()).collect();
        assert_eq!(sources, vec!["A", "B", "custom"]);
        assert_eq!(log[2].fields.get("LegName"), Some(&Value::from("corrected")));
        assert_eq!(log[2].fields.get("Status"), Some(&Value::from("1")));
        assert_eq!(s.state(), SessionState::Complete);
        assert!(out.contains("All records reviewed."));
        assert!(out.contains("3 verdicts (A: 1, B: 1, custom: 1)"));
    }

    #[test]
    fn cancelled_form_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), 2, 2);
        drive(&mut s, "n\n-\nq\n");
        assert!(s.snapshot().verdicts.is_empty());
        assert_eq!(s.state(), SessionState::Reviewing(0));
    }

    #[test]
    fn end_of_input_stops_and_keeps_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), 3, 3);
        drive(&mut s, "a\n");
        assert_eq!(s.state(), SessionState::Reviewing(1));
        assert_eq!(VerdictStore::load(dir.path()).cursor, 1);
    }

    #[test]
    fn previous_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), 3, 3);
        let out = drive(&mut s, "a\np\nx\nq\n");
        assert!(out.contains("unknown key 'x'"));
        assert_eq!(s.state(), SessionState::Reviewing(0));
        assert_eq!(s.snapshot().verdicts.len(), 1);
    }

    #[test]
    fn restart_after_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), 1, 1);
        drive(&mut s, "a\nr\nq\n");
        assert_eq!(s.state(), SessionState::Reviewing(0));
        assert_eq!(s.snapshot().verdicts.len(), 1);
    }

    #[test]
    fn failed_save_is_shown_to_reviewer() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("state");
        std::fs::write(&blocker, "").unwrap();
        let mut s = session(&blocker, 2, 2);
        let out = drive(&mut s, "a\nq\n");
        assert!(out.contains("warning: progress not saved"));
        assert_eq!(s.snapshot().verdicts.len(), 1);
    }
}
