//! Status code normalisation.
//!
//! Status columns arrive as integers, floats, numeric strings with either
//! decimal separator, or the Arabic token for "not in force". All of these
//! collapse to a small integer code; anything else is unknown. Arabic-Indic
//! and Eastern Arabic-Indic digits count as digits.

use std::borrow::Cow;

use tracing::debug;

use crate::record::Value;

/// Status code meaning inactive/superseded.
pub const INACTIVE: i64 = 2;

/// Textual token meaning "not in force".
pub const INACTIVE_TOKEN: &str = "غير ساري";

/// Parse a status cell into its integer code.
///
/// Returns `None` for empty or unparseable input. Never panics.
pub fn parse_status(value: &Value) -> Option<i64> {
    match value {
        Value::Empty => None,
        Value::Int(i) => Some(*i),
        Value::Float(f) => truncate(*f),
        Value::Text(s) => parse_status_str(s),
    }
}

fn parse_status_str(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == INACTIVE_TOKEN {
        return Some(INACTIVE);
    }
    let v = ascii_digits(trimmed);
    let v = v.as_ref();
    if v.bytes().all(|b| b.is_ascii_digit()) {
        return v.parse().ok();
    }
    let parsed = parse_decimal(v);
    if parsed.is_none() {
        debug!(value = v, "unrecognised status value");
    }
    parsed
}

/// True when `value` parses to the inactive code.
pub fn is_inactive(value: &Value) -> bool {
    parse_status(value) == Some(INACTIVE)
}

/// Rewrite U+0660..=U+0669 and U+06F0..=U+06F9 as ASCII digits.
fn ascii_digits(v: &str) -> Cow<'_, str> {
    if v.is_ascii() {
        return Cow::Borrowed(v);
    }
    Cow::Owned(
        v.chars()
            .map(|c| match c {
                '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
                '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
                _ => c,
            })
            .collect(),
    )
}

/// Digits with exactly one `,` or `.` separator and an optional sign.
fn parse_decimal(v: &str) -> Option<i64> {
    let unsigned = v.strip_prefix(['-', '+']).unwrap_or(v);
    let mut separators = 0;
    let mut digits = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            ',' | '.' => separators += 1,
            _ => return None,
        }
    }
    if separators != 1 || digits == 0 {
        return None;
    }
    v.replace(',', ".").parse::<f64>().ok().and_then(truncate)
}

fn truncate(f: f64) -> Option<i64> {
    if !f.is_finite() || f >= i64::MAX as f64 || f < i64::MIN as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}
