//! Timestamp parsing and formatting
//!
//! Converts between the textual timestamp layouts used by the supported
//! subtitle formats and seconds as `f64`. Formatting truncates the sub-second
//! part, so `format(parse(s)) == s` for every well-formed `s`.

use crate::error::{CaptionError, Result};

/// Textual timestamp layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    /// `HH:MM:SS,mmm` (SubRip)
    CommaMillis,
    /// `HH:MM:SS.mmm` or `MM:SS.mmm` (WebVTT)
    DotMillis,
    /// `H:MM:SS.cc`, centiseconds (ASS/SSA dialogue fields)
    Tabular,
}

/// Absorbs binary representation error before truncating, e.g. 1.001 * 1000
/// evaluating to 1000.9999999999999.
const TRUNCATION_EPSILON: f64 = 1e-6;

/// Parse a timestamp in the given layout into seconds
pub fn parse_timestamp(input: &str, layout: TimestampLayout) -> Result<f64> {
    let input = input.trim();
    let caps = match layout {
        TimestampLayout::CommaMillis => regex!(r"^(\d{1,2}):(\d{2}):(\d{2}),(\d{3})$").captures(input),
        TimestampLayout::DotMillis => {
            regex!(r"^(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})$").captures(input)
        }
        TimestampLayout::Tabular => regex!(r"^(\d{1,2}):(\d{2}):(\d{2})\.(\d{2})$").captures(input),
    }
    .ok_or_else(|| CaptionError::TimestampUnparseable(input.to_string()))?;

    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let (hours, minutes, seconds, fraction) = (field(1), field(2), field(3), field(4));
    if minutes >= 60 || seconds >= 60 {
        return Err(CaptionError::TimestampUnparseable(input.to_string()));
    }

    let fraction_secs = match layout {
        TimestampLayout::Tabular => fraction as f64 / 100.0,
        _ => fraction as f64 / 1000.0,
    };

    Ok((hours * 3600 + minutes * 60 + seconds) as f64 + fraction_secs)
}

/// Format seconds in the given layout, truncating sub-second precision
pub fn format_timestamp(secs: f64, layout: TimestampLayout) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };

    match layout {
        TimestampLayout::Tabular => {
            let total_cs = (secs * 100.0 + TRUNCATION_EPSILON).floor() as u64;
            let (h, m, s, cs) = split_units(total_cs, 100);
            format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
        }
        TimestampLayout::CommaMillis | TimestampLayout::DotMillis => {
            let total_ms = (secs * 1000.0 + TRUNCATION_EPSILON).floor() as u64;
            let (h, m, s, ms) = split_units(total_ms, 1000);
            let sep = if layout == TimestampLayout::CommaMillis { ',' } else { '.' };
            format!("{:02}:{:02}:{:02}{}{:03}", h, m, s, sep, ms)
        }
    }
}

fn split_units(total: u64, per_second: u64) -> (u64, u64, u64, u64) {
    let fraction = total % per_second;
    let whole = total / per_second;
    (whole / 3600, (whole % 3600) / 60, whole % 60, fraction)
}
