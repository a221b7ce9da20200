//! ASS/SSA (dialogue-line) parser
//!
//! Only `Dialogue:` lines are read. Their comma separated fields are:
//!
//! ```text
//! Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
//! ```
//!
//! The text field may itself contain commas, so everything after the ninth
//! separator is kept together.

use super::timecode::{parse_timestamp, TimestampLayout};
use crate::types::Caption;

const DIALOGUE_MARKER: &str = "Dialogue:";
const FIELD_COUNT: usize = 10;

/// Parse ASS/SSA text. Returns `None` when no valid dialogue line was found.
pub fn parse(content: &str) -> Option<Vec<Caption>> {
    let captions: Vec<Caption> = content
        .lines()
        .map(str::trim_start)
        .filter_map(|line| line.strip_prefix(DIALOGUE_MARKER))
        .filter_map(parse_dialogue)
        .collect();

    if captions.is_empty() {
        None
    } else {
        Some(captions)
    }
}

fn parse_dialogue(fields: &str) -> Option<Caption> {
    let fields: Vec<&str> = fields.splitn(FIELD_COUNT, ',').map(str::trim).collect();
    if fields.len() < FIELD_COUNT {
        tracing::debug!("Skipping dialogue line with {} fields", fields.len());
        return None;
    }

    let start = parse_timestamp(fields[1], TimestampLayout::Tabular)
        .map_err(|e| tracing::debug!("Skipping dialogue line: {}", e))
        .ok()?;
    let end = parse_timestamp(fields[2], TimestampLayout::Tabular)
        .map_err(|e| tracing::debug!("Skipping dialogue line: {}", e))
        .ok()?;

    let text = strip_override_tags(fields[9]);
    if text.trim().is_empty() {
        return None;
    }

    Caption::new(start, end, text).map(|c| c.with_voice(voice_label(fields[3], fields[4])))
}

/// Both style and actor name must be present to form a label
fn voice_label(style: &str, name: &str) -> Option<String> {
    if style.is_empty() || name.is_empty() {
        None
    } else {
        Some(format!("{} ({})", name, style))
    }
}

/// Remove `{\...}` override blocks and turn `\N` / `\n` into line breaks
pub fn strip_override_tags(text: &str) -> String {
    regex!(r"\{\\[^}]*\}")
        .replace_all(text, "")
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", "\u{a0}")
}
