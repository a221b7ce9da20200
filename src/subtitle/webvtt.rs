//! WebVTT (cue-block) parser
//!
//! The first line must carry the `WEBVTT` header. Cues are blank-line
//! separated blocks of an optional identifier, a timing line (cue settings
//! after the end timestamp are ignored) and the cue text. Text is kept as
//! written; no entity decoding happens here.

use super::split_blocks;
use super::timecode::{parse_timestamp, TimestampLayout};
use crate::types::Caption;

const HEADER: &str = "WEBVTT";

/// Parse WebVTT text. Returns `None` without the header or without any cue.
pub fn parse(content: &str) -> Option<Vec<Caption>> {
    let content = content.trim_start_matches('\u{feff}');
    let first_line = content.lines().next()?;
    if !first_line.trim_start().starts_with(HEADER) {
        return None;
    }

    let captions: Vec<Caption> = split_blocks(content)
        .iter()
        .skip(1) // header block, including any header metadata lines
        .filter(|block| !is_metadata_block(block))
        .filter_map(|block| parse_cue(block))
        .collect();

    if captions.is_empty() {
        None
    } else {
        Some(captions)
    }
}

fn is_metadata_block(block: &str) -> bool {
    let first = block.lines().next().unwrap_or("");
    ["NOTE", "STYLE", "REGION"]
        .iter()
        .any(|kw| first == *kw || first.starts_with(&format!("{} ", kw)))
}

fn parse_cue(block: &str) -> Option<Caption> {
    let lines: Vec<&str> = block.lines().collect();
    let timing_pos = lines.iter().take(2).position(|l| l.contains("-->"))?;

    let caps = regex!(r"^\s*(\S+)\s+-->\s+(\S+)").captures(lines[timing_pos])?;
    let start = parse_timestamp(&caps[1], TimestampLayout::DotMillis)
        .map_err(|e| tracing::debug!("Skipping WebVTT cue: {}", e))
        .ok()?;
    let end = parse_timestamp(&caps[2], TimestampLayout::DotMillis)
        .map_err(|e| tracing::debug!("Skipping WebVTT cue: {}", e))
        .ok()?;

    let text = lines[timing_pos + 1..].join("\n");
    if text.trim().is_empty() {
        return None;
    }

    let voice = voice_span(&text);
    Caption::new(start, end, text).map(|c| c.with_voice(voice))
}

/// Speaker from a leading `<v Name>` or `<v.class Name>` span
fn voice_span(text: &str) -> Option<String> {
    regex!(r"^<v(?:\.[\w.-]+)?\s+([^>]+)>")
        .captures(text.trim_start())
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}
