//! SubRip (line-block) parser
//!
//! Blocks are separated by blank lines. Each block is an optional numeric
//! index line, a `start --> end` timing line and one or more text lines.

use super::timecode::{parse_timestamp, TimestampLayout};
use super::split_blocks;
use crate::types::Caption;

/// Parse SubRip text. Returns `None` when no valid entry was found.
pub fn parse(content: &str) -> Option<Vec<Caption>> {
    let captions: Vec<Caption> = split_blocks(content)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect();

    if captions.is_empty() {
        None
    } else {
        Some(captions)
    }
}

fn parse_block(block: &str) -> Option<Caption> {
    let lines: Vec<&str> = block.lines().collect();

    // The index line is optional; the timing line is either first or second.
    let timing_pos = lines.iter().take(2).position(|l| l.contains("-->"))?;
    let (start, end) = parse_timing_line(lines[timing_pos])?;

    let text_lines: Vec<&str> = lines[timing_pos + 1..]
        .iter()
        .map(|l| l.trim_end())
        .collect();
    if text_lines.iter().all(|l| l.is_empty()) {
        return None;
    }

    let text = decode_entities(&text_lines.join("\n"));
    let caption = Caption::new(start, end, text);
    if caption.is_none() {
        tracing::debug!("Dropping SubRip entry with end <= start: {}", lines[timing_pos]);
    }
    caption
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let caps = regex!(r"^\s*(\S+)\s*-->\s*(\S+)").captures(line)?;
    let start = parse_srt_timestamp(&caps[1])?;
    let end = parse_srt_timestamp(&caps[2])?;
    Some((start, end))
}

/// Accepts the comma layout, and the dot layout some encoders emit.
fn parse_srt_timestamp(text: &str) -> Option<f64> {
    parse_timestamp(text, TimestampLayout::CommaMillis)
        .or_else(|_| parse_timestamp(text, TimestampLayout::DotMillis))
        .map_err(|e| tracing::debug!("Skipping SubRip block: {}", e))
        .ok()
}

/// Decode the HTML entities SubRip files commonly carry.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
