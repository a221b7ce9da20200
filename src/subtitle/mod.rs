//! Subtitle parsing module
//!
//! This module turns raw subtitle text into a normalized track:
//! - Timestamp parsing/formatting for every supported layout
//! - Format detection (WebVTT, then ASS/SSA, then SubRip)
//! - Sorting, duplicate merging and lane assignment
//! - Basic re-serialization to SubRip and WebVTT

pub mod ass;
pub mod normalize;
pub mod srt;
pub mod timecode;
pub mod webvtt;
pub mod writer;

use crate::error::{CaptionError, Result};
use crate::types::{Caption, SubtitleTrack, TrackMetadata};
use normalize::Normalizer;

/// Subtitle format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    WebVtt,
    Ass,
    SubRip,
}

impl SubtitleFormat {
    /// Order in which the parsers are tried
    pub const DETECTION_ORDER: [SubtitleFormat; 3] =
        [SubtitleFormat::WebVtt, SubtitleFormat::Ass, SubtitleFormat::SubRip];

    /// Run this format's parser; `None` means "not this format"
    pub fn parse(self, content: &str) -> Option<Vec<Caption>> {
        match self {
            SubtitleFormat::WebVtt => webvtt::parse(content),
            SubtitleFormat::Ass => ass::parse(content),
            SubtitleFormat::SubRip => srt::parse(content),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SubtitleFormat::WebVtt => "WebVTT",
            SubtitleFormat::Ass => "ASS/SSA",
            SubtitleFormat::SubRip => "SubRip (SRT)",
        }
    }
}

/// Try each parser in detection order and return the first non-empty result
pub fn parse_captions(content: &str) -> Result<(SubtitleFormat, Vec<Caption>)> {
    SubtitleFormat::DETECTION_ORDER
        .iter()
        .find_map(|format| format.parse(content).map(|captions| (*format, captions)))
        .ok_or(CaptionError::FormatUnrecognized)
}

/// Parse and normalize raw subtitle text into a (not yet enriched) track
pub fn parse_track(
    content: &str,
    metadata: TrackMetadata,
    normalizer: &Normalizer,
) -> Result<SubtitleTrack> {
    let (format, captions) = parse_captions(content)?;
    tracing::info!(
        "Parsed {} captions as {} (language={:?}, title={:?})",
        captions.len(),
        format.name(),
        metadata.language,
        metadata.title
    );
    Ok(SubtitleTrack::new(normalizer.normalize(captions), metadata))
}

/// Split text into blank-line separated blocks, normalizing line endings and
/// dropping a leading byte order mark.
pub(crate) fn split_blocks(content: &str) -> Vec<String> {
    let content = content.trim_start_matches('\u{feff}');
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}
