//! Basic re-serialization of a track to SubRip or WebVTT text

use std::fmt::Write as FmtWrite;

use super::timecode::{format_timestamp, TimestampLayout};
use crate::types::SubtitleTrack;

/// Serialize a track as SubRip
pub fn to_srt(track: &SubtitleTrack) -> String {
    let mut out = String::new();
    for (i, caption) in track.captions.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(caption.start_time, TimestampLayout::CommaMillis),
            format_timestamp(caption.end_time, TimestampLayout::CommaMillis),
            cue_text(&caption.text)
        );
    }
    out
}

/// Serialize a track as WebVTT. Voices are written as `<v>` spans unless the
/// text already carries one.
pub fn to_webvtt(track: &SubtitleTrack) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for caption in &track.captions {
        let body = cue_text(&caption.text);
        let text = match &caption.voice {
            Some(voice) if !body.starts_with("<v") => format!("<v {}>{}", voice, body),
            _ => body,
        };
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            format_timestamp(caption.start_time, TimestampLayout::DotMillis),
            format_timestamp(caption.end_time, TimestampLayout::DotMillis),
            text
        );
    }
    out
}

/// Both formats end a cue at the first blank line, so blank lines inside the
/// text are dropped.
fn cue_text(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
