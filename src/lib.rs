//! Caption Annotator
//!
//! Parses SubRip, WebVTT and ASS/SSA subtitles into a normalized, lane
//! assigned caption model, enriches Japanese captions with morphological
//! tokens and furigana through a chain of fallible analyzers, and tracks
//! which captions are active as playback time advances.

// Regex compiled once per call site.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod config_file;
pub mod enrich;
pub mod error;
pub mod export;
pub mod furigana;
pub mod http;
pub mod pipeline;
pub mod state;
pub mod subtitle;
pub mod types;

#[cfg(test)]
mod integration;

pub use config::{AppConfig, PipelineConfig};
pub use error::{CaptionError, Result};
pub use pipeline::Pipeline;
pub use state::{AppState, PlaybackState};
pub use types::{Caption, FuriganaSegment, SubtitleTrack, Token, TrackMetadata};
