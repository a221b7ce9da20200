//! Caption, track and token types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One morphological token as produced by an analyzer backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Text as written in the caption
    pub surface_form: String,
    /// Dictionary (lemma) form
    pub basic_form: String,
    /// Phonetic form; script depends on the backend
    pub reading: String,
    /// Free-form part-of-speech tag
    pub part_of_speech: String,
}

impl Token {
    /// Token whose lemma and reading are just the surface text
    pub fn plain(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        Self {
            basic_form: surface.clone(),
            reading: surface.clone(),
            surface_form: surface,
            part_of_speech: "unknown".to_string(),
        }
    }
}

/// A run of caption text with an optional ruby reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuriganaSegment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
}

/// A timed subtitle unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    /// Assigned at parse time, stable for the caption's lifetime
    pub id: String,
    /// Seconds
    pub start_time: f64,
    /// Seconds, always greater than `start_time`
    pub end_time: f64,
    /// Display text, may still contain format markup
    pub text: String,
    pub voice: Option<String>,
    /// Vertical stacking slot
    pub lane: usize,
    pub furigana: Option<Vec<FuriganaSegment>>,
    pub tokens: Option<Vec<Token>>,
}

impl Caption {
    /// Create a caption; returns `None` unless `end_time > start_time`
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Option<Self> {
        if !(end_time > start_time) {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time,
            text: text.into(),
            voice: None,
            lane: 0,
            furigana: None,
            tokens: None,
        })
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Inclusive on both ends
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Length of the temporal intersection with `other` (0 when disjoint)
    pub fn intersection(&self, other: &Caption) -> f64 {
        let start = self.start_time.max(other.start_time);
        let end = self.end_time.min(other.end_time);
        (end - start).max(0.0)
    }

    pub fn is_enriched(&self) -> bool {
        self.furigana.is_some() || self.tokens.is_some()
    }
}

/// Descriptive information supplied with a track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub language: Option<String>,
    pub title: Option<String>,
}

impl TrackMetadata {
    pub fn new(language: Option<String>, title: Option<String>) -> Self {
        Self { language, title }
    }

    /// Enrichment is Japanese-specific; a track with no declared language is
    /// still enriched.
    pub fn wants_enrichment(&self) -> bool {
        match self.language.as_deref() {
            None => true,
            Some(lang) => is_japanese_language_tag(lang),
        }
    }
}

fn is_japanese_language_tag(lang: &str) -> bool {
    let lang = lang.trim().to_ascii_lowercase();
    if lang.is_empty() {
        return true;
    }
    let primary = lang.split(['-', '_']).next().unwrap_or("");
    matches!(primary, "ja" | "jp" | "jpn" | "japanese")
}

/// An ordered collection of captions sharing one language/title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Time-sorted and lane-assigned
    pub captions: Vec<Caption>,
    pub metadata: TrackMetadata,
}

impl SubtitleTrack {
    pub fn new(captions: Vec<Caption>, metadata: TrackMetadata) -> Self {
        Self { captions, metadata }
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Captions whose interval contains `time`
    pub fn captions_at(&self, time: f64) -> impl Iterator<Item = &Caption> {
        self.captions.iter().filter(move |c| c.is_active_at(time))
    }

    pub fn caption_by_id(&self, id: &str) -> Option<&Caption> {
        self.captions.iter().find(|c| c.id == id)
    }

    /// Same language, title and caption count
    pub fn is_duplicate_of(&self, other: &SubtitleTrack) -> bool {
        self.metadata == other.metadata && self.captions.len() == other.captions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_requires_positive_duration() {
        assert!(Caption::new(1.0, 1.0, "x").is_none());
        assert!(Caption::new(2.0, 1.0, "x").is_none());
        assert!(Caption::new(f64::NAN, 1.0, "x").is_none());
        let caption = Caption::new(1.0, 2.5, "x").unwrap();
        assert_eq!(caption.duration(), 1.5);
        assert_eq!(caption.lane, 0);
        assert!(!caption.is_enriched());
    }

    #[test]
    fn test_caption_ids_are_unique() {
        let a = Caption::new(0.0, 1.0, "a").unwrap();
        let b = Caption::new(0.0, 1.0, "a").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_is_active_at_is_inclusive() {
        let caption = Caption::new(1.0, 2.0, "x").unwrap();
        assert!(caption.is_active_at(1.0));
        assert!(caption.is_active_at(2.0));
        assert!(!caption.is_active_at(2.001));
        assert!(!caption.is_active_at(0.999));
    }

    #[test]
    fn test_intersection() {
        let a = Caption::new(1.0, 2.0, "x").unwrap();
        let b = Caption::new(1.5, 3.0, "x").unwrap();
        let c = Caption::new(4.0, 5.0, "x").unwrap();
        assert!((a.intersection(&b) - 0.5).abs() < 1e-9);
        assert_eq!(a.intersection(&c), 0.0);
    }

    #[test]
    fn test_wants_enrichment() {
        assert!(TrackMetadata::default().wants_enrichment());
        assert!(TrackMetadata::new(Some("ja".into()), None).wants_enrichment());
        assert!(TrackMetadata::new(Some("ja-JP".into()), None).wants_enrichment());
        assert!(TrackMetadata::new(Some("JPN".into()), None).wants_enrichment());
        assert!(!TrackMetadata::new(Some("en".into()), None).wants_enrichment());
        assert!(!TrackMetadata::new(Some("zh-Hans".into()), None).wants_enrichment());
    }

    #[test]
    fn test_caption_serializes_camel_case() {
        let caption = Caption::new(1.0, 2.0, "x").unwrap();
        let json = serde_json::to_value(&caption).unwrap();
        assert_eq!(json["startTime"], 1.0);
        assert_eq!(json["endTime"], 2.0);
        assert!(json["furigana"].is_null());
    }
}
