//! Application state management
//!
//! This module defines:
//! - `PlaybackState`: loaded tracks, playback time and the derived set of
//!   active caption ids
//! - `AppState`: the pipeline, playback state and exporter shared by handlers

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{CaptionError, Result};
use crate::export::{CardExporter, ExportReceipt, ExportRequest, LoggingExporter};
use crate::pipeline::Pipeline;
use crate::types::{Caption, SubtitleTrack, TrackMetadata};

/// How many tracks are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    Empty,
    Single,
    Multi,
}

/// Target of a caption navigation shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekDirection {
    /// Start of the caption before the current one
    Previous,
    /// Start of the caption being shown (replay line)
    Current,
    /// Start of the next caption
    Next,
}

/// Tracks plus playback position.
///
/// `active_caption_ids` is recomputed on every mutation and always equals the
/// ids of the active track's captions whose interval contains `current_time`.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    tracks: Vec<SubtitleTrack>,
    active_track_index: usize,
    current_time: f64,
    active_caption_ids: HashSet<String>,
    secondary_visible: bool,
    /// Bumped when all tracks are cleared; loads started earlier are discarded
    generation: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            active_track_index: 0,
            current_time: 0.0,
            active_caption_ids: HashSet::new(),
            secondary_visible: true,
            generation: 0,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[SubtitleTrack] {
        &self.tracks
    }

    pub fn active_track_index(&self) -> usize {
        self.active_track_index
    }

    pub fn active_track(&self) -> Option<&SubtitleTrack> {
        self.tracks.get(self.active_track_index)
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn active_caption_ids(&self) -> &HashSet<String> {
        &self.active_caption_ids
    }

    pub fn secondary_visible(&self) -> bool {
        self.secondary_visible
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mode(&self) -> TrackMode {
        match self.tracks.len() {
            0 => TrackMode::Empty,
            1 => TrackMode::Single,
            _ => TrackMode::Multi,
        }
    }

    fn refresh_active(&mut self) {
        let time = self.current_time;
        self.active_caption_ids = self
            .tracks
            .get(self.active_track_index)
            .map(|track| track.captions_at(time).map(|c| c.id.clone()).collect())
            .unwrap_or_default();
    }

    /// Move the playhead. Idempotent.
    pub fn set_current_time(&mut self, time: f64) {
        if time.is_finite() {
            self.current_time = time.max(0.0);
        }
        self.refresh_active();
    }

    /// Advance to the next track, wrapping around. Returns the new index.
    pub fn cycle_active_track(&mut self) -> usize {
        if !self.tracks.is_empty() {
            self.active_track_index = (self.active_track_index + 1) % self.tracks.len();
        }
        self.refresh_active();
        self.active_track_index
    }

    pub fn set_active_track(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(CaptionError::TrackNotFound(index));
        }
        self.active_track_index = index;
        self.refresh_active();
        Ok(())
    }

    /// Publish a fully enriched track. `generation` is the value of
    /// [`generation`](Self::generation) when the load started.
    pub fn add_track(&mut self, track: SubtitleTrack, generation: u64) -> Result<usize> {
        if generation != self.generation {
            tracing::info!(
                "Discarding track loaded under generation {} (now {})",
                generation,
                self.generation
            );
            return Err(CaptionError::LoadAbandoned);
        }

        if self.tracks.iter().any(|t| t.is_duplicate_of(&track)) {
            let TrackMetadata { language, title } = track.metadata;
            tracing::warn!(
                "Ignoring duplicate track (language={:?}, title={:?}, {} captions)",
                language,
                title,
                track.captions.len()
            );
            return Err(CaptionError::DuplicateTrack {
                language,
                title,
                caption_count: track.captions.len(),
            });
        }

        self.tracks.push(track);
        self.refresh_active();
        Ok(self.tracks.len() - 1)
    }

    pub fn remove_track(&mut self, index: usize) -> Result<SubtitleTrack> {
        if index >= self.tracks.len() {
            return Err(CaptionError::TrackNotFound(index));
        }
        let removed = self.tracks.remove(index);

        if index < self.active_track_index {
            self.active_track_index -= 1;
        } else if self.active_track_index >= self.tracks.len() {
            self.active_track_index = 0;
        }
        self.refresh_active();
        Ok(removed)
    }

    /// Drop every track. Loads still in flight will be discarded.
    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
        self.active_track_index = 0;
        self.active_caption_ids.clear();
        self.generation += 1;
    }

    pub fn set_secondary_visible(&mut self, visible: bool) {
        self.secondary_visible = visible;
    }

    /// Captions of the active track shown at the current time, by lane
    pub fn active_captions(&self) -> Vec<&Caption> {
        let mut captions: Vec<&Caption> = self
            .active_track()
            .map(|track| {
                track
                    .captions
                    .iter()
                    .filter(|c| self.active_caption_ids.contains(&c.id))
                    .collect()
            })
            .unwrap_or_default();
        captions.sort_by_key(|c| c.lane);
        captions
    }

    /// Captions of every other track shown at the current time. Computed on
    /// each call; empty while secondary tracks are hidden.
    pub fn secondary_captions(&self) -> Vec<&Caption> {
        if !self.secondary_visible {
            return Vec::new();
        }
        self.tracks
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.active_track_index)
            .flat_map(|(_, track)| track.captions_at(self.current_time))
            .collect()
    }

    /// Find a caption in any loaded track
    pub fn caption_by_id(&self, id: &str) -> Option<&Caption> {
        self.tracks.iter().find_map(|track| track.caption_by_id(id))
    }

    /// Start time to seek to for a navigation shortcut on the active track
    pub fn seek_target(&self, direction: SeekDirection) -> Option<f64> {
        let track = self.active_track()?;
        let time = self.current_time;
        let current_start = track
            .captions_at(time)
            .map(|c| c.start_time)
            .min_by(f64::total_cmp);

        match direction {
            SeekDirection::Current => current_start,
            SeekDirection::Previous => {
                let reference = current_start.unwrap_or(time);
                track
                    .captions
                    .iter()
                    .map(|c| c.start_time)
                    .filter(|start| *start < reference)
                    .max_by(f64::total_cmp)
            }
            SeekDirection::Next => track
                .captions
                .iter()
                .map(|c| c.start_time)
                .find(|start| *start > time),
        }
    }

    /// Build the export hand-off for the caption shown at the current time
    pub fn export_request(&self, media_url: Option<String>) -> Result<ExportRequest> {
        let caption = self
            .active_captions()
            .into_iter()
            .next()
            .cloned()
            .ok_or(CaptionError::NoActiveCaption(self.current_time))?;

        Ok(ExportRequest {
            caption,
            current_time: self.current_time,
            media_url,
        })
    }
}

/// Application state shared across all handlers
pub struct AppState {
    /// Parse/normalize/enrich pipeline
    pub pipeline: Arc<Pipeline>,

    /// Tracks and playback position
    pub playback: RwLock<PlaybackState>,

    /// Flashcard export collaborator
    pub exporter: Arc<dyn CardExporter>,

    /// Server configuration
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: AppConfig) -> Self {
        let pipeline = Arc::new(Pipeline::new(&config.pipeline));
        Self::with_parts(config, pipeline, Arc::new(LoggingExporter))
    }

    pub fn with_parts(
        config: AppConfig,
        pipeline: Arc<Pipeline>,
        exporter: Arc<dyn CardExporter>,
    ) -> Self {
        Self {
            pipeline,
            playback: RwLock::new(PlaybackState::new()),
            exporter,
            config,
        }
    }

    /// Parse, enrich and publish a track. Returns its index.
    pub async fn load_track(&self, content: &str, metadata: TrackMetadata) -> Result<usize> {
        let generation = self.playback.read().generation();
        let track = self.pipeline.load_track(content, metadata).await?;
        let index = self.playback.write().add_track(track, generation)?;
        tracing::info!("Published track {}", index);
        Ok(index)
    }

    /// Hand the caption shown at the current time to the exporter
    pub async fn export_active(&self, media_url: Option<String>) -> Result<ExportReceipt> {
        let request = self.playback.read().export_request(media_url)?;
        self.exporter.export(request).await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
