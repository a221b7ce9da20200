//! HTTP request handlers
//!
//! Implements handlers for track loading, playback control and export.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CaptionError;
use crate::export::ExportReceipt;
use crate::state::{AppState, PlaybackState, SeekDirection, TrackMode};
use crate::subtitle::writer;
use crate::types::{Caption, SubtitleTrack, TrackMetadata};

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    NotFound(String),
    UnsupportedMediaType(String),
    Conflict(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<CaptionError> for HttpError {
    fn from(err: CaptionError) -> Self {
        let msg = err.to_string();
        match err {
            CaptionError::FormatUnrecognized => HttpError::UnsupportedMediaType(msg),
            CaptionError::DuplicateTrack { .. } | CaptionError::LoadAbandoned => {
                HttpError::Conflict(msg)
            }
            CaptionError::TrackNotFound(_)
            | CaptionError::CaptionNotFound(_)
            | CaptionError::NoActiveCaption(_) => HttpError::NotFound(msg),
            CaptionError::Config(_) => HttpError::BadRequest(msg),
            _ => HttpError::InternalError(msg),
        }
    }
}

/// Body of `POST /tracks`
#[derive(Debug, Deserialize)]
pub struct LoadTrackRequest {
    /// Raw subtitle file text
    pub content: String,
    pub language: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub index: usize,
    pub language: Option<String>,
    pub title: Option<String>,
    pub caption_count: usize,
    pub enriched_count: usize,
}

impl TrackSummary {
    fn new(index: usize, track: &SubtitleTrack) -> Self {
        Self {
            index,
            language: track.metadata.language.clone(),
            title: track.metadata.title.clone(),
            caption_count: track.captions.len(),
            enriched_count: track.captions.iter().filter(|c| c.is_enriched()).count(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackList {
    pub mode: TrackMode,
    pub active_track_index: usize,
    pub tracks: Vec<TrackSummary>,
}

/// What the player renders at the current time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCaptions {
    pub current_time: f64,
    pub active_track_index: usize,
    pub active: Vec<Caption>,
    pub secondary: Vec<Caption>,
}

impl ActiveCaptions {
    fn new(playback: &PlaybackState) -> Self {
        Self {
            current_time: playback.current_time(),
            active_track_index: playback.active_track_index(),
            active: playback.active_captions().into_iter().cloned().collect(),
            secondary: playback.secondary_captions().into_iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetTimeRequest {
    pub time: f64,
}

#[derive(Debug, Deserialize)]
pub struct SecondaryRequest {
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekQuery {
    pub direction: SeekDirection,
}

#[derive(Debug, Serialize)]
pub struct SeekResponse {
    pub target: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubtitleQuery {
    pub format: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("caption-annotator v", env!("CARGO_PKG_VERSION"))
}

/// Parse, enrich and publish a track
/// POST /tracks
pub async fn load_track(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadTrackRequest>,
) -> Result<(StatusCode, Json<TrackSummary>), HttpError> {
    let metadata = TrackMetadata::new(request.language, request.title);
    let index = state.load_track(&request.content, metadata).await?;

    let playback = state.playback.read();
    let track = playback
        .tracks()
        .get(index)
        .ok_or(CaptionError::TrackNotFound(index))?;
    Ok((StatusCode::CREATED, Json(TrackSummary::new(index, track))))
}

/// GET /tracks
pub async fn list_tracks(State(state): State<Arc<AppState>>) -> Json<TrackList> {
    let playback = state.playback.read();
    Json(TrackList {
        mode: playback.mode(),
        active_track_index: playback.active_track_index(),
        tracks: playback
            .tracks()
            .iter()
            .enumerate()
            .map(|(i, t)| TrackSummary::new(i, t))
            .collect(),
    })
}

/// DELETE /tracks
pub async fn clear_tracks(State(state): State<Arc<AppState>>) -> StatusCode {
    state.playback.write().clear_tracks();
    tracing::info!("Cleared all tracks");
    StatusCode::NO_CONTENT
}

/// DELETE /tracks/{index}
pub async fn remove_track(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<TrackSummary>, HttpError> {
    let removed = state.playback.write().remove_track(index)?;
    tracing::info!("Removed track {}", index);
    Ok(Json(TrackSummary::new(index, &removed)))
}

/// Re-serialized track
/// GET /tracks/{index}/subtitles?format=srt|vtt
pub async fn track_subtitles(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(query): Query<SubtitleQuery>,
) -> Result<Response, HttpError> {
    let playback = state.playback.read();
    let track = playback
        .tracks()
        .get(index)
        .ok_or(CaptionError::TrackNotFound(index))?;

    let (content_type, body) = match query.format.as_deref().unwrap_or("vtt") {
        "vtt" | "webvtt" => ("text/vtt; charset=utf-8", writer::to_webvtt(track)),
        "srt" => ("application/x-subrip; charset=utf-8", writer::to_srt(track)),
        other => {
            return Err(HttpError::BadRequest(format!(
                "Unknown subtitle format: {}",
                other
            )))
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok((headers, body).into_response())
}

/// GET /captions/{id}
pub async fn get_caption(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Caption>, HttpError> {
    let playback = state.playback.read();
    let caption = playback
        .caption_by_id(&id)
        .cloned()
        .ok_or(CaptionError::CaptionNotFound(id))?;
    Ok(Json(caption))
}

/// POST /playback/time
pub async fn set_time(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetTimeRequest>,
) -> Json<ActiveCaptions> {
    let mut playback = state.playback.write();
    playback.set_current_time(request.time);
    Json(ActiveCaptions::new(&playback))
}

/// POST /playback/cycle
pub async fn cycle_track(State(state): State<Arc<AppState>>) -> Json<ActiveCaptions> {
    let mut playback = state.playback.write();
    let index = playback.cycle_active_track();
    tracing::debug!("Active track is now {}", index);
    Json(ActiveCaptions::new(&playback))
}

/// POST /playback/secondary
pub async fn set_secondary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SecondaryRequest>,
) -> Json<ActiveCaptions> {
    let mut playback = state.playback.write();
    playback.set_secondary_visible(request.visible);
    Json(ActiveCaptions::new(&playback))
}

/// GET /playback/active
pub async fn active_captions(State(state): State<Arc<AppState>>) -> Json<ActiveCaptions> {
    Json(ActiveCaptions::new(&state.playback.read()))
}

/// GET /playback/seek?direction=previous|current|next
pub async fn seek_target(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeekQuery>,
) -> Json<SeekResponse> {
    Json(SeekResponse {
        target: state.playback.read().seek_target(query.direction),
    })
}

/// POST /playback/export
pub async fn export_active(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ExportBody>>,
) -> Result<Json<ExportReceipt>, HttpError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let receipt = state.export_active(body.media_url).await?;
    Ok(Json(receipt))
}

/// Debug endpoint - cache and analyzer status
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.pipeline.cache_stats();
    let lookups = stats.hits + stats.misses;

    Json(serde_json::json!({
        "entries": stats.entries,
        "capacity": stats.capacity,
        "hits": stats.hits,
        "misses": stats.misses,
        "hit_rate": format!("{:.1}%",
            if lookups == 0 { 0.0 } else { stats.hits as f64 / lookups as f64 * 100.0 }
        ),
        "backends": state.pipeline.backend_status(),
    }))
}
