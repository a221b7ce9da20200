//! Axum router configuration

use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{
    active_captions, cache_stats, clear_tracks, cycle_track, export_active, get_caption,
    health_check, list_tracks, load_track, remove_track, seek_target, set_secondary, set_time,
    track_subtitles, version_check,
};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // The player is usually served from a different local origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .allow_private_network(true)
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Tracks
        .route(
            "/tracks",
            get(list_tracks).post(load_track).delete(clear_tracks),
        )
        .route("/tracks/{index}", delete(remove_track))
        .route("/tracks/{index}/subtitles", get(track_subtitles))
        .route("/captions/{id}", get(get_caption))
        // Playback
        .route("/playback/time", post(set_time))
        .route("/playback/cycle", post(cycle_track))
        .route("/playback/secondary", post(set_secondary))
        .route("/playback/active", get(active_captions))
        .route("/playback/seek", get(seek_target))
        .route("/playback/export", post(export_active))
        // Debug endpoints
        .route("/debug/cache", get(cache_stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
