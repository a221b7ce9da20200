//! HTTP server module
//!
//! This module exposes the pipeline to the player:
//! - Axum router with all endpoints
//! - Track loading, listing and removal
//! - Playback time, track cycling and active caption queries
//! - Export hand-off
//! - CORS middleware

pub mod handlers;
pub mod routes;

pub use routes::create_router;
