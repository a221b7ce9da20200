//! End-to-end integration tests
//!
//! Raw subtitle text goes in through [`AppState`] or the HTTP router; the
//! analyzer is either the fallback segmenter or the mock remote service.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::util::ServiceExt;

use crate::config::{AppConfig, TokenizationMethod};
use crate::error::CaptionError;
use crate::http::create_router;
use crate::integration::fixtures::{
    MockAnalyzer, SAMPLE_ASS, SAMPLE_SRT, SAMPLE_SRT_EN, SAMPLE_VTT,
};
use crate::state::AppState;
use crate::types::TrackMetadata;

fn remote_config(mock: &MockAnalyzer) -> AppConfig {
    let mut config = AppConfig::default();
    config.pipeline.analyzer.method = TokenizationMethod::Remote;
    config.pipeline.analyzer.remote_url = Some(mock.base_url.clone());
    config.pipeline.analyzer.init_retry_delay_ms = 1;
    config
}

fn fallback_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.pipeline.analyzer.method = TokenizationMethod::Fallback;
    config
}

fn ja() -> TrackMetadata {
    TrackMetadata::new(Some("ja".into()), Some("Japanese".into()))
}

#[tokio::test]
async fn test_srt_track_enriched_through_remote_analyzer() {
    let mock = MockAnalyzer::spawn().await;
    let state = AppState::new(remote_config(&mock));

    let index = state.load_track(SAMPLE_SRT, ja()).await.unwrap();
    let playback = state.playback.read();
    let track = &playback.tracks()[index];

    // cues 2 and 3 merge
    assert_eq!(track.len(), 3);
    assert_eq!(track.captions[1].start_time, 2.5);
    assert_eq!(track.captions[1].end_time, 5.0);
    assert_eq!(
        track.captions.iter().map(|c| c.lane).collect::<Vec<_>>(),
        [0, 1, 0]
    );
    assert_eq!(track.captions[2].text, "ありがとう & さようなら");

    let furigana = track.captions[0].furigana.as_ref().unwrap();
    let readings: Vec<(&str, Option<&str>)> = furigana
        .iter()
        .map(|s| (s.text.as_str(), s.reading.as_deref()))
        .collect();
    assert_eq!(
        readings,
        [
            ("日本語", Some("にほんご")),
            ("を", None),
            ("勉強", Some("べんきょう")),
            ("する", None)
        ]
    );

    let tokens = track.captions[0].tokens.as_ref().unwrap();
    assert_eq!(tokens[2].basic_form, "勉強");
    assert_eq!(tokens[2].reading, "ベンキョウ");
}

#[tokio::test]
async fn test_all_formats_load_side_by_side() {
    let state = AppState::new(fallback_config());

    state.load_track(SAMPLE_VTT, ja()).await.unwrap();
    state
        .load_track(SAMPLE_ASS, TrackMetadata::new(Some("ja".into()), Some("ASS".into())))
        .await
        .unwrap();
    state
        .load_track(SAMPLE_SRT_EN, TrackMetadata::new(Some("en".into()), None))
        .await
        .unwrap();

    let mut playback = state.playback.write();
    let tracks = playback.tracks();
    assert_eq!(tracks.len(), 3);

    let vtt = &tracks[0];
    assert_eq!(vtt.captions[0].voice.as_deref(), Some("Ken"));
    assert!(vtt.captions.iter().all(|c| c.is_enriched()));

    let ass = &tracks[1];
    assert_eq!(ass.captions[0].text, "日本語を勉強する");
    assert_eq!(ass.captions[0].voice.as_deref(), Some("Ken (Main)"));
    assert_eq!(ass.captions[1].voice, None);
    assert_eq!(ass.captions[1].text, "猫が好きです, 本当に");

    let english = &tracks[2];
    assert!(english.captions.iter().all(|c| !c.is_enriched()));

    playback.set_current_time(3.0);
    assert_eq!(playback.active_caption_ids().len(), 1);
    // both ASS lines touch 3.0, as does the first English line
    assert_eq!(playback.secondary_captions().len(), 3);
}

#[tokio::test]
async fn test_remote_outage_degrades_to_fallback_quickly() {
    let mock = MockAnalyzer::spawn().await;
    mock.healthy.store(false, Ordering::SeqCst);

    let mut config = remote_config(&mock);
    config.pipeline.analyzer.init_max_attempts = 2;
    config.pipeline.analyzer.request_timeout_ms = 3000;
    let state = AppState::new(config);

    state.load_track(SAMPLE_SRT, ja()).await.unwrap();
    assert_eq!(mock.health_calls.load(Ordering::SeqCst), 2);

    let started = Instant::now();
    state
        .load_track(SAMPLE_VTT, TrackMetadata::new(Some("ja".into()), Some("vtt".into())))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(3000));

    assert_eq!(mock.analyze_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.health_calls.load(Ordering::SeqCst), 2);

    let playback = state.playback.read();
    let tokens = playback.tracks()[0].captions[0].tokens.as_ref().unwrap();
    // single characters from the fallback segmenter
    assert_eq!(tokens.len(), "日本語を勉強する".chars().count());
}

#[tokio::test]
async fn test_cleared_load_is_discarded() {
    let state = AppState::new(fallback_config());
    state.load_track(SAMPLE_VTT, ja()).await.unwrap();

    // Load started, then the user clears captions before it is published
    let generation = state.playback.read().generation();
    let track = state.pipeline.load_track(SAMPLE_SRT, ja()).await.unwrap();
    state.playback.write().clear_tracks();

    let result = state.playback.write().add_track(track, generation);
    assert!(matches!(result, Err(CaptionError::LoadAbandoned)));
    assert!(state.playback.read().tracks().is_empty());

    // A load started after the clear is published normally
    assert_eq!(state.load_track(SAMPLE_SRT, ja()).await.unwrap(), 0);
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_player_session_over_http() {
    let mock = MockAnalyzer::spawn().await;
    let app = create_router(Arc::new(AppState::new(remote_config(&mock))));

    let (status, body) = send(
        &app,
        post(
            "/tracks",
            serde_json::json!({ "content": SAMPLE_SRT, "language": "ja", "title": "main" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["captionCount"], 3);
    assert_eq!(body["enrichedCount"], 3);

    let (status, _) = send(
        &app,
        post(
            "/tracks",
            serde_json::json!({ "content": SAMPLE_SRT, "language": "ja", "title": "main" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        post(
            "/tracks",
            serde_json::json!({ "content": SAMPLE_SRT_EN, "language": "en" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, post("/playback/time", serde_json::json!({ "time": 2.75 }))).await;
    assert_eq!(body["active"].as_array().unwrap().len(), 2);
    assert_eq!(body["active"][0]["lane"], 0);
    assert_eq!(body["active"][1]["lane"], 1);
    assert_eq!(body["secondary"][0]["text"], "I study Japanese");
    assert_eq!(body["active"][0]["furigana"][0]["reading"], "にほんご");

    let (_, body) = send(&app, get("/playback/seek?direction=next")).await;
    assert_eq!(body["target"], 6.0);

    let (status, body) = send(
        &app,
        post("/playback/export", serde_json::json!({ "mediaUrl": "http://localhost/v.mp4" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let caption_id = body["captionId"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/captions/{}", caption_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "日本語を勉強する");

    let (_, body) = send(&app, post("/playback/cycle", serde_json::json!({}))).await;
    assert_eq!(body["activeTrackIndex"], 1);
    assert_eq!(body["active"][0]["text"], "I study Japanese");

    let (_, body) = send(&app, post("/playback/secondary", serde_json::json!({ "visible": false }))).await;
    assert!(body["secondary"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, get("/tracks/0/subtitles?format=srt")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("00:00:02,500 --> 00:00:05,000"));

    let (_, body) = send(&app, get("/debug/cache")).await;
    assert_eq!(body["backends"][0]["name"], "remote");
    assert_eq!(body["backends"][0]["phase"], "ready");

    let (status, _) = send(
        &app,
        Request::delete("/tracks/0").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/tracks")).await;
    assert_eq!(body["mode"], "single");
    assert_eq!(body["activeTrackIndex"], 0);

    let (status, _) = send(
        &app,
        Request::delete("/tracks").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get("/playback/active")).await;
    assert!(body["active"].as_array().unwrap().is_empty());
}
