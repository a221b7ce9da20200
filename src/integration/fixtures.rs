//! Test fixtures for integration tests
//!
//! Provides sample subtitle files and an in-process mock of the remote
//! analysis service.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::analyzer::remote::RemoteToken;

/// SubRip track with one Japanese line per cue and a duplicated cue
pub const SAMPLE_SRT: &str = "\
1
00:00:01,000 --> 00:00:03,000
日本語を勉強する

2
00:00:02,500 --> 00:00:04,000
猫が好きです

3
00:00:03,500 --> 00:00:05,000
猫が好きです

4
00:00:06,000 --> 00:00:07,500
ありがとう &amp; さようなら
";

/// WebVTT track with a header note, a cue identifier and a voice span
pub const SAMPLE_VTT: &str = "\
WEBVTT

NOTE sample file

intro
00:00:01.000 --> 00:00:02.000 align:start
<v Ken>猫が好きです

00:00:02.000 --> 00:00:04.000
日本語を勉強する
";

/// ASS script with override tags and a named speaker
pub const SAMPLE_ASS: &str = "\
[Script Info]
Title: sample

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:03.00,Main,Ken,0,0,0,,{\\b1}日本語{\\b0}を勉強する
Dialogue: 0,0:00:03.00,0:00:04.50,Main,,0,0,0,,猫が好きです, 本当に
";

/// English SubRip track
pub const SAMPLE_SRT_EN: &str = "\
1
00:00:01,000 --> 00:00:03,000
I study Japanese

2
00:00:03,500 --> 00:00:05,000
I like cats
";

/// `(surface, reading, dictionary form, part of speech)` known to the mock
const LEXICON: &[(&str, &str, &str, &str)] = &[
    ("日本語", "ニホンゴ", "日本語", "名詞"),
    ("勉強", "ベンキョウ", "勉強", "名詞"),
    ("する", "スル", "する", "動詞"),
    ("猫", "ネコ", "猫", "名詞"),
    ("好き", "スキ", "好き", "名詞"),
    ("本当", "ホントウ", "本当", "名詞"),
    ("です", "デス", "です", "助動詞"),
    ("が", "ガ", "が", "助詞"),
    ("を", "ヲ", "を", "助詞"),
    ("に", "ニ", "に", "助詞"),
];

/// Greedy longest-match segmentation over [`LEXICON`]; unknown characters
/// become single-character tokens without a reading.
pub fn mock_segment(text: &str) -> Vec<RemoteToken> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let known = LEXICON
            .iter()
            .filter(|(surface, ..)| rest.starts_with(surface))
            .max_by_key(|(surface, ..)| surface.len());

        let len = match known {
            Some((surface, reading, base, pos)) => {
                tokens.push(RemoteToken {
                    surface: surface.to_string(),
                    reading: reading.to_string(),
                    dictionary_form: base.to_string(),
                    part_of_speech: pos.to_string(),
                });
                surface.len()
            }
            None => {
                if !c.is_whitespace() {
                    tokens.push(RemoteToken {
                        surface: c.to_string(),
                        reading: String::new(),
                        dictionary_form: String::new(),
                        part_of_speech: "記号".to_string(),
                    });
                }
                c.len_utf8()
            }
        };
        rest = &rest[len..];
    }

    tokens
}

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    text: String,
    #[allow(dead_code)]
    mode: String,
}

/// Mock analysis service bound to an ephemeral local port
#[derive(Clone)]
pub struct MockAnalyzer {
    pub base_url: String,
    pub analyze_calls: Arc<AtomicUsize>,
    pub health_calls: Arc<AtomicUsize>,
    /// `GET /health` answers 503 while false
    pub healthy: Arc<AtomicBool>,
    /// `POST /analyze` answers 500 while true
    pub fail_analyze: Arc<AtomicBool>,
}

impl MockAnalyzer {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock analyzer");
        let addr = listener.local_addr().expect("mock analyzer address");

        let mock = Self {
            base_url: format!("http://{}", addr),
            analyze_calls: Arc::new(AtomicUsize::new(0)),
            health_calls: Arc::new(AtomicUsize::new(0)),
            healthy: Arc::new(AtomicBool::new(true)),
            fail_analyze: Arc::new(AtomicBool::new(false)),
        };

        let app = Router::new()
            .route("/health", get(health))
            .route("/analyze", post(analyze))
            .with_state(mock.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock analyzer server");
        });

        mock
    }
}

async fn health(State(mock): State<MockAnalyzer>) -> StatusCode {
    mock.health_calls.fetch_add(1, Ordering::SeqCst);
    if mock.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn analyze(State(mock): State<MockAnalyzer>, Json(body): Json<AnalyzeBody>) -> Response {
    mock.analyze_calls.fetch_add(1, Ordering::SeqCst);
    if mock.fail_analyze.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(mock_segment(&body.text)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_segment_longest_match() {
        let tokens = mock_segment("日本語を勉強する");
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, ["日本語", "を", "勉強", "する"]);
        assert_eq!(tokens[0].reading, "ニホンゴ");
    }

    #[test]
    fn test_mock_segment_unknown_characters() {
        let tokens = mock_segment("猫!");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].surface, "!");
        assert!(tokens[1].reading.is_empty());
    }
}
