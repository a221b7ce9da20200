//! Remote HTTP segmenter
//!
//! Talks to an analysis service exposing:
//!
//! ```text
//! POST /analyze {text, mode} -> [{surface, reading, dictionary_form, part_of_speech}]
//! GET  /health               -> 2xx when ready
//! ```
//!
//! Availability is cached and re-probed at most once per health interval.
//! The refresh is single-flight: the health lock is held across the probe, so
//! callers arriving while it runs wait for its result. While the service is
//! marked unavailable, calls return immediately instead of waiting for the
//! request timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::{BackendCell, InitPhase, InitPolicy};
use super::TokenizeStrategy;
use crate::config::AnalyzerConfig;
use crate::error::{CaptionError, Result};
use crate::types::Token;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    mode: &'a str,
}

/// Token as returned by the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteToken {
    pub surface: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub dictionary_form: String,
    #[serde(default)]
    pub part_of_speech: String,
}

impl From<RemoteToken> for Token {
    fn from(remote: RemoteToken) -> Self {
        let RemoteToken {
            surface,
            reading,
            dictionary_form,
            part_of_speech,
        } = remote;
        let or_surface = |value: String| if value.is_empty() { surface.clone() } else { value };

        Token {
            basic_form: or_surface(dictionary_form),
            reading: or_surface(reading),
            part_of_speech: if part_of_speech.is_empty() {
                "unknown".to_string()
            } else {
                part_of_speech
            },
            surface_form: surface,
        }
    }
}

#[derive(Debug, Default)]
struct Health {
    available: bool,
    checked_at: Option<Instant>,
}

pub struct RemoteSegmenter {
    base_url: String,
    mode: String,
    client: reqwest::Client,
    health_timeout: Duration,
    health_interval: Duration,
    request_retries: u32,
    health: tokio::sync::Mutex<Health>,
    cell: BackendCell<()>,
}

impl RemoteSegmenter {
    pub fn new(base_url: &str, config: &AnalyzerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            mode: config.remote_mode.clone(),
            client,
            health_timeout: config.health_timeout(),
            health_interval: config.health_interval(),
            request_retries: config.request_retries,
            health: tokio::sync::Mutex::new(Health::default()),
            cell: BackendCell::new("remote", InitPolicy::from(config)),
        })
    }

    pub fn phase(&self) -> InitPhase {
        self.cell.phase()
    }

    /// Single health probe; any transport error counts as unhealthy
    async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health probe to {} failed: {}", url, e);
                false
            }
        }
    }

    async fn set_available(&self, available: bool) {
        let mut health = self.health.lock().await;
        health.available = available;
        health.checked_at = Some(Instant::now());
    }

    /// Cached availability, refreshed once the health interval has passed
    async fn is_available(&self) -> bool {
        let mut health = self.health.lock().await;
        if let Some(at) = health.checked_at {
            if at.elapsed() < self.health_interval {
                return health.available;
            }
        }

        let available = self.probe().await;
        if !available {
            tracing::warn!("Remote analyzer at {} is unavailable", self.base_url);
        }
        health.available = available;
        health.checked_at = Some(Instant::now());
        available
    }

    async fn connect(&self) -> Result<()> {
        if self.probe().await {
            self.set_available(true).await;
            Ok(())
        } else {
            self.set_available(false).await;
            Err(CaptionError::BackendUnavailable(format!(
                "health check failed for {}",
                self.base_url
            )))
        }
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Token>> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&AnalyzeRequest {
                text,
                mode: &self.mode,
            })
            .send()
            .await?
            .error_for_status()?;

        let tokens: Vec<RemoteToken> = response.json().await?;
        Ok(tokens.into_iter().map(Token::from).collect())
    }
}

#[async_trait]
impl TokenizeStrategy for RemoteSegmenter {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn try_tokenize(&self, text: &str) -> Option<Vec<Token>> {
        self.cell.get_or_init(|| self.connect()).await?;

        if !self.is_available().await {
            tracing::debug!("Skipping remote analyzer, marked unavailable");
            return None;
        }

        for attempt in 0..=self.request_retries {
            match self.analyze(text).await {
                Ok(tokens) => {
                    self.cell.record_success();
                    return Some(tokens);
                }
                Err(e) => {
                    tracing::warn!(
                        "Remote analyze attempt {}/{} failed: {}",
                        attempt + 1,
                        self.request_retries + 1,
                        e
                    );
                    self.cell.record_failure().await;
                }
            }
        }

        self.set_available(false).await;
        None
    }
}
