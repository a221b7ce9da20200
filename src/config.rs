//! Pipeline and server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Thresholds used by the caption normalizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Absolute overlap (seconds) above which two captions count as overlapping
    pub merge_min_overlap_secs: f64,

    /// Overlap relative to the later caption's duration above which two
    /// captions count as overlapping
    pub merge_min_overlap_ratio: f64,

    /// Consecutive non-overlapping predecessors after which the lane scan stops
    pub lane_lookback_misses: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            merge_min_overlap_secs: 0.2,
            merge_min_overlap_ratio: 0.3,
            lane_lookback_misses: 5,
        }
    }
}

/// Which analyzer backend is preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizationMethod {
    /// In-process dictionary segmenter, remote service as second choice
    Dictionary,
    /// Remote HTTP segmenter, in-process dictionary as second choice
    Remote,
    /// Trivial segmentation only
    Fallback,
}

impl std::str::FromStr for TokenizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dictionary" | "vibrato" | "local" => Ok(Self::Dictionary),
            "remote" | "http" => Ok(Self::Remote),
            "fallback" | "simple" => Ok(Self::Fallback),
            other => Err(format!("unknown tokenization method: {}", other)),
        }
    }
}

/// Analyzer chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Preferred backend
    pub method: TokenizationMethod,

    /// Compiled dictionary for the in-process segmenter
    pub dictionary_path: Option<PathBuf>,

    /// Base URL of the remote segmenter (no trailing slash)
    pub remote_url: Option<String>,

    /// Split mode forwarded to the remote segmenter
    pub remote_mode: String,

    /// Timeout for `POST /analyze`
    pub request_timeout_ms: u64,

    /// Timeout for `GET /health`
    pub health_timeout_ms: u64,

    /// Minimum time between two health probes
    pub health_interval_secs: u64,

    /// Extra attempts for a failed `POST /analyze`
    pub request_retries: u32,

    /// Initialization attempts before a backend is marked failed
    pub init_max_attempts: u32,

    /// Delay between initialization attempts
    pub init_retry_delay_ms: u64,

    /// Consecutive tokenize failures before a ready backend is reset
    pub max_consecutive_errors: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            method: TokenizationMethod::Dictionary,
            dictionary_path: None,
            remote_url: None,
            remote_mode: "C".to_string(),
            request_timeout_ms: 3000,
            health_timeout_ms: 1000,
            health_interval_secs: 30,
            request_retries: 1,
            init_max_attempts: 3,
            init_retry_delay_ms: 500,
            max_consecutive_errors: 3,
        }
    }
}

impl AnalyzerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }
}

/// Enrichment result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached caption texts
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

/// Everything a pipeline needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub analyzer: AnalyzerConfig,
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Pipeline settings
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
