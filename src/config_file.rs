//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section is optional;
//! missing values fall back to the defaults in [`crate::config`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{
    AnalyzerConfig, AppConfig, CacheConfig, NormalizerConfig, PipelineConfig, TokenizationMethod,
};
use crate::error::{CaptionError, Result};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: Option<ServerSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Normalizer settings
    pub normalizer: Option<NormalizerSettings>,
    /// Analyzer settings
    pub analyzer: Option<AnalyzerSettings>,
    /// Cache settings
    pub cache: Option<CacheSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerSettings {
    pub merge_min_overlap_secs: Option<f64>,
    pub merge_min_overlap_ratio: Option<f64>,
    pub lane_lookback_misses: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// dictionary, remote or fallback
    pub method: Option<String>,
    pub dictionary_path: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub remote_mode: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub health_timeout_ms: Option<u64>,
    pub health_interval_secs: Option<u64>,
    pub request_retries: Option<u32>,
    pub init_max_attempts: Option<u32>,
    pub init_retry_delay_ms: Option<u64>,
    pub max_consecutive_errors: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of cached caption texts
    pub max_entries: usize,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| CaptionError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CaptionError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let app = AppConfig::default();
        let normalizer = app.pipeline.normalizer;
        let analyzer = app.pipeline.analyzer;
        Self {
            server: Some(ServerSettings {
                host: app.host,
                port: app.port,
            }),
            logging: Some(LoggingSettings {
                level: app.log_level,
                format: Some(app.log_format),
            }),
            normalizer: Some(NormalizerSettings {
                merge_min_overlap_secs: Some(normalizer.merge_min_overlap_secs),
                merge_min_overlap_ratio: Some(normalizer.merge_min_overlap_ratio),
                lane_lookback_misses: Some(normalizer.lane_lookback_misses),
            }),
            analyzer: Some(AnalyzerSettings {
                method: Some("dictionary".to_string()),
                dictionary_path: None,
                remote_url: Some("http://127.0.0.1:8765".to_string()),
                remote_mode: Some(analyzer.remote_mode),
                request_timeout_ms: Some(analyzer.request_timeout_ms),
                health_timeout_ms: Some(analyzer.health_timeout_ms),
                health_interval_secs: Some(analyzer.health_interval_secs),
                request_retries: Some(analyzer.request_retries),
                init_max_attempts: Some(analyzer.init_max_attempts),
                init_retry_delay_ms: Some(analyzer.init_retry_delay_ms),
                max_consecutive_errors: Some(analyzer.max_consecutive_errors),
            }),
            cache: Some(CacheSettings {
                max_entries: app.pipeline.cache.max_entries,
            }),
        }
    }

    /// Convert to AppConfig
    pub fn into_app_config(self) -> AppConfig {
        let defaults = AppConfig::default();

        let (host, port) = self
            .server
            .map(|s| (s.host, s.port))
            .unwrap_or((defaults.host, defaults.port));

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        let normalizer = match self.normalizer {
            Some(n) => {
                let d = NormalizerConfig::default();
                NormalizerConfig {
                    merge_min_overlap_secs: n
                        .merge_min_overlap_secs
                        .unwrap_or(d.merge_min_overlap_secs),
                    merge_min_overlap_ratio: n
                        .merge_min_overlap_ratio
                        .unwrap_or(d.merge_min_overlap_ratio),
                    lane_lookback_misses: n.lane_lookback_misses.unwrap_or(d.lane_lookback_misses),
                }
            }
            None => NormalizerConfig::default(),
        };

        let analyzer = match self.analyzer {
            Some(a) => {
                let d = AnalyzerConfig::default();
                let method = match a.method {
                    Some(m) => m.parse::<TokenizationMethod>().unwrap_or_else(|e| {
                        tracing::warn!("{}, using fallback segmentation", e);
                        TokenizationMethod::Fallback
                    }),
                    None => d.method,
                };
                AnalyzerConfig {
                    method,
                    dictionary_path: a.dictionary_path,
                    remote_url: a.remote_url.map(|u| u.trim_end_matches('/').to_string()),
                    remote_mode: a.remote_mode.unwrap_or(d.remote_mode),
                    request_timeout_ms: a.request_timeout_ms.unwrap_or(d.request_timeout_ms),
                    health_timeout_ms: a.health_timeout_ms.unwrap_or(d.health_timeout_ms),
                    health_interval_secs: a.health_interval_secs.unwrap_or(d.health_interval_secs),
                    request_retries: a.request_retries.unwrap_or(d.request_retries),
                    init_max_attempts: a.init_max_attempts.unwrap_or(d.init_max_attempts),
                    init_retry_delay_ms: a.init_retry_delay_ms.unwrap_or(d.init_retry_delay_ms),
                    max_consecutive_errors: a
                        .max_consecutive_errors
                        .unwrap_or(d.max_consecutive_errors),
                }
            }
            None => AnalyzerConfig::default(),
        };

        let cache = self
            .cache
            .map(|c| CacheConfig {
                max_entries: c.max_entries,
            })
            .unwrap_or_default();

        AppConfig {
            host,
            port,
            log_level,
            log_format,
            pipeline: PipelineConfig {
                normalizer,
                analyzer,
                cache,
            },
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}
