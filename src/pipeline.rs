//! Caption pipeline
//!
//! Owns the normalizer, analyzer chain and result cache for one configuration.
//! Nothing here is global: independent pipelines can coexist in one process.

use std::sync::Arc;

use crate::analyzer::{AnalyzerChain, BackendStatus};
use crate::cache::{CacheStats, ResultCache};
use crate::config::PipelineConfig;
use crate::enrich::Enricher;
use crate::error::Result;
use crate::subtitle::{self, normalize::Normalizer};
use crate::types::{SubtitleTrack, TrackMetadata};

pub struct Pipeline {
    normalizer: Normalizer,
    chain: Arc<AnalyzerChain>,
    cache: Arc<ResultCache>,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_chain(config, AnalyzerChain::from_config(&config.analyzer))
    }

    /// Pipeline around an already assembled analyzer chain
    pub fn with_chain(config: &PipelineConfig, chain: AnalyzerChain) -> Self {
        let chain = Arc::new(chain);
        let cache = Arc::new(ResultCache::new(&config.cache));
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            enricher: Enricher::new(chain.clone(), cache.clone()),
            chain,
            cache,
        }
    }

    /// Parse, normalize and enrich raw subtitle text.
    ///
    /// Only an unrecognized format is an error; enrichment problems leave the
    /// affected captions unannotated.
    pub async fn load_track(&self, content: &str, metadata: TrackMetadata) -> Result<SubtitleTrack> {
        let track = subtitle::parse_track(content, metadata, &self.normalizer)?;
        Ok(self.enricher.enrich_track(track).await)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn backend_status(&self) -> Vec<BackendStatus> {
        self.chain.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, TokenizationMethod};
    use crate::error::CaptionError;

    fn config() -> PipelineConfig {
        PipelineConfig {
            analyzer: AnalyzerConfig {
                method: TokenizationMethod::Fallback,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_srt_track() {
        let pipeline = Pipeline::new(&config());
        let track = pipeline
            .load_track("00:00:01,000 --> 00:00:03,000\nこんにちは", TrackMetadata::default())
            .await
            .unwrap();

        assert_eq!(track.len(), 1);
        let caption = &track.captions[0];
        assert_eq!(caption.start_time, 1.0);
        assert_eq!(caption.end_time, 3.0);
        assert_eq!(caption.text, "こんにちは");
        assert_eq!(caption.tokens.as_ref().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn test_unrecognized_format() {
        let pipeline = Pipeline::new(&config());
        let err = pipeline
            .load_track("just some prose", TrackMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::FormatUnrecognized));
    }

    #[tokio::test]
    async fn test_independent_pipelines_have_separate_caches() {
        let a = Pipeline::new(&config());
        let b = Pipeline::new(&config());
        a.load_track("00:00:01,000 --> 00:00:02,000\n猫", TrackMetadata::default())
            .await
            .unwrap();

        assert_eq!(a.cache_stats().entries, 1);
        assert_eq!(b.cache_stats().entries, 0);
    }
}
