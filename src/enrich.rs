//! Caption enrichment
//!
//! Every caption of a track is enriched in its own task. Furigana and tokens
//! are computed independently and a failure in one caption only leaves that
//! caption unannotated. The track is handed back once every task settled.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::analyzer::AnalyzerChain;
use crate::cache::{Enrichment, ResultCache};
use crate::error::{CaptionError, Result};
use crate::furigana;
use crate::types::SubtitleTrack;

/// Caption text with inline markup tags removed
pub fn plain_text(text: &str) -> String {
    regex!(r"<[^>]*>").replace_all(text, "").into_owned()
}

/// Enrich one caption text, consulting the cache first
pub async fn enrich_text(
    chain: &AnalyzerChain,
    cache: &ResultCache,
    text: &str,
) -> Result<Enrichment> {
    let plain = plain_text(text);
    if plain.trim().is_empty() {
        return Err(CaptionError::EnrichmentFailed(format!(
            "no text left to analyze in {:?}",
            text
        )));
    }

    if let Some(hit) = cache.get(&plain) {
        return Ok(hit);
    }

    let (furigana, tokens) = tokio::join!(
        furigana::synthesize(chain, &plain),
        chain.tokenize(&plain)
    );
    let enrichment = Enrichment { furigana, tokens };
    cache.insert(&plain, enrichment.clone());
    Ok(enrichment)
}

/// Fans enrichment out over the captions of a track
#[derive(Clone)]
pub struct Enricher {
    chain: Arc<AnalyzerChain>,
    cache: Arc<ResultCache>,
}

impl Enricher {
    pub fn new(chain: Arc<AnalyzerChain>, cache: Arc<ResultCache>) -> Self {
        Self { chain, cache }
    }

    /// Annotate every caption of `track`. Never fails: captions whose task
    /// errors or panics keep `furigana`/`tokens` unset.
    pub async fn enrich_track(&self, mut track: SubtitleTrack) -> SubtitleTrack {
        if !track.metadata.wants_enrichment() {
            tracing::info!(
                "Skipping enrichment for non-Japanese track (language={:?})",
                track.metadata.language
            );
            return track;
        }

        let tasks = track.captions.iter().map(|caption| {
            let chain = self.chain.clone();
            let cache = self.cache.clone();
            let text = caption.text.clone();
            tokio::spawn(async move { enrich_text(&chain, &cache, &text).await })
        });
        let results = join_all(tasks).await;

        let mut failed = 0;
        for (caption, result) in track.captions.iter_mut().zip(results) {
            let outcome = result
                .map_err(|e| CaptionError::EnrichmentFailed(e.to_string()))
                .and_then(|r| r);
            match outcome {
                Ok(Enrichment { furigana, tokens }) => {
                    caption.furigana = Some(furigana);
                    caption.tokens = Some(tokens);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Caption {} left unannotated: {}", caption.id, e);
                }
            }
        }

        tracing::info!(
            "Enriched {}/{} captions",
            track.captions.len() - failed,
            track.captions.len()
        );
        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::TokenizeStrategy;
    use crate::config::CacheConfig;
    use crate::types::{Caption, Token, TrackMetadata};
    use async_trait::async_trait;

    /// Panics on one specific text, fixed reading otherwise
    struct Flaky;

    #[async_trait]
    impl TokenizeStrategy for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn try_tokenize(&self, text: &str) -> Option<Vec<Token>> {
            if text == "爆発" {
                panic!("analyzer exploded");
            }
            Some(vec![Token {
                surface_form: text.to_string(),
                basic_form: text.to_string(),
                reading: "ヨミ".to_string(),
                part_of_speech: "名詞".to_string(),
            }])
        }
    }

    fn track(texts: &[&str], language: Option<&str>) -> SubtitleTrack {
        let captions = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Caption::new(i as f64, i as f64 + 1.0, *text).unwrap())
            .collect();
        SubtitleTrack::new(captions, TrackMetadata::new(language.map(String::from), None))
    }

    fn enricher(chain: AnalyzerChain) -> Enricher {
        Enricher::new(
            Arc::new(chain),
            Arc::new(ResultCache::new(&CacheConfig { max_entries: 16 })),
        )
    }

    #[test]
    fn test_plain_text_strips_tags() {
        assert_eq!(plain_text("<i>日本</i><v Ken>語"), "日本語");
        assert_eq!(plain_text("a < b"), "a < b");
    }

    #[tokio::test]
    async fn test_enrich_track_populates_annotations() {
        let enricher = enricher(AnalyzerChain::fallback_only().with_strategy(Arc::new(Flaky)));
        let track = enricher.enrich_track(track(&["漢字", "<b>猫</b>"], Some("ja"))).await;

        for caption in &track.captions {
            assert!(caption.is_enriched());
        }
        let furigana = track.captions[1].furigana.as_ref().unwrap();
        assert_eq!(furigana[0].text, "猫");
        assert_eq!(furigana[0].reading.as_deref(), Some("よみ"));
        // raw text keeps its markup
        assert_eq!(track.captions[1].text, "<b>猫</b>");
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_caption() {
        let enricher = enricher(AnalyzerChain::fallback_only().with_strategy(Arc::new(Flaky)));
        let track = enricher
            .enrich_track(track(&["猫", "爆発", "犬"], None))
            .await;

        assert!(track.captions[0].is_enriched());
        assert!(!track.captions[1].is_enriched());
        assert!(track.captions[2].is_enriched());
    }

    #[tokio::test]
    async fn test_non_japanese_track_skipped() {
        let enricher = enricher(AnalyzerChain::fallback_only());
        let track = enricher.enrich_track(track(&["hello"], Some("en"))).await;
        assert!(!track.captions[0].is_enriched());
    }

    #[tokio::test]
    async fn test_repeated_text_served_from_cache() {
        let cache = Arc::new(ResultCache::new(&CacheConfig { max_entries: 16 }));
        let enricher = Enricher::new(Arc::new(AnalyzerChain::fallback_only()), cache.clone());

        enricher.enrich_track(track(&["猫"], Some("ja"))).await;
        let track = enricher.enrich_track(track(&["猫", "猫"], Some("ja"))).await;

        assert!(track.captions.iter().all(|c| c.is_enriched()));
        assert_eq!(cache.len(), 1);
        assert!(cache.stats().hits >= 2);
    }
}
