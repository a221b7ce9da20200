//! Morphological analysis
//!
//! Backends are tried in order behind one contract: each either returns
//! tokens or reports itself unavailable, and the chain always ends in the
//! trivial fallback segmenter, so [`AnalyzerChain::tokenize`] never fails.

pub mod backend;
pub mod dictionary;
pub mod fallback;
pub mod remote;
pub mod script;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{AnalyzerConfig, TokenizationMethod};
use crate::types::Token;
use backend::{InitPhase, InitPolicy};
use dictionary::DictionarySegmenter;
use fallback::FallbackSegmenter;
use remote::RemoteSegmenter;

/// Uniform capability of every analyzer backend
#[async_trait]
pub trait TokenizeStrategy: Send + Sync {
    /// Short backend name for logs and status
    fn name(&self) -> &'static str;

    /// Tokens, or `None` when the backend is not available right now
    async fn try_tokenize(&self, text: &str) -> Option<Vec<Token>>;
}

/// Backend selected for a chain, resolved once from configuration
#[derive(Clone)]
enum Backend {
    Dictionary(Arc<DictionarySegmenter>),
    Remote(Arc<RemoteSegmenter>),
}

impl Backend {
    fn strategy(&self) -> &dyn TokenizeStrategy {
        match self {
            Backend::Dictionary(d) => d.as_ref(),
            Backend::Remote(r) => r.as_ref(),
        }
    }

    fn phase(&self) -> InitPhase {
        match self {
            Backend::Dictionary(d) => d.phase(),
            Backend::Remote(r) => r.phase(),
        }
    }
}

/// Status of one backend in the chain
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub phase: InitPhase,
}

/// Ordered backends terminated by the fallback segmenter
#[derive(Clone)]
pub struct AnalyzerChain {
    backends: Vec<Backend>,
    extra: Vec<Arc<dyn TokenizeStrategy>>,
    fallback: FallbackSegmenter,
}

impl AnalyzerChain {
    /// Chain with only the fallback segmenter
    pub fn fallback_only() -> Self {
        Self {
            backends: Vec::new(),
            extra: Vec::new(),
            fallback: FallbackSegmenter,
        }
    }

    /// Build the chain for the configured method. The preferred backend comes
    /// first and the other configured backend second; backends without a
    /// dictionary path or URL are left out.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let policy = InitPolicy::from(config);

        let dictionary = config
            .dictionary_path
            .as_ref()
            .map(|path| Backend::Dictionary(Arc::new(DictionarySegmenter::new(path, policy))));

        let remote = config.remote_url.as_deref().and_then(|url| {
            match RemoteSegmenter::new(url, config) {
                Ok(remote) => Some(Backend::Remote(Arc::new(remote))),
                Err(e) => {
                    tracing::warn!("Remote analyzer disabled: {}", e);
                    None
                }
            }
        });

        let backends: Vec<Backend> = match config.method {
            TokenizationMethod::Dictionary => [dictionary, remote],
            TokenizationMethod::Remote => [remote, dictionary],
            TokenizationMethod::Fallback => [None, None],
        }
        .into_iter()
        .flatten()
        .collect();

        tracing::info!(
            "Analyzer chain: {:?} -> fallback",
            backends.iter().map(|b| b.strategy().name()).collect::<Vec<_>>()
        );

        Self {
            backends,
            extra: Vec::new(),
            fallback: FallbackSegmenter,
        }
    }

    /// Append a custom backend, tried after the configured ones
    pub fn with_strategy(mut self, strategy: Arc<dyn TokenizeStrategy>) -> Self {
        self.extra.push(strategy);
        self
    }

    /// Tokenize with the first backend that is available. Never fails; falls
    /// back to trivial segmentation.
    pub async fn tokenize(&self, text: &str) -> Vec<Token> {
        if text.trim().is_empty() {
            return fallback::segment(text);
        }

        let strategies = self
            .backends
            .iter()
            .map(Backend::strategy)
            .chain(self.extra.iter().map(|s| s.as_ref()));

        for strategy in strategies {
            match strategy.try_tokenize(text).await {
                Some(tokens) => return tokens,
                None => tracing::debug!("{} analyzer unavailable, trying next", strategy.name()),
            }
        }

        fallback::segment(text)
    }

    /// Phase of each configured backend, in chain order
    pub fn status(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                name: b.strategy().name(),
                phase: b.phase(),
            })
            .chain(std::iter::once(BackendStatus {
                name: self.fallback.name(),
                phase: InitPhase::Ready,
            }))
            .collect()
    }
}
