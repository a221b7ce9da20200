//! In-process dictionary segmenter backed by vibrato
//!
//! The compiled system dictionary is loaded lazily on first use, on the
//! blocking pool, and shared by every later call.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vibrato::{Dictionary, Tokenizer};

use super::backend::{BackendCell, InitPhase, InitPolicy};
use super::TokenizeStrategy;
use crate::error::{CaptionError, Result};
use crate::types::Token;

/// Feature column layout of IPADIC-style dictionaries:
/// `pos1,pos2,pos3,pos4,conj_type,conj_form,base_form,reading,pronunciation`
const POS_COLUMNS: usize = 4;
const BASE_FORM_COLUMN: usize = 6;
const READING_COLUMN: usize = 7;

pub struct DictionarySegmenter {
    path: PathBuf,
    cell: BackendCell<Tokenizer>,
}

impl DictionarySegmenter {
    pub fn new(path: impl Into<PathBuf>, policy: InitPolicy) -> Self {
        Self {
            path: path.into(),
            cell: BackendCell::new("dictionary", policy),
        }
    }

    pub fn phase(&self) -> InitPhase {
        self.cell.phase()
    }

    async fn tokenizer(&self) -> Option<std::sync::Arc<Tokenizer>> {
        self.cell
            .get_or_init(|| {
                let path = self.path.clone();
                async move {
                    tokio::task::spawn_blocking(move || load_tokenizer(&path))
                        .await
                        .map_err(|e| CaptionError::BackendUnavailable(e.to_string()))?
                }
            })
            .await
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    let reader = BufReader::new(File::open(path)?);
    let dict = Dictionary::read(reader).map_err(|e| {
        CaptionError::BackendUnavailable(format!("{}: {}", path.display(), e))
    })?;
    tracing::info!("Loaded system dictionary from {}", path.display());
    Ok(Tokenizer::new(dict))
}

/// Build a token from a surface form and its dictionary feature string.
/// Missing (`*`) columns fall back to the surface form.
pub fn token_from_feature(surface: &str, feature: &str) -> Token {
    let columns: Vec<&str> = feature.split(',').collect();
    let column = |i: usize| {
        columns
            .get(i)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && *c != "*")
    };

    let part_of_speech = (0..POS_COLUMNS)
        .filter_map(column)
        .collect::<Vec<_>>()
        .join("-");

    Token {
        surface_form: surface.to_string(),
        basic_form: column(BASE_FORM_COLUMN).unwrap_or(surface).to_string(),
        reading: column(READING_COLUMN).unwrap_or(surface).to_string(),
        part_of_speech: if part_of_speech.is_empty() {
            "unknown".to_string()
        } else {
            part_of_speech
        },
    }
}

#[async_trait]
impl TokenizeStrategy for DictionarySegmenter {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    async fn try_tokenize(&self, text: &str) -> Option<Vec<Token>> {
        let tokenizer = self.tokenizer().await?;

        let tokens: Vec<Token> = {
            let mut worker = tokenizer.new_worker();
            worker.reset_sentence(text);
            worker.tokenize();
            (0..worker.num_tokens())
                .map(|i| {
                    let token = worker.token(i);
                    token_from_feature(token.surface(), token.feature())
                })
                .collect()
        };

        if tokens.is_empty() && !text.trim().is_empty() {
            tracing::debug!("Dictionary segmenter produced no tokens for {:?}", text);
            self.cell.record_failure().await;
            return None;
        }

        self.cell.record_success();
        Some(tokens)
    }
}
