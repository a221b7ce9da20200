//! Trivial segmentation used when no real analyzer is available
//!
//! Japanese-looking text is split into single characters, anything else on
//! whitespace runs. Always terminates and yields at least one token for
//! non-empty input.

use async_trait::async_trait;

use super::script::looks_japanese;
use super::TokenizeStrategy;
use crate::types::Token;

pub fn segment(text: &str) -> Vec<Token> {
    let tokens: Vec<Token> = if looks_japanese(text) {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Token::plain(c.to_string()))
            .collect()
    } else {
        text.split_whitespace().map(Token::plain).collect()
    };

    if tokens.is_empty() && !text.is_empty() {
        return vec![Token::plain(text)];
    }
    tokens
}

/// Always-succeeding last link of the analyzer chain
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackSegmenter;

#[async_trait]
impl TokenizeStrategy for FallbackSegmenter {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn try_tokenize(&self, text: &str) -> Option<Vec<Token>> {
        Some(segment(text))
    }
}
