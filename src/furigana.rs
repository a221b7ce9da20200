//! Furigana synthesis
//!
//! Maps a token sequence to `(text, reading)` pairs for ruby rendering.
//! Readings are only kept where they add information: the surface has to
//! contain a kanji and the reading has to differ from it. Katakana readings
//! are folded to hiragana so every reading shares one script.

use crate::analyzer::script::{contains_kanji, katakana_to_hiragana};
use crate::analyzer::AnalyzerChain;
use crate::types::{FuriganaSegment, Token};

/// Reading to display above `surface`, if any
fn ruby_reading(surface: &str, reading: &str) -> Option<String> {
    if reading.is_empty() || reading == surface || !contains_kanji(surface) {
        return None;
    }
    let reading = katakana_to_hiragana(reading);
    if reading == katakana_to_hiragana(surface) {
        return None;
    }
    Some(reading)
}

pub fn from_tokens(tokens: &[Token]) -> Vec<FuriganaSegment> {
    tokens
        .iter()
        .map(|token| FuriganaSegment {
            text: token.surface_form.clone(),
            reading: ruby_reading(&token.surface_form, &token.reading),
        })
        .collect()
}

/// Tokenize `text` through the chain and build its furigana
pub async fn synthesize(chain: &AnalyzerChain, text: &str) -> Vec<FuriganaSegment> {
    from_tokens(&chain.tokenize(text).await)
}
