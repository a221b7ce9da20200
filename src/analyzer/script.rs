//! Character class helpers for Japanese text

/// Offset between a katakana code point and its hiragana counterpart
const KATAKANA_HIRAGANA_OFFSET: u32 = 0x60;

/// CJK ideograph, including the `々` iteration mark
pub fn is_kanji(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{3005}')
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{309F}')
}

pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}')
}

/// Any kanji or kana in the text
pub fn looks_japanese(text: &str) -> bool {
    text.chars()
        .any(|c| is_kanji(c) || is_hiragana(c) || is_katakana(c))
}

pub fn contains_kanji(text: &str) -> bool {
    text.chars().any(is_kanji)
}

/// Map full-width katakana to hiragana; every other character is kept.
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => {
                char::from_u32(c as u32 - KATAKANA_HIRAGANA_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}
