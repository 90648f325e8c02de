//! Display labels for ranked keys.
//!
//! Applied to a frame after ranking; never feeds back into totals or order.

use serde::{Deserialize, Serialize};

/// Distance from `'A'` to REGIONAL INDICATOR SYMBOL LETTER A (U+1F1E6).
const REGIONAL_INDICATOR_OFFSET: u32 = 0x1F1E6 - 'A' as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormatter {
    /// Key shown as-is (IP addresses).
    #[default]
    Identity,
    /// Two-letter country codes get a flag glyph prefix: `"🇺🇸 US"`.
    CountryFlag,
}

impl LabelFormatter {
    pub fn format(&self, key: &str) -> String {
        match self {
            LabelFormatter::Identity => key.to_string(),
            LabelFormatter::CountryFlag => match flag_emoji(key) {
                Some(flag) => format!("{flag} {}", key.to_ascii_uppercase()),
                None => key.to_string(),
            },
        }
    }
}

/// Flag glyph for a two-letter ASCII country code, `None` for anything else.
pub fn flag_emoji(code: &str) -> Option<String> {
    let bytes = code.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
        return None;
    }
    bytes
        .iter()
        .map(|b| char::from_u32(u32::from(b.to_ascii_uppercase()) + REGIONAL_INDICATOR_OFFSET))
        .collect()
}
