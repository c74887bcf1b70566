//! Free-text folding for alias and title comparisons.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Trademark-style glyphs removed outright ("Brand™" reads as "Brand").
const DROPPED: [char; 4] = ['™', '®', '©', '℠'];

/// Glyphs folded to a single space.
const SEPARATORS: &[char] = &[
    '“', '”', '‘', '’', '′', '´', '`', '"', '\\', '\'', '–', '—', '‑', '-', '·', '•', '.', ',',
    ';', ':', '!', '/', '?', '(', ')', '[', ']', '{', '}', '|', '+', '&', '@', '#', '%', '^',
    '*', '~', '=', '_',
];

/// Canonical comparison form of free text.
///
/// Drops trademark glyphs, strips diacritics, turns punctuation into spaces,
/// lowercases, and collapses whitespace. Total and idempotent.
pub fn normalize_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|ch| !DROPPED.contains(ch))
        .map(|ch| if ch == '\u{a0}' { ' ' } else { ch })
        .collect();
    // Lowercase on both sides of the decomposition: compatibility forms can
    // decompose to uppercase letters and some lowercase mappings add marks.
    let folded: String = kept
        .to_lowercase()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase();
    let spaced: String = folded
        .chars()
        .map(|ch| if SEPARATORS.contains(&ch) { ' ' } else { ch })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Header cleanup for spreadsheet exports: NFKC plus whitespace collapse.
pub fn normalize_header(raw: &str) -> String {
    let composed: String = raw.trim_matches('\u{feff}').nfkc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trademark_glyphs_are_dropped() {
        assert_eq!(normalize_text("Brand™"), normalize_text("brand"));
        assert_eq!(normalize_text("Acme® Corp"), "acme corp");
    }

    #[test]
    fn accents_and_punctuation_fold() {
        assert_eq!(normalize_text("  Crème-Brûlée!!  "), "creme brulee");
        assert_eq!(normalize_text("Ben & Jerry's"), "ben jerry s");
        assert_eq!(normalize_text("Røde\u{a0}Pølse"), "røde pølse");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" .,; "), "");
    }

    #[test]
    fn header_cleanup_collapses_unicode_spaces() {
        assert_eq!(normalize_header("\u{feff}Planned\u{a0} (Local)"), "Planned (Local)");
        assert_eq!(normalize_header("Budget  (EUR) "), "Budget (EUR)");
    }
}
