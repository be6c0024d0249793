//! Text normalization for extracted document text.
//!
//! PDF text comes back with inconsistent line endings, decomposed accents,
//! runs of spaces used for layout and stray blank lines. This module cleans
//! that up without touching the wording.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{2000}-\u{200B}\u{3000}]+").unwrap());

/// Soft hyphen and zero-width characters that some PDF producers leave behind.
const INVISIBLE_CHARS: &[char] = &['\u{00AD}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Normalizer for text extracted from documents.
#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer;

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a new text normalizer with default settings.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a block of text.
    ///
    /// - Converts `\r\n` and `\r` to `\n`
    /// - Applies Unicode NFC composition
    /// - Removes soft hyphens and zero-width characters
    /// - Turns control characters other than tab and newline (form feeds
    ///   between PDF pages, stray NULs) into spaces
    /// - Collapses horizontal whitespace runs, trims each line and drops
    ///   blank lines
    pub fn normalize(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        let composed: String = text
            .nfc()
            .filter(|c| !INVISIBLE_CHARS.contains(c))
            .map(|c| if c.is_control() && c != '\n' && c != '\t' { ' ' } else { c })
            .collect();

        composed
            .lines()
            .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Hello    world"), "Hello world");
        assert_eq!(normalizer.normalize("  Hello  "), "Hello");
        assert_eq!(normalizer.normalize("\t\tHello\t\t"), "Hello");
        assert_eq!(normalizer.normalize("a\u{00A0}\u{00A0}b"), "a b");
    }

    #[test]
    fn test_line_endings() {
        let normalizer = TextNormalizer::new();

        assert_eq!(
            normalizer.normalize("Line one\r\nLine two\rLine three"),
            "Line one\nLine two\nLine three"
        );
    }

    #[test]
    fn test_drop_blank_lines() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Hello\n\n  \nWorld"), "Hello\nWorld");
    }

    #[test]
    fn test_nfc_composition() {
        let normalizer = TextNormalizer::new();

        // "e" followed by a combining acute accent becomes a single "é"
        let decomposed = "caf\u{0065}\u{0301}";
        assert_eq!(normalizer.normalize(decomposed), "caf\u{00E9}");
    }

    #[test]
    fn test_invisible_chars_removed() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("co\u{00AD}operate\u{FEFF}"), "cooperate");
    }

    #[test]
    fn test_control_chars_become_spaces() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Page\u{0C}break"), "Page break");
        assert_eq!(normalizer.normalize("a\u{0}\u{1F}b\u{7F}"), "a b");
        assert_eq!(normalizer.normalize("\u{0C}\nNext"), "Next");
    }
}
