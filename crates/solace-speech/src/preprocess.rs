// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text clean-up applied to each sentence before synthesis.

use std::sync::LazyLock;

use regex::Regex;

/// Everything except word characters, whitespace and basic punctuation.
static UNSPEAKABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s.,?!]").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes typographic punctuation and strips characters the voice
/// model cannot pronounce.
pub fn preprocess_text(text: &str) -> String {
    let text = text.replace('\u{2019}', "'").replace('\u{2026}', "...");
    let text = UNSPEAKABLE.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsis_expanded() {
        assert_eq!(preprocess_text("Well\u{2026} maybe."), "Well... maybe.");
    }

    #[test]
    fn apostrophe_normalized_then_stripped() {
        // The straight apostrophe is not in the kept set either.
        assert_eq!(preprocess_text("It\u{2019}s fine."), "Its fine.");
    }

    #[test]
    fn symbols_removed_and_spaces_collapsed() {
        assert_eq!(
            preprocess_text("  Hello   *world*!\n\n(smiles) :-) "),
            "Hello world! smiles"
        );
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(preprocess_text("Café, naïve?"), "Café, naïve?");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(preprocess_text(" \u{1F600} "), "");
    }
}
