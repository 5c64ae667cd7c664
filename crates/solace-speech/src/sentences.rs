// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence splitting for per-sentence synthesis.

const TERMINATORS: [char; 3] = ['.', '!', '?'];

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Splits `text` after `.`, `!` or `?` when followed by whitespace or the
/// end of the text.
///
/// Runs of terminators ("...", "?!") stay together and closing quotes or
/// brackets stay with their sentence. Text without a final terminator
/// becomes the last sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        i += 1;

        if !TERMINATORS.contains(&c) {
            continue;
        }
        while i < chars.len() && (TERMINATORS.contains(&chars[i]) || is_closer(chars[i])) {
            current.push(chars[i]);
            i += 1;
        }
        if i == chars.len() || chars[i].is_whitespace() {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
