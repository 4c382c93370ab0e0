//! Directional text normalization.
//!
//! Source documents store Hebrew runs in visual order, so a string read out
//! of them has every Hebrew segment reversed while the embedded numerals
//! are already correct. [`normalize`] flips the Hebrew back into reading
//! order and leaves digit runs and race times alone.

use std::sync::LazyLock;

use regex::Regex;

/// Hebrew Unicode block.
const HEBREW_BLOCK: std::ops::RangeInclusive<char> = '\u{0590}'..='\u{05FF}';

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}\.[0-9]{2}$").expect("valid time pattern"));

/// Whether `text` is exactly a `MM:SS.ss` race time.
pub fn is_time(text: &str) -> bool {
    TIME_PATTERN.is_match(text)
}

/// Whether `text` contains any character from the Hebrew block.
pub fn contains_hebrew(text: &str) -> bool {
    text.chars().any(|c| HEBREW_BLOCK.contains(&c))
}

/// Reorder mixed-direction text into display orientation.
///
/// Times and text without Hebrew are returned unchanged. Otherwise the
/// string is split on ASCII digit runs, each non-digit segment is reversed
/// character by character, and the pieces are reassembled from the last
/// segment to the first, each digit run emitted in front of the segment
/// that preceded it.
pub fn normalize(text: &str) -> String {
    if is_time(text) || !contains_hebrew(text) {
        return text.to_string();
    }

    // Always one more segment than digit runs, possibly empty at either end.
    let mut segments = vec![String::new()];
    let mut runs: Vec<String> = Vec::new();
    let mut prev_digit = false;

    for ch in text.chars() {
        let digit = ch.is_ascii_digit();
        match (digit, prev_digit) {
            (true, false) => runs.push(ch.to_string()),
            (true, true) => {
                let last = runs.len() - 1;
                runs[last].push(ch);
            }
            (false, true) => segments.push(ch.to_string()),
            (false, false) => {
                let last = segments.len() - 1;
                segments[last].push(ch);
            }
        }
        prev_digit = digit;
    }
    if prev_digit {
        segments.push(String::new());
    }

    let mut result = String::with_capacity(text.len());
    for (i, segment) in segments.iter().enumerate().rev() {
        if let Some(run) = runs.get(i) {
            result.push_str(run);
        }
        result.extend(segment.chars().rev());
    }
    result
}
