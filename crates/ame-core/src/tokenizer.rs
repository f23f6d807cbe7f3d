use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MIN_TOKEN_LEN;

static ALPHA_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+").unwrap());

/// High-frequency function words that never count as vocabulary hits.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must", "can",
    "could", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "during", "before", "after", "above", "below", "between", "out", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "just", "because", "but", "and", "or",
    "if", "while", "about", "up", "down", "he", "she", "it", "they", "we", "you", "i", "me",
    "him", "her", "us", "them", "my", "your", "his", "its", "our", "their", "this", "that",
    "these", "those", "what", "which", "who", "whom", "whose", "also", "still", "even", "much",
    "many", "well", "back", "new",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Crude inflection suffixes stripped when looking up a token.
const SUFFIXES: &[&str] = &["ing", "ed", "s"];

/// Lowercase ASCII-alphabetic runs, in order. Digits, apostrophes and
/// non-ASCII letters all split tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    ALPHA_RUN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_SET.contains(token)
}

/// Vocabulary candidates in `text`: tokens of at least three letters that are
/// not stop words, deduplicated in first-encounter order.
pub fn candidate_keys(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !is_stop_word(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Forms of `token` with one trailing `-ing`, `-ed` or `-s` removed.
///
/// No real stemming: `declined` yields `declin`, and irregular forms yield
/// nothing useful. Stems shorter than three letters are dropped.
pub fn suffix_variants(token: &str) -> Vec<String> {
    SUFFIXES
        .iter()
        .filter_map(|suffix| token.strip_suffix(suffix))
        .filter(|stem| stem.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
