// Key-term extraction for fill-in-the-blank questions
use regex::Regex;
use std::sync::LazyLock;

static CAPITALIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());

const CONNECTORS: &[&str] = &["however", "therefore", "although", "because", "through", "without"];
const LONG_WORD_CHARS: usize = 6;
const LONG_WORDS_TAKEN: usize = 2;
const MAX_TERMS: usize = 3;

/// Candidate answer terms in priority order: capitalized words, numbers,
/// then the first two long words. At most three are returned.
pub fn key_terms(sentence: &str) -> Vec<String> {
    let capitalized = CAPITALIZED.find_iter(sentence).map(|m| m.as_str().to_string());
    let numbers = NUMBER.find_iter(sentence).map(|m| m.as_str().to_string());
    let long_words = sentence
        .split_whitespace()
        .filter(|w| w.chars().count() > LONG_WORD_CHARS && !CONNECTORS.contains(&w.to_lowercase().as_str()))
        .map(|w| w.trim_matches(|c| ",.!?;:".contains(c)).to_string())
        .take(LONG_WORDS_TAKEN);

    capitalized
        .chain(numbers)
        .chain(long_words)
        .filter(|t| !t.is_empty())
        .take(MAX_TERMS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let terms = key_terms("The mitochondria produces 42 units of energy, however slowly");
        assert_eq!(terms, vec!["The", "42", "mitochondria"]);
    }

    #[test]
    fn test_long_words_are_trimmed_and_connectors_skipped() {
        let terms = key_terms("we studied because enzymes, catalysts; and proteins");
        assert_eq!(terms, vec!["studied", "enzymes"]);
    }

    #[test]
    fn test_decimals_stay_whole() {
        assert_eq!(key_terms("value is 3.14 here"), vec!["3.14"]);
    }

    #[test]
    fn test_long_word_length_counts_characters() {
        assert!(key_terms("we wrote a résumé for the job fair in town").is_empty());
        assert_eq!(key_terms("we read a résumés pile"), vec!["résumés"]);
    }

    #[test]
    fn test_nothing_to_blank() {
        assert!(key_terms("a b c d e f g h").is_empty());
    }
}
