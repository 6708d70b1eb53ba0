//! Sentence and word splitting shared by the answerer and quiz builder

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Split on runs of `.`, `!` or `?`, trimming each piece and keeping those
/// strictly longer than `min_chars` characters.
pub fn sentences(text: &str, min_chars: usize) -> Vec<String> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}

/// Lowercased word-character runs, in order of appearance
pub fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split_and_filter() {
        let text = "Short. This one is clearly long enough!! Why? Another sentence that passes the bar";
        let got = sentences(text, 20);
        assert_eq!(
            got,
            vec![
                "This one is clearly long enough",
                "Another sentence that passes the bar"
            ]
        );
    }

    #[test]
    fn test_sentences_boundary_is_exclusive() {
        let twenty = "abcdefghij klmnopqrs"; // 20 chars
        assert!(sentences(twenty, 20).is_empty());
        assert_eq!(sentences(twenty, 19).len(), 1);
    }

    #[test]
    fn test_words_lowercase_and_strip_punctuation() {
        assert_eq!(words("What is Machine-Learning?"), vec!["what", "is", "machine", "learning"]);
    }
}
