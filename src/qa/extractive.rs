// Rule-based answerer: keyword relevance gate + sentence extraction
use std::collections::HashSet;
use tracing::debug;

use crate::errors::Result;
use crate::models::Embedder;
use crate::rag::MaterialStore;
use crate::text;

pub const NOT_AVAILABLE: &str = "This information is not available in the provided material.";

const STOP_WORDS: &[&str] = &[
    "what", "when", "where", "which", "how", "does", "this", "that", "these", "those",
];
const MIN_KEYWORD_CHARS: usize = 3;
const KEYWORD_MATCH_RATIO: f64 = 0.3;
const MIN_SENTENCE_CHARS: usize = 20;
const ANSWER_SENTENCES: usize = 2;

/// Answers questions by quoting the most relevant context sentences
#[derive(Debug, Clone)]
pub struct ExtractiveAnswerer {
    top_k: usize,
}

impl ExtractiveAnswerer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k: top_k.max(1) }
    }

    /// Retrieve context for `material_id` and answer from it
    pub fn answer_material(
        &self,
        store: &MaterialStore,
        embedder: &dyn Embedder,
        material_id: &str,
        question: &str,
    ) -> Result<String> {
        let chunks = store.retrieve(embedder, material_id, question, self.top_k)?;
        Ok(self.answer(question, &chunks))
    }

    /// Answer `question` using only `context_chunks`, or refuse
    pub fn answer(&self, question: &str, context_chunks: &[String]) -> String {
        let context = context_chunks.join(" ");

        if !is_relevant(question, &context) {
            debug!("relevance gate refused question");
            return NOT_AVAILABLE.to_string();
        }

        extract_answer(question, &context).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

impl Default for ExtractiveAnswerer {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Question words worth matching: longer than three chars, not a stop word
pub fn keywords(question: &str) -> Vec<String> {
    text::words(question)
        .into_iter()
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// At least 30% of the keywords (and at least one) must occur in the context
pub fn is_relevant(question: &str, context: &str) -> bool {
    let keywords = keywords(question);
    if keywords.is_empty() {
        return true;
    }

    let context_lower = context.to_lowercase();
    let matches = keywords
        .iter()
        .filter(|k| context_lower.contains(k.as_str()))
        .count();

    matches as f64 >= (keywords.len() as f64 * KEYWORD_MATCH_RATIO).max(1.0)
}

/// Up to two context sentences sharing the most words with the question
fn extract_answer(question: &str, context: &str) -> Option<String> {
    let question_words: HashSet<String> = text::words(question).into_iter().collect();

    let mut scored: Vec<(usize, String)> = text::sentences(context, MIN_SENTENCE_CHARS)
        .into_iter()
        .map(|sentence| {
            let sentence_words: HashSet<String> = text::words(&sentence).into_iter().collect();
            (question_words.intersection(&sentence_words).count(), sentence)
        })
        .collect();

    // stable: equal scores keep document order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    match scored.first() {
        None | Some((0, _)) => None,
        Some(_) => Some(
            scored
                .into_iter()
                .take(ANSWER_SENTENCES)
                .filter(|(score, _)| *score > 0)
                .map(|(_, sentence)| sentence)
                .collect::<Vec<_>>()
                .join(" "),
        ),
    }
}
