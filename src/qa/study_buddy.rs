//! Similarity-gated generative answering over lectures
//!
//! The generator only ever sees the retrieved lecture chunks. When the best
//! chunk is too far from the question the generator is not called at all and
//! a fixed refusal is returned.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::models::{Embedder, Generator};
use crate::rag::retrieval::{mean_score, ScoredChunk};
use crate::rag::MaterialStore;

pub const NOT_COVERED: &str = "The uploaded material does not cover this topic.";

const HIGH_CONFIDENCE: f32 = 0.6;
const MEDIUM_CONFIDENCE: f32 = 0.4;

/// How well the retrieved chunks matched the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Label for a mean similarity score
    pub fn from_mean_score(score: f32) -> Self {
        if score > HIGH_CONFIDENCE {
            Confidence::High
        } else if score > MEDIUM_CONFIDENCE {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyBuddyAnswer {
    pub answer: String,
    pub confidence: Confidence,
    pub sources_used: usize,
}

impl StudyBuddyAnswer {
    fn refusal() -> Self {
        Self {
            answer: NOT_COVERED.to_string(),
            confidence: Confidence::Low,
            sources_used: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudyBuddy {
    top_k: usize,
    relevance_threshold: f32,
}

impl StudyBuddy {
    pub fn new(top_k: usize, relevance_threshold: f32) -> Self {
        Self {
            top_k: top_k.max(1),
            relevance_threshold,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.study_buddy_top_k, config.relevance_threshold)
    }

    /// Answer `question` from the chunks of `lecture_id`
    pub fn answer(
        &self,
        store: &MaterialStore,
        embedder: &dyn Embedder,
        generator: &dyn Generator,
        lecture_id: &str,
        question: &str,
    ) -> Result<StudyBuddyAnswer> {
        let retrieved = store.retrieve_scored(embedder, lecture_id, question, self.top_k)?;

        let best = retrieved.first().map(|c| c.score).unwrap_or(f32::NEG_INFINITY);
        if best < self.relevance_threshold {
            info!(lecture_id, best_score = best, "question below relevance threshold, refusing");
            return Ok(StudyBuddyAnswer::refusal());
        }

        let prompt = build_prompt(&retrieved, question);
        debug!(lecture_id, prompt_chars = prompt.len(), "generating answer");
        let answer = generator.generate(&prompt)?;

        Ok(StudyBuddyAnswer {
            answer,
            confidence: Confidence::from_mean_score(mean_score(&retrieved)),
            sources_used: retrieved.len(),
        })
    }
}

impl Default for StudyBuddy {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

/// Fill the grounding template with the retrieved chunks and the question
pub fn build_prompt(chunks: &[ScoredChunk], question: &str) -> String {
    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a Study Buddy AI.\n\
         Answer the question using ONLY the provided lecture content.\n\
         If the answer is not present in the lecture, reply exactly:\n\
         '{NOT_COVERED}'\n\
         \n\
         Lecture Content:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use std::sync::Mutex;

    const VOCAB: &[&str] = &["photosynthesis", "chlorophyll", "mitochondria", "quantum"];

    /// One axis per vocabulary word, counting occurrences
    struct VocabEmbedder;

    impl Embedder for VocabEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    VOCAB.iter().map(|w| lower.matches(w).count() as f32).collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            VOCAB.len()
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl Generator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Plants turn light into sugar.".to_string())
        }
    }

    fn lecture_store() -> MaterialStore {
        let store = MaterialStore::default();
        store
            .ingest_chunks(
                &VocabEmbedder,
                "bio",
                vec![
                    "Photosynthesis uses chlorophyll to capture light".to_string(),
                    "Mitochondria release energy".to_string(),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(Confidence::from_mean_score(0.61), Confidence::High);
        assert_eq!(Confidence::from_mean_score(0.6), Confidence::Medium);
        assert_eq!(Confidence::from_mean_score(0.41), Confidence::Medium);
        assert_eq!(Confidence::from_mean_score(0.4), Confidence::Low);
        assert_eq!(Confidence::from_mean_score(f32::NEG_INFINITY), Confidence::Low);
    }

    #[test]
    fn test_refuses_without_calling_generator() {
        let store = lecture_store();
        let generator = RecordingGenerator::default();
        let answer = StudyBuddy::default()
            .answer(&store, &VocabEmbedder, &generator, "bio", "Explain quantum tunnelling")
            .unwrap();

        assert_eq!(answer, StudyBuddyAnswer::refusal());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generates_from_retrieved_chunks() {
        let store = lecture_store();
        let generator = RecordingGenerator::default();
        let answer = StudyBuddy::new(1, 0.3)
            .answer(&store, &VocabEmbedder, &generator, "bio", "What does photosynthesis need chlorophyll for?")
            .unwrap();

        assert_eq!(answer.answer, "Plants turn light into sugar.");
        assert_eq!(answer.confidence, Confidence::High);
        assert_eq!(answer.sources_used, 1);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Photosynthesis uses chlorophyll to capture light"));
        assert!(!prompts[0].contains("Mitochondria"));
        assert!(prompts[0].ends_with("Question: What does photosynthesis need chlorophyll for?\n\nAnswer:"));
    }

    #[test]
    fn test_unknown_lecture_is_not_found() {
        let store = lecture_store();
        let err = StudyBuddy::default()
            .answer(&store, &VocabEmbedder, &RecordingGenerator::default(), "nope", "photosynthesis")
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_prompt_joins_chunks_with_blank_lines() {
        let chunks = vec![
            ScoredChunk { index: 0, text: "first".into(), score: 0.9 },
            ScoredChunk { index: 1, text: "second".into(), score: 0.8 },
        ];
        let prompt = build_prompt(&chunks, "q?");
        assert!(prompt.starts_with("You are a Study Buddy AI.\n"));
        assert!(prompt.contains("Lecture Content:\nfirst\n\nsecond\n\nQuestion: q?"));
        assert!(prompt.contains("reply exactly:\n'The uploaded material does not cover this topic.'\n"));
    }

    #[test]
    fn test_answer_serializes_lowercase_confidence() {
        let json = serde_json::to_value(StudyBuddyAnswer::refusal()).unwrap();
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["sources_used"], 0);
    }
}
