//! Fill-in-the-blank quiz generation
//!
//! Questions are built from sentences of the stored material: one key
//! term is blanked out and shuffled together with three distractors.
//! When the material does not yield enough usable sentences the list is
//! padded with generic review questions. All randomness comes from the
//! caller's RNG, so a seeded RNG gives a reproducible quiz.

pub mod distractors;
pub mod terms;

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::rag::MaterialStore;
use crate::text;

pub use distractors::distractors;
pub use terms::key_terms;

const MIN_SENTENCE_CHARS: usize = 30;
const MIN_SENTENCE_WORDS: usize = 8;
const BLANK: &str = "_____";

const FILLER_OPTIONS: [&str; 4] = [
    "Refer to the material for details",
    "Multiple concepts are covered",
    "Review the full content",
    "Information varies",
];

/// One multiple-choice question as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    pub difficulty: String,
}

impl QuizQuestion {
    fn filler(number: usize, difficulty: &str) -> Self {
        Self {
            question: format!("What key concept is discussed in the material? (Question {})", number),
            options: FILLER_OPTIONS.iter().map(|o| o.to_string()).collect(),
            correct_answer: 0,
            difficulty: difficulty.to_string(),
        }
    }
}

/// Build a quiz from every chunk of a stored material
pub fn generate_for_material<R: Rng + ?Sized>(
    store: &MaterialStore,
    material_id: &str,
    difficulty: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>> {
    let chunks = store.get_all_chunks(material_id)?;
    Ok(generate(&chunks, difficulty, count, rng))
}

/// Up to `count` questions from `chunks`.
///
/// `count` is capped at the number of usable sentences; shortfalls after
/// that are padded with filler questions.
pub fn generate<R: Rng + ?Sized>(
    chunks: &[String],
    difficulty: &str,
    count: usize,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let sentences: Vec<String> = chunks
        .iter()
        .flat_map(|chunk| text::sentences(chunk, MIN_SENTENCE_CHARS))
        .collect();

    let count = count.min(sentences.len());
    let candidates = (count * 2).min(sentences.len());

    let mut questions = Vec::with_capacity(count);
    for i in index::sample(rng, sentences.len(), candidates) {
        if questions.len() >= count {
            break;
        }
        if let Some(question) = question_from_sentence(&sentences[i], difficulty, rng) {
            questions.push(question);
        }
    }

    let built = questions.len();
    for number in 1..=count - built {
        questions.push(QuizQuestion::filler(number, difficulty));
    }
    debug!(sentences = sentences.len(), built, padded = count - built, "quiz generated");

    questions.truncate(count);
    questions
}

/// Blank out the sentence's first key term, or `None` if it has no usable term
pub fn question_from_sentence<R: Rng + ?Sized>(
    sentence: &str,
    difficulty: &str,
    rng: &mut R,
) -> Option<QuizQuestion> {
    if sentence.split_whitespace().count() < MIN_SENTENCE_WORDS {
        return None;
    }

    let target = key_terms(sentence).into_iter().next()?;
    let blanked = sentence.replace(&target, BLANK);
    if blanked == sentence {
        return None;
    }

    let mut options = Vec::with_capacity(4);
    options.push(target.clone());
    options.extend(distractors(&target, rng));
    options.shuffle(rng);

    let correct_answer = options.iter().position(|o| *o == target)?;

    Some(QuizQuestion {
        question: format!("Fill in the blank: {}", blanked),
        options,
        correct_answer,
        difficulty: difficulty.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn material() -> Vec<String> {
        vec![
            "The Amazon rainforest covers about 5500000 square kilometres of land. \
             Photosynthesis converts sunlight into chemical energy inside plant cells. \
             Too short."
                .to_string(),
            "Isaac Newton published the laws of motion in the year 1687 in England. \
             Water boils at 100 degrees at standard atmospheric pressure levels."
                .to_string(),
        ]
    }

    #[test]
    fn test_question_properties() {
        let mut rng = StdRng::seed_from_u64(42);
        let questions = generate(&material(), "medium", 3, &mut rng);

        assert_eq!(questions.len(), 3);
        for q in &questions {
            assert_eq!(q.options.len(), 4);
            assert!(q.correct_answer < 4);
            assert_eq!(q.difficulty, "medium");
            assert!(q.question.starts_with("Fill in the blank: "));
            assert!(q.question.contains(BLANK));
        }
    }

    #[test]
    fn test_correct_option_is_the_blanked_term() {
        let sentence = "Photosynthesis converts sunlight into chemical energy inside plant cells";
        let mut rng = StdRng::seed_from_u64(9);
        let q = question_from_sentence(sentence, "easy", &mut rng).unwrap();

        assert_eq!(q.options[q.correct_answer], "Photosynthesis");
        assert_eq!(
            q.question,
            "Fill in the blank: _____ converts sunlight into chemical energy inside plant cells"
        );
    }

    #[test]
    fn test_rejects_short_and_termless_sentences() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(question_from_sentence("Newton wrote laws", "easy", &mut rng).is_none());
        assert!(question_from_sentence("a b c d e f g h i j", "easy", &mut rng).is_none());
    }

    #[test]
    fn test_count_capped_by_sentences() {
        let mut rng = StdRng::seed_from_u64(5);
        let questions = generate(&material(), "hard", 50, &mut rng);
        assert_eq!(questions.len(), 4);
    }

    #[test]
    fn test_pads_with_filler_questions() {
        // long enough to count as a sentence, but no term to blank out
        let chunks = vec!["this one has no caps and no big words at all in it".to_string()];
        let mut rng = StdRng::seed_from_u64(5);
        let questions = generate(&chunks, "easy", 1, &mut rng);

        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].question,
            "What key concept is discussed in the material? (Question 1)"
        );
        assert_eq!(questions[0].options[0], "Refer to the material for details");
        assert_eq!(questions[0].correct_answer, 0);
    }

    #[test]
    fn test_empty_material_gives_empty_quiz() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(generate(&[], "easy", 5, &mut rng).is_empty());
        assert!(generate(&material(), "easy", 0, &mut rng).is_empty());
    }

    #[test]
    fn test_same_seed_same_quiz() {
        let a = generate(&material(), "easy", 2, &mut StdRng::seed_from_u64(11));
        let b = generate(&material(), "easy", 2, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(QuizQuestion::filler(2, "easy")).unwrap();
        assert_eq!(json["correctAnswer"], 0);
        assert!(json.get("correct_answer").is_none());
    }
}
