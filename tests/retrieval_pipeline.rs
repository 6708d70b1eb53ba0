//! End-to-end retrieval pipeline tests
//!
//! Everything here runs on the hashing embedder, so no model weights are
//! downloaded.

use rand::rngs::StdRng;
use rand::SeedableRng;

use prepease::models::{Embedder, HashingEmbedder};
use prepease::qa::extractive::{ExtractiveAnswerer, NOT_AVAILABLE};
use prepease::quiz;
use prepease::rag::chunker::chunk;
use prepease::rag::{ChunkerConfig, MaterialStore, TextChunker};
use prepease::ServiceError;

const ML_TEXT: &str = "Machine learning is a subset of AI that enables systems to learn from data. \
                       Deep learning uses neural networks.";

fn numbered_words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{}", i)).collect()
}

fn small_store() -> MaterialStore {
    MaterialStore::new(TextChunker::new(ChunkerConfig { chunk_size: 8, overlap: 2 }).unwrap())
}

#[test]
fn test_short_text_is_one_trimmed_chunk() {
    let text = "  only a handful of words here \n";
    assert_eq!(chunk(text, 500, 50), vec!["only a handful of words here"]);
    assert!(chunk(" \n\t ", 500, 50).is_empty());
}

#[test]
fn test_long_text_windows_cover_every_token() {
    let words = numbered_words(23);
    let text = words.join(" ");
    let (size, overlap) = (8, 3);
    let step = size - overlap;

    let chunks = chunk(&text, size, overlap);
    for (i, c) in chunks.iter().enumerate() {
        let start = i * step;
        let end = (start + size).min(words.len());
        assert_eq!(c, &words[start..end].join(" "));
    }
    assert!(chunks.last().unwrap().ends_with("w22"));

    // chunk count is a pure function of the input
    assert_eq!(chunk(&text, size, overlap), chunks);
}

#[test]
fn test_unknown_material_is_not_found() {
    let store = MaterialStore::default();
    let embedder = HashingEmbedder::default();
    assert!(matches!(
        store.retrieve(&embedder, "nope", "anything", 3),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn test_top_k_is_bounded_and_sorted() {
    let store = small_store();
    let embedder = HashingEmbedder::default();
    store
        .ingest(&embedder, "m", &numbered_words(40).join(" "))
        .unwrap();

    let results = store.retrieve_scored(&embedder, "m", "w3 w4 w20 w21", 3).unwrap();
    assert!(results.len() <= 3);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let all = store.get_all_chunks("m").unwrap();
    let everything = store.retrieve(&embedder, "m", "w1", 100).unwrap();
    assert_eq!(everything.len(), all.len());
}

#[test]
fn test_query_equal_to_chunk_ranks_it_first() {
    let store = small_store();
    let embedder = HashingEmbedder::default();
    store
        .ingest(&embedder, "m", &numbered_words(30).join(" "))
        .unwrap();

    let target = store.get_all_chunks("m").unwrap()[1].clone();
    let results = store.retrieve_scored(&embedder, "m", &target, 3).unwrap();
    assert_eq!(results[0].index, 1);
    assert_eq!(results[0].text, target);
    assert!((results[0].score - 1.0).abs() < 1e-5);
}

#[test]
fn test_reingestion_is_idempotent() {
    let store = small_store();
    let embedder = HashingEmbedder::default();
    let text = numbered_words(25).join(" ");

    store.ingest(&embedder, "m", &text).unwrap();
    let first = store.retrieve_scored(&embedder, "m", "w5 w17", 2).unwrap();
    store.ingest(&embedder, "m", &text).unwrap();
    let second = store.retrieve_scored(&embedder, "m", "w5 w17", 2).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_machine_learning_example() {
    let store = MaterialStore::default();
    let embedder = HashingEmbedder::default();
    store.ingest(&embedder, "m1", ML_TEXT).unwrap();
    let answerer = ExtractiveAnswerer::default();

    let answer = answerer
        .answer_material(&store, &embedder, "m1", "What is machine learning?")
        .unwrap();
    assert!(answer.contains("Machine learning is a subset of AI"));

    let refusal = answerer
        .answer_material(&store, &embedder, "m1", "What is quantum computing?")
        .unwrap();
    assert_eq!(refusal, NOT_AVAILABLE);
}

#[test]
fn test_unrelated_question_is_refused() {
    let store = small_store();
    let embedder = HashingEmbedder::default();
    store
        .ingest(
            &embedder,
            "bio",
            "Cells divide through mitosis. Ribosomes assemble proteins from amino acids.",
        )
        .unwrap();

    let answer = ExtractiveAnswerer::default()
        .answer_material(&store, &embedder, "bio", "Explain galaxy formation timelines")
        .unwrap();
    assert_eq!(answer, NOT_AVAILABLE);
}

#[test]
fn test_quiz_from_stored_material() {
    let store = MaterialStore::default();
    let embedder = HashingEmbedder::default();
    store
        .ingest(
            &embedder,
            "hist",
            "The Roman Empire reached its greatest extent under Trajan in 117. \
             Julius Caesar crossed the Rubicon river with a single legion in 49 BC. \
             The Byzantine capital Constantinople fell to Ottoman forces in 1453.",
        )
        .unwrap();

    let mut rng = StdRng::seed_from_u64(2024);
    let questions = quiz::generate_for_material(&store, "hist", "medium", 2, &mut rng).unwrap();
    assert_eq!(questions.len(), 2);
    for q in &questions {
        assert_eq!(q.options.len(), 4);
        let answer = &q.options[q.correct_answer];
        assert!(q.question.contains("_____"));
        assert!(!q.question.contains(answer.as_str()));
    }

    assert!(matches!(
        quiz::generate_for_material(&store, "missing", "easy", 2, &mut rng),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn test_embedder_dimension_matches_vectors() {
    let embedder = HashingEmbedder::new(64);
    let vectors = embedder.embed_batch(&["one", "two three"]).unwrap();
    assert_eq!(vectors.len(), 2);
    assert!(vectors.iter().all(|v| v.len() == embedder.dimension()));
}
