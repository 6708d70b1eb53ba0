// Retrieval: embedding matrix and cosine ranking
pub mod engine;
pub mod matrix;

pub use engine::{mean_score, rank_indices, top_chunks, ScoredChunk};
pub use matrix::EmbeddingMatrix;
