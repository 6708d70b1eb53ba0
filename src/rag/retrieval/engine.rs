// Similarity ranking over a material's chunks
use serde::{Deserialize, Serialize};

use super::matrix::EmbeddingMatrix;
use crate::errors::{Result, ServiceError};

/// Retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Position of the chunk in the material
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Indices of the `top_k` highest scores, best first.
///
/// The sort is stable, so equal scores keep chunk order (lower index wins).
pub fn rank_indices(scores: &[f32], top_k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(top_k);
    order
}

/// Score `chunks` against `query_embedding` and keep the best `top_k`
pub fn top_chunks(
    chunks: &[String],
    matrix: &EmbeddingMatrix,
    query_embedding: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredChunk>> {
    if matrix.rows() != chunks.len() {
        return Err(ServiceError::ProcessingFailure(format!(
            "{} chunks but {} embeddings",
            chunks.len(),
            matrix.rows()
        )));
    }
    let scores = matrix.cosine_similarities(query_embedding)?;
    Ok(rank_indices(&scores, top_k)
        .into_iter()
        .map(|index| ScoredChunk {
            index,
            text: chunks[index].clone(),
            score: scores[index],
        })
        .collect())
}

/// Mean similarity of the retrieved chunks (0.0 when nothing was retrieved)
pub fn mean_score(chunks: &[ScoredChunk]) -> f32 {
    if chunks.is_empty() {
        return 0.0;
    }
    chunks.iter().map(|c| c.score).sum::<f32>() / chunks.len() as f32
}
