// Row-major embedding matrix with cached row norms
use crate::errors::{Result, ServiceError};

/// Chunk embeddings for one material, one row per chunk
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build from per-chunk vectors; every row must share one non-zero dimension
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(ServiceError::ProcessingFailure(
                "Embedder returned empty vectors".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        let mut norms = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(ServiceError::ProcessingFailure(format!(
                    "Embedding {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            norms.push(l2_norm(&row));
            data.extend(row);
        }

        Ok(Self { dim, data, norms })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    /// Cosine similarity of `query` against every row in one pass.
    ///
    /// Rows or queries with zero (or non-finite) norm score `-inf`.
    pub fn cosine_similarities(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dim {
            return Err(ServiceError::ProcessingFailure(format!(
                "Query embedding has dimension {}, expected {}",
                query.len(),
                self.dim
            )));
        }

        let query_norm = l2_norm(query);
        let scores = self
            .data
            .chunks_exact(self.dim)
            .zip(&self.norms)
            .map(|(row, &row_norm)| {
                let denom = query_norm * row_norm;
                if denom == 0.0 || !denom.is_finite() {
                    return f32::NEG_INFINITY;
                }
                let dot: f32 = row.iter().zip(query).map(|(a, b)| a * b).sum();
                let score = dot / denom;
                if score.is_nan() {
                    f32::NEG_INFINITY
                } else {
                    score
                }
            })
            .collect();

        Ok(scores)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
