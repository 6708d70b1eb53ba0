//! Local model layer
//!
//! The retrieval and answering core only sees two narrow interfaces:
//! [`Embedder`] (texts -> vectors) and [`Generator`] (prompt -> text).
//! Concrete backends live in the submodules; the [`ModelRegistry`] tracks
//! which of them finished loading.

pub mod beam;
pub mod embedding;
pub mod generation;
pub mod hashing;
pub mod registry;

use crate::errors::Result;

/// Maps text to fixed-dimension dense vectors
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimension produced by this embedder
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?.pop().ok_or_else(|| {
            crate::errors::ServiceError::ProcessingFailure(
                "Embedder returned no vector".to_string(),
            )
        })
    }
}

/// Produces text from a prompt
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

pub use beam::{BeamSearch, BeamSearchParams, StepScorer};
pub use embedding::BertEmbedder;
pub use generation::T5Generator;
pub use hashing::HashingEmbedder;
pub use registry::{ModelRegistry, ModelState};
