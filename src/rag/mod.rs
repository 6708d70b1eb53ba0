// Retrieval core
//
// Components:
// - Chunker: overlapping word windows over material text
// - Retrieval: embedding matrix + cosine ranking
// - Store: per-material immutable snapshots behind a RwLock

pub mod chunker;
pub mod retrieval;
pub mod store;

pub use chunker::{ChunkerConfig, TextChunker};
pub use retrieval::{EmbeddingMatrix, ScoredChunk};
pub use store::{MaterialRecord, MaterialStore};
