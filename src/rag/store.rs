// In-memory material store: id -> immutable chunk/embedding snapshot
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use super::chunker::TextChunker;
use super::retrieval::{top_chunks, EmbeddingMatrix, ScoredChunk};
use crate::errors::{Result, ServiceError};
use crate::models::Embedder;

/// Everything stored for one material. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    chunks: Vec<String>,
    matrix: EmbeddingMatrix,
    full_text: Option<String>,
}

impl MaterialRecord {
    /// Embed `chunks` in one batch and pair each chunk with its vector
    pub fn build(embedder: &dyn Embedder, chunks: Vec<String>, full_text: Option<String>) -> Result<Self> {
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = embedder.embed_batch(&refs)?;
        if embeddings.len() != chunks.len() {
            return Err(ServiceError::ProcessingFailure(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        let matrix = EmbeddingMatrix::from_rows(embeddings)?;

        Ok(Self {
            chunks,
            matrix,
            full_text,
        })
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn full_text(&self) -> Option<&str> {
        self.full_text.as_deref()
    }

    pub fn embedding_dim(&self) -> usize {
        self.matrix.dim()
    }

    /// Rank this record's chunks against an already-embedded query
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        top_chunks(&self.chunks, &self.matrix, query_embedding, top_k)
    }
}

/// Concurrency-safe map of material snapshots.
///
/// Writers build the whole record before taking the lock and swap the
/// `Arc` in; readers clone the `Arc` and work without holding the lock.
pub struct MaterialStore {
    chunker: TextChunker,
    records: RwLock<HashMap<String, Arc<MaterialRecord>>>,
}

impl MaterialStore {
    pub fn new(chunker: TextChunker) -> Self {
        Self {
            chunker,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Chunk, embed and store `text`, replacing any previous record
    pub fn ingest(&self, embedder: &dyn Embedder, material_id: &str, text: &str) -> Result<usize> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(ServiceError::EmptyContent);
        }

        let count = chunks.len();
        let record = MaterialRecord::build(embedder, chunks, Some(text.to_string()))?;
        self.commit(material_id, record);

        info!(material_id, chunks = count, "material ingested");
        Ok(count)
    }

    /// Embed and store caller-chunked content; returns the embedding dimension
    pub fn ingest_chunks(&self, embedder: &dyn Embedder, material_id: &str, chunks: Vec<String>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(ServiceError::InvalidInput("No chunks provided".to_string()));
        }

        let count = chunks.len();
        let record = MaterialRecord::build(embedder, chunks, None)?;
        let dim = record.embedding_dim();
        self.commit(material_id, record);

        info!(material_id, chunks = count, dim, "chunks embedded");
        Ok(dim)
    }

    /// Snapshot of a stored record
    pub fn get(&self, material_id: &str) -> Result<Arc<MaterialRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(material_id)
            .cloned()
            .ok_or_else(|| ServiceError::material_not_found(material_id))
    }

    /// Top `top_k` chunks with their similarity scores, best first
    pub fn retrieve_scored(
        &self,
        embedder: &dyn Embedder,
        material_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let record = self.get(material_id)?;
        let query_embedding = embedder.embed(query)?;
        let results = record.search(&query_embedding, top_k)?;

        debug!(
            material_id,
            top_score = results.first().map(|c| c.score),
            returned = results.len(),
            "retrieved chunks"
        );
        Ok(results)
    }

    /// Top `top_k` chunk texts, best first
    pub fn retrieve(
        &self,
        embedder: &dyn Embedder,
        material_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(embedder, material_id, query, top_k)?
            .into_iter()
            .map(|c| c.text)
            .collect())
    }

    /// Every chunk of a material, in order
    pub fn get_all_chunks(&self, material_id: &str) -> Result<Vec<String>> {
        Ok(self.get(material_id)?.chunks().to_vec())
    }

    pub fn exists(&self, material_id: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(material_id)
    }

    /// Drop a material; false if it was not stored
    pub fn remove(&self, material_id: &str) -> bool {
        let removed = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(material_id)
            .is_some();
        if removed {
            info!(material_id, "material removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn commit(&self, material_id: &str, record: MaterialRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(material_id.to_string(), Arc::new(record));
    }
}

impl Default for MaterialStore {
    fn default() -> Self {
        Self::new(TextChunker::default())
    }
}
