// Word-window chunker: splits material text into overlapping chunks
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// Chunking configuration (sizes are in whitespace-delimited words)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared between neighbouring chunks
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    /// Reject configurations that cannot make forward progress
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ServiceError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(ServiceError::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Text chunker bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk(text, self.config.chunk_size, self.config.overlap)
    }
}

/// Split `text` into windows of `chunk_size` words advancing by
/// `chunk_size - overlap` words. The last window always ends at the final word.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));

        if end >= words.len() {
            break;
        }
        start += step;
    }

    chunks
}
