use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::beam::BeamSearchParams;
use crate::rag::chunker::ChunkerConfig;

/// Complete service configuration (~/.prepease/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chunking: ChunkerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Retrieval and gating knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks handed to the extractive answerer
    pub chat_top_k: usize,
    /// Chunks handed to the generative answerer
    pub study_buddy_top_k: usize,
    /// Best similarity below this refuses without generating
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chat_top_k: 3,
            study_buddy_top_k: 3,
            relevance_threshold: 0.3,
        }
    }
}

/// Which embedding backend to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 sentence encoder
    Minilm,
    /// Offline feature-hashing embedder
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub embedder: EmbedderKind,
    pub embedding_model_id: String,
    pub generation_model_id: String,
    pub generation_enabled: bool,
    pub hashing_dim: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderKind::Minilm,
            embedding_model_id: crate::models::embedding::DEFAULT_MODEL_ID.to_string(),
            generation_model_id: crate::models::generation::DEFAULT_MODEL_ID.to_string(),
            generation_enabled: true,
            hashing_dim: crate::models::hashing::DEFAULT_HASHING_DIM,
        }
    }
}

/// Decoding settings for the generative answerer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_input_tokens: usize,
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub no_repeat_ngram_size: usize,
    pub early_stopping: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: 512,
            max_length: 150,
            min_length: 10,
            num_beams: 4,
            no_repeat_ngram_size: 3,
            early_stopping: true,
        }
    }
}

impl GenerationConfig {
    pub fn beam_params(&self) -> BeamSearchParams {
        BeamSearchParams {
            num_beams: self.num_beams,
            max_length: self.max_length,
            min_length: self.min_length,
            no_repeat_ngram_size: self.no_repeat_ngram_size,
            early_stopping: self.early_stopping,
            ..BeamSearchParams::default()
        }
    }
}

impl Config {
    /// Load the default config file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path()?)
    }

    /// Load `path` if it exists, otherwise return defaults without writing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(path)
    }

    /// Load an explicit config file; a missing file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        config.chunking.validate()
            .context("Invalid [chunking] section")?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".prepease").join("config.toml"))
    }
}
