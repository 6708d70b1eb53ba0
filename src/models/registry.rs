//! Model registry with load-state tracking
//!
//! Models are loaded once, off the async runtime, right after startup.
//! Until a slot is `Loaded` every accessor returns
//! [`ServiceError::ModelUnavailable`] instead of waiting.

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::embedding::BertEmbedder;
use super::generation::T5Generator;
use super::hashing::HashingEmbedder;
use super::{Embedder, Generator};
use crate::config::{EmbedderKind, GenerationConfig, ModelsConfig};
use crate::errors::{Result, ServiceError};

/// Load state reported by `/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Loading,
    Loaded,
    Failed,
    Disabled,
}

enum Slot<T: ?Sized> {
    Loading,
    Ready(Arc<T>),
    Failed(String),
    Disabled,
}

impl<T: ?Sized> Slot<T> {
    fn state(&self) -> ModelState {
        match self {
            Slot::Loading => ModelState::Loading,
            Slot::Ready(_) => ModelState::Loaded,
            Slot::Failed(_) => ModelState::Failed,
            Slot::Disabled => ModelState::Disabled,
        }
    }

    fn get(&self, what: &str) -> Result<Arc<T>> {
        match self {
            Slot::Ready(model) => Ok(Arc::clone(model)),
            Slot::Loading => Err(ServiceError::ModelUnavailable(format!("{} not loaded", what))),
            Slot::Failed(reason) => Err(ServiceError::ModelUnavailable(format!(
                "{} failed to load: {}",
                what, reason
            ))),
            Slot::Disabled => Err(ServiceError::ModelUnavailable(format!("{} is disabled", what))),
        }
    }
}

/// Shared holder for the embedding and generation models
pub struct ModelRegistry {
    embedder: RwLock<Slot<dyn Embedder>>,
    generator: RwLock<Slot<dyn Generator>>,
}

impl ModelRegistry {
    /// Registry with both models still loading
    pub fn new() -> Self {
        Self {
            embedder: RwLock::new(Slot::Loading),
            generator: RwLock::new(Slot::Loading),
        }
    }

    /// Registry with models already available
    pub fn with_models(embedder: Arc<dyn Embedder>, generator: Option<Arc<dyn Generator>>) -> Self {
        let generator = match generator {
            Some(g) => Slot::Ready(g),
            None => Slot::Disabled,
        };
        Self {
            embedder: RwLock::new(Slot::Ready(embedder)),
            generator: RwLock::new(generator),
        }
    }

    pub fn set_embedder(&self, embedder: Arc<dyn Embedder>) {
        *self.embedder.write().unwrap_or_else(PoisonError::into_inner) = Slot::Ready(embedder);
    }

    pub fn set_generator(&self, generator: Arc<dyn Generator>) {
        *self.generator.write().unwrap_or_else(PoisonError::into_inner) = Slot::Ready(generator);
    }

    pub fn mark_embedder_failed(&self, reason: impl Into<String>) {
        *self.embedder.write().unwrap_or_else(PoisonError::into_inner) = Slot::Failed(reason.into());
    }

    pub fn mark_generator_failed(&self, reason: impl Into<String>) {
        *self.generator.write().unwrap_or_else(PoisonError::into_inner) = Slot::Failed(reason.into());
    }

    pub fn disable_generator(&self) {
        *self.generator.write().unwrap_or_else(PoisonError::into_inner) = Slot::Disabled;
    }

    /// The embedding model, or `ModelUnavailable`
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        self.embedder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get("Embedding model")
    }

    /// The generation model, or `ModelUnavailable`
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        self.generator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get("Generation model")
    }

    pub fn embedder_state(&self) -> ModelState {
        self.embedder.read().unwrap_or_else(PoisonError::into_inner).state()
    }

    pub fn generator_state(&self) -> ModelState {
        self.generator.read().unwrap_or_else(PoisonError::into_inner).state()
    }

    /// Load every configured model, publishing each slot as it settles
    pub fn load_blocking(&self, models: &ModelsConfig, generation: &GenerationConfig) {
        match models.embedder {
            EmbedderKind::Hashing => {
                info!(dim = models.hashing_dim, "using hashing embedder");
                self.set_embedder(Arc::new(HashingEmbedder::new(models.hashing_dim)));
            }
            EmbedderKind::Minilm => {
                info!(model = %models.embedding_model_id, "loading embedding model");
                match BertEmbedder::load(&models.embedding_model_id) {
                    Ok(embedder) => {
                        info!(dim = embedder.dimension(), "embedding model loaded");
                        self.set_embedder(Arc::new(embedder));
                    }
                    Err(e) => {
                        error!("Failed to load embedding model: {:#}", e);
                        self.mark_embedder_failed(format!("{:#}", e));
                    }
                }
            }
        }

        if !models.generation_enabled {
            warn!("generation model disabled; /study-buddy will answer 503");
            self.disable_generator();
            return;
        }

        info!(model = %models.generation_model_id, "loading generation model");
        match T5Generator::load(&models.generation_model_id, generation.clone()) {
            Ok(generator) => {
                info!("generation model loaded");
                self.set_generator(Arc::new(generator));
            }
            Err(e) => {
                error!("Failed to load generation model: {:#}", e);
                self.mark_generator_failed(format!("{:#}", e));
            }
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Load models on a blocking worker so the server can start accepting requests
pub fn spawn_loading(
    registry: Arc<ModelRegistry>,
    models: ModelsConfig,
    generation: GenerationConfig,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || registry.load_blocking(&models, &generation))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    impl Generator for EchoGenerator {
        fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_new_registry_is_loading() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.embedder_state(), ModelState::Loading);
        assert_eq!(registry.generator_state(), ModelState::Loading);
        assert!(matches!(registry.embedder(), Err(ServiceError::ModelUnavailable(_))));
        assert!(matches!(registry.generator(), Err(ServiceError::ModelUnavailable(_))));
    }

    #[test]
    fn test_set_models() {
        let registry = ModelRegistry::new();
        registry.set_embedder(Arc::new(HashingEmbedder::new(8)));
        registry.set_generator(Arc::new(EchoGenerator));
        assert_eq!(registry.embedder().unwrap().dimension(), 8);
        assert_eq!(registry.generator().unwrap().generate("hi").unwrap(), "hi");
        assert_eq!(registry.generator_state(), ModelState::Loaded);
    }

    #[test]
    fn test_failed_slot_reports_reason() {
        let registry = ModelRegistry::new();
        registry.mark_generator_failed("weights missing");
        assert_eq!(registry.generator_state(), ModelState::Failed);
        match registry.generator() {
            Err(ServiceError::ModelUnavailable(msg)) => assert!(msg.contains("weights missing")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_with_models_without_generator() {
        let registry = ModelRegistry::with_models(Arc::new(HashingEmbedder::default()), None);
        assert_eq!(registry.embedder_state(), ModelState::Loaded);
        assert_eq!(registry.generator_state(), ModelState::Disabled);
    }

    #[test]
    fn test_load_hashing_without_generator() {
        let registry = ModelRegistry::new();
        let models = ModelsConfig {
            embedder: EmbedderKind::Hashing,
            hashing_dim: 32,
            generation_enabled: false,
            ..ModelsConfig::default()
        };
        registry.load_blocking(&models, &GenerationConfig::default());
        assert_eq!(registry.embedder().unwrap().dimension(), 32);
        assert_eq!(registry.generator_state(), ModelState::Disabled);
    }
}
