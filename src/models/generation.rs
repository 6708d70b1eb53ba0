// Answer generation: FLAN-T5 via Candle, decoded with beam search
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config, T5ForConditionalGeneration};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::beam::{BeamSearch, StepScorer};
use super::Generator;
use crate::config::GenerationConfig;
use crate::errors::ServiceError;

pub const DEFAULT_MODEL_ID: &str = "google/flan-t5-base";

/// Seq2seq generator backed by a T5 checkpoint
pub struct T5Generator {
    // decode() takes &mut self, so calls are serialised
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    settings: GenerationConfig,
    decoder_start_token: u32,
    eos_token: u32,
}

impl T5Generator {
    /// Download (first use) and load the model
    pub fn load(model_id: &str, settings: GenerationConfig) -> Result<Self> {
        let device = Device::Cpu;

        info!(model = model_id, "downloading generation model");
        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let mut config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;
        // Every beam re-runs the decoder over its whole prefix
        config.use_cache = false;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // SAFETY: the safetensors file is owned by the hf-hub cache and not mutated while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = T5ForConditionalGeneration::load(vb, &config)
            .context("Failed to create T5 model")?;

        let decoder_start_token = config
            .decoder_start_token_id
            .unwrap_or(config.pad_token_id) as u32;
        let eos_token = config.eos_token_id as u32;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            settings,
            decoder_start_token,
            eos_token,
        })
    }

    /// Tokenize the prompt, keeping at most `max_input_tokens` (EOS included)
    fn encode_prompt(&self, prompt: &str) -> crate::errors::Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ServiceError::ProcessingFailure(format!("Tokenization failed: {}", e)))?;
        let mut ids = encoding.get_ids().to_vec();
        let limit = self.settings.max_input_tokens.max(1);
        if ids.len() > limit {
            ids.truncate(limit - 1);
            ids.push(self.eos_token);
        }
        Ok(ids)
    }
}

/// One decoding step over the shared encoder output
struct T5Step<'a> {
    model: &'a mut T5ForConditionalGeneration,
    encoder_output: &'a Tensor,
    device: &'a Device,
}

impl StepScorer for T5Step<'_> {
    fn next_token_logits(&mut self, prefixes: &[Vec<u32>]) -> crate::errors::Result<Vec<Vec<f32>>> {
        let mut rows = Vec::with_capacity(prefixes.len());
        for prefix in prefixes {
            let decoder_ids = Tensor::new(prefix.as_slice(), self.device)?.unsqueeze(0)?;
            let logits = self
                .model
                .decode(&decoder_ids, self.encoder_output)?
                .squeeze(0)?
                .to_dtype(DType::F32)?
                .to_vec1::<f32>()?;
            rows.push(logits);
        }
        Ok(rows)
    }
}

impl Generator for T5Generator {
    fn generate(&self, prompt: &str) -> crate::errors::Result<String> {
        let input_ids = self.encode_prompt(prompt)?;
        debug!(input_tokens = input_ids.len(), "generating answer");

        let mut model = self
            .model
            .lock()
            .map_err(|_| ServiceError::ProcessingFailure("Generation model lock poisoned".to_string()))?;
        model.clear_kv_cache();

        let input = Tensor::new(input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let search = BeamSearch::new(self.settings.beam_params());
        let mut step = T5Step {
            model: &mut *model,
            encoder_output: &encoder_output,
            device: &self.device,
        };
        let output_ids = search.run(&mut step, self.decoder_start_token, self.eos_token)?;

        self.tokenizer
            .decode(&output_ids, true)
            .map(|text| text.trim().to_string())
            .map_err(|e| ServiceError::ProcessingFailure(format!("Decoding failed: {}", e)))
    }
}
