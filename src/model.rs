//! BERT-based sentence encoder and the embedding entry point.

use crate::error::{EmbeddingError, Result};
use crate::pooling::mean_pool;
use crate::tokenizer::{EncodedInput, TextTokenizer};
use crate::EMBEDDING_DIM;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, HiddenAct};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Configuration of the pretrained encoder checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hidden size (embedding dimension).
    pub hidden_size: usize,
    /// Number of attention heads.
    pub num_attention_heads: usize,
    /// Number of hidden layers.
    pub num_hidden_layers: usize,
    /// Intermediate size in feed-forward layers.
    pub intermediate_size: usize,
    /// Vocabulary size.
    pub vocab_size: usize,
    /// Maximum position embeddings.
    pub max_position_embeddings: usize,
    /// Hidden activation function.
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    /// Hidden dropout probability.
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,
    /// Attention dropout probability.
    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,
    /// Type vocabulary size.
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    /// Layer norm epsilon.
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_dropout() -> f64 {
    0.1
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size: EMBEDDING_DIM,
            num_attention_heads: 12,
            num_hidden_layers: 12,
            intermediate_size: 3072,
            vocab_size: 30522,
            max_position_embeddings: 512,
            hidden_act: default_hidden_act(),
            hidden_dropout_prob: default_dropout(),
            attention_probs_dropout_prob: default_dropout(),
            type_vocab_size: default_type_vocab_size(),
            layer_norm_eps: default_layer_norm_eps(),
        }
    }
}

impl ModelConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Convert to candle BERT config.
    fn to_bert_config(&self) -> BertConfig {
        BertConfig {
            vocab_size: self.vocab_size,
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            intermediate_size: self.intermediate_size,
            hidden_act: HiddenAct::Gelu,
            hidden_dropout_prob: self.hidden_dropout_prob,
            max_position_embeddings: self.max_position_embeddings,
            type_vocab_size: self.type_vocab_size,
            initializer_range: 0.02,
            layer_norm_eps: self.layer_norm_eps,
            pad_token_id: 0,
            position_embedding_type:
                candle_transformers::models::bert::PositionEmbeddingType::Absolute,
            use_cache: false,
            classifier_dropout: None,
            model_type: None,
        }
    }

    /// Reject a checkpoint that cannot produce the fixed embedding width.
    fn validate(&self) -> Result<()> {
        if self.hidden_size != EMBEDDING_DIM {
            return Err(EmbeddingError::ConfigError {
                message: format!(
                    "Checkpoint hidden size is {}, expected {}",
                    self.hidden_size, EMBEDDING_DIM
                ),
            });
        }
        Ok(())
    }
}

/// Sentence embedding model.
///
/// Bundles the tokenizer, the BERT encoder, and the CPU device into one
/// owned handle, loaded once and held for the lifetime of the process.
/// The handle is never mutated after construction; reloading means building
/// a new one.
///
/// Calls are synchronous and blocking. Concurrent calls to [`embed`] from
/// multiple threads must be serialized by the caller.
///
/// [`embed`]: Embedder::embed
pub struct Embedder {
    model: BertModel,
    tokenizer: TextTokenizer,
    config: ModelConfig,
    device: Device,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("config", &self.config)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl Embedder {
    /// Load the embedder from a directory containing model files.
    ///
    /// The directory should contain the artifacts of the checkpoint named by
    /// [`crate::MODEL_NAME`]:
    /// - `config.json`: Model configuration
    /// - `model.safetensors`: Model weights
    /// - `tokenizer.json`: Tokenizer configuration
    ///
    /// # Errors
    ///
    /// Returns error if any artifact is missing or corrupt, or if the
    /// checkpoint's hidden size is not [`EMBEDDING_DIM`].
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        info!("Loading model from: {}", model_dir.display());

        if !model_dir.exists() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.display().to_string(),
            });
        }

        let config_path = model_dir.join("config.json");
        let config =
            ModelConfig::from_file(&config_path).map_err(|e| EmbeddingError::ConfigError {
                message: format!(
                    "Failed to load config from {}: {}",
                    config_path.display(),
                    e
                ),
            })?;
        config.validate()?;
        debug!("Loaded config: hidden_size={}", config.hidden_size);

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = TextTokenizer::from_file(&tokenizer_path)?;
        debug!("Loaded tokenizer: vocab_size={}", tokenizer.vocab_size());

        let device = Device::Cpu;

        let weights_path = model_dir.join("model.safetensors");
        if !weights_path.exists() {
            return Err(EmbeddingError::WeightLoadError {
                message: format!(
                    "No weights file found. Expected model.safetensors in {}",
                    model_dir.display()
                ),
            });
        }

        let data = std::fs::read(&weights_path)?;
        let vb = Self::load_weights(&data, &device)?;
        let model =
            BertModel::load(vb, &config.to_bert_config()).map_err(|e| {
                EmbeddingError::WeightLoadError {
                    message: format!("Failed to load BERT model: {}", e),
                }
            })?;

        info!("Model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
        })
    }

    /// Build the embedder from in-memory artifacts.
    ///
    /// Useful when the model artifacts are shipped inside the binary or come
    /// from somewhere other than a directory on disk, and for tests that
    /// substitute a different checkpoint.
    ///
    /// # Arguments
    ///
    /// * `config_json` - Model configuration as JSON string
    /// * `tokenizer_json` - Tokenizer configuration as JSON string
    /// * `weights` - Safetensors weights as bytes
    ///
    /// # Errors
    ///
    /// Returns error if any artifact fails to parse or the checkpoint's
    /// hidden size is not [`EMBEDDING_DIM`].
    pub fn from_bytes(config_json: &str, tokenizer_json: &str, weights: &[u8]) -> Result<Self> {
        info!("Loading model from in-memory artifacts");

        let config: ModelConfig = serde_json::from_str(config_json)?;
        config.validate()?;
        debug!("Loaded config: hidden_size={}", config.hidden_size);

        let tokenizer = TextTokenizer::from_json(tokenizer_json)?;
        debug!("Loaded tokenizer: vocab_size={}", tokenizer.vocab_size());

        let device = Device::Cpu;

        let vb = Self::load_weights(weights, &device)?;
        let model =
            BertModel::load(vb, &config.to_bert_config()).map_err(|e| {
                EmbeddingError::WeightLoadError {
                    message: format!("Failed to load BERT model: {}", e),
                }
            })?;

        info!("Model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
        })
    }

    /// Generate the embedding for a single text.
    ///
    /// The text is encoded as a batch of one, truncated and padded to the
    /// fixed token budget, run through the encoder, and mean-pooled with the
    /// attention mask so padding never influences the result. Text past the
    /// token budget is silently dropped.
    ///
    /// # Returns
    ///
    /// Embedding vector with exactly [`EMBEDDING_DIM`] values.
    ///
    /// # Errors
    ///
    /// Returns error if encoding or inference fails.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding text ({} bytes)", text.len());

        let encoding = self.tokenizer.encode(text)?;
        let (input_ids, token_type_ids, attention_mask) = self.encoding_to_tensors(&encoding)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbeddingError::InferenceError {
                message: format!("Forward pass failed: {}", e),
            })?;

        let pooled = mean_pool(&hidden_states, &attention_mask)?;

        // Row count inferred from the batch, width pinned to the embedding
        // dimension
        let pooled = pooled.reshape(((), EMBEDDING_DIM))?;
        let embedding: Vec<f32> = pooled.squeeze(0)?.to_vec1().map_err(|e| {
            EmbeddingError::TensorError {
                message: format!("Failed to convert embedding to vec: {}", e),
            }
        })?;

        Ok(embedding)
    }

    /// Get the embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.hidden_size
    }

    /// Get the model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // Private helper methods

    fn load_weights(data: &[u8], device: &Device) -> Result<VarBuilder<'static>> {
        debug!("Loading weights ({} bytes)", data.len());
        let tensors = candle_core::safetensors::load_buffer(data, device).map_err(|e| {
            EmbeddingError::WeightLoadError {
                message: format!("Failed to load safetensors: {}", e),
            }
        })?;
        Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
    }

    fn encoding_to_tensors(&self, encoding: &EncodedInput) -> Result<(Tensor, Tensor, Tensor)> {
        let seq_len = encoding.input_ids.len();
        let shape = (1, seq_len);

        let input_ids: Vec<i64> = encoding.input_ids.iter().map(|&x| x as i64).collect();
        let token_type_ids: Vec<i64> = encoding.token_type_ids.iter().map(|&x| x as i64).collect();
        let attention_mask: Vec<i64> = encoding.attention_mask.iter().map(|&x| x as i64).collect();

        Ok((
            Tensor::from_vec(input_ids, shape, &self.device)?,
            Tensor::from_vec(token_type_ids, shape, &self.device)?,
            Tensor::from_vec(attention_mask, shape, &self.device)?,
        ))
    }
}
