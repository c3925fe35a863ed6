//! Error types for text-embedder.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur while loading the model or generating embeddings.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Model directory not found at the specified path.
    #[error("Model directory not found: {path}")]
    ModelNotFound {
        /// Path that was searched for the model artifacts.
        path: String,
    },

    /// Tokenizer file not found or invalid.
    #[error("Tokenizer error: {message}")]
    TokenizerError {
        /// Description of the tokenizer error.
        message: String,
    },

    /// Error loading model weights.
    #[error("Failed to load model weights: {message}")]
    WeightLoadError {
        /// Description of the weight loading error.
        message: String,
    },

    /// Error during the encoder forward pass.
    #[error("Inference error: {message}")]
    InferenceError {
        /// Description of the inference error.
        message: String,
    },

    /// Invalid or incompatible model configuration.
    #[error("Invalid model configuration: {message}")]
    ConfigError {
        /// Description of the configuration error.
        message: String,
    },

    /// IO error reading model files.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error for config files.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Candle tensor operation error.
    #[error("Tensor error: {message}")]
    TensorError {
        /// Description of the tensor error.
        message: String,
    },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::TensorError {
            message: err.to_string(),
        }
    }
}

impl From<tokenizers::Error> for EmbeddingError {
    fn from(err: tokenizers::Error) -> Self {
        EmbeddingError::TokenizerError {
            message: err.to_string(),
        }
    }
}
