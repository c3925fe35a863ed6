//! Text Embedder - Native sentence embedding inference for semantic search.
//!
//! This crate turns a single text into a fixed-width dense vector using a
//! pretrained BERT-family sentence encoder and attention-mask-aware mean
//! pooling over the token representations.
//!
//! # Features
//!
//! - **Native inference**: No Python dependency, pure Rust using Candle
//! - **CPU execution**: All computation runs on the CPU
//! - **Fixed token budget**: Inputs are truncated and padded to 256 tokens;
//!   text beyond the budget is silently dropped
//! - **Explicit handle**: The model is loaded once into an [`Embedder`] owned
//!   by the caller, with no hidden process-wide state
//!
//! # Usage
//!
//! ```rust,no_run
//! use text_embedder::Embedder;
//!
//! // Load tokenizer, config, and weights from a model directory
//! let embedder = Embedder::load("path/to/model")?;
//!
//! // Generate an embedding for one text
//! let embedding = embedder.embed("how do solar panels work?")?;
//!
//! // Each embedding is a Vec<f32> with dimension 768
//! assert_eq!(embedding.len(), 768);
//! # Ok::<(), text_embedder::EmbeddingError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod model;
mod pooling;
mod tokenizer;

pub use error::{EmbeddingError, Result};
pub use model::{Embedder, ModelConfig};
pub use pooling::mean_pool;
pub use tokenizer::{EncodedInput, TextTokenizer};

/// Width of the embedding vectors produced by the encoder.
pub const EMBEDDING_DIM: usize = 768;

/// Fixed token budget: inputs are truncated and padded to this many tokens.
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// Checkpoint the model artifacts must come from.
pub const MODEL_NAME: &str = "sentence-transformers/msmarco-bert-base-dot-v5";
