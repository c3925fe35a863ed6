//! Tokenizer wrapper producing fixed-width encoder inputs.

use crate::error::{EmbeddingError, Result};
use crate::MAX_SEQUENCE_LENGTH;
use std::path::Path;
use tokenizers::Tokenizer;

/// Wrapper around a HuggingFace tokenizer that truncates and pads every
/// input to the fixed token budget.
pub struct TextTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

/// Encoded input ready for model inference.
///
/// All three sequences have exactly [`MAX_SEQUENCE_LENGTH`] entries.
#[derive(Debug, Clone)]
pub struct EncodedInput {
    /// Token IDs, padded with 0 ([PAD]).
    pub input_ids: Vec<u32>,
    /// Attention mask (1 for real tokens, 0 for padding).
    pub attention_mask: Vec<u32>,
    /// Token type IDs (all 0 for single sequence).
    pub token_type_ids: Vec<u32>,
}

impl TextTokenizer {
    /// Load tokenizer from a file path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to tokenizer.json file
    ///
    /// # Errors
    ///
    /// Returns error if tokenizer file cannot be loaded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbeddingError::TokenizerError {
                message: format!("Tokenizer file not found: {}", path.display()),
            });
        }

        let tokenizer = Tokenizer::from_file(path)?;

        Ok(Self {
            tokenizer,
            max_length: MAX_SEQUENCE_LENGTH,
        })
    }

    /// Load tokenizer from JSON string.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON string containing tokenizer configuration
    ///
    /// # Errors
    ///
    /// Returns error if JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let tokenizer =
            Tokenizer::from_bytes(json.as_bytes()).map_err(|e| EmbeddingError::TokenizerError {
                message: format!("Failed to parse tokenizer JSON: {}", e),
            })?;

        Ok(Self {
            tokenizer,
            max_length: MAX_SEQUENCE_LENGTH,
        })
    }

    /// Encode a single text into a fixed-width input.
    ///
    /// The token sequence is truncated to the token budget and padded back up
    /// to exactly that length. Truncation is silent: tokens past the budget
    /// never influence the embedding.
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails.
    pub fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizerError {
                    message: format!("Encoding failed: {}", e),
                })?;

        let mut input_ids: Vec<u32> = encoding.get_ids().to_vec();
        let mut attention_mask: Vec<u32> = encoding.get_attention_mask().to_vec();
        let mut token_type_ids: Vec<u32> = encoding.get_type_ids().to_vec();

        // Truncate if too long
        if input_ids.len() > self.max_length {
            input_ids.truncate(self.max_length);
            attention_mask.truncate(self.max_length);
            token_type_ids.truncate(self.max_length);
        }

        // Pad to the full budget with 0 (PAD token)
        let current_len = input_ids.len();
        if current_len < self.max_length {
            let padding_len = self.max_length - current_len;
            input_ids.extend(vec![0u32; padding_len]);
            attention_mask.extend(vec![0u32; padding_len]);
            token_type_ids.extend(vec![0u32; padding_len]);
        }

        Ok(EncodedInput {
            input_ids,
            attention_mask,
            token_type_ids,
        })
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Get the maximum sequence length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Minimal whitespace WordLevel tokenizer used by unit tests across the crate.
#[cfg(test)]
pub(crate) const TEST_TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "[PAD]": 0,
      "[UNK]": 1,
      "alpha": 2,
      "beta": 3,
      "gamma": 4,
      "delta": 5
    },
    "unk_token": "[UNK]"
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tokenizer() -> TextTokenizer {
        TextTokenizer::from_json(TEST_TOKENIZER_JSON).expect("test tokenizer should parse")
    }

    #[test]
    fn test_encode_pads_to_fixed_width() {
        let tokenizer = test_tokenizer();
        let encoded = tokenizer.encode("alpha beta gamma").unwrap();

        assert_eq!(encoded.input_ids.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.attention_mask.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.token_type_ids.len(), MAX_SEQUENCE_LENGTH);

        assert_eq!(&encoded.input_ids[..3], &[2, 3, 4]);
        assert_eq!(&encoded.attention_mask[..3], &[1, 1, 1]);
        // Everything past the real tokens is padding
        assert!(encoded.input_ids[3..].iter().all(|&id| id == 0));
        assert!(encoded.attention_mask[3..].iter().all(|&m| m == 0));
    }

    #[test]
    fn test_mask_counts_real_tokens_only() {
        let tokenizer = test_tokenizer();
        let encoded = tokenizer.encode("alpha beta gamma delta").unwrap();

        let real: u32 = encoded.attention_mask.iter().sum();
        assert_eq!(real, 4);
    }

    #[test]
    fn test_long_input_truncates_silently() {
        let tokenizer = test_tokenizer();
        let long_text = "alpha ".repeat(300);
        let encoded = tokenizer.encode(&long_text).unwrap();

        assert_eq!(encoded.input_ids.len(), MAX_SEQUENCE_LENGTH);
        assert!(encoded.attention_mask.iter().all(|&m| m == 1));

        // The tail has no influence: the first 256 tokens alone produce
        // the same ids
        let prefix_text = "alpha ".repeat(MAX_SEQUENCE_LENGTH);
        let prefix = tokenizer.encode(&prefix_text).unwrap();
        assert_eq!(encoded.input_ids, prefix.input_ids);
        assert_eq!(encoded.attention_mask, prefix.attention_mask);
    }

    #[test]
    fn test_empty_text_encodes_to_all_padding() {
        let tokenizer = test_tokenizer();
        let encoded = tokenizer.encode("").unwrap();

        assert_eq!(encoded.input_ids.len(), MAX_SEQUENCE_LENGTH);
        assert!(encoded.input_ids.iter().all(|&id| id == 0));
        assert!(encoded.attention_mask.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_vocab_size() {
        let tokenizer = test_tokenizer();
        assert_eq!(tokenizer.vocab_size(), 6);
        assert_eq!(tokenizer.max_length(), MAX_SEQUENCE_LENGTH);
    }
}
