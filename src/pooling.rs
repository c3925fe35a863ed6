//! Attention-masked mean pooling over token embeddings.

use crate::error::Result;
use candle_core::{Tensor, D};

/// Mean-pools per-token hidden states over the sequence dimension, weighted
/// by an attention mask so padding positions are excluded from the average.
///
/// - `hidden_states`: shape `[batch, seq_len, hidden]`
/// - `attention_mask`: shape `[batch, seq_len]` with 1 for real tokens, 0 for
///   padding
///
/// The divisor (the per-sequence real-token count) is floored at 1e-9, so an
/// all-padding sequence pools to a finite zero vector instead of NaN.
///
/// Returns one pooled vector per sequence: shape `[batch, hidden]`.
///
/// # Errors
///
/// Returns error if the hidden states and mask shapes are incompatible.
pub fn mean_pool(hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    // Expand mask to [batch, seq_len, 1] for broadcasting
    let mask = attention_mask
        .unsqueeze(D::Minus1)?
        .to_dtype(hidden_states.dtype())?;
    let masked = hidden_states.broadcast_mul(&mask)?;
    let summed = masked.sum(1)?; // [batch, hidden]
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?; // [batch, 1]
    summed.broadcast_div(&counts).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use candle_core::Device;

    #[test]
    fn test_mean_pool_averages_over_sequence() {
        let device = Device::Cpu;
        // [1, 3, 2] - 3 tokens, 2 hidden dims
        let hidden =
            Tensor::from_vec(vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0], (1, 3, 2), &device).unwrap();
        // All tokens are real
        let mask = Tensor::from_vec(vec![1.0_f32, 1.0, 1.0], (1, 3), &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let result: Vec<f32> = pooled.squeeze(0).unwrap().to_vec1().unwrap();

        // (1+3+5)/3 = 3.0, (2+4+6)/3 = 4.0
        assert_relative_eq!(result[0], 3.0, epsilon = 1e-5);
        assert_relative_eq!(result[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mean_pool_excludes_padding() {
        let device = Device::Cpu;
        // [1, 3, 2] - last token is padding with garbage values
        let hidden =
            Tensor::from_vec(vec![1.0_f32, 2.0, 3.0, 4.0, 99.0, 99.0], (1, 3, 2), &device).unwrap();
        let mask = Tensor::from_vec(vec![1.0_f32, 1.0, 0.0], (1, 3), &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let result: Vec<f32> = pooled.squeeze(0).unwrap().to_vec1().unwrap();

        // Only the two real tokens: (1+3)/2 = 2.0, (2+4)/2 = 3.0
        assert_relative_eq!(result[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(result[1], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mean_pool_all_padding_stays_finite() {
        let device = Device::Cpu;
        let hidden =
            Tensor::from_vec(vec![7.0_f32, 8.0, 9.0, 10.0], (1, 2, 2), &device).unwrap();
        // Degenerate: no real tokens at all
        let mask = Tensor::from_vec(vec![0.0_f32, 0.0], (1, 2), &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let result: Vec<f32> = pooled.squeeze(0).unwrap().to_vec1().unwrap();

        // Divisor floor keeps the result at zero rather than NaN/Inf
        assert!(result.iter().all(|v| v.is_finite()));
        assert_relative_eq!(result[0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(result[1], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mean_pool_batch_shape() {
        let device = Device::Cpu;
        let hidden = Tensor::zeros((3, 4, 8), candle_core::DType::F32, &device).unwrap();
        let mask = Tensor::ones((3, 4), candle_core::DType::F32, &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        assert_eq!(pooled.dims2().unwrap(), (3, 8));
    }

    #[test]
    fn test_mean_pool_integer_mask() {
        let device = Device::Cpu;
        let hidden =
            Tensor::from_vec(vec![2.0_f32, 4.0, 6.0, 8.0], (1, 2, 2), &device).unwrap();
        // Masks arrive from the tokenizer as integers
        let mask = Tensor::from_vec(vec![1_i64, 0], (1, 2), &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let result: Vec<f32> = pooled.squeeze(0).unwrap().to_vec1().unwrap();

        assert_relative_eq!(result[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(result[1], 4.0, epsilon = 1e-5);
    }
}
