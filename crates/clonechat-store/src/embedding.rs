//! uint8 quantization of stored embeddings.
//!
//! Each vector is stored as one byte per dimension plus a scale and offset:
//! `original ≈ byte * scale + offset`.

use ndarray::{Array1, ArrayView1};

/// A quantized embedding as stored in `passage_embeddings`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub bytes: Vec<u8>,
    pub scale: f32,
    pub offset: f32,
}

/// Map `[min, max]` of the vector linearly onto `[0, 255]`.
pub fn quantize_uint8(embedding: ArrayView1<'_, f32>) -> Quantized {
    let min_val = embedding.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if embedding.is_empty() {
        return Quantized {
            bytes: Vec::new(),
            scale: 0.0,
            offset: 0.0,
        };
    }

    let range = max_val - min_val;
    if range < 1e-9 {
        return Quantized {
            bytes: vec![0u8; embedding.len()],
            scale: 0.0,
            offset: min_val,
        };
    }

    let scale = range / 255.0;
    let bytes = embedding
        .iter()
        .map(|&v| ((v - min_val) / scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    Quantized {
        bytes,
        scale,
        offset: min_val,
    }
}

/// Restore an approximate float vector from its stored form.
pub fn dequantize_uint8(bytes: &[u8], scale: f32, offset: f32) -> Array1<f32> {
    Array1::from_iter(bytes.iter().map(|&b| b as f32 * scale + offset))
}
