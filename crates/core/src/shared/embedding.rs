//! Embedding helpers shared by the cosine template matchers.
//!
//! Templates produced here are little-endian `f32` vectors, L2-normalized.

use crate::shared::error::StageError;

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of L2-normalized vectors equals cosine similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum::<f64>() as f32
}

/// Element-wise mean of equally sized embeddings, re-normalized.
pub fn mean_embedding(samples: &[Vec<f32>]) -> Result<Vec<f32>, StageError> {
    let first = samples
        .first()
        .ok_or_else(|| StageError::internal("no embeddings to average"))?;
    let dim = first.len();
    let mut mean = vec![0.0f32; dim];
    for s in samples {
        if s.len() != dim {
            return Err(StageError::internal(format!(
                "embedding length {} does not match {dim}",
                s.len()
            )));
        }
        for (acc, v) in mean.iter_mut().zip(s) {
            *acc += v;
        }
    }
    for v in &mut mean {
        *v /= samples.len() as f32;
    }
    l2_normalize(&mut mean);
    Ok(mean)
}

pub fn encode_template(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn decode_template(bytes: &[u8]) -> Result<Vec<f32>, StageError> {
    if bytes.len() % 4 != 0 {
        return Err(StageError::internal(format!(
            "template length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
