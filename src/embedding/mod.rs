//! Text-to-vector embedding seam.
//!
//! Provides the [`Embedder`] trait and the Ollama HTTP implementation.
//! Implementations produce L2-normalized vectors of the configured dimension,
//! so cosine similarity reduces to a dot product on the store side.

pub mod ollama;

use async_trait::async_trait;

use crate::error::Result;

/// Embed text into unit-length vectors of a fixed dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The number of dimensions this embedder produces.
    fn dimensions(&self) -> usize;
}

/// L2-normalize a vector in place. A zero vector cannot be normalized.
pub(crate) fn normalize(vector: &mut [f32]) -> Result<()> {
    let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return Err(crate::error::Error::Backend(anyhow::anyhow!(
            "embedding model returned a zero vector"
        )));
    }
    for v in vector.iter_mut() {
        *v /= magnitude;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_rejected() {
        let mut v = vec![0.0, 0.0, 0.0];
        assert!(normalize(&mut v).is_err());
    }
}
