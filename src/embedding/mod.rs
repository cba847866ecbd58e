//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and a local implementation using
//! all-MiniLM-L6-v2 (384 dimensions, L2-normalized). The provider is created
//! via [`create_provider`] from configuration.

pub mod local;

use anyhow::{Context, Result};
use ndarray::Array2;

/// Number of dimensions in the default embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`dimensions`](Self::dimensions)
/// entries. All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Encode texts into an `(N, D)` matrix with L2-normalized rows.
    ///
    /// A single input still yields a `(1, D)` matrix so callers can treat
    /// one query and a batch the same way.
    fn encode(&self, texts: &[&str]) -> Result<Array2<f32>> {
        let dim = self.dimensions();
        let rows = self.embed_batch(texts)?;
        let mut flat = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            anyhow::ensure!(
                row.len() == dim,
                "embedding has {} dimensions, expected {dim}",
                row.len()
            );
            flat.extend_from_slice(row);
        }
        let mut matrix = Array2::from_shape_vec((rows.len(), dim), flat)
            .context("embedding batch has an inconsistent shape")?;
        normalize_rows(&mut matrix);
        Ok(matrix)
    }
}

/// L2-normalize every row in place. All-zero rows are left untouched.
pub fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.rows_mut() {
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"local"` is supported (ONNX Runtime + all-MiniLM-L6-v2).
/// Returns an error if model files are not found; run `recollect model download` first.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl EmbeddingProvider for Fixed {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.is_empty() {
                vec![0.0, 0.0]
            } else {
                vec![3.0, 4.0]
            })
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[test]
    fn encode_single_text_is_one_row() {
        let matrix = Fixed.encode(&["hello"]).unwrap();
        assert_eq!(matrix.shape(), &[1, 2]);
        assert!((matrix[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((matrix[[0, 1]] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn encode_keeps_zero_rows() {
        let matrix = Fixed.encode(&["a", ""]).unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix.row(1).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn encode_rejects_wrong_dimensions() {
        struct Wrong;
        impl EmbeddingProvider for Wrong {
            fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0; 3])
            }
            fn dimensions(&self) -> usize {
                2
            }
        }
        assert!(Wrong.encode(&["x"]).is_err());
    }
}
