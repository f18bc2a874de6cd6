//! Mock embedding provider producing deterministic content-derived vectors.

use vecstore_core::{AppError, AppResult};

use crate::embedder::Embedder;
use crate::model::Model;

/// Mock provider for testing and offline runs.
///
/// Generates deterministic embeddings from word hashes. While not
/// semantically accurate like real embedding models, it produces
/// consistent, content-dependent unit vectors suitable for testing.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    model: Model,
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder with the given model and dimensions.
    pub fn new(model: Model, dimensions: usize) -> Self {
        Self { model, dimensions }
    }

    fn generate(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0f64; self.dimensions];

        for word in text.to_lowercase().split_whitespace() {
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let dim = (word_hash as usize) % self.dimensions;
            vector[dim] += 1.0;

            // Spread each word over a second dimension so short texts still
            // differ in more than one component
            let spread = (word_hash.rotate_left(17) as usize) % self.dimensions;
            vector[spread] += 0.5;
        }

        // Normalize to unit length
        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        } else {
            // Whitespace-only input hashes to nothing; pin a constant
            // component so the vector is never all-zero
            vector[0] = 1.0;
        }

        vector
    }
}

#[async_trait::async_trait]
impl Embedder for MockEmbedder {
    fn model(&self) -> Model {
        self.model
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f64>> {
        if text.is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(self.generate(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimensions_and_model() {
        let embedder = MockEmbedder::new(Model::Llama32, 64);
        assert_eq!(embedder.model(), Model::Llama32);

        let vector = embedder.embed("hello world").await.unwrap();
        assert_eq!(vector.len(), 64);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = MockEmbedder::new(Model::Llama32, 64);
        let a = embedder.embed("deterministic test").await.unwrap();
        let b = embedder.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = MockEmbedder::new(Model::Llama32, 64);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("goodbye world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let embedder = MockEmbedder::new(Model::Llama32, 64);
        let vector = embedder.embed("normalize me please").await.unwrap();
        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_never_all_zero() {
        let embedder = MockEmbedder::new(Model::Llama32, 8);
        let vector = embedder.embed("   ").await.unwrap();
        assert!(vector.iter().any(|v| *v != 0.0));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = MockEmbedder::new(Model::Llama32, 8);
        assert!(embedder.embed("").await.is_err());
    }
}
