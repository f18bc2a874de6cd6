//! Embedder trait and provider factory.

use std::sync::Arc;

use vecstore_core::{AppError, AppResult};

use crate::model::Model;
use crate::providers::{MockEmbedder, OllamaEmbedder};

/// Trait for embedding providers.
///
/// Given text, produce its embedding vector. Determinism is not guaranteed
/// by this contract; a remote model may be non-deterministic. Callers may
/// only assume the vector is dimensionally consistent for a given model.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// The model this embedder computes vectors with.
    fn model(&self) -> Model;

    /// Compute the embedding vector for `text`.
    ///
    /// Fails with `AppError::Embedding` when the upstream endpoint is
    /// unreachable, returns malformed output, or returns an empty or
    /// all-zero vector.
    async fn embed(&self, text: &str) -> AppResult<Vec<f64>>;
}

/// Create an embedding provider based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "mock")
/// * `endpoint` - Provider endpoint URL (ignored by "mock")
/// * `model` - Embedding model to use
/// * `dimensions` - Vector dimension for providers that synthesize vectors
///
/// # Errors
/// Returns `AppError::Config` for unknown provider names and
/// `AppError::Connection` when the provider endpoint is unreachable.
pub async fn create_embedder(
    provider: &str,
    endpoint: &str,
    model: Model,
    dimensions: usize,
) -> AppResult<Arc<dyn Embedder>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let embedder = OllamaEmbedder::connect(endpoint, model).await?;
            Ok(Arc::new(embedder))
        }
        "mock" => {
            if dimensions == 0 {
                return Err(AppError::Config(
                    "Mock embedder dimension must be positive".to_string(),
                ));
            }
            Ok(Arc::new(MockEmbedder::new(model, dimensions)))
        }
        other => Err(AppError::Config(format!(
            "Unknown embedder: {}. Supported: ollama, mock",
            other
        ))),
    }
}
