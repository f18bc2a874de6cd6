//! Embedding provider implementations.

pub mod mock;
pub mod ollama;

pub use mock::MockEmbedder;
pub use ollama::OllamaEmbedder;
