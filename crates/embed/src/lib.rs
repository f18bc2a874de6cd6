//! Embedding crate for the vecstore CLI.
//!
//! This crate provides a provider-agnostic abstraction for computing text
//! embeddings. It supports multiple providers through a unified trait-based
//! interface.
//!
//! # Providers
//! - **Ollama**: local embedding model runtime (default)
//! - **Mock**: deterministic content-derived vectors for tests and offline runs
//!
//! # Example
//! ```no_run
//! use vecstore_embed::{Embedder, Model, providers::OllamaEmbedder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OllamaEmbedder::connect("http://localhost:11434", Model::Llama32).await?;
//! let vector = embedder.embed("Hello, world!").await?;
//! println!("{} dimensions", vector.len());
//! # Ok(())
//! # }
//! ```

pub mod embedder;
pub mod model;
pub mod providers;

// Re-export main types
pub use embedder::{create_embedder, Embedder};
pub use model::Model;
pub use providers::{MockEmbedder, OllamaEmbedder};
