//! Vector store crate for the vecstore CLI.
//!
//! This crate provides a backend-agnostic abstraction for storing text
//! documents as embedding vectors and retrieving the k nearest documents to
//! a query. It supports multiple backends through a unified trait-based
//! interface.
//!
//! # Backends
//! - **Redis** (RediSearch): inverted-index store with manual index
//!   management and raw binary vector parameters
//! - **Chroma**: collection-oriented vector database over REST
//! - **Memory**: brute-force in-process reference backend
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use vecstore_embed::{Model, MockEmbedder};
//! use vecstore_store::{create_client, Document, SchemaConfig, DistanceMetric, VectorStoreClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(MockEmbedder::new(Model::Llama32, 1024));
//! let client = create_client("redis", "redis://127.0.0.1:6379", embedder).await?;
//!
//! let cfg = SchemaConfig::new(1024, DistanceMetric::Cosine);
//! client.create_schema(Model::Llama32, &cfg).await?;
//! client
//!     .insert_document(Model::Llama32, Document::new("doc-1", "hello world"))
//!     .await?;
//! let hits = client
//!     .find_k_nearest(Model::Llama32, Document::new("", "hello"), 3)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod chroma;
pub mod client;
pub mod codec;
pub mod memory;
pub mod redis;
pub mod types;

// Re-export main types
pub use self::chroma::ChromaStore;
pub use self::client::{create_client, ensure_embedded, namespace, VectorStoreClient};
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::types::{is_degenerate, DistanceMetric, Document, Neighbor, PurgeOutcome, SchemaConfig};
