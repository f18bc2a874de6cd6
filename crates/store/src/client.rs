//! Vector store client abstraction and backend factory.
//!
//! This module defines the backend-agnostic contract for schema lifecycle,
//! document CRUD and KNN search. Every operation is namespaced by the
//! embedding [`Model`], so vectors produced by different models are never
//! compared against each other.

use std::sync::Arc;

use vecstore_core::{AppError, AppResult};
use vecstore_embed::{Embedder, Model};

use crate::chroma::ChromaStore;
use crate::memory::MemoryStore;
use crate::redis::RedisStore;
use crate::types::{is_degenerate, Document, Neighbor, PurgeOutcome, SchemaConfig};

/// Storage namespace for a model: `embeddings-<model-name>`.
///
/// This naming is a persistence contract. It must stay bit-exact across
/// backends, or existing stores become unreachable.
pub fn namespace(model: Model) -> String {
    format!("embeddings-{}", model.name())
}

/// Trait for vector store backends.
///
/// A client owns a session handle to exactly one backend and a reference to
/// one embedder; it is stateless beyond that and keeps no local copy of
/// stored documents. Each operation is a single round trip (one batched
/// trip for bulk insert); transient backend errors propagate immediately
/// and retries are the caller's decision.
#[async_trait::async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Provision an index/collection for the model namespace.
    ///
    /// Fails with `SchemaExists` if one already exists; re-creation
    /// requires an explicit drop first, preventing silent dimension or
    /// metric mismatches.
    async fn create_schema(&self, model: Model, cfg: &SchemaConfig) -> AppResult<()>;

    /// Delete the model's index/collection and all documents in it.
    ///
    /// Fails with `SchemaNotFound` if absent. Irreversible.
    async fn drop_schema(&self, model: Model) -> AppResult<()>;

    /// Insert or overwrite a document, keyed by `file_id` within the model
    /// namespace. A missing embedding is computed first.
    async fn insert_document(&self, model: Model, doc: Document) -> AppResult<()>;

    /// Insert many documents. Backends with a batch API override this;
    /// the default loops over single inserts.
    async fn insert_documents(&self, model: Model, docs: Vec<Document>) -> AppResult<()> {
        for doc in docs {
            self.insert_document(model, doc).await?;
        }
        Ok(())
    }

    /// Delete a single document by `file_id`.
    ///
    /// Idempotent: deleting a missing document is a no-op, and a missing
    /// schema counts as an empty namespace rather than an error. Returns
    /// whether a document was actually removed.
    async fn delete_document(&self, model: Model, file_id: &str) -> AppResult<bool>;

    /// Best-effort sweep of every document in the model namespace, keeping
    /// the schema itself. A missing schema counts as an empty namespace.
    /// Not atomic: already-deleted documents stay deleted when a later
    /// deletion fails.
    async fn delete_all_documents(&self, model: Model) -> AppResult<PurgeOutcome>;

    /// Return the `k` stored documents closest to `doc`, ascending by the
    /// index's configured distance metric. A missing query embedding is
    /// computed from `doc.text` first. Embedding vectors are not returned.
    async fn find_k_nearest(&self, model: Model, doc: Document, k: usize)
        -> AppResult<Vec<Neighbor>>;
}

/// Attach a computed embedding to a document that lacks one.
///
/// An explicit pure step: returns a new value instead of mutating a shared
/// one, so ownership of the document stays with its creator. Documents that
/// already carry a non-empty vector pass through unchanged.
pub async fn ensure_embedded(embedder: &dyn Embedder, doc: Document) -> AppResult<Document> {
    if doc.has_vector() {
        return Ok(doc);
    }

    let vector = embedder.embed(&doc.text).await?;
    if is_degenerate(&vector) {
        return Err(AppError::Embedding(format!(
            "Embedder returned a degenerate vector for document '{}'",
            doc.file_id
        )));
    }

    Ok(Document {
        embedding: Some(vector),
        ..doc
    })
}

/// Create a vector store client based on the backend name.
///
/// # Arguments
/// * `backend` - Backend identifier ("redis", "chroma", "memory")
/// * `endpoint` - Backend endpoint URL (ignored by "memory")
/// * `embedder` - Embedder used to hydrate missing document vectors
///
/// # Errors
/// Returns `AppError::Config` for unknown backend names and
/// `AppError::Connection` when the backend is unreachable.
pub async fn create_client(
    backend: &str,
    endpoint: &str,
    embedder: Arc<dyn Embedder>,
) -> AppResult<Arc<dyn VectorStoreClient>> {
    match backend.to_lowercase().as_str() {
        "redis" => {
            let store = RedisStore::connect(endpoint, embedder).await?;
            Ok(Arc::new(store))
        }
        "chroma" => {
            let store = ChromaStore::connect(endpoint, embedder).await?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryStore::new(embedder))),
        other => Err(AppError::Config(format!(
            "Unknown backend: {}. Supported: redis, chroma, memory",
            other
        ))),
    }
}
