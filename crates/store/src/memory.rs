//! In-memory brute-force backend.
//!
//! A process-local reference implementation of the store contract, used by
//! the integration suite and as an offline backend. Distances are computed
//! exhaustively against every stored vector, so it is only suitable for
//! small corpora.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use vecstore_core::{AppError, AppResult};
use vecstore_embed::{Embedder, Model};

use crate::client::{ensure_embedded, namespace, VectorStoreClient};
use crate::types::{DistanceMetric, Document, Neighbor, PurgeOutcome, SchemaConfig};

struct Collection {
    config: SchemaConfig,
    // file_id -> document; BTreeMap keeps tie-breaking deterministic
    docs: BTreeMap<String, Document>,
}

/// Vector store held entirely in process memory.
pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn lock_poisoned() -> AppError {
        AppError::Other("Memory store lock poisoned".to_string())
    }

    /// Index dimension for the model's collection, or `SchemaNotFound`.
    ///
    /// Checked before embedding so the NoSchema state surfaces ahead of
    /// any embedder failure, matching the remote backends.
    fn require_dim(&self, name: &str) -> AppResult<usize> {
        let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        collections
            .get(name)
            .map(|collection| collection.config.index_dim)
            .ok_or_else(|| AppError::SchemaNotFound(name.to_string()))
    }
}

#[async_trait::async_trait]
impl VectorStoreClient for MemoryStore {
    async fn create_schema(&self, model: Model, cfg: &SchemaConfig) -> AppResult<()> {
        cfg.validate()?;

        let name = namespace(model);
        let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        if collections.contains_key(&name) {
            return Err(AppError::SchemaExists(name));
        }

        collections.insert(
            name,
            Collection {
                config: *cfg,
                docs: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn drop_schema(&self, model: Model) -> AppResult<()> {
        let name = namespace(model);
        let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        collections
            .remove(&name)
            .map(|_| ())
            .ok_or(AppError::SchemaNotFound(name))
    }

    async fn insert_document(&self, model: Model, doc: Document) -> AppResult<()> {
        let name = namespace(model);
        let index_dim = self.require_dim(&name)?;

        let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;

        let dim = doc.embedding.as_deref().unwrap_or_default().len();
        if dim != index_dim {
            return Err(AppError::StoreWrite(format!(
                "Document '{}' has dimension {}, index expects {}",
                doc.file_id, dim, index_dim
            )));
        }

        let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        let collection = collections
            .get_mut(&name)
            .ok_or(AppError::SchemaNotFound(name))?;
        collection.docs.insert(doc.file_id.clone(), doc);
        Ok(())
    }

    async fn delete_document(&self, model: Model, file_id: &str) -> AppResult<bool> {
        let name = namespace(model);
        let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        Ok(collections
            .get_mut(&name)
            .is_some_and(|collection| collection.docs.remove(file_id).is_some()))
    }

    async fn delete_all_documents(&self, model: Model) -> AppResult<PurgeOutcome> {
        let name = namespace(model);
        let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;

        let deleted = collections
            .get_mut(&name)
            .map(|collection| {
                let count = collection.docs.len();
                collection.docs.clear();
                count
            })
            .unwrap_or(0);

        Ok(PurgeOutcome {
            deleted,
            failed: Vec::new(),
        })
    }

    async fn find_k_nearest(
        &self,
        model: Model,
        doc: Document,
        k: usize,
    ) -> AppResult<Vec<Neighbor>> {
        let name = namespace(model);
        let index_dim = self.require_dim(&name)?;

        let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;
        let query = doc.embedding.unwrap_or_default();

        if query.len() != index_dim {
            return Err(AppError::Query(format!(
                "Query vector has dimension {}, index expects {}",
                query.len(),
                index_dim
            )));
        }

        let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        let collection = collections
            .get(&name)
            .ok_or(AppError::SchemaNotFound(name))?;

        let mut neighbors: Vec<Neighbor> = collection
            .docs
            .values()
            .map(|stored| {
                let vector = stored.embedding.as_deref().unwrap_or_default();
                Neighbor {
                    file_id: stored.file_id.clone(),
                    text: stored.text.clone(),
                    distance: distance(collection.config.distance_metric, &query, vector),
                }
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

/// Distance under the configured metric; lower is closer for all three.
fn distance(metric: DistanceMetric, a: &[f64], b: &[f64]) -> f64 {
    match metric {
        DistanceMetric::L2 => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Cosine => {
            let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
            let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                return 1.0;
            }
            1.0 - dot / (norm_a * norm_b)
        }
        DistanceMetric::Ip => {
            let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            1.0 - dot
        }
    }
}
