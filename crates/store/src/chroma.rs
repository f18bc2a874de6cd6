//! Chroma backend (adapter B).
//!
//! Talks to a Chroma server over its REST API. Each model namespace maps to
//! a collection named `embeddings-<model>`; document ids are raw `file_id`
//! values. Chroma stores single-precision vectors, so embeddings are
//! narrowed from f64 before transmission. Inserts are batched: ids, texts
//! and vectors travel as parallel sequences that must stay in lockstep.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vecstore_core::{AppError, AppResult};
use vecstore_embed::{Embedder, Model};

use crate::client::{ensure_embedded, namespace, VectorStoreClient};
use crate::types::{Document, Neighbor, PurgeOutcome, SchemaConfig};

const API_ROOT: &str = "/api/v1";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
    #[allow(dead_code)]
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    metadata: serde_json::Value,
    get_or_create: bool,
}

#[derive(Debug, Serialize)]
struct AddRequest {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadatas: Vec<serde_json::Value>,
    documents: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

/// Per-query nested result arrays: outer index = query, inner = rank.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<String>>,
}

/// Vector store backed by a Chroma server.
pub struct ChromaStore {
    http: reqwest::Client,
    base_url: String,
    embedder: Arc<dyn Embedder>,
}

impl ChromaStore {
    /// Connect to a Chroma server and verify it is reachable.
    ///
    /// # Errors
    /// Returns `AppError::Connection` if the heartbeat probe fails.
    pub async fn connect(base_url: impl Into<String>, embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Connection(format!("Failed to create HTTP client for Chroma: {}", e))
            })?;

        let store = Self {
            http,
            base_url: base_url.into(),
            embedder,
        };

        let url = store.url("/heartbeat");
        let response = store.http.get(&url).send().await.map_err(|e| {
            AppError::Connection(format!("Chroma not available at {}: {}", store.base_url, e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Connection(format!(
                "Chroma heartbeat failed with status {}",
                response.status()
            )));
        }

        Ok(store)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_ROOT, path)
    }

    fn collection_name(model: Model) -> String {
        namespace(model)
    }

    /// Look up a collection by name; `None` when it does not exist.
    async fn get_collection(&self, model: Model) -> AppResult<Option<CollectionInfo>> {
        let name = Self::collection_name(model);
        let url = self.url(&format!("/collections/{}", name));

        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::Query(format!("Failed to fetch Chroma collection {}: {}", name, e))
        })?;

        let status = response.status();
        if status.is_success() {
            let info: CollectionInfo = response.json().await.map_err(|e| {
                AppError::Query(format!("Failed to parse Chroma collection {}: {}", name, e))
            })?;
            return Ok(Some(info));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Older servers report a missing collection as a generic error
        let body = response.text().await.unwrap_or_default();
        if body.contains("does not exist") {
            return Ok(None);
        }

        Err(AppError::Query(format!(
            "Failed to fetch Chroma collection {} ({}): {}",
            name, status, body
        )))
    }

    async fn require_collection(&self, model: Model) -> AppResult<CollectionInfo> {
        self.get_collection(model)
            .await?
            .ok_or_else(|| AppError::SchemaNotFound(Self::collection_name(model)))
    }
}

#[async_trait::async_trait]
impl VectorStoreClient for ChromaStore {
    async fn create_schema(&self, model: Model, cfg: &SchemaConfig) -> AppResult<()> {
        cfg.validate()?;

        let name = Self::collection_name(model);
        if self.get_collection(model).await?.is_some() {
            return Err(AppError::SchemaExists(name));
        }

        let request = CreateCollectionRequest {
            name: &name,
            metadata: serde_json::json!({
                "hnsw:space": cfg.distance_metric.chroma_space(),
            }),
            get_or_create: false,
        };

        let response = self
            .http
            .post(self.url("/collections"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::StoreWrite(format!("Failed to create Chroma collection {}: {}", name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StoreWrite(format!(
                "Failed to create Chroma collection {} ({}): {}",
                name, status, body
            )));
        }

        tracing::info!("Created collection {}", name);
        Ok(())
    }

    async fn drop_schema(&self, model: Model) -> AppResult<()> {
        let name = Self::collection_name(model);
        self.require_collection(model).await?;

        let response = self
            .http
            .delete(self.url(&format!("/collections/{}", name)))
            .send()
            .await
            .map_err(|e| {
                AppError::StoreWrite(format!("Failed to delete Chroma collection {}: {}", name, e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::StoreWrite(format!(
                "Failed to delete Chroma collection {}: status {}",
                name,
                response.status()
            )));
        }

        tracing::info!("Dropped collection {}", name);
        Ok(())
    }

    async fn insert_document(&self, model: Model, doc: Document) -> AppResult<()> {
        self.insert_documents(model, vec![doc]).await
    }

    async fn insert_documents(&self, model: Model, docs: Vec<Document>) -> AppResult<()> {
        let collection = self.require_collection(model).await?;

        // ids, texts and vectors are parallel sequences aligned by index; a
        // single loop keeps them in lockstep
        let mut ids = Vec::with_capacity(docs.len());
        let mut documents = Vec::with_capacity(docs.len());
        let mut metadatas = Vec::with_capacity(docs.len());
        let mut embeddings = Vec::with_capacity(docs.len());

        for doc in docs {
            let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;
            embeddings.push(narrow(doc.embedding.as_deref().unwrap_or_default()));
            metadatas.push(serde_json::json!({}));
            documents.push(doc.text);
            ids.push(doc.file_id);
        }

        let request = AddRequest {
            ids,
            embeddings,
            metadatas,
            documents,
        };

        let response = self
            .http
            .post(self.url(&format!("/collections/{}/add", collection.id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::StoreWrite(format!("Failed to add documents: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StoreWrite(format!(
                "Failed to add documents ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn delete_document(&self, model: Model, file_id: &str) -> AppResult<bool> {
        // A missing collection is an empty namespace, not an error
        let Some(collection) = self.get_collection(model).await? else {
            return Ok(false);
        };

        let request = DeleteRequest {
            ids: Some(vec![file_id.to_string()]),
        };

        let deleted = self.delete_ids(&collection, &request).await?;
        Ok(deleted.iter().any(|id| id == file_id))
    }

    async fn delete_all_documents(&self, model: Model) -> AppResult<PurgeOutcome> {
        let Some(collection) = self.get_collection(model).await? else {
            return Ok(PurgeOutcome::default());
        };

        // An id-less delete sweeps the whole collection in one call; the
        // backend reports which ids it removed
        let deleted = self.delete_ids(&collection, &DeleteRequest { ids: None }).await?;

        tracing::info!("Deleted {} documents", deleted.len());
        Ok(PurgeOutcome {
            deleted: deleted.len(),
            failed: Vec::new(),
        })
    }

    async fn find_k_nearest(
        &self,
        model: Model,
        doc: Document,
        k: usize,
    ) -> AppResult<Vec<Neighbor>> {
        let collection = self.require_collection(model).await?;

        let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;
        let request = QueryRequest {
            query_embeddings: vec![narrow(doc.embedding.as_deref().unwrap_or_default())],
            n_results: k,
            include: vec!["documents", "distances"],
        };

        let response = self
            .http
            .post(self.url(&format!("/collections/{}/query", collection.id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Query(format!("Chroma query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Query(format!(
                "Chroma query failed ({}): {}",
                status, body
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Query(format!("Failed to parse Chroma query reply: {}", e)))?;

        flatten_query_response(body)
    }
}

impl ChromaStore {
    async fn delete_ids(
        &self,
        collection: &CollectionInfo,
        request: &DeleteRequest,
    ) -> AppResult<Vec<String>> {
        let response = self
            .http
            .post(self.url(&format!("/collections/{}/delete", collection.id)))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::StoreWrite(format!("Failed to delete documents: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StoreWrite(format!(
                "Failed to delete documents ({}): {}",
                status, body
            )));
        }

        let deleted: Vec<String> = response.json().await.map_err(|e| {
            AppError::StoreWrite(format!("Failed to parse Chroma delete reply: {}", e))
        })?;

        Ok(deleted)
    }
}

/// Narrow a double-precision vector to the single precision Chroma stores.
fn narrow(vector: &[f64]) -> Vec<f32> {
    vector.iter().map(|v| *v as f32).collect()
}

/// Flatten the nested per-query arrays of a single-query KNN reply.
fn flatten_query_response(response: QueryResponse) -> AppResult<Vec<Neighbor>> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .ok_or_else(|| AppError::Query("Chroma reply is missing distances".to_string()))?;

    if distances.len() != ids.len() {
        return Err(AppError::Query(format!(
            "Chroma reply misaligned: {} ids but {} distances",
            ids.len(),
            distances.len()
        )));
    }

    let mut neighbors = Vec::with_capacity(ids.len());
    for (rank, (file_id, distance)) in ids.into_iter().zip(distances).enumerate() {
        let text = documents
            .get(rank)
            .cloned()
            .flatten()
            .unwrap_or_default();
        neighbors.push(Neighbor {
            file_id,
            text,
            distance,
        });
    }

    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_naming() {
        assert_eq!(
            ChromaStore::collection_name(Model::SnowflakeArcticEmbed),
            "embeddings-snowflake-arctic-embed"
        );
    }

    #[test]
    fn test_narrow() {
        assert_eq!(narrow(&[1.0, -0.5, 2.25]), vec![1.0f32, -0.5, 2.25]);
        assert!(narrow(&[]).is_empty());
    }

    #[test]
    fn test_add_request_keeps_sequences_parallel() {
        let request = AddRequest {
            ids: vec!["a".to_string(), "b".to_string()],
            embeddings: vec![vec![1.0], vec![2.0]],
            metadatas: vec![serde_json::json!({}), serde_json::json!({})],
            documents: vec!["alpha".to_string(), "beta".to_string()],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ids"][1], "b");
        assert_eq!(value["documents"][1], "beta");
        assert_eq!(value["embeddings"][1][0], 2.0);
    }

    #[test]
    fn test_flatten_query_response() {
        let body = r#"{
            "ids": [["a", "b"]],
            "documents": [["alpha", "beta"]],
            "distances": [[0.1, 0.4]]
        }"#;
        let response: QueryResponse = serde_json::from_str(body).unwrap();

        let neighbors = flatten_query_response(response).unwrap();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].file_id, "a");
        assert_eq!(neighbors[0].text, "alpha");
        assert_eq!(neighbors[0].distance, 0.1);
        assert_eq!(neighbors[1].file_id, "b");
    }

    #[test]
    fn test_flatten_handles_null_documents() {
        let body = r#"{
            "ids": [["a"]],
            "documents": [[null]],
            "distances": [[0.3]]
        }"#;
        let response: QueryResponse = serde_json::from_str(body).unwrap();

        let neighbors = flatten_query_response(response).unwrap();
        assert_eq!(neighbors[0].text, "");
    }

    #[test]
    fn test_flatten_rejects_missing_distances() {
        let body = r#"{"ids": [["a"]]}"#;
        let response: QueryResponse = serde_json::from_str(body).unwrap();
        assert!(flatten_query_response(response).is_err());
    }

    #[test]
    fn test_flatten_empty_reply() {
        let body = r#"{"ids": [[]], "documents": [[]], "distances": [[]]}"#;
        let response: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(flatten_query_response(response).unwrap(), vec![]);
    }

    #[test]
    fn test_delete_request_omits_missing_ids() {
        let all = serde_json::to_value(&DeleteRequest { ids: None }).unwrap();
        assert!(all.get("ids").is_none());

        let one = serde_json::to_value(&DeleteRequest {
            ids: Some(vec!["a".to_string()]),
        })
        .unwrap();
        assert_eq!(one["ids"][0], "a");
    }
}
