//! Redis/RediSearch backend (adapter A).
//!
//! Documents live in hashes keyed `embeddings-<model>:{<file_id>}`; the
//! braces make all documents of one model share a cluster routing tag. A
//! RediSearch HNSW index named `idx:embeddings-<model>` covers the
//! namespace prefix, and KNN queries pass the codec-encoded query vector as
//! an opaque binary parameter.

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use redis::{cmd, RedisError, Value};

use vecstore_core::{AppError, AppResult};
use vecstore_embed::{Embedder, Model};

use crate::client::{ensure_embedded, namespace, VectorStoreClient};
use crate::codec;
use crate::types::{Document, Neighbor, PurgeOutcome, SchemaConfig};

/// Alias under which the KNN clause exposes the distance for each hit.
const DISTANCE_FIELD: &str = "knn_dist";

/// Vector store backed by Redis with the RediSearch module.
pub struct RedisStore {
    conn: MultiplexedConnection,
    embedder: Arc<dyn Embedder>,
}

impl RedisStore {
    /// Connect to Redis and verify the server answers.
    ///
    /// # Errors
    /// Returns `AppError::Connection` for an invalid address or an
    /// unreachable server.
    pub async fn connect(addr: &str, embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        let client = redis::Client::open(addr)
            .map_err(|e| AppError::Connection(format!("Invalid redis address {}: {}", addr, e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                AppError::Connection(format!("Failed to connect to redis at {}: {}", addr, e))
            })?;

        cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::Connection(format!("Failed to ping redis: {}", e)))?;

        Ok(Self { conn, embedder })
    }

    fn index_name(model: Model) -> String {
        format!("idx:{}", namespace(model))
    }

    fn key_prefix(model: Model) -> String {
        format!("{}:", namespace(model))
    }

    fn document_key(model: Model, file_id: &str) -> String {
        format!("{}:{{{}}}", namespace(model), file_id)
    }

    fn knn_clause(k: usize) -> String {
        format!("*=>[KNN {} @embedding $vec_param AS {}]", k, DISTANCE_FIELD)
    }

    async fn index_exists(&self, index: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        match cmd("FT.INFO").arg(index).query_async::<Value>(&mut conn).await {
            Ok(_) => Ok(true),
            Err(err) if is_unknown_index(&err) => Ok(false),
            Err(err) => Err(AppError::Query(format!(
                "Failed to inspect index {}: {}",
                index, err
            ))),
        }
    }

    async fn require_index(&self, model: Model) -> AppResult<String> {
        let index = Self::index_name(model);
        if !self.index_exists(&index).await? {
            return Err(AppError::SchemaNotFound(index));
        }
        Ok(index)
    }
}

#[async_trait::async_trait]
impl VectorStoreClient for RedisStore {
    async fn create_schema(&self, model: Model, cfg: &SchemaConfig) -> AppResult<()> {
        cfg.validate()?;

        let index = Self::index_name(model);
        if self.index_exists(&index).await? {
            return Err(AppError::SchemaExists(index));
        }

        let mut conn = self.conn.clone();
        cmd("FT.CREATE")
            .arg(&index)
            .arg("PREFIX")
            .arg(1)
            .arg(Self::key_prefix(model))
            .arg("SCORE")
            .arg("1.0")
            .arg("SCHEMA")
            .arg("file_id")
            .arg("TEXT")
            .arg("WEIGHT")
            .arg("1.0")
            .arg("NOSTEM")
            .arg("text")
            .arg("TEXT")
            .arg("WEIGHT")
            .arg("1.0")
            .arg("NOSTEM")
            .arg("embedding")
            .arg("VECTOR")
            .arg("HNSW")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT64")
            .arg("DIM")
            .arg(cfg.index_dim)
            .arg("DISTANCE_METRIC")
            .arg(cfg.distance_metric.redis_name())
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::StoreWrite(format!("Failed to create index {}: {}", index, e)))?;

        tracing::info!("Created index {}", index);
        Ok(())
    }

    async fn drop_schema(&self, model: Model) -> AppResult<()> {
        let index = self.require_index(model).await?;

        let mut conn = self.conn.clone();
        // DD also deletes the documents covered by the index
        cmd("FT.DROPINDEX")
            .arg(&index)
            .arg("DD")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::StoreWrite(format!("Failed to drop index {}: {}", index, e)))?;

        tracing::info!("Dropped index {}", index);
        Ok(())
    }

    async fn insert_document(&self, model: Model, doc: Document) -> AppResult<()> {
        self.require_index(model).await?;

        let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;
        let vector_bytes = codec::encode(doc.embedding.as_deref().unwrap_or_default());
        let key = Self::document_key(model, &doc.file_id);

        let mut conn = self.conn.clone();
        cmd("HSET")
            .arg(&key)
            .arg("file_id")
            .arg(&doc.file_id)
            .arg("text")
            .arg(&doc.text)
            .arg("embedding")
            .arg(vector_bytes)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                AppError::StoreWrite(format!("Failed to insert document {}: {}", key, e))
            })?;

        Ok(())
    }

    async fn delete_document(&self, model: Model, file_id: &str) -> AppResult<bool> {
        let key = Self::document_key(model, file_id);

        let mut conn = self.conn.clone();
        let removed: i64 = cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::StoreWrite(format!("Failed to delete key {}: {}", key, e)))?;

        Ok(removed > 0)
    }

    async fn delete_all_documents(&self, model: Model) -> AppResult<PurgeOutcome> {
        let pattern = format!("{}*", Self::key_prefix(model));

        let mut conn = self.conn.clone();
        let keys: Vec<String> = cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Query(format!("Failed to list keys {}: {}", pattern, e)))?;

        let mut outcome = PurgeOutcome::default();
        for key in keys {
            match cmd("DEL").arg(&key).query_async::<i64>(&mut conn).await {
                Ok(_) => outcome.deleted += 1,
                Err(err) => {
                    tracing::warn!("Failed to delete key {}: {}", key, err);
                    outcome.failed.push(key);
                }
            }
        }

        tracing::info!("Deleted {} keys", outcome.deleted);
        Ok(outcome)
    }

    async fn find_k_nearest(
        &self,
        model: Model,
        doc: Document,
        k: usize,
    ) -> AppResult<Vec<Neighbor>> {
        let index = self.require_index(model).await?;

        let doc = ensure_embedded(self.embedder.as_ref(), doc).await?;
        let vector_bytes = codec::encode(doc.embedding.as_deref().unwrap_or_default());

        let mut conn = self.conn.clone();
        let reply: Value = cmd("FT.SEARCH")
            .arg(&index)
            .arg(Self::knn_clause(k))
            .arg("PARAMS")
            .arg(2)
            .arg("vec_param")
            .arg(vector_bytes)
            .arg("SORTBY")
            .arg(DISTANCE_FIELD)
            .arg("RETURN")
            .arg(3)
            .arg("file_id")
            .arg("text")
            .arg(DISTANCE_FIELD)
            .arg("DIALECT")
            .arg(2)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Query(format!("KNN search on {} failed: {}", index, e)))?;

        parse_search_reply(&reply)
    }
}

fn is_unknown_index(err: &RedisError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("unknown index") || msg.contains("no such index")
}

/// Best-effort string extraction from a reply value.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::VerbatimString { text, .. } => Some(text.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

/// Translate an FT.SEARCH reply into the internal result schema.
///
/// The generic reply carries no static schema, and its shape depends on the
/// protocol version: RESP3 returns a map with a `results` list, RESP2 a
/// flat array of `[total, key, fields, key, fields, ...]`. Both are handled
/// here so the contract's shape never depends on the wire's.
fn parse_search_reply(reply: &Value) -> AppResult<Vec<Neighbor>> {
    match reply {
        Value::Map(entries) => parse_resp3_reply(entries),
        Value::Array(items) => parse_resp2_reply(items),
        other => Err(AppError::Query(format!(
            "Unexpected FT.SEARCH reply shape: {:?}",
            other
        ))),
    }
}

fn parse_resp3_reply(entries: &[(Value, Value)]) -> AppResult<Vec<Neighbor>> {
    let results = entries
        .iter()
        .find(|(key, _)| value_to_string(key).as_deref() == Some("results"))
        .map(|(_, value)| value)
        .ok_or_else(|| AppError::Query("FT.SEARCH reply is missing 'results'".to_string()))?;

    let Value::Array(hits) = results else {
        return Err(AppError::Query(
            "FT.SEARCH 'results' is not a list".to_string(),
        ));
    };

    hits.iter().map(parse_resp3_hit).collect()
}

fn parse_resp3_hit(hit: &Value) -> AppResult<Neighbor> {
    let Value::Map(fields) = hit else {
        return Err(AppError::Query("FT.SEARCH hit is not a map".to_string()));
    };

    let attrs = fields
        .iter()
        .find(|(key, _)| value_to_string(key).as_deref() == Some("extra_attributes"))
        .map(|(_, value)| value)
        .ok_or_else(|| {
            AppError::Query("FT.SEARCH hit is missing 'extra_attributes'".to_string())
        })?;

    let Value::Map(attrs) = attrs else {
        return Err(AppError::Query(
            "FT.SEARCH 'extra_attributes' is not a map".to_string(),
        ));
    };

    neighbor_from_attrs(attrs.iter().filter_map(|(key, value)| {
        Some((value_to_string(key)?, value_to_string(value)?))
    }))
}

fn parse_resp2_reply(items: &[Value]) -> AppResult<Vec<Neighbor>> {
    // [total, key1, fields1, key2, fields2, ...]
    let mut neighbors = Vec::new();
    let mut iter = items.iter().skip(1);

    while let Some(_key) = iter.next() {
        let fields = iter.next().ok_or_else(|| {
            AppError::Query("FT.SEARCH hit is missing its field list".to_string())
        })?;

        let Value::Array(pairs) = fields else {
            return Err(AppError::Query(
                "FT.SEARCH hit field list is not an array".to_string(),
            ));
        };

        neighbors.push(neighbor_from_attrs(pairs.chunks_exact(2).filter_map(
            |pair| Some((value_to_string(&pair[0])?, value_to_string(&pair[1])?)),
        ))?);
    }

    Ok(neighbors)
}

fn neighbor_from_attrs(attrs: impl Iterator<Item = (String, String)>) -> AppResult<Neighbor> {
    let mut file_id = None;
    let mut text = None;
    let mut distance = None;

    for (key, value) in attrs {
        match key.as_str() {
            "file_id" => file_id = Some(value),
            "text" => text = Some(value),
            DISTANCE_FIELD => distance = value.parse::<f64>().ok(),
            _ => {}
        }
    }

    Ok(Neighbor {
        file_id: file_id
            .ok_or_else(|| AppError::Query("FT.SEARCH hit is missing 'file_id'".to_string()))?,
        text: text.unwrap_or_default(),
        distance: distance
            .ok_or_else(|| AppError::Query("FT.SEARCH hit is missing its distance".to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_naming_is_bit_exact() {
        assert_eq!(RedisStore::index_name(Model::Llama32), "idx:embeddings-llama3.2");
        assert_eq!(RedisStore::key_prefix(Model::Llama32), "embeddings-llama3.2:");
        assert_eq!(
            RedisStore::document_key(Model::Llama32, "a.txt"),
            "embeddings-llama3.2:{a.txt}"
        );
    }

    #[test]
    fn test_knn_clause() {
        assert_eq!(
            RedisStore::knn_clause(5),
            "*=>[KNN 5 @embedding $vec_param AS knn_dist]"
        );
    }

    #[test]
    fn test_parse_resp2_reply() {
        let reply = Value::Array(vec![
            Value::Int(2),
            bulk("embeddings-llama3.2:{a}"),
            Value::Array(vec![
                bulk("file_id"),
                bulk("a"),
                bulk("text"),
                bulk("alpha"),
                bulk(DISTANCE_FIELD),
                bulk("0.125"),
            ]),
            bulk("embeddings-llama3.2:{b}"),
            Value::Array(vec![
                bulk("file_id"),
                bulk("b"),
                bulk("text"),
                bulk("beta"),
                bulk(DISTANCE_FIELD),
                bulk("0.5"),
            ]),
        ]);

        let neighbors = parse_search_reply(&reply).unwrap();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].file_id, "a");
        assert_eq!(neighbors[0].text, "alpha");
        assert_eq!(neighbors[0].distance, 0.125);
        assert_eq!(neighbors[1].file_id, "b");
        assert_eq!(neighbors[1].distance, 0.5);
    }

    #[test]
    fn test_parse_resp3_reply() {
        let hit = Value::Map(vec![
            (bulk("id"), bulk("embeddings-llama3.2:{a}")),
            (
                bulk("extra_attributes"),
                Value::Map(vec![
                    (bulk("file_id"), bulk("a")),
                    (bulk("text"), bulk("alpha")),
                    (bulk(DISTANCE_FIELD), bulk("0.25")),
                ]),
            ),
        ]);
        let reply = Value::Map(vec![
            (bulk("total_results"), Value::Int(1)),
            (bulk("results"), Value::Array(vec![hit])),
        ]);

        let neighbors = parse_search_reply(&reply).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].file_id, "a");
        assert_eq!(neighbors[0].text, "alpha");
        assert_eq!(neighbors[0].distance, 0.25);
    }

    #[test]
    fn test_parse_empty_resp2_reply() {
        let reply = Value::Array(vec![Value::Int(0)]);
        assert_eq!(parse_search_reply(&reply).unwrap(), vec![]);
    }

    #[test]
    fn test_parse_rejects_hit_without_file_id() {
        let reply = Value::Array(vec![
            Value::Int(1),
            bulk("embeddings-llama3.2:{a}"),
            Value::Array(vec![bulk("text"), bulk("alpha")]),
        ]);
        assert!(parse_search_reply(&reply).is_err());
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(parse_search_reply(&Value::Int(3)).is_err());
    }
}
