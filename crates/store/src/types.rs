//! Data model shared by all vector store backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use vecstore_core::{AppError, AppResult};

/// A text document exchanged between caller and store.
///
/// `file_id` is a stable external identifier, unique per model namespace.
/// `embedding` may be absent; it is hydrated exactly once via the configured
/// embedder before any backend call. A present-but-empty embedding is
/// distinct from an absent one (bulk ingestion skips the former).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
}

impl Document {
    /// Create a document without a precomputed embedding.
    pub fn new(file_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            text: text.into(),
            embedding: None,
        }
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Whether the document carries a non-empty embedding.
    pub fn has_vector(&self) -> bool {
        self.embedding.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Whether a vector is unusable for similarity search: empty or all-zero.
pub fn is_degenerate(vector: &[f64]) -> bool {
    vector.is_empty() || vector.iter().all(|v| *v == 0.0)
}

/// Distance metric for the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistanceMetric {
    Cosine,
    L2,
    Ip,
}

impl DistanceMetric {
    /// Metric name as used by the RediSearch `DISTANCE_METRIC` argument.
    pub fn redis_name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "COSINE",
            DistanceMetric::L2 => "L2",
            DistanceMetric::Ip => "IP",
        }
    }

    /// Metric name as used by Chroma's `hnsw:space` collection metadata.
    pub fn chroma_space(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
            DistanceMetric::Ip => "ip",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redis_name())
    }
}

impl FromStr for DistanceMetric {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.to_uppercase().as_str() {
            "COSINE" => Ok(DistanceMetric::Cosine),
            "L2" => Ok(DistanceMetric::L2),
            "IP" => Ok(DistanceMetric::Ip),
            other => Err(AppError::Config(format!(
                "Unknown distance metric: {}. Supported: COSINE, L2, IP",
                other
            ))),
        }
    }
}

/// Vector index description; immutable once the schema exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub index_dim: usize,
    pub distance_metric: DistanceMetric,
}

impl SchemaConfig {
    pub fn new(index_dim: usize, distance_metric: DistanceMetric) -> Self {
        Self {
            index_dim,
            distance_metric,
        }
    }

    /// Validate schema parameters before any network call.
    pub fn validate(&self) -> AppResult<()> {
        if self.index_dim == 0 {
            return Err(AppError::Config(
                "Index dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single KNN search hit.
///
/// The strict internal result schema: backends translate their wire reply
/// shapes into this, never the other way around. Embedding vectors are not
/// returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub file_id: String,
    pub text: String,
    pub distance: f64,
}

/// Outcome of a best-effort namespace sweep.
///
/// `delete_all_documents` is not atomic: keys deleted before a failure stay
/// deleted. Callers inspect `failed` to decide whether to retry the
/// remainder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PurgeOutcome {
    /// Number of documents successfully deleted
    pub deleted: usize,
    /// Keys whose deletion failed
    pub failed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_record_shape() {
        // Field names are a boundary contract with the NDJSON ingestion
        // format
        let line = r#"{"file_id": "a.txt", "text": "hello", "embedding": [1.0, 2.0]}"#;
        let doc: Document = serde_json::from_str(line).unwrap();
        assert_eq!(doc.file_id, "a.txt");
        assert_eq!(doc.text, "hello");
        assert_eq!(doc.embedding, Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_absent_embedding_is_none() {
        let line = r#"{"file_id": "a.txt", "text": "hello"}"#;
        let doc: Document = serde_json::from_str(line).unwrap();
        assert_eq!(doc.embedding, None);
        assert!(!doc.has_vector());
    }

    #[test]
    fn test_empty_embedding_is_distinct_from_absent() {
        let line = r#"{"file_id": "a.txt", "text": "hello", "embedding": []}"#;
        let doc: Document = serde_json::from_str(line).unwrap();
        assert_eq!(doc.embedding, Some(vec![]));
        assert!(!doc.has_vector());
    }

    #[test]
    fn test_is_degenerate() {
        assert!(is_degenerate(&[]));
        assert!(is_degenerate(&[0.0, 0.0, 0.0]));
        assert!(!is_degenerate(&[0.0, 0.1, 0.0]));
    }

    #[test]
    fn test_distance_metric_parse() {
        assert_eq!(
            DistanceMetric::from_str("cosine").unwrap(),
            DistanceMetric::Cosine
        );
        assert_eq!(DistanceMetric::from_str("L2").unwrap(), DistanceMetric::L2);
        assert_eq!(DistanceMetric::from_str("IP").unwrap(), DistanceMetric::Ip);
        assert!(DistanceMetric::from_str("hamming").is_err());
    }

    #[test]
    fn test_distance_metric_wire_names() {
        assert_eq!(DistanceMetric::Cosine.redis_name(), "COSINE");
        assert_eq!(DistanceMetric::Cosine.chroma_space(), "cosine");
        assert_eq!(DistanceMetric::Ip.redis_name(), "IP");
    }

    #[test]
    fn test_schema_config_validate() {
        assert!(SchemaConfig::new(0, DistanceMetric::Cosine).validate().is_err());
        assert!(SchemaConfig::new(1024, DistanceMetric::Cosine)
            .validate()
            .is_ok());
    }
}
