//! Ollama embedding provider.
//!
//! Talks to a local Ollama runtime over HTTP.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vecstore_core::{AppError, AppResult};

use crate::embedder::Embedder;
use crate::model::Model;

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";
const VERSION_ENDPOINT: &str = "/api/version";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embeddings API request format.
#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

/// Ollama embeddings API response format.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

/// Error response from the Ollama API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// Ollama embedding provider.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: Model,
}

impl OllamaEmbedder {
    /// Connect to an Ollama runtime and verify it is reachable.
    ///
    /// # Errors
    /// Returns `AppError::Connection` if the server does not answer the
    /// version probe.
    pub async fn connect(base_url: impl Into<String>, model: Model) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Connection(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let embedder = Self {
            client,
            base_url: base_url.into(),
            model,
        };

        let version = embedder.server_version().await?;
        tracing::info!("Ollama version: {}", version);

        Ok(embedder)
    }

    async fn server_version(&self) -> AppResult<String> {
        let url = format!("{}{}", self.base_url, VERSION_ENDPOINT);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::Connection(format!("Ollama not available at {}: {}", self.base_url, e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Connection(format!(
                "Ollama version probe failed with status {}",
                response.status()
            )));
        }

        let body: VersionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Connection(format!("Failed to parse Ollama version: {}", e)))?;

        Ok(body.version)
    }
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    fn model(&self) -> Model {
        self.model
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f64>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: self.model.name().to_string(),
            prompt: text.to_string(),
        };

        tracing::debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(AppError::Embedding(format!(
                    "Ollama API error ({}): {}",
                    status, error_response.error
                )));
            }

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embedding.is_empty() || body.embedding.iter().all(|v| *v == 0.0) {
            return Err(AppError::Embedding(format!(
                "Ollama model '{}' returned a degenerate vector",
                self.model
            )));
        }

        tracing::debug!("Generated {} dimensional embedding", body.embedding.len());

        Ok(body.embedding)
    }
}
