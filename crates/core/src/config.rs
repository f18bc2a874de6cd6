//! Configuration management for the vecstore CLI.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (vecstore.yaml)
//!
//! Precedence is defaults < config file < environment < CLI flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Default RediSearch endpoint (adapter A).
pub const DEFAULT_REDIS_ADDR: &str = "redis://127.0.0.1:6379";

/// Default Chroma endpoint (adapter B).
pub const DEFAULT_CHROMA_ADDR: &str = "http://127.0.0.1:35000";

/// Default Ollama endpoint (embedding provider).
pub const DEFAULT_OLLAMA_ADDR: &str = "http://127.0.0.1:11434";

/// Policy applied when a bulk-ingestion insert fails.
///
/// Resolved before the run starts so the ingestion loop stays
/// non-interactive and scriptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first failed insert
    #[default]
    Abort,
    /// Log the failure and continue with the next record
    Skip,
    /// Re-attempt the insert a configured number of times, then abort
    Retry,
}

impl OnError {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnError::Abort => "abort",
            OnError::Skip => "skip",
            OnError::Retry => "retry",
        }
    }
}

impl FromStr for OnError {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(OnError::Abort),
            "skip" => Ok(OnError::Skip),
            "retry" => Ok(OnError::Retry),
            other => Err(AppError::Config(format!(
                "Unknown on-error policy: {}. Supported: abort, skip, retry",
                other
            ))),
        }
    }
}

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Vector store backend ("redis", "chroma", "memory")
    pub backend: String,

    /// Embedding model identifier (e.g., "mxbai-embed-large")
    pub model: Option<String>,

    /// Embedding provider ("ollama", "mock")
    pub embedder: String,

    /// RediSearch endpoint
    pub redis_addr: String,

    /// Chroma endpoint
    pub chroma_addr: String,

    /// Ollama endpoint
    pub ollama_addr: String,

    /// Default vector index dimension for `schema create`
    pub index_dim: usize,

    /// Default distance metric name for `schema create`
    pub index_dist: String,

    /// Ingestion error policy
    pub on_error: OnError,

    /// Retry attempts for the `retry` ingestion policy
    pub retries: u32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    backend: Option<String>,
    model: Option<String>,
    embedder: Option<String>,
    endpoints: Option<EndpointsConfig>,
    index: Option<IndexConfig>,
    ingest: Option<IngestConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EndpointsConfig {
    redis: Option<String>,
    chroma: Option<String>,
    ollama: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexConfig {
    dim: Option<usize>,
    dist: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IngestConfig {
    on_error: Option<OnError>,
    retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            backend: "redis".to_string(),
            model: None,
            embedder: "ollama".to_string(), // Local-first default
            redis_addr: DEFAULT_REDIS_ADDR.to_string(),
            chroma_addr: DEFAULT_CHROMA_ADDR.to_string(),
            ollama_addr: DEFAULT_OLLAMA_ADDR.to_string(),
            index_dim: 1024,
            index_dist: "COSINE".to_string(),
            on_error: OnError::Abort,
            retries: 3,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `VECSTORE_CONFIG`: Path to config file
    /// - `VECSTORE_BACKEND`: Vector store backend
    /// - `VECSTORE_MODEL`: Embedding model identifier
    /// - `VECSTORE_EMBEDDER`: Embedding provider
    /// - `VECSTORE_REDIS_ADDR`, `VECSTORE_CHROMA_ADDR`, `VECSTORE_OLLAMA_ADDR`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("VECSTORE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("vecstore.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(backend) = std::env::var("VECSTORE_BACKEND") {
            config.backend = backend;
        }

        if let Ok(model) = std::env::var("VECSTORE_MODEL") {
            config.model = Some(model);
        }

        if let Ok(embedder) = std::env::var("VECSTORE_EMBEDDER") {
            config.embedder = embedder;
        }

        if let Ok(addr) = std::env::var("VECSTORE_REDIS_ADDR") {
            config.redis_addr = addr;
        }

        if let Ok(addr) = std::env::var("VECSTORE_CHROMA_ADDR") {
            config.chroma_addr = addr;
        }

        if let Ok(addr) = std::env::var("VECSTORE_OLLAMA_ADDR") {
            config.ollama_addr = addr;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Called by `load()` for the implicit `vecstore.yaml`, and by the
    /// binary when an explicit config file is passed on the command line.
    pub fn merge_yaml(&self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(backend) = config_file.backend {
            result.backend = backend;
        }

        if let Some(model) = config_file.model {
            result.model = Some(model);
        }

        if let Some(embedder) = config_file.embedder {
            result.embedder = embedder;
        }

        if let Some(endpoints) = config_file.endpoints {
            if let Some(redis) = endpoints.redis {
                result.redis_addr = redis;
            }
            if let Some(chroma) = endpoints.chroma {
                result.chroma_addr = chroma;
            }
            if let Some(ollama) = endpoints.ollama {
                result.ollama_addr = ollama;
            }
        }

        if let Some(index) = config_file.index {
            if let Some(dim) = index.dim {
                result.index_dim = dim;
            }
            if let Some(dist) = index.dist {
                result.index_dist = dist;
            }
        }

        if let Some(ingest) = config_file.ingest {
            if let Some(on_error) = ingest.on_error {
                result.on_error = on_error;
            }
            if let Some(retries) = ingest.retries {
                result.retries = retries;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        backend: Option<String>,
        model: Option<String>,
        embedder: Option<String>,
        redis_addr: Option<String>,
        chroma_addr: Option<String>,
        ollama_addr: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(backend) = backend {
            self.backend = backend;
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if let Some(embedder) = embedder {
            self.embedder = embedder;
        }

        if let Some(redis_addr) = redis_addr {
            self.redis_addr = redis_addr;
        }

        if let Some(chroma_addr) = chroma_addr {
            self.chroma_addr = chroma_addr;
        }

        if let Some(ollama_addr) = ollama_addr {
            self.ollama_addr = ollama_addr;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Endpoint for the configured backend.
    pub fn backend_endpoint(&self) -> &str {
        match self.backend.as_str() {
            "chroma" => &self.chroma_addr,
            _ => &self.redis_addr,
        }
    }

    /// Model name, or a `Config` error when none was supplied.
    pub fn require_model(&self) -> AppResult<&str> {
        self.model
            .as_deref()
            .ok_or_else(|| AppError::Config("Model name is required (--model)".to_string()))
    }

    /// Validate configuration before any network call.
    pub fn validate(&self) -> AppResult<()> {
        let known_backends = ["redis", "chroma", "memory"];
        if !known_backends.contains(&self.backend.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown backend: {}. Supported: {}",
                self.backend,
                known_backends.join(", ")
            )));
        }

        let known_embedders = ["ollama", "mock"];
        if !known_embedders.contains(&self.embedder.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedder: {}. Supported: {}",
                self.embedder,
                known_embedders.join(", ")
            )));
        }

        if self.index_dim == 0 {
            return Err(AppError::Config(
                "Index dimension must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend, "redis");
        assert_eq!(config.embedder, "ollama");
        assert_eq!(config.index_dim, 1024);
        assert_eq!(config.index_dist, "COSINE");
        assert_eq!(config.on_error, OnError::Abort);
        assert!(config.model.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            Some("chroma".to_string()),
            Some("llama3.2".to_string()),
            None,
            None,
            None,
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.backend, "chroma");
        assert_eq!(overridden.model.as_deref(), Some("llama3.2"));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend: chroma\nmodel: mxbai-embed-large\nendpoints:\n  chroma: http://example:9000\ningest:\n  on_error: retry\n  retries: 5\nindex:\n  dim: 768\n  dist: L2\n"
        )
        .unwrap();

        let config = AppConfig::default();
        let merged = config.merge_yaml(&file.path().to_path_buf()).unwrap();

        assert_eq!(merged.backend, "chroma");
        assert_eq!(merged.model.as_deref(), Some("mxbai-embed-large"));
        assert_eq!(merged.chroma_addr, "http://example:9000");
        assert_eq!(merged.on_error, OnError::Retry);
        assert_eq!(merged.retries, 5);
        assert_eq!(merged.index_dim, 768);
        assert_eq!(merged.index_dist, "L2");
        // Untouched fields keep their defaults
        assert_eq!(merged.redis_addr, DEFAULT_REDIS_ADDR);
    }

    #[test]
    fn test_explicit_config_file_applies_without_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend: memory\nmodel: llama3.2\n").unwrap();
        let path = file.path().to_path_buf();

        // Mirrors the binary's flow for `--config <file>`: merge the named
        // file first, then apply the remaining flag overrides
        let config = AppConfig::default().merge_yaml(&path).unwrap();
        let config = config.with_overrides(
            Some(path.clone()),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            false,
            false,
        );

        assert_eq!(config.backend, "memory");
        assert_eq!(config.model.as_deref(), Some("llama3.2"));
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_validate_unknown_backend() {
        let mut config = AppConfig::default();
        config.backend = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_dim() {
        let mut config = AppConfig::default();
        config.index_dim = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_model() {
        let mut config = AppConfig::default();
        assert!(config.require_model().is_err());
        config.model = Some("llama3.2".to_string());
        assert_eq!(config.require_model().unwrap(), "llama3.2");
    }

    #[test]
    fn test_on_error_from_str() {
        assert_eq!(OnError::from_str("abort").unwrap(), OnError::Abort);
        assert_eq!(OnError::from_str("SKIP").unwrap(), OnError::Skip);
        assert_eq!(OnError::from_str("retry").unwrap(), OnError::Retry);
        assert!(OnError::from_str("ask").is_err());
    }
}
