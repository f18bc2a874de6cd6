//! Command handlers for the vecstore CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod delete;
pub mod ingest;
pub mod purge;
pub mod query;
pub mod schema;

// Re-export command types for convenience
pub use delete::DeleteCommand;
pub use ingest::IngestCommand;
pub use purge::PurgeCommand;
pub use query::QueryCommand;
pub use schema::SchemaCommand;

use std::str::FromStr;
use std::sync::Arc;

use vecstore_core::{config::AppConfig, AppResult};
use vecstore_embed::{create_embedder, Model};
use vecstore_store::{create_client, VectorStoreClient};

/// Resolve the model and connect to the configured backend.
///
/// Every command needs the same pair, so the factory wiring lives here.
pub(crate) async fn connect(
    config: &AppConfig,
) -> AppResult<(Model, Arc<dyn VectorStoreClient>)> {
    let model = Model::from_str(config.require_model()?)?;

    let embedder = create_embedder(
        &config.embedder,
        &config.ollama_addr,
        model,
        config.index_dim,
    )
    .await?;

    let client = create_client(&config.backend, config.backend_endpoint(), embedder).await?;

    Ok((model, client))
}
