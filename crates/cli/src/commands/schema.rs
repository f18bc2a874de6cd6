//! Schema command handler.
//!
//! Creates and drops the vector index for a model's namespace.

use clap::{Args, Subcommand};
use std::str::FromStr;
use vecstore_core::{config::AppConfig, AppResult};
use vecstore_store::{namespace, DistanceMetric, SchemaConfig};

/// Manage the vector index schema
#[derive(Args, Debug)]
pub struct SchemaCommand {
    #[command(subcommand)]
    pub action: SchemaAction,
}

#[derive(Subcommand, Debug)]
pub enum SchemaAction {
    /// Create the vector index for the selected model
    Create(SchemaCreateCommand),
    /// Drop the vector index and its documents
    Drop(SchemaDropCommand),
}

/// Create the index
#[derive(Args, Debug)]
pub struct SchemaCreateCommand {
    /// Vector dimension (defaults to the configured index dimension)
    #[arg(long)]
    pub dim: Option<usize>,

    /// Distance metric (COSINE, L2, IP)
    #[arg(long)]
    pub dist: Option<String>,
}

impl SchemaCreateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (model, client) = super::connect(config).await?;

        let dim = self.dim.unwrap_or(config.index_dim);
        let dist = self.dist.as_deref().unwrap_or(&config.index_dist);
        let schema = SchemaConfig::new(dim, DistanceMetric::from_str(dist)?);

        tracing::info!(
            "Creating schema '{}' (dim={}, dist={})",
            namespace(model),
            dim,
            dist
        );

        client.create_schema(model, &schema).await?;

        println!("Created schema '{}'", namespace(model));
        Ok(())
    }
}

/// Drop the index
#[derive(Args, Debug)]
pub struct SchemaDropCommand {}

impl SchemaDropCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (model, client) = super::connect(config).await?;

        tracing::info!("Dropping schema '{}'", namespace(model));

        client.drop_schema(model).await?;

        println!("Dropped schema '{}'", namespace(model));
        Ok(())
    }
}

impl SchemaCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            SchemaAction::Create(cmd) => cmd.execute(config).await,
            SchemaAction::Drop(cmd) => cmd.execute(config).await,
        }
    }
}
