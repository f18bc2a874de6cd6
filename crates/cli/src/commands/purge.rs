//! Purge command handler.
//!
//! Removes every document in a model's namespace while keeping the
//! schema in place.

use clap::Args;
use vecstore_core::{config::AppConfig, AppError, AppResult};
use vecstore_store::namespace;

/// Delete every document in a namespace
#[derive(Args, Debug)]
pub struct PurgeCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PurgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (model, client) = super::connect(config).await?;

        tracing::info!("Purging namespace '{}'", namespace(model));

        let outcome = client.delete_all_documents(model).await?;

        if self.json {
            let output = serde_json::json!({
                "deleted": outcome.deleted,
                "failed": outcome.failed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Purged {} documents from '{}'",
                outcome.deleted,
                namespace(model)
            );
            for key in &outcome.failed {
                eprintln!("Failed to delete: {}", key);
            }
        }

        if !outcome.failed.is_empty() {
            return Err(AppError::StoreWrite(format!(
                "{} documents could not be deleted",
                outcome.failed.len()
            )));
        }

        Ok(())
    }
}
