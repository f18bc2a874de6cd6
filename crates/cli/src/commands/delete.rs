//! Delete command handler.

use clap::Args;
use vecstore_core::{config::AppConfig, AppResult};

/// Delete a single document
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// File id of the document to delete
    pub file_id: String,
}

impl DeleteCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (model, client) = super::connect(config).await?;

        // Deleting an absent id is a no-op, not an error
        let removed = client.delete_document(model, &self.file_id).await?;

        if removed {
            println!("Deleted '{}'", self.file_id);
        } else {
            println!("Document '{}' not found, nothing to delete", self.file_id);
        }

        Ok(())
    }
}
