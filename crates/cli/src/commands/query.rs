//! Query command handler.
//!
//! Finds the k nearest stored documents to a query text. Runs one-shot
//! when a text argument is given, otherwise drops into an interactive
//! read-query-print loop.

use clap::Args;
use std::io::Write;
use tokio::io::AsyncBufReadExt;

use vecstore_core::{config::AppConfig, AppResult};
use vecstore_store::{Document, Neighbor};

/// Find the k nearest documents
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Query text (omit for interactive mode)
    pub text: Option<String>,

    /// Number of neighbors to return
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (model, client) = super::connect(config).await?;

        if let Some(text) = &self.text {
            let hits = client
                .find_k_nearest(model, Document::new("", text), self.top_k)
                .await?;
            self.print_hits(&hits)?;
            return Ok(());
        }

        // Interactive loop: one query per line until EOF
        tracing::info!("Entering interactive query mode");
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!(">: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match client
                .find_k_nearest(model, Document::new("", text), self.top_k)
                .await
            {
                Ok(hits) => self.print_hits(&hits)?,
                Err(e) => eprintln!("Query failed: {}", e),
            }
        }

        Ok(())
    }

    fn print_hits(&self, hits: &[Neighbor]) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(hits)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No documents found");
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. {} (distance {:.6})\n   {}",
                rank + 1,
                hit.file_id,
                hit.distance,
                hit.text
            );
        }
        Ok(())
    }
}
