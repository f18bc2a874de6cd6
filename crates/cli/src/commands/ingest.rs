//! Ingest command handler.
//!
//! Bulk-loads NDJSON documents (one JSON record per line) into the
//! configured backend. Records may carry a precomputed embedding or rely
//! on the store to embed their text on insert.

use clap::Args;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::str::FromStr;

use vecstore_core::{config::AppConfig, AppError, AppResult, OnError};
use vecstore_embed::Model;
use vecstore_store::{is_degenerate, Document, VectorStoreClient};

/// Ingest NDJSON documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Input file (defaults to stdin)
    pub file: Option<PathBuf>,

    /// Error policy for failed inserts (abort, skip, retry)
    #[arg(long)]
    pub on_error: Option<String>,

    /// Retry attempts for the retry policy
    #[arg(long)]
    pub retries: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Ingestion tally reported at the end of a run.
#[derive(Debug, Default)]
struct IngestStats {
    inserted: usize,
    skipped: usize,
    failed: usize,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let policy = match &self.on_error {
            Some(s) => OnError::from_str(s)?,
            None => config.on_error,
        };
        let retries = self.retries.unwrap_or(config.retries);

        let (model, client) = super::connect(config).await?;

        tracing::info!(
            "Ingesting from {} (policy={}, retries={})",
            self.file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdin".to_string()),
            policy.as_str(),
            retries
        );

        let reader: Box<dyn BufRead> = match &self.file {
            Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
            None => Box::new(BufReader::new(std::io::stdin())),
        };

        let stats = self
            .ingest_lines(reader, model, client.as_ref(), policy, retries)
            .await?;

        if self.json {
            let output = serde_json::json!({
                "inserted": stats.inserted,
                "skipped": stats.skipped,
                "failed": stats.failed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} documents ({} skipped, {} failed)",
                stats.inserted, stats.skipped, stats.failed
            );
        }

        Ok(())
    }

    async fn ingest_lines(
        &self,
        reader: Box<dyn BufRead>,
        model: Model,
        client: &dyn VectorStoreClient,
        policy: OnError,
        retries: u32,
    ) -> AppResult<IngestStats> {
        let mut stats = IngestStats::default();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            // Malformed input aborts the run regardless of policy: the
            // rest of the stream is no longer trustworthy
            let doc: Document = serde_json::from_str(&line).map_err(|e| {
                AppError::Serialization(format!("Invalid record on line {}: {}", line_no, e))
            })?;

            if let Some(reason) = skip_reason(&doc) {
                tracing::warn!("Skipping '{}' on line {}: {}", doc.file_id, line_no, reason);
                stats.skipped += 1;
                continue;
            }

            match insert_with_policy(client, model, doc, policy, retries).await {
                Ok(()) => stats.inserted += 1,
                Err(InsertFailure::Skipped(file_id, e)) => {
                    tracing::warn!("Insert of '{}' failed, continuing: {}", file_id, e);
                    stats.failed += 1;
                }
                Err(InsertFailure::Fatal(e)) => return Err(e),
            }
        }

        Ok(stats)
    }
}

enum InsertFailure {
    /// The record was dropped under the skip policy
    Skipped(String, AppError),
    /// The run must stop
    Fatal(AppError),
}

async fn insert_with_policy(
    client: &dyn VectorStoreClient,
    model: Model,
    doc: Document,
    policy: OnError,
    retries: u32,
) -> Result<(), InsertFailure> {
    let file_id = doc.file_id.clone();

    match policy {
        OnError::Abort => client
            .insert_document(model, doc)
            .await
            .map_err(InsertFailure::Fatal),
        OnError::Skip => client
            .insert_document(model, doc)
            .await
            .map_err(|e| InsertFailure::Skipped(file_id, e)),
        OnError::Retry => {
            let mut last_err = None;
            for attempt in 0..=retries {
                match client.insert_document(model, doc.clone()).await {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::warn!(
                            "Insert of '{}' failed (attempt {}/{}): {}",
                            file_id,
                            attempt + 1,
                            retries + 1,
                            e
                        );
                        last_err = Some(e);
                    }
                }
            }
            Err(InsertFailure::Fatal(last_err.unwrap_or_else(|| {
                AppError::StoreWrite(format!("Insert of '{}' failed", file_id))
            })))
        }
    }
}

/// Reason to drop a record before it reaches the store, if any.
///
/// A record with no embedding at all is fine (the store embeds its text),
/// but a present-yet-unusable vector signals a broken export.
fn skip_reason(doc: &Document) -> Option<&'static str> {
    match doc.embedding.as_deref() {
        Some(v) if v.is_empty() => Some("empty embedding"),
        Some(v) if is_degenerate(v) => Some("all-zero embedding"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_empty_embedding() {
        let doc = Document::new("a", "text").with_embedding(vec![]);
        assert_eq!(skip_reason(&doc), Some("empty embedding"));
    }

    #[test]
    fn test_skip_reason_all_zero_embedding() {
        let doc = Document::new("a", "text").with_embedding(vec![0.0, 0.0, 0.0]);
        assert_eq!(skip_reason(&doc), Some("all-zero embedding"));
    }

    #[test]
    fn test_no_skip_for_missing_embedding() {
        // Lazy embedding path: the store hydrates from text
        let doc = Document::new("a", "text");
        assert_eq!(skip_reason(&doc), None);
    }

    #[test]
    fn test_no_skip_for_valid_embedding() {
        let doc = Document::new("a", "text").with_embedding(vec![0.1, 0.2]);
        assert_eq!(skip_reason(&doc), None);
    }

    #[test]
    fn test_ndjson_record_parses() {
        let line = r#"{"file_id":"doc-1","text":"hello","embedding":[1.0,2.0]}"#;
        let doc: Document = serde_json::from_str(line).unwrap();
        assert_eq!(doc.file_id, "doc-1");
        assert_eq!(doc.embedding.as_deref(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn test_ndjson_record_without_embedding_parses() {
        let line = r#"{"file_id":"doc-1","text":"hello"}"#;
        let doc: Document = serde_json::from_str(line).unwrap();
        assert!(doc.embedding.is_none());
    }
}
