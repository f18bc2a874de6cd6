//! Vecstore CLI
//!
//! Main entry point for the vecstore command-line tool.
//! Provides commands for managing embedding indexes across vector store
//! backends.

mod commands;

use clap::{Parser, Subcommand};
use commands::{DeleteCommand, IngestCommand, PurgeCommand, QueryCommand, SchemaCommand};
use std::path::PathBuf;
use vecstore_core::{config::AppConfig, logging, AppError, AppResult};

/// Vecstore CLI - embedding storage and k-nearest retrieval
#[derive(Parser, Debug)]
#[command(name = "vecstore")]
#[command(about = "Store documents as embeddings and query the k nearest", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "VECSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// Vector store backend (redis, chroma, memory)
    #[arg(short, long, global = true, env = "VECSTORE_BACKEND")]
    backend: Option<String>,

    /// Embedding model (llama3.2, mxbai-embed-large, snowflake-arctic-embed)
    #[arg(short, long, global = true, env = "VECSTORE_MODEL")]
    model: Option<String>,

    /// Embedding provider (ollama, mock)
    #[arg(long, global = true, env = "VECSTORE_EMBEDDER")]
    embedder: Option<String>,

    /// RediSearch endpoint
    #[arg(long, global = true, env = "VECSTORE_REDIS_ADDR")]
    redis_addr: Option<String>,

    /// Chroma endpoint
    #[arg(long, global = true, env = "VECSTORE_CHROMA_ADDR")]
    chroma_addr: Option<String>,

    /// Ollama endpoint
    #[arg(long, global = true, env = "VECSTORE_OLLAMA_ADDR")]
    ollama_addr: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the vector index schema for a model
    Schema(SchemaCommand),

    /// Ingest NDJSON documents into the store
    Ingest(IngestCommand),

    /// Find the k nearest documents to a query text
    Query(QueryCommand),

    /// Delete a single document by file id
    Delete(DeleteCommand),

    /// Delete every document in a model's namespace
    Purge(PurgeCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // An explicit --config file merges before the remaining flag overrides
    let config = match &cli.config {
        Some(path) => config.merge_yaml(path)?,
        None => config,
    };

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.config,
        cli.backend,
        cli.model,
        cli.embedder,
        cli.redis_addr,
        cli.chroma_addr,
        cli.ollama_addr,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    // Log startup
    tracing::info!("Vecstore CLI starting");
    tracing::debug!("Backend: {}", config.backend);
    tracing::debug!("Embedder: {}", config.embedder);
    tracing::debug!("Model: {:?}", config.model);

    // Emit command.start span
    let command_name = match &cli.command {
        Commands::Schema(_) => "schema",
        Commands::Ingest(_) => "ingest",
        Commands::Query(_) => "query",
        Commands::Delete(_) => "delete",
        Commands::Purge(_) => "purge",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers, interruptible by Ctrl-C
    let result = tokio::select! {
        result = async {
            match cli.command {
                Commands::Schema(cmd) => cmd.execute(&config).await,
                Commands::Ingest(cmd) => cmd.execute(&config).await,
                Commands::Query(cmd) => cmd.execute(&config).await,
                Commands::Delete(cmd) => cmd.execute(&config).await,
                Commands::Purge(cmd) => cmd.execute(&config).await,
            }
        } => result,
        _ = tokio::signal::ctrl_c() => {
            Err(AppError::Other("Interrupted".to_string()))
        }
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
