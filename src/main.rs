//! Memory service entry point.
//!
//! Loads configuration, constructs the embedder and the engine, runs the
//! startup retention sweep, then serves the HTTP surface until shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use companion_memory::config::MemoryConfig;
use companion_memory::memory::{retention, ConversationLog, FastembedProvider, MemoryEngine};
use companion_memory::server;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting tracing subscriber")?;

    let config_path =
        std::env::var("COMPANION_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = MemoryConfig::load(&config_path);
    info!("Embedding model: {}", config.model);

    let embedder = Arc::new(FastembedProvider::new(&config.model)?);
    let engine = Arc::new(MemoryEngine::open(&config.index_dir, embedder).await?);
    let log = Arc::new(ConversationLog::new(&config.history_file));

    // Startup sweep: drop stale turns and rebuild before serving.
    retention::sweep(&log, &engine, config.max_day).await?;

    // Serves until ctrl-c; the server flushes the store on the way out.
    server::run(config, engine, log).await
}
