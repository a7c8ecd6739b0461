//! tripshell server entry point.
//!
//! Boots the offline asset cache for the trip app and serves it over MCP on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use tripshell_client::{FetchClient, FetchConfig};
use tripshell_core::{AppConfig, CacheDb, PrefsStore, ShellWorker};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(cache = %config.cache_name, origin = %config.origin, "Starting tripshell on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = Arc::new(ShellWorker::new(config.worker_config()?, Arc::new(db.clone()), Arc::clone(&network)));

    match worker.start().await {
        Ok(state) => tracing::info!(%state, "cache manager ready"),
        Err(e) => match worker.serving_bucket() {
            Some(bucket) => tracing::warn!(error = %e, %bucket, "install failed; serving previous bucket"),
            None => tracing::warn!(error = %e, "cache manager not active; requests pass through to the network"),
        },
    }

    let prefs = PrefsStore::new(db.clone(), config.storage_prefix.clone());
    let handler = handler::TripShellServer::new(Arc::clone(&worker), network, db, prefs);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    worker.flush().await;

    Ok(())
}
