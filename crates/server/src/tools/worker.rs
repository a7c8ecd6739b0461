//! worker_status and worker_update tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tripshell_core::cache::{BucketInfo, EntryInfo};
use tripshell_core::{CacheDb, Fetcher, Lifecycle, ShellWorker};

use super::json_result;

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub state: Lifecycle,
    pub cache_name: String,
    /// Bucket answering requests; an older version's after a failed upgrade.
    pub serving: Option<String>,
    pub origin: String,
    /// URLs pre-cached at install.
    pub manifest: Vec<String>,
    /// Every bucket in the store; after activation only the current one.
    pub buckets: Vec<BucketInfo>,
    /// Entries of the current bucket.
    pub entries: Vec<EntryInfo>,
}

/// Output from the worker_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerUpdateOutput {
    pub state: Lifecycle,
    /// Superseded buckets removed by this update.
    pub deleted: Vec<String>,
}

/// Implementation of the worker_status tool.
pub async fn status_impl<F>(worker: &ShellWorker<CacheDb, F>, db: &CacheDb) -> Result<CallToolResult, McpError>
where
    F: Fetcher + 'static,
{
    let config = worker.config();
    let output = WorkerStatusOutput {
        state: worker.state(),
        cache_name: config.cache_name.clone(),
        serving: worker.serving_bucket(),
        origin: config.origin.to_string(),
        manifest: config.manifest.iter().map(|u| u.to_string()).collect(),
        buckets: db.buckets().await?,
        entries: db.entries(&config.cache_name).await?,
    };

    json_result(&output)
}

/// Implementation of the worker_update tool.
pub async fn update_impl<F>(worker: &ShellWorker<CacheDb, F>) -> Result<CallToolResult, McpError>
where
    F: Fetcher + 'static,
{
    let deleted = worker.update().await?;
    json_result(&WorkerUpdateOutput { state: worker.state(), deleted })
}
