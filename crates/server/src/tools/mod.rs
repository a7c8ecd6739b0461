//! MCP tool implementations.
//!
//! This module contains all tools exposed by the tripshell server.

pub mod asset;
pub mod prefs;
pub mod trip;
pub mod worker;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use asset::{AssetGetParams, asset_get_impl};
pub use prefs::{PrefsGetParams, PrefsRemoveParams, PrefsSetParams, prefs_get_impl, prefs_remove_impl, prefs_set_impl};
pub use trip::{
    ChecklistAddParams, ChecklistGetParams, ChecklistItemParams, ExpenseAddParams, ExpenseDeleteParams,
    ExpenseEditParams, ExpenseListParams, ThemeParams, checklist_add_impl, checklist_delete_impl, checklist_get_impl,
    checklist_toggle_impl, expense_add_impl, expense_delete_impl, expense_edit_impl, expense_list_impl,
    theme_get_impl, theme_set_impl,
};
pub use worker::{status_impl, update_impl};

/// Wrap a serializable output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Encode(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use tripshell_core::{AssetRequest, AssetResponse, CacheDb, Error, Fetcher, ShellWorker, WorkerConfig};
    use url::Url;

    pub const ORIGIN: &str = "http://localhost:8080/";

    /// Answers every URL with `ok <url>`, except paths containing "offline".
    pub struct EchoFetcher;

    #[async_trait::async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
            if request.url.path().contains("offline") {
                return Err(Error::Network("unreachable".into()));
            }
            Ok(AssetResponse::new(200, "OK", format!("ok {}", request.url)).with_header("content-type", "text/plain"))
        }
    }

    pub fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    pub async fn worker(manifest: &[&str]) -> (CacheDb, Arc<ShellWorker<CacheDb, EchoFetcher>>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let config = WorkerConfig {
            origin: Url::parse(ORIGIN).unwrap(),
            cache_name: "trip-v2".into(),
            manifest: manifest.iter().map(|p| url(p)).collect(),
            shell: url("./index.html"),
            offline_text: "Offline".into(),
        };
        let worker = ShellWorker::new(config, Arc::new(db.clone()), Arc::new(EchoFetcher));
        (db, Arc::new(worker))
    }

    /// Decode the JSON text content of a tool result.
    pub fn decode<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
