//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    AssetGetParams, ChecklistAddParams, ChecklistGetParams, ChecklistItemParams, ExpenseAddParams,
    ExpenseDeleteParams, ExpenseEditParams, ExpenseListParams, PrefsGetParams, PrefsRemoveParams, PrefsSetParams,
    ThemeParams, asset_get_impl, checklist_add_impl, checklist_delete_impl, checklist_get_impl, checklist_toggle_impl,
    expense_add_impl, expense_delete_impl, expense_edit_impl, expense_list_impl, prefs_get_impl, prefs_remove_impl,
    prefs_set_impl, status_impl, theme_get_impl, theme_set_impl, update_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tripshell_client::FetchClient;
use tripshell_core::{CacheDb, PrefsStore, ShellWorker, TripState};

/// The cache manager as wired in the binary.
pub type Worker = ShellWorker<CacheDb, FetchClient>;

/// The main MCP server handler for tripshell.
#[derive(Clone)]
pub struct TripShellServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker>,
    network: Arc<FetchClient>,
    db: CacheDb,
    prefs: PrefsStore,
    trip: TripState,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl TripShellServer {
    /// Create a new server handler.
    pub fn new(worker: Arc<Worker>, network: Arc<FetchClient>, db: CacheDb, prefs: PrefsStore) -> Self {
        let trip = TripState::new(prefs.clone());
        Self { tool_router: Self::tool_router(), worker, network, db, prefs, trip }
    }

    /// Fetch an app asset through the offline cache.
    #[tool(description = "Fetch an app asset through the offline cache. Same-origin GETs are served cache-first; \
                          set navigate=true for page loads so they fall back to the cached shell when offline.")]
    async fn asset_get(&self, params: Parameters<AssetGetParams>) -> Result<CallToolResult, McpError> {
        asset_get_impl(&self.worker, &self.network, params.0).await
    }

    /// Report lifecycle state, buckets and cached entries.
    #[tool(description = "Report the cache lifecycle state, existing buckets, and entries of the current bucket.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, &self.db).await
    }

    /// Re-seed the manifest and purge superseded buckets.
    #[tool(description = "Re-fetch the asset manifest into the current bucket and delete buckets from other versions.")]
    async fn worker_update(&self) -> Result<CallToolResult, McpError> {
        update_impl(&self.worker).await
    }

    /// Read a stored preference.
    #[tool(description = "Read an app preference (e.g. ck, ex, custom_ck). Returns the default when unset or unreadable.")]
    async fn prefs_get(&self, params: Parameters<PrefsGetParams>) -> Result<CallToolResult, McpError> {
        prefs_get_impl(&self.prefs, params.0).await
    }

    /// Write a preference.
    #[tool(description = "Store an app preference as JSON under its prefixed key.")]
    async fn prefs_set(&self, params: Parameters<PrefsSetParams>) -> Result<CallToolResult, McpError> {
        prefs_set_impl(&self.prefs, params.0).await
    }

    /// Delete a preference.
    #[tool(description = "Delete an app preference. Later reads return their default.")]
    async fn prefs_remove(&self, params: Parameters<PrefsRemoveParams>) -> Result<CallToolResult, McpError> {
        prefs_remove_impl(&self.prefs, params.0).await
    }

    /// Show checklist state.
    #[tool(description = "Show checked items, custom checklist items, and how many items with the given id prefix are done.")]
    async fn checklist_get(&self, params: Parameters<ChecklistGetParams>) -> Result<CallToolResult, McpError> {
        checklist_get_impl(&self.trip, params.0).await
    }

    /// Flip one checklist item.
    #[tool(description = "Toggle a checklist item between done and not done.")]
    async fn checklist_toggle(&self, params: Parameters<ChecklistItemParams>) -> Result<CallToolResult, McpError> {
        checklist_toggle_impl(&self.trip, params.0).await
    }

    /// Add a custom checklist item.
    #[tool(description = "Add a custom checklist item; returns its generated id.")]
    async fn checklist_add_item(&self, params: Parameters<ChecklistAddParams>) -> Result<CallToolResult, McpError> {
        checklist_add_impl(&self.trip, params.0).await
    }

    /// Remove a custom checklist item.
    #[tool(description = "Delete a custom checklist item and its done mark.")]
    async fn checklist_delete_item(&self, params: Parameters<ChecklistItemParams>) -> Result<CallToolResult, McpError> {
        checklist_delete_impl(&self.trip, params.0).await
    }

    /// List expenses with per-category totals.
    #[tool(description = "List logged expenses and the amount spent per category (optionally one category).")]
    async fn expense_list(&self, params: Parameters<ExpenseListParams>) -> Result<CallToolResult, McpError> {
        expense_list_impl(&self.trip, params.0).await
    }

    /// Log an expense.
    #[tool(description = "Log an expense. Category must be non-empty and amount a positive number (or numeric text).")]
    async fn expense_add(&self, params: Parameters<ExpenseAddParams>) -> Result<CallToolResult, McpError> {
        expense_add_impl(&self.trip, params.0).await
    }

    /// Edit an expense.
    #[tool(description = "Change the category and amount of the expense at an index.")]
    async fn expense_edit(&self, params: Parameters<ExpenseEditParams>) -> Result<CallToolResult, McpError> {
        expense_edit_impl(&self.trip, params.0).await
    }

    /// Delete an expense.
    #[tool(description = "Delete the expense at an index.")]
    async fn expense_delete(&self, params: Parameters<ExpenseDeleteParams>) -> Result<CallToolResult, McpError> {
        expense_delete_impl(&self.trip, params.0).await
    }

    /// Read the theme.
    #[tool(description = "Read the colour theme: auto, light or dark.")]
    async fn theme_get(&self) -> Result<CallToolResult, McpError> {
        theme_get_impl(&self.trip).await
    }

    /// Set the theme.
    #[tool(description = "Set the colour theme: auto, light or dark.")]
    async fn theme_set(&self, params: Parameters<ThemeParams>) -> Result<CallToolResult, McpError> {
        theme_set_impl(&self.trip, params.0).await
    }
}

impl ServerHandler for TripShellServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tripshell".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
