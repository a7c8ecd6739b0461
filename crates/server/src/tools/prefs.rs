//! prefs_get and prefs_set tool implementations.
//!
//! Exposes the app's prefixed preference store (checklist state, expenses,
//! custom checklist items, theme).

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripshell_core::PrefsStore;

use super::json_result;
use crate::error::ToolError;

/// Parameters for the prefs_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefsGetParams {
    /// Unprefixed key, e.g. "ck" or "ex".
    pub key: String,

    /// Returned when the key is unset or holds an unreadable value.
    #[serde(default)]
    pub default: Value,
}

/// Parameters for the prefs_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefsSetParams {
    /// Unprefixed key, e.g. "ck" or "ex".
    pub key: String,

    /// Any JSON value.
    pub value: Value,
}

/// Parameters for the prefs_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefsRemoveParams {
    /// Unprefixed key, e.g. "ck" or "ex".
    pub key: String,
}

/// Output from the prefs_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefsRemoveOutput {
    pub key: String,
    /// False if the key was not set.
    pub removed: bool,
}

/// Output from prefs_get and prefs_set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefsOutput {
    pub key: String,
    pub value: Value,
}

fn require_key(key: &str) -> Result<(), ToolError> {
    if key.trim().is_empty() {
        return Err(ToolError::InvalidInput("key cannot be empty".into()));
    }
    Ok(())
}

/// Implementation of the prefs_get tool.
pub async fn prefs_get_impl(prefs: &PrefsStore, params: PrefsGetParams) -> Result<CallToolResult, McpError> {
    require_key(&params.key)?;
    let value = prefs.get(&params.key, params.default).await;
    json_result(&PrefsOutput { key: params.key, value })
}

/// Implementation of the prefs_set tool.
pub async fn prefs_set_impl(prefs: &PrefsStore, params: PrefsSetParams) -> Result<CallToolResult, McpError> {
    require_key(&params.key)?;
    prefs.set(&params.key, &params.value).await?;
    json_result(&PrefsOutput { key: params.key, value: params.value })
}

/// Implementation of the prefs_remove tool.
pub async fn prefs_remove_impl(prefs: &PrefsStore, params: PrefsRemoveParams) -> Result<CallToolResult, McpError> {
    require_key(&params.key)?;
    let removed = prefs.remove(&params.key).await?;
    json_result(&PrefsRemoveOutput { key: params.key, removed })
}
