//! asset_get tool implementation.
//!
//! Runs a request through the cache manager the way the app's own page
//! loads would, and goes straight to the network when the manager declines.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tripshell_core::worker::{PassReason, resolve};
use tripshell_core::{AssetRequest, AssetResponse, BucketStore, Fetcher, Outcome, ShellWorker, Source};

use super::json_result;

/// Parameters for the asset_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetGetParams {
    /// Path relative to the app origin (e.g. "./styles.css"), or an absolute URL.
    pub path: String,

    /// Treat the request as a full-page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Where the answer came from, including requests the manager left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    Cache,
    Network,
    ShellFallback,
    Offline,
    Passthrough,
}

impl From<Source> for AssetSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Cache => AssetSource::Cache,
            Source::Network => AssetSource::Network,
            Source::ShellFallback => AssetSource::ShellFallback,
            Source::Offline => AssetSource::Offline,
        }
    }
}

/// Output from the asset_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetGetOutput {
    /// The resolved request URL.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub source: AssetSource,
    /// Why the manager did not intercept, for passthrough answers.
    pub passthrough: Option<PassReason>,
    pub content_type: Option<String>,
    /// Body as text; invalid UTF-8 is replaced.
    pub body: String,
    pub bytes: usize,
}

impl AssetGetOutput {
    fn new(url: String, response: AssetResponse, source: AssetSource, passthrough: Option<PassReason>) -> Self {
        Self {
            url,
            status: response.status,
            status_text: response.status_text.clone(),
            source,
            passthrough,
            content_type: response.content_type().map(str::to_string),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            bytes: response.body.len(),
        }
    }
}

/// Implementation of the asset_get tool.
pub async fn asset_get_impl<S, F>(
    worker: &ShellWorker<S, F>, network: &F, params: AssetGetParams,
) -> Result<CallToolResult, McpError>
where
    S: BucketStore + 'static,
    F: Fetcher + 'static,
{
    let url = resolve(&worker.config().origin, &params.path)?;
    let request = if params.navigate { AssetRequest::navigate(url) } else { AssetRequest::get(url) };

    let output = match worker.handle(&request).await {
        Outcome::Respond { response, source } => {
            AssetGetOutput::new(request.url.to_string(), response, source.into(), None)
        }
        Outcome::Passthrough(reason) => {
            let response = network.fetch(&request).await?;
            AssetGetOutput::new(request.url.to_string(), response, AssetSource::Passthrough, Some(reason))
        }
    };

    json_result(&output)
}
