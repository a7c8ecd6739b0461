//! Request and response values exchanged with the cache manager.
//!
//! These are deliberately plain data: the manager never alters headers or
//! bodies, it only decides where a response comes from.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How the caller intends to use the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// A full-page document load.
    Navigate,
    /// A script, stylesheet, image or data request.
    Subresource,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl AssetRequest {
    pub fn new(method: impl AsRef<str>, url: Url, mode: RequestMode) -> Self {
        Self { method: method.as_ref().to_ascii_uppercase(), url, mode }
    }

    /// A GET for a sub-resource.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Subresource)
    }

    /// A GET for a full-page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A response, either from the network or from a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl AssetResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only exact 200 responses are eligible for write-through caching.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The synthetic response for a sub-resource that neither cache nor network could supply.
    pub fn offline(text: &str) -> Self {
        Self::new(503, "Service Unavailable", Bytes::copy_from_slice(text.as_bytes()))
            .with_header("content-type", "text/plain; charset=utf-8")
    }
}

/// Network access as seen by the cache manager.
///
/// Implementations return `Ok` for every HTTP status, including errors, and
/// `Err` only when no response could be obtained at all.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error>;
}
