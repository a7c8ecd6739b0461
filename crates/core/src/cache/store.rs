//! The bucket store seam used by the cache manager.

use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::request_key;
use crate::Error;
use crate::http::{AssetRequest, AssetResponse};

/// One request/response pair destined for a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub method: String,
    pub url: Url,
    pub response: AssetResponse,
}

impl CacheEntry {
    pub fn new(request: &AssetRequest, response: AssetResponse) -> Self {
        Self { method: request.method.clone(), url: request.url.clone(), response }
    }

    pub fn key(&self) -> String {
        request_key(&self.method, &self.url)
    }
}

/// Summary of a bucket for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BucketInfo {
    pub name: String,
    pub created_at: String,
    pub activated_at: Option<String>,
    pub entries: u64,
}

/// Summary of a stored entry, without the body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryInfo {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub bytes: u64,
    pub stored_at: String,
}

/// Named, versioned collections of cached responses.
///
/// Individual operations are atomic; `seed_bucket` is atomic across all
/// of its entries.
#[async_trait::async_trait]
pub trait BucketStore: Send + Sync {
    /// Names of every bucket, oldest first.
    async fn bucket_names(&self) -> Result<Vec<String>, Error>;

    /// Create the bucket if absent and write all entries, or nothing.
    async fn seed_bucket(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error>;

    /// Delete a bucket with all its entries. Returns false if it did not exist.
    async fn delete_bucket(&self, name: &str) -> Result<bool, Error>;

    /// Look up the stored response for a request identity.
    async fn match_entry(&self, name: &str, request: &AssetRequest) -> Result<Option<AssetResponse>, Error>;

    /// Insert or replace one entry in an existing bucket.
    async fn put_entry(&self, name: &str, entry: CacheEntry) -> Result<(), Error>;

    /// Record that the bucket's version took control.
    async fn mark_activated(&self, name: &str) -> Result<(), Error>;

    /// Whether the bucket exists and was activated.
    async fn is_activated(&self, name: &str) -> Result<bool, Error>;

    /// Name of the bucket activated most recently, if any.
    async fn latest_activated(&self) -> Result<Option<String>, Error>;
}
