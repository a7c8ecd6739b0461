//! Scripted collaborators for manager tests.

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use crate::cache::{BucketStore, CacheEntry};
use crate::http::{AssetRequest, AssetResponse, Fetcher};
use crate::{CacheDb, Error};

enum Reply {
    Body(String),
    Status(u16),
    TooLarge,
    Fail,
}

/// Fetcher answering from a script. Unscripted URLs fail like an unreachable network.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(&self, url: Url, body: impl Into<String>) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Body(body.into()));
    }

    pub(crate) fn status(&self, url: Url, status: u16) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Status(status));
    }

    pub(crate) fn too_large(&self, url: Url) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::TooLarge);
    }

    pub(crate) fn fail(&self, url: Url) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    /// URLs fetched so far, in call order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        match self.replies.lock().unwrap().get(&url) {
            Some(Reply::Body(body)) => Ok(AssetResponse::new(200, "OK", body.clone())),
            Some(Reply::Status(status)) => Ok(AssetResponse::new(*status, "", "")),
            Some(Reply::TooLarge) => Err(Error::FetchTooLarge(format!("{url}: body over limit"))),
            Some(Reply::Fail) | None => Err(Error::Network(format!("unreachable: {url}"))),
        }
    }
}

/// Store whose entry writes are always rejected.
pub(crate) struct FailingWrites(pub(crate) CacheDb);

#[async_trait::async_trait]
impl BucketStore for FailingWrites {
    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.0.bucket_names().await
    }

    async fn seed_bucket(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        self.0.seed_bucket(name, entries).await
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        self.0.delete_bucket(name).await
    }

    async fn match_entry(&self, name: &str, request: &AssetRequest) -> Result<Option<AssetResponse>, Error> {
        self.0.match_entry(name, request).await
    }

    async fn put_entry(&self, _name: &str, _entry: CacheEntry) -> Result<(), Error> {
        Err(Error::InvalidState("store full".into()))
    }

    async fn mark_activated(&self, name: &str) -> Result<(), Error> {
        self.0.mark_activated(name).await
    }

    async fn is_activated(&self, name: &str) -> Result<bool, Error> {
        self.0.is_activated(name).await
    }

    async fn latest_activated(&self) -> Result<Option<String>, Error> {
        self.0.latest_activated().await
    }
}
