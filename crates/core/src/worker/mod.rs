//! The offline asset cache manager.
//!
//! `ShellWorker` owns one versioned bucket and walks it through
//! install → activate → steady-state interception:
//!
//! - **install** fetches every manifest URL and seeds the bucket in one
//!   transaction; any failure abandons the attempt and leaves the store as it was.
//! - **activate** deletes every bucket not named for this version and takes
//!   control of subsequent requests. Until then, a bucket activated by an
//!   earlier version keeps answering.
//! - **handle** serves same-origin GETs cache-first, writes 200 responses
//!   through on a miss, and falls back to the shell document or a 503 when
//!   the network is unreachable.
//!
//! The store and the network are injected, so every path here runs against
//! in-memory SQLite and a scripted fetcher in tests.

mod lifecycle;
mod route;

#[cfg(test)]
mod testing;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::{BucketStore, CacheEntry};
use crate::http::{AssetRequest, AssetResponse, Fetcher};

pub use lifecycle::Lifecycle;
pub use route::{PassReason, Route, classify, resolve};

use lifecycle::StateCell;

/// Everything the manager needs to know about the app it fronts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// App base URL; its origin decides interception.
    pub origin: Url,
    /// Name of the one bucket this version reads and writes.
    pub cache_name: String,
    /// Absolute URLs seeded at install.
    pub manifest: Vec<Url>,
    /// Document returned to offline navigations.
    pub shell: Url,
    /// Body of the synthetic 503.
    pub offline_text: String,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Network,
    ShellFallback,
    Offline,
}

/// Result of offering a request to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not intercepted; the caller goes to the network itself.
    Passthrough(PassReason),
    Respond { response: AssetResponse, source: Source },
}

/// Versioned cache-first request handler.
pub struct ShellWorker<S, F> {
    config: Arc<WorkerConfig>,
    store: Arc<S>,
    fetcher: Arc<F>,
    state: StateCell,
    /// Bucket answering intercepted requests; None while nothing has control.
    serving: Mutex<Option<String>>,
    writes: Mutex<JoinSet<()>>,
}

impl<S, F> ShellWorker<S, F>
where
    S: BucketStore + 'static,
    F: Fetcher + 'static,
{
    pub fn new(config: WorkerConfig, store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            fetcher,
            state: StateCell::new(),
            serving: Mutex::new(None),
            writes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> Lifecycle {
        self.state.get()
    }

    /// Bucket currently answering intercepted requests.
    pub fn serving_bucket(&self) -> Option<String> {
        self.serving.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn serve_from(&self, bucket: Option<String>) {
        *self.serving.lock().unwrap_or_else(PoisonError::into_inner) = bucket;
    }

    /// Boot the manager.
    ///
    /// Resumes as active when this version's bucket was activated by an
    /// earlier run; otherwise installs and activates. If the install fails,
    /// the most recently activated bucket of an older version keeps serving
    /// and the error is still returned.
    pub async fn start(&self) -> Result<Lifecycle, Error> {
        if self.state() == Lifecycle::Uninstalled && self.store.is_activated(&self.config.cache_name).await? {
            self.state.advance(&[Lifecycle::Uninstalled], Lifecycle::Active)?;
            self.serve_from(Some(self.config.cache_name.clone()));
            tracing::info!(cache = %self.config.cache_name, "resumed active bucket");
            return Ok(Lifecycle::Active);
        }

        if let Err(e) = self.install().await {
            if self.serving_bucket().is_none() {
                let previous = self.store.latest_activated().await.unwrap_or_else(|lookup| {
                    tracing::warn!(error = %lookup, "could not look up previous bucket");
                    None
                });
                if let Some(bucket) = &previous {
                    tracing::warn!(bucket = %bucket, "install failed; previous version keeps serving");
                }
                self.serve_from(previous);
            }
            return Err(e);
        }

        self.activate().await?;
        Ok(Lifecycle::Active)
    }

    /// Pre-cache the manifest into this version's bucket.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest asset can't be fetched
    /// with an ok status or the bucket can't be written; nothing is stored in
    /// that case and the state returns to `uninstalled`.
    pub async fn install(&self) -> Result<(), Error> {
        self.state
            .advance(&[Lifecycle::Uninstalled, Lifecycle::Installed], Lifecycle::Installing)?;
        tracing::info!(cache = %self.config.cache_name, assets = self.config.manifest.len(), "installing");

        match self.precache().await {
            Ok(()) => {
                self.state.set(Lifecycle::Installed);
                tracing::info!(cache = %self.config.cache_name, "installed");
                Ok(())
            }
            Err(e) => {
                self.state.set(Lifecycle::Uninstalled);
                tracing::warn!(cache = %self.config.cache_name, error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Delete every other bucket and take control.
    ///
    /// Returns the names of the deleted buckets.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.state.advance(&[Lifecycle::Installed], Lifecycle::Activating)?;

        match self.purge_and_claim().await {
            Ok(deleted) => {
                self.serve_from(Some(self.config.cache_name.clone()));
                self.state.set(Lifecycle::Active);
                tracing::info!(cache = %self.config.cache_name, deleted = deleted.len(), "activated");
                Ok(deleted)
            }
            Err(e) => {
                self.state.set(Lifecycle::Installed);
                tracing::warn!(cache = %self.config.cache_name, error = %e, "activation failed");
                Err(e)
            }
        }
    }

    /// Re-seed the manifest and purge stale buckets.
    ///
    /// While active, the bucket is refreshed in place and requests keep being
    /// served; a failed refresh leaves the current entries untouched.
    pub async fn update(&self) -> Result<Vec<String>, Error> {
        if self.state() != Lifecycle::Active {
            self.install().await?;
            return self.activate().await;
        }

        self.precache().await?;
        self.purge_and_claim().await
    }

    /// Offer a request to the manager.
    pub async fn handle(&self, request: &AssetRequest) -> Outcome {
        let Some(bucket) = self.serving_bucket() else {
            return Outcome::Passthrough(PassReason::Inactive);
        };

        let navigation = match classify(request, &self.config.origin) {
            Route::Passthrough(reason) => {
                tracing::trace!(url = %request.url, ?reason, "passthrough");
                return Outcome::Passthrough(reason);
            }
            Route::Intercept { navigation } => navigation,
        };

        match self.store.match_entry(&bucket, request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, %bucket, "cache hit");
                return Outcome::Respond { response, source: Source::Cache };
            }
            Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.put_detached(bucket, CacheEntry::new(request, response.clone()));
                }
                Outcome::Respond { response, source: Source::Network }
            }
            Err(e) => {
                if e.is_network_failure() {
                    tracing::debug!(url = %request.url, error = %e, "network failed; using fallback");
                } else {
                    tracing::warn!(url = %request.url, error = %e, "fetch rejected; using fallback");
                }
                self.fallback(&bucket, navigation).await
            }
        }
    }

    /// Wait for every outstanding cache write to finish.
    pub async fn flush(&self) {
        let mut writes = std::mem::take(&mut *self.writes.lock().unwrap_or_else(PoisonError::into_inner));
        while writes.join_next().await.is_some() {}
    }

    async fn precache(&self) -> Result<(), Error> {
        let mut fetches = JoinSet::new();
        for url in &self.config.manifest {
            let fetcher = Arc::clone(&self.fetcher);
            let request = AssetRequest::get(url.clone());
            fetches.spawn(async move {
                let result = fetcher.fetch(&request).await;
                (request, result)
            });
        }

        let mut entries = Vec::with_capacity(self.config.manifest.len());
        while let Some(joined) = fetches.join_next().await {
            let (request, result) = joined.map_err(|e| Error::InstallFailed(format!("fetch task failed: {e}")))?;
            let response = result.map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
            if !(200..300).contains(&response.status) {
                return Err(Error::InstallFailed(format!("{}: status {}", request.url, response.status)));
            }
            entries.push(CacheEntry::new(&request, response));
        }

        self.store
            .seed_bucket(&self.config.cache_name, entries)
            .await
            .map_err(|e| Error::InstallFailed(e.to_string()))
    }

    async fn purge_and_claim(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store.bucket_names().await? {
            if name == self.config.cache_name {
                continue;
            }
            if self.store.delete_bucket(&name).await? {
                tracing::info!(bucket = %name, "deleted superseded bucket");
                deleted.push(name);
            }
        }

        self.store.mark_activated(&self.config.cache_name).await?;
        Ok(deleted)
    }

    async fn fallback(&self, bucket: &str, navigation: bool) -> Outcome {
        if navigation {
            let shell = AssetRequest::get(self.config.shell.clone());
            match self.store.match_entry(bucket, &shell).await {
                Ok(Some(response)) => return Outcome::Respond { response, source: Source::ShellFallback },
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "shell lookup failed"),
            }
        }

        Outcome::Respond { response: AssetResponse::offline(&self.config.offline_text), source: Source::Offline }
    }

    /// Store a copy without holding up the response. Failures are logged and dropped.
    fn put_detached(&self, bucket: String, entry: CacheEntry) {
        let store = Arc::clone(&self.store);

        let mut writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        while writes.try_join_next().is_some() {}
        writes.spawn(async move {
            let url = entry.url.clone();
            match store.put_entry(&bucket, entry).await {
                Ok(()) => tracing::debug!(%url, "cached network response"),
                Err(e) => tracing::warn!(%url, error = %e, "cache write failed"),
            }
        });
    }
}
