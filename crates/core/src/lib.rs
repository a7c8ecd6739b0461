//! Core types and shared functionality for tripshell.
//!
//! This crate provides:
//! - The offline asset cache manager (install, activate, intercept)
//! - Bucket store implementation with SQLite backend
//! - Prefixed key-value preferences
//! - Trip checklist, expense and theme state on top of them
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod prefs;
pub mod trip;
pub mod worker;

pub use cache::{BucketStore, CacheDb, CacheEntry};
pub use config::AppConfig;
pub use error::Error;
pub use http::{AssetRequest, AssetResponse, Fetcher, RequestMode};
pub use prefs::PrefsStore;
pub use trip::{Amount, CustomItem, Expense, Theme, TripState};
pub use worker::{Lifecycle, Outcome, ShellWorker, Source, WorkerConfig};
