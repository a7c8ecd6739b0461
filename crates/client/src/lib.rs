//! Network side of tripshell.
//!
//! This crate provides the reqwest-backed `Fetcher` used by the cache
//! manager for pre-caching, cache misses, and passthrough requests.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
