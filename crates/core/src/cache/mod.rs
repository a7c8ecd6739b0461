//! SQLite-backed storage for versioned cache buckets.
//!
//! This module provides a persistent bucket store using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Atomic seeding of a whole bucket in one transaction

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{BucketInfo, BucketStore, CacheEntry, EntryInfo};
