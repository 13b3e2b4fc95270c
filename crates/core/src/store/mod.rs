//! SQLite-backed persistence for the engine's two stores.
//!
//! This module provides the versioned cache store and the durable
//! pending-operation queue over a single SQLite database with async
//! access via tokio-rusqlite. It supports:
//!
//! - Key-addressed cache entries tagged with the generation that wrote them
//! - Wholesale purge of every generation but the current one
//! - An ordered, durably persisted queue of deferred write operations
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//!
//! The two tables never reference each other: purging cache generations
//! cannot affect queued operations and draining the queue cannot affect
//! cache contents.

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod queue;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::CacheEntry;
pub use queue::{NewOperation, QueuedOperation};
