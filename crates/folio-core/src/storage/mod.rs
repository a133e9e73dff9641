//! Storage layer
//!
//! Durable local cache for reader state.
//!
//! ## Architecture
//!
//! - **SQLite**: one key-value table, JSON values
//! - **Keys**: `{record kind}:{book locator}`, so books never collide
//!
//! The cache is the only tier with no fallback below it, so its errors
//! are the ones callers see.

pub mod cache;
pub mod error;
pub mod schema;

pub use cache::{CacheKey, LocalCache, RecordKind};
pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
