//! Bullseye Cache - A time-expiring object cache with lifecycle hooks
//!
//! Tracks identified objects, expires them after a sliding TTL, and fires
//! setup, update and eviction hooks as they enter, change and leave the cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{CacheHooks, CacheStats, EvictionReason, ObjectCache};
pub use config::Config;
pub use error::{CacheError, HookKind, Result};
pub use models::CachedObject;
