//! Cache Module
//!
//! Provides the expiring store and the object cache layered on top of it.

mod entry;
mod eviction;
mod hooks;
mod object_cache;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{EvictionEvent, EvictionReason, SetOutcome};
pub use hooks::{CacheHooks, CacheHooksBuilder, ErrorHook, EvictHook, ObjectHook};
pub(crate) use object_cache::CacheInner;
pub use object_cache::ObjectCache;
pub use stats::CacheStats;
pub use store::ExpiringStore;
