//! Value models shared by the cache and its callers

pub mod object;

pub use object::CachedObject;
