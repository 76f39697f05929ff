//! Cached object model
//!
//! The value type callers hand to the cache and get back from lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An identified object held by the cache.
///
/// The id doubles as the cache key. The payload is opaque to the cache.
/// Two objects are equal when both id and payload match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachedObject {
    /// Stable identifier, used as the cache key
    pub id: String,
    /// Opaque payload
    pub payload: String,
}

impl CachedObject {
    /// Creates a new CachedObject
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for CachedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
