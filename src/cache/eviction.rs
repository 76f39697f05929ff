//! Eviction notifications emitted by the expiring store.

use std::fmt;

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// The sliding window ran out with no intervening touch
    Expired,
    /// An explicit removal
    Removed,
    /// A write superseded a live entry under the same key
    Replaced,
    /// Any other cause a store implementation may report
    Other,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            EvictionReason::Expired => "expired",
            EvictionReason::Removed => "removed",
            EvictionReason::Replaced => "replaced",
            EvictionReason::Other => "evicted",
        };
        f.write_str(reason)
    }
}

/// A single departure from the store, sent at most once per entry instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionEvent {
    pub key: String,
    pub payload: String,
    pub reason: EvictionReason,
}

/// Result of writing a key into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// No live entry existed for the key
    Inserted,
    /// A live entry was overwritten; carries the superseded payload
    Replaced { previous: String },
}

impl SetOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, SetOutcome::Replaced { .. })
    }
}
