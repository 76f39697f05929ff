//! Cache Entry Module
//!
//! Defines the structure for individual store entries with sliding TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Longest window an entry can carry; larger TTLs are clamped to it.
///
/// Matches the cap tokio applies to oversized sleeps, so the expiry timer
/// and the entry agree on when the entry times out.
pub const MAX_DEADLINE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// Represents a single store entry with payload and expiry metadata.
///
/// Deadlines use `tokio::time::Instant` so a paused runtime clock drives expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub payload: String,
    /// Sliding window restored on every touch
    pub ttl: Duration,
    /// Deadline after which the entry is no longer live
    pub expires_at: Instant,
    /// Distinguishes successive entries stored under the same key
    pub instance: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(payload: String, ttl: Duration, instance: u64) -> Self {
        Self {
            payload,
            ttl,
            expires_at: deadline_after(ttl),
            instance,
        }
    }

    // == Touch ==
    /// Slides the deadline to a full `ttl` from now.
    pub fn touch(&mut self) {
        self.expires_at = deadline_after(self.ttl);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the time left before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

fn deadline_after(ttl: Duration) -> Instant {
    Instant::now() + ttl.min(MAX_DEADLINE)
}
