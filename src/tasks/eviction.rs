//! Eviction Listener Task
//!
//! Background task that turns store departures into cache bookkeeping and
//! eviction hooks, off the caller's execution context.

use std::sync::Weak;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheInner, EvictionEvent};

/// Spawns the task that drains the store's eviction channel.
///
/// The task holds only a weak reference to the cache and ends once the
/// cache has been dropped, which also closes the channel.
///
/// # Arguments
/// * `runtime` - Runtime to spawn on
/// * `cache` - Weak reference to the cache that owns the store
/// * `events` - Receiving half of the store's eviction channel
pub(crate) fn spawn_eviction_listener(
    runtime: &Handle,
    cache: Weak<CacheInner>,
    mut events: UnboundedReceiver<EvictionEvent>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        debug!("Starting eviction listener");

        while let Some(event) = events.recv().await {
            let Some(cache) = cache.upgrade() else {
                break;
            };
            cache.handle_eviction(event).await;
        }

        debug!("Eviction listener stopped");
    })
}
