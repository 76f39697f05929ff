//! Object Cache Module
//!
//! Public cache surface. Keeps the set of tracked keys in step with the
//! expiring store and decides which lifecycle hook each operation fires.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheHooks, CacheStats, EvictionEvent, EvictionReason, ExpiringStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::CachedObject;
use crate::tasks::{current_runtime, spawn_eviction_listener, Scheduler, TokioScheduler};

/// Tracked keys and the store they mirror, always mutated together.
struct CacheState {
    tracked: HashSet<String>,
    store: ExpiringStore,
    stats: CacheStats,
}

impl CacheState {
    fn sync_total(&mut self) {
        self.stats.set_total_entries(self.tracked.len());
    }
}

pub(crate) struct CacheInner {
    state: Mutex<CacheState>,
    hooks: CacheHooks,
    default_ttl: u64,
}

// == Object Cache ==
/// Time-expiring object cache with setup, update and eviction hooks.
///
/// Cloning is cheap; clones share the same cache.
///
/// # Example
/// ```ignore
/// let cache = ObjectCache::new(&Config::default(), CacheHooks::none())?;
/// cache.add(&CachedObject::new("device 01", "{ ... }"), 30).await?;
/// assert_eq!(cache.count().await, 1);
/// ```
#[derive(Clone)]
pub struct ObjectCache {
    inner: Arc<CacheInner>,
}

impl ObjectCache {
    // == Constructor ==
    /// Creates a cache whose expiry timers run on the current tokio runtime.
    pub fn new(config: &Config, hooks: CacheHooks) -> Result<Self> {
        let scheduler = TokioScheduler::from_current()?;
        Self::with_scheduler(config, hooks, Arc::new(scheduler))
    }

    /// Creates a cache whose expiry timers run on `scheduler`.
    ///
    /// Must be called from within a tokio runtime, which hosts the task that
    /// turns store expirations into eviction hooks.
    pub fn with_scheduler(
        config: &Config,
        hooks: CacheHooks,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        let runtime = current_runtime()?;
        let (store, events) = ExpiringStore::new(scheduler);

        let inner = Arc::new(CacheInner {
            state: Mutex::new(CacheState {
                tracked: HashSet::new(),
                store,
                stats: CacheStats::new(),
            }),
            hooks,
            default_ttl: config.default_ttl,
        });

        spawn_eviction_listener(&runtime, Arc::downgrade(&inner), events);
        debug!(default_ttl = config.default_ttl, "object cache created");

        Ok(Self { inner })
    }

    // == Add ==
    /// Adds an object for `ttl_seconds`.
    ///
    /// A key seen for the first time fires the setup hook. Adding a key that is
    /// already tracked behaves exactly like [`ObjectCache::update`].
    pub async fn add(&self, object: &CachedObject, ttl_seconds: u64) -> Result<()> {
        self.upsert(object, ttl_seconds).await
    }

    /// Adds an object using the configured default TTL.
    pub async fn add_default(&self, object: &CachedObject) -> Result<()> {
        self.upsert(object, self.inner.default_ttl).await
    }

    // == Update ==
    /// Overwrites a tracked object and restarts its TTL, then fires the update hook.
    ///
    /// Updating a key that is not tracked behaves exactly like [`ObjectCache::add`].
    pub async fn update(&self, object: &CachedObject, ttl_seconds: u64) -> Result<()> {
        self.upsert(object, ttl_seconds).await
    }

    /// Writes through to the store under the lock, then fires one hook outside it.
    async fn upsert(&self, object: &CachedObject, ttl_seconds: u64) -> Result<()> {
        validate_object(object)?;
        validate_ttl(ttl_seconds)?;

        let is_new = {
            let mut state = self.inner.state.lock().await;
            let outcome = state
                .store
                .set(&object.id, object.payload.clone(), ttl_seconds)?;
            let newly_tracked = state.tracked.insert(object.id.clone());

            // A tracked key whose entry already timed out starts a new lifecycle
            let is_new = newly_tracked || !outcome.is_replaced();
            if is_new {
                state.stats.record_setup();
            } else {
                state.stats.record_update();
            }
            state.sync_total();
            is_new
        };

        if is_new {
            debug!(key = %object.id, ttl_seconds, "object added");
            self.inner.hooks.setup(object)
        } else {
            debug!(key = %object.id, ttl_seconds, "object updated");
            self.inner.hooks.update(object)
        }
    }

    // == Add Many ==
    /// Adds every object in `objects` with the same TTL.
    ///
    /// Arguments are validated up front, so a rejected batch adds nothing. A
    /// hook failure stops the batch and leaves earlier objects in place.
    pub async fn add_many(&self, objects: &[CachedObject], ttl_seconds: u64) -> Result<()> {
        validate_ttl(ttl_seconds)?;
        objects.iter().try_for_each(validate_object)?;

        for object in objects {
            self.upsert(object, ttl_seconds).await?;
        }
        Ok(())
    }

    // == Get ==
    /// Looks up an object by key, sliding its TTL if found.
    pub async fn get(&self, key: &str) -> Result<Option<CachedObject>> {
        validate_key(key)?;
        let mut state = self.inner.state.lock().await;
        Ok(lookup(&mut state, key))
    }

    /// Looks up an object by the id of `object`.
    pub async fn get_object(&self, object: &CachedObject) -> Result<Option<CachedObject>> {
        self.get(&object.id).await
    }

    // == Get Many ==
    /// Returns the current version of each object in `objects` that is still cached.
    pub async fn get_many(&self, objects: &[CachedObject]) -> Result<Vec<CachedObject>> {
        objects.iter().try_for_each(validate_object)?;

        let mut state = self.inner.state.lock().await;
        Ok(objects
            .iter()
            .filter_map(|object| lookup(&mut state, &object.id))
            .collect())
    }

    // == Remove ==
    /// Removes a tracked object and fires the eviction hook with `Removed`.
    ///
    /// Returns `false` without firing anything if the key is not tracked.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let removed = {
            let mut state = self.inner.state.lock().await;
            if !state.tracked.remove(key) {
                debug!(key, "not in cache, nothing to remove");
                return Ok(false);
            }
            let payload = state.store.remove(key);
            if payload.is_some() {
                state.stats.record_removals(1);
            }
            state.sync_total();
            payload
        };

        match removed {
            Some(payload) => {
                debug!(key, "object removed");
                let object = CachedObject::new(key, payload);
                self.inner.hooks.evict(&object, EvictionReason::Removed)?;
                Ok(true)
            }
            // Timed out just before removal; the expiry path reports it
            None => Ok(false),
        }
    }

    /// Removes the object with the id of `object`.
    pub async fn remove_object(&self, object: &CachedObject) -> Result<bool> {
        self.remove(&object.id).await
    }

    // == Remove All ==
    /// Drops every object without firing eviction hooks.
    ///
    /// Returns the number of objects dropped.
    pub async fn remove_all(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let dropped = state.store.clear();
        state.tracked.clear();
        state.stats.record_removals(dropped);
        state.sync_total();
        info!(dropped, "removed all objects");
        dropped
    }

    // == Count ==
    /// Returns the number of objects the cache currently holds.
    pub async fn count(&self) -> usize {
        self.inner.state.lock().await.tracked.len()
    }

    /// Returns true if `key` is tracked.
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.state.lock().await.tracked.contains(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.tracked.len());
        stats
    }
}

impl CacheInner {
    /// Applies a departure reported by the store.
    ///
    /// Removals are already dispatched by [`ObjectCache::remove`], and
    /// overwrites never reach the channel, so only expirations fire hooks here.
    pub(crate) async fn handle_eviction(&self, event: EvictionEvent) {
        match event.reason {
            EvictionReason::Expired => {
                {
                    let mut state = self.state.lock().await;
                    // The key may already hold a newer entry written after this one timed out
                    if !state.store.contains(&event.key) {
                        state.tracked.remove(&event.key);
                    }
                    state.stats.record_expiration();
                    state.sync_total();
                }

                info!(key = %event.key, "object expired");
                let object = CachedObject::new(event.key, event.payload);
                if let Err(err) = self.hooks.evict(&object, EvictionReason::Expired) {
                    self.hooks.report(err);
                }
            }
            EvictionReason::Removed | EvictionReason::Replaced => {
                debug!(key = %event.key, reason = %event.reason, "departure already dispatched");
            }
            EvictionReason::Other => {
                warn!(key = %event.key, "unexpected eviction reported by store");
            }
        }
    }
}

fn lookup(state: &mut CacheState, key: &str) -> Option<CachedObject> {
    match state.store.try_get(key) {
        Some(payload) => {
            state.stats.record_hit();
            Some(CachedObject::new(key, payload))
        }
        None => {
            state.stats.record_miss();
            None
        }
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("key cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_object(object: &CachedObject) -> Result<()> {
    if object.id.is_empty() {
        return Err(CacheError::InvalidArgument(
            "object id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_ttl(ttl_seconds: u64) -> Result<()> {
    if ttl_seconds == 0 {
        return Err(CacheError::InvalidArgument(
            "ttl must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}
