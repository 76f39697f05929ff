//! Expiring Store Module
//!
//! Key/payload storage where every entry carries its own sliding expiry timer.
//! Departures are reported on a channel instead of through callbacks so that
//! nothing outside the store ever runs under the store's lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::cache::{CacheEntry, EvictionEvent, EvictionReason, SetOutcome};
use crate::error::{CacheError, Result};
use crate::tasks::{Scheduler, TimerHandle};

// == Slot ==
/// An entry together with the timer that will expire it.
struct Slot {
    entry: CacheEntry,
    timer: TimerHandle,
}

struct StoreInner {
    entries: Mutex<HashMap<String, Slot>>,
    scheduler: Arc<dyn Scheduler>,
    events: UnboundedSender<EvictionEvent>,
    next_instance: AtomicU64,
}

// == Expiring Store ==
/// Storage with sliding per-key expiration and exactly-once departure events.
pub struct ExpiringStore {
    inner: Arc<StoreInner>,
}

impl ExpiringStore {
    // == Constructor ==
    /// Creates a store that arms its timers on `scheduler`.
    ///
    /// The returned receiver yields one [`EvictionEvent`] per entry that
    /// expires or is explicitly removed. Overwrites are reported through
    /// [`SetOutcome`] instead. Bulk clears report nothing.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> (Self, UnboundedReceiver<EvictionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = StoreInner {
            entries: Mutex::new(HashMap::new()),
            scheduler,
            events,
            next_instance: AtomicU64::new(1),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    // == Set ==
    /// Creates or overwrites the entry for `key` and arms a fresh timer.
    ///
    /// # Arguments
    /// * `key` - Non-empty key
    /// * `payload` - The payload to store
    /// * `ttl_seconds` - Sliding window in seconds, must be positive
    pub fn set(&self, key: &str, payload: String, ttl_seconds: u64) -> Result<SetOutcome> {
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key cannot be empty".to_string()));
        }
        if ttl_seconds == 0 {
            return Err(CacheError::InvalidArgument(
                "ttl must be a positive number of seconds".to_string(),
            ));
        }

        let ttl = Duration::from_secs(ttl_seconds);
        let instance = self.inner.next_instance.fetch_add(1, Ordering::Relaxed);
        let entry = CacheEntry::new(payload, ttl, instance);
        let timer = StoreInner::arm(&self.inner, key, instance, ttl);

        // Dropping the previous slot cancels its timer
        let previous = self
            .inner
            .lock()
            .insert(key.to_string(), Slot { entry, timer });

        let outcome = match previous {
            Some(slot) if !slot.entry.is_expired() => SetOutcome::Replaced {
                previous: slot.entry.payload,
            },
            Some(slot) => {
                // Overwritten before its timer fired; it still left by expiry
                self.inner
                    .notify(key.to_string(), slot.entry.payload, EvictionReason::Expired);
                SetOutcome::Inserted
            }
            None => SetOutcome::Inserted,
        };

        trace!(key, ttl_seconds, replaced = outcome.is_replaced(), "store set");
        Ok(outcome)
    }

    // == Try Get ==
    /// Returns the payload for a live entry and slides its deadline.
    pub fn try_get(&self, key: &str) -> Option<String> {
        let mut entries = self.inner.lock();
        let slot = entries.get_mut(key)?;
        if slot.entry.is_expired() {
            return None;
        }
        slot.entry.touch();
        Some(slot.entry.payload.clone())
    }

    // == Peek ==
    /// Returns the payload for a live entry without sliding its deadline.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .get(key)
            .filter(|slot| !slot.entry.is_expired())
            .map(|slot| slot.entry.payload.clone())
    }

    // == Remove ==
    /// Removes the entry for `key`, returning its payload if it was live.
    ///
    /// Removing an absent key is a no-op and reports nothing.
    pub fn remove(&self, key: &str) -> Option<String> {
        let slot = self.inner.lock().remove(key)?;
        let Slot { entry, timer } = slot;
        drop(timer);

        if entry.is_expired() {
            self.inner
                .notify(key.to_string(), entry.payload, EvictionReason::Expired);
            return None;
        }

        self.inner
            .notify(key.to_string(), entry.payload.clone(), EvictionReason::Removed);
        Some(entry.payload)
    }

    // == Clear ==
    /// Drops every entry and cancels every timer without reporting departures.
    ///
    /// Returns the number of live entries that were dropped.
    pub fn clear(&self) -> usize {
        let drained: Vec<Slot> = self.inner.lock().drain().map(|(_, slot)| slot).collect();
        let live = drained
            .iter()
            .filter(|slot| !slot.entry.is_expired())
            .count();
        debug!(live, total = drained.len(), "store cleared");
        live
    }

    // == Contains ==
    /// Returns true if `key` holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .get(key)
            .is_some_and(|slot| !slot.entry.is_expired())
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .values()
            .filter(|slot| !slot.entry.is_expired())
            .count()
    }

    // == Is Empty ==
    /// Returns true if the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules the expiry check for one entry instance.
    fn arm(inner: &Arc<Self>, key: &str, instance: u64, delay: Duration) -> TimerHandle {
        let store: Weak<Self> = Arc::downgrade(inner);
        let key = key.to_string();
        inner.scheduler.schedule_after(
            delay,
            Box::new(move || {
                if let Some(store) = store.upgrade() {
                    store.expire(&key, instance);
                }
            }),
        )
    }

    /// Timer callback: removes the entry if its deadline has really passed.
    ///
    /// Reads slide the deadline without re-arming, so a timer may fire early;
    /// in that case it re-arms for the remaining time.
    fn expire(self: Arc<Self>, key: &str, instance: u64) {
        let expired = {
            let mut entries = self.lock();
            let Some(slot) = entries.get_mut(key) else {
                return;
            };
            if slot.entry.instance != instance {
                return;
            }
            if !slot.entry.is_expired() {
                let remaining = slot.entry.ttl_remaining();
                slot.timer = Self::arm(&self, key, instance, remaining);
                trace!(key, ?remaining, "expiry timer re-armed");
                return;
            }
            entries.remove(key)
        };

        if let Some(Slot { entry, timer }) = expired {
            // The timer being dropped is the one currently running
            drop(timer);
            debug!(key, "entry expired");
            self.notify(key.to_string(), entry.payload, EvictionReason::Expired);
        }
    }

    fn notify(&self, key: String, payload: String, reason: EvictionReason) {
        // The receiver is gone only once the owner has been dropped
        let _ = self.events.send(EvictionEvent {
            key,
            payload,
            reason,
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TimerTask, TokioScheduler};
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::{advance, sleep};

    fn new_store() -> (ExpiringStore, UnboundedReceiver<EvictionEvent>) {
        let scheduler = TokioScheduler::from_current().unwrap();
        ExpiringStore::new(Arc::new(scheduler))
    }

    /// Holds timers until the test fires them by hand.
    #[derive(Default)]
    struct HeldScheduler {
        tasks: Mutex<Vec<TimerTask>>,
    }

    impl HeldScheduler {
        fn fire_all(&self) {
            let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
            for task in tasks {
                task();
            }
        }
    }

    impl Scheduler for HeldScheduler {
        fn schedule_after(&self, _delay: Duration, task: TimerTask) -> TimerHandle {
            self.tasks.lock().unwrap().push(task);
            TimerHandle::new(|| {})
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_new() {
        let (store, _events) = new_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_set_and_get() {
        let (store, _events) = new_store();

        let outcome = store.set("key1", "value1".to_string(), 60).unwrap();
        assert_eq!(outcome, SetOutcome::Inserted);
        assert_eq!(store.try_get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_get_nonexistent() {
        let (store, _events) = new_store();
        assert!(store.try_get("nonexistent").is_none());
        assert!(store.peek("nonexistent").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_rejects_invalid_arguments() {
        let (store, _events) = new_store();

        let zero_ttl = store.set("key1", "value1".to_string(), 0);
        assert!(matches!(zero_ttl, Err(CacheError::InvalidArgument(_))));

        let empty_key = store.set("", "value1".to_string(), 10);
        assert!(matches!(empty_key, Err(CacheError::InvalidArgument(_))));

        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_reports_replaced() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 60).unwrap();
        let outcome = store.set("key1", "value2".to_string(), 60).unwrap();

        assert_eq!(
            outcome,
            SetOutcome::Replaced {
                previous: "value1".to_string()
            }
        );
        assert_eq!(store.try_get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_remove_notifies_once() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 60).unwrap();
        assert_eq!(store.remove("key1"), Some("value1".to_string()));
        assert!(store.remove("key1").is_none());

        let event = events.recv().await.unwrap();
        assert_eq!(event.key, "key1");
        assert_eq!(event.payload, "value1");
        assert_eq!(event.reason, EvictionReason::Removed);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_remove_nonexistent_is_silent() {
        let (store, mut events) = new_store();

        assert!(store.remove("nonexistent").is_none());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 1).unwrap();
        assert!(store.contains("key1"));

        sleep(Duration::from_millis(1100)).await;

        assert!(store.try_get("key1").is_none());
        assert_eq!(store.len(), 0);

        let event = events.recv().await.unwrap();
        assert_eq!(event.reason, EvictionReason::Expired);
        assert_eq!(event.payload, "value1");

        // The timer fires once per entry
        sleep(Duration::from_secs(5)).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_read_slides_expiry() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 1).unwrap();

        sleep(Duration::from_millis(500)).await;
        assert!(store.try_get("key1").is_some());

        sleep(Duration::from_millis(800)).await;
        assert!(store.contains("key1"), "read should have slid the deadline");
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        sleep(Duration::from_millis(300)).await;
        assert!(!store.contains("key1"));
        assert_eq!(events.recv().await.unwrap().reason, EvictionReason::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_peek_does_not_slide() {
        let (store, _events) = new_store();

        store.set("key1", "value1".to_string(), 1).unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(store.peek("key1"), Some("value1".to_string()));

        sleep(Duration::from_millis(600)).await;
        assert!(!store.contains("key1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_write_rearms_timer() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 1).unwrap();
        sleep(Duration::from_millis(800)).await;
        store.set("key1", "value2".to_string(), 1).unwrap();

        sleep(Duration::from_millis(800)).await;
        assert_eq!(store.try_get("key1"), Some("value2".to_string()));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_clear_is_silent() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), 1).unwrap();
        store.set("key2", "value2".to_string(), 1).unwrap();

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());

        sleep(Duration::from_secs(3)).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_remove_after_deadline_reports_expiry_once() {
        let scheduler = Arc::new(HeldScheduler::default());
        let (store, mut events) = ExpiringStore::new(scheduler.clone());

        store.set("key1", "value1".to_string(), 1).unwrap();
        advance(Duration::from_secs(1)).await;

        // Timed out, but its timer has not run yet
        assert!(store.remove("key1").is_none());

        let event = events.try_recv().unwrap();
        assert_eq!(event.key, "key1");
        assert_eq!(event.payload, "value1");
        assert_eq!(event.reason, EvictionReason::Expired);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        // The late timer finds nothing left to expire
        scheduler.fire_all();
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_accepts_largest_ttl() {
        let (store, mut events) = new_store();

        store.set("key1", "value1".to_string(), u64::MAX).unwrap();
        sleep(Duration::from_secs(3600)).await;

        assert_eq!(store.try_get("key1"), Some("value1".to_string()));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }
}
