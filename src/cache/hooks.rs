//! Lifecycle Hooks Module
//!
//! Immutable set of caller-supplied callbacks fired when an object is first
//! inserted, updated in place, or evicted.

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use crate::cache::EvictionReason;
use crate::error::{CacheError, HookKind, Result};
use crate::models::CachedObject;

/// Callback fired for setup and update.
pub type ObjectHook = Arc<dyn Fn(&CachedObject) -> anyhow::Result<()> + Send + Sync>;
/// Callback fired when an object leaves the cache.
pub type EvictHook =
    Arc<dyn Fn(&CachedObject, EvictionReason) -> anyhow::Result<()> + Send + Sync>;
/// Receives hook failures that have no caller to return to.
pub type ErrorHook = Arc<dyn Fn(&CacheError) + Send + Sync>;

// == Cache Hooks ==
/// Lifecycle callbacks, fixed at construction.
///
/// Every hook is optional. Hooks run after the cache state reflects the
/// operation and never while the cache lock is held, so a hook may hand work
/// back to the cache (for instance by spawning a task that calls `add`).
///
/// Whether a write counts as a setup or an update is decided under the lock,
/// but hooks from concurrent callers are not ordered. When two callers race to
/// add the same new key, the loser's `on_update` may run before the winner's
/// `on_setup`.
#[derive(Clone, Default)]
pub struct CacheHooks {
    on_setup: Option<ObjectHook>,
    on_update: Option<ObjectHook>,
    on_evict: Option<EvictHook>,
    on_error: Option<ErrorHook>,
}

impl CacheHooks {
    pub fn builder() -> CacheHooksBuilder {
        CacheHooksBuilder::default()
    }

    /// Hooks that do nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn setup(&self, object: &CachedObject) -> Result<()> {
        match &self.on_setup {
            Some(hook) => {
                hook(object).map_err(|source| hook_error(HookKind::Setup, object, source))
            }
            None => Ok(()),
        }
    }

    pub(crate) fn update(&self, object: &CachedObject) -> Result<()> {
        match &self.on_update {
            Some(hook) => {
                hook(object).map_err(|source| hook_error(HookKind::Update, object, source))
            }
            None => Ok(()),
        }
    }

    pub(crate) fn evict(&self, object: &CachedObject, reason: EvictionReason) -> Result<()> {
        match &self.on_evict {
            Some(hook) => hook(object, reason)
                .map_err(|source| hook_error(HookKind::Evict, object, source)),
            None => Ok(()),
        }
    }

    /// Routes a failure from the background expiry path to the error hook.
    pub(crate) fn report(&self, err: CacheError) {
        match &self.on_error {
            Some(hook) => hook(&err),
            None => error!(error = %err, "unhandled lifecycle hook failure"),
        }
    }
}

fn hook_error(hook: HookKind, object: &CachedObject, source: anyhow::Error) -> CacheError {
    warn!(%hook, key = %object.id, error = %source, "lifecycle hook failed");
    CacheError::Hook {
        hook,
        key: object.id.clone(),
        source,
    }
}

impl fmt::Debug for CacheHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHooks")
            .field("on_setup", &self.on_setup.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_evict", &self.on_evict.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// == Builder ==
/// Builds a [`CacheHooks`].
///
/// # Example
/// ```ignore
/// let hooks = CacheHooks::builder()
///     .on_setup(|object| {
///         tracing::info!("set up {}", object.id);
///         Ok(())
///     })
///     .on_evict(|object, reason| {
///         tracing::info!("{} was {}", object.id, reason);
///         Ok(())
///     })
///     .build();
/// ```
#[derive(Default)]
pub struct CacheHooksBuilder {
    hooks: CacheHooks,
}

impl CacheHooksBuilder {
    pub fn on_setup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CachedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.on_setup = Some(Arc::new(hook));
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CachedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.on_update = Some(Arc::new(hook));
        self
    }

    pub fn on_evict<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CachedObject, EvictionReason) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.on_evict = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CacheError) + Send + Sync + 'static,
    {
        self.hooks.on_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> CacheHooks {
        self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_missing_hooks_are_noops() {
        let hooks = CacheHooks::none();
        let object = CachedObject::new("a", "payload");

        assert!(hooks.setup(&object).is_ok());
        assert!(hooks.update(&object).is_ok());
        assert!(hooks.evict(&object, EvictionReason::Removed).is_ok());
    }

    #[test]
    fn test_hooks_receive_object_and_reason() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks = CacheHooks::builder()
            .on_evict(move |object, reason| {
                sink.lock().unwrap().push((object.id.clone(), reason));
                Ok(())
            })
            .build();

        hooks
            .evict(&CachedObject::new("a", "payload"), EvictionReason::Expired)
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a".to_string(), EvictionReason::Expired)]
        );
    }

    #[test]
    fn test_hook_failure_is_attributed() {
        let hooks = CacheHooks::builder()
            .on_update(|_| Err(anyhow::anyhow!("downstream refused")))
            .build();

        let err = hooks.update(&CachedObject::new("a", "payload")).unwrap_err();
        assert_eq!(err.hook_kind(), Some(HookKind::Update));
        assert!(err.to_string().contains("downstream refused"));
    }

    #[test]
    fn test_report_uses_error_hook() {
        let reported = Arc::new(AtomicUsize::new(0));
        let counter = reported.clone();
        let hooks = CacheHooks::builder()
            .on_error(move |err| {
                assert_eq!(err.hook_kind(), Some(HookKind::Evict));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        hooks.report(CacheError::Hook {
            hook: HookKind::Evict,
            key: "a".to_string(),
            source: anyhow::anyhow!("boom"),
        });

        assert_eq!(reported.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_lists_configured_hooks() {
        let hooks = CacheHooks::builder().on_setup(|_| Ok(())).build();
        let debug = format!("{:?}", hooks);
        assert!(debug.contains("on_setup: true"));
        assert!(debug.contains("on_evict: false"));
    }
}
