//! Bullseye Cache demo
//!
//! Walks an object cache through batch inserts, bulk clears, explicit
//! removals and timed expiry, logging every lifecycle hook as it fires.

use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bullseye_cache::{CacheHooks, CachedObject, Config, ObjectCache};

/// Entry point for the cache demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache with logging hooks
/// 4. Add a batch, clear it, add it again and let it expire
/// 5. Add objects with staggered TTLs, remove one, watch the rest time out
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bullseye_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bullseye cache demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, demo_objects={}",
        config.default_ttl, config.demo_objects
    );

    let cache = ObjectCache::new(&config, logging_hooks())?;
    info!("Starting cache size: {}", cache.count().await);

    let batch: Vec<CachedObject> = (1..=config.demo_objects).map(demo_object).collect();

    cache.add_many(&batch, config.default_ttl).await?;
    info!("Cache size after adding a batch: {}", cache.count().await);

    cache.remove_all().await;
    info!("Cache size after removing all objects: {}", cache.count().await);

    cache.add_many(&batch, config.default_ttl).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let found = cache.get_many(&batch).await?;
    info!("{} of {} objects cached after one second", found.len(), batch.len());

    tokio::time::sleep(Duration::from_secs(config.default_ttl + 2)).await;
    info!(
        "Cache size after waiting past the TTL: {}",
        cache.count().await
    );

    // Staggered expiry
    let phase_start = tokio::time::Instant::now();
    let timed = [(demo_object(101), 1), (demo_object(102), 4), (demo_object(103), 6)];
    for (object, ttl) in &timed {
        cache.add(object, *ttl).await?;
    }
    let extra = demo_object(104);
    cache.add(&extra, 6).await?;
    info!("Cache size after inserting timed objects: {}", cache.count().await);

    cache.remove_object(&extra).await?;
    if !cache.remove_object(&extra).await? {
        warn!("{} is not in the cache and can't be removed", extra);
    }

    for elapsed in [2u64, 5, 7] {
        tokio::time::sleep_until(phase_start + Duration::from_secs(elapsed)).await;
        info!(
            "After {}s: {} object(s) cached",
            elapsed,
            cache.count().await
        );
    }

    let stats = cache.stats().await;
    info!("Final stats: {}", serde_json::to_string(&stats)?);
    info!("Demo complete");
    Ok(())
}

fn demo_object(n: usize) -> CachedObject {
    CachedObject::new(
        format!("object {n:02}"),
        format!("{{ {n:02} some object info; object info here; }}"),
    )
}

fn logging_hooks() -> CacheHooks {
    CacheHooks::builder()
        .on_setup(|object| {
            info!("Setup hook for {}", object);
            Ok(())
        })
        .on_update(|object| {
            info!("Update hook for {}", object);
            Ok(())
        })
        .on_evict(|object, reason| {
            info!("Eviction hook for {} ({})", object, reason);
            Ok(())
        })
        .build()
}
