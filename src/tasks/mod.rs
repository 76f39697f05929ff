//! Background Tasks Module
//!
//! Contains the timer and notification tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiry timers: one delayed callback per stored entry
//! - Eviction listener: applies store departures to the cache

mod eviction;
mod scheduler;

pub(crate) use eviction::spawn_eviction_listener;
pub(crate) use scheduler::current_runtime;
pub use scheduler::{Scheduler, TimerHandle, TimerTask, TokioScheduler};
