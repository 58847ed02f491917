//! RedLilium Scheduler - per-frame update callbacks and timers
//!
//! The scheduler is ticked once per frame by the host loop and drives:
//! - **update callbacks**: one per target, run every tick in priority order
//! - **timers**: keyed per target, with an optional delay, an interval and a repeat count
//!
//! # Features
//! - Callbacks may schedule, unschedule, pause and resume anything while a
//!   tick is being dispatched, themselves included
//! - Bulk pause/unschedule with a priority floor that spares engine systems
//! - Global time scale for slow motion and fast forward
//! - Recycled bookkeeping entries to keep the steady state allocation free
//! - Optional Tracy instrumentation via the `profiling` feature
//! - Optional RON configuration via the `serialize-ron` feature
//!
//! # Example
//!
//! ```
//! use redlilium_scheduler::{Priority, Scheduler, TargetIdAllocator, TimerOptions};
//!
//! let mut targets = TargetIdAllocator::new();
//! let spawner = targets.allocate();
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule_update(spawner, Priority::LOW, false, |_, _dt| {});
//! scheduler
//!     .schedule("wave", spawner, TimerOptions::every(5.0), |scheduler, _dt| {
//!         // Slow everything down once the first wave arrives.
//!         scheduler.set_time_scale(0.5).unwrap();
//!     })
//!     .unwrap();
//!
//! scheduler.update(1.0 / 60.0).unwrap();
//! assert!(scheduler.is_scheduled("wave", spawner));
//! ```

pub mod config;
mod entries;
pub mod error;
pub mod priority;
pub mod scheduler;
pub mod target;
pub mod timer;
mod update_lists;

pub use config::SchedulerConfig;
pub use entries::ListEntry;
pub use error::{SchedulerError, SchedulerResult};
pub use priority::Priority;
pub use redlilium_core::pool::PoolStats;
pub use scheduler::{Scheduler, SchedulerPoolStats, TimerCallback, UpdateCallback};
pub use target::{Schedulable, TargetId, TargetIdAllocator};
pub use timer::{
    REPEAT_FOREVER, Repeat, Timer, TimerDriver, TimerKey, TimerOptions, TimerState,
    TimerTargetCallback,
};
pub use update_lists::Bucket;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
