//! Scheduler error type.

use thiserror::Error;

/// Errors reported by the scheduler API.
///
/// Unscheduling something that is not scheduled is never an error; those
/// calls are silent no-ops.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler::update called from inside a dispatch pass")]
    ReentrantUpdate,
    #[error("Invalid delta time: {0} (must be finite and non-negative)")]
    InvalidDeltaTime(f32),
    #[error("Invalid timer interval: {0} (must be finite and non-negative)")]
    InvalidInterval(f32),
    #[error("Invalid timer delay: {0} (must be finite and non-negative)")]
    InvalidDelay(f32),
    #[error("Invalid time scale: {0} (must be finite and non-negative)")]
    InvalidTimeScale(f32),
    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),
    #[cfg(feature = "serialize-ron")]
    #[error("Failed to parse scheduler config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

/// Result alias used throughout the scheduler.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Checks that a time quantity handed to the scheduler is usable.
pub(crate) fn is_valid_seconds(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
