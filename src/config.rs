//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult, is_valid_seconds};
use redlilium_core::pool::DEFAULT_POOL_CAPACITY;

/// Construction-time settings for a [`Scheduler`](crate::Scheduler).
///
/// Missing fields fall back to their defaults when deserializing, so a
/// config file only needs to mention what it changes.
///
/// # Example
///
/// ```
/// use redlilium_scheduler::{Scheduler, SchedulerConfig};
///
/// let config = SchedulerConfig {
///     pool_capacity: 0, // disable entry recycling
///     ..SchedulerConfig::default()
/// };
/// let scheduler = Scheduler::with_config(config).unwrap();
/// assert_eq!(scheduler.time_scale(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of retired entries kept per entry pool. `0` disables pooling.
    pub pool_capacity: usize,
    /// Initial multiplier applied to every `dt` passed to `update`.
    pub time_scale: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            time_scale: 1.0,
        }
    }
}

impl SchedulerConfig {
    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> SchedulerResult<()> {
        if !is_valid_seconds(self.time_scale) {
            return Err(SchedulerError::InvalidConfig(format!(
                "time_scale must be finite and non-negative, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }

    /// Parses and validates a config written in RON.
    ///
    /// ```
    /// # #[cfg(feature = "serialize-ron")]
    /// # {
    /// use redlilium_scheduler::SchedulerConfig;
    ///
    /// let config = SchedulerConfig::from_ron_str("(time_scale: 0.5)").unwrap();
    /// assert_eq!(config.time_scale, 0.5);
    /// assert_eq!(config.pool_capacity, 20);
    /// # }
    /// ```
    #[cfg(feature = "serialize-ron")]
    pub fn from_ron_str(text: &str) -> SchedulerResult<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.pool_capacity, 20);
        assert_eq!(config.time_scale, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_time_scale() {
        for bad in [-1.0, f32::NAN, f32::INFINITY] {
            let config = SchedulerConfig {
                time_scale: bad,
                ..SchedulerConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(SchedulerError::InvalidConfig(_))
            ));
        }
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn test_from_ron_partial() {
        let config = SchedulerConfig::from_ron_str("(pool_capacity: 4)").unwrap();
        assert_eq!(config.pool_capacity, 4);
        assert_eq!(config.time_scale, 1.0);
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn test_from_ron_invalid() {
        assert!(matches!(
            SchedulerConfig::from_ron_str("(time_scale: -2.0)"),
            Err(SchedulerError::InvalidConfig(_))
        ));
        assert!(matches!(
            SchedulerConfig::from_ron_str("(pool_capacity: \"lots\")"),
            Err(SchedulerError::ConfigParse(_))
        ));
    }
}
