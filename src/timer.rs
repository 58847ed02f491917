//! Timer state machine and the callback-bound timer the scheduler stores.
//!
//! A [`Timer`] is pure bookkeeping: it accumulates elapsed time and decides
//! when, and with which slice of time, to fire. What "firing" means is
//! supplied by a [`TimerDriver`], so the same clock logic serves the
//! scheduler's callback timers and any other variant.
//!
//! ```text
//! NotStarted --first update--> Delaying --elapsed >= delay--> Repeating --repeat exhausted--> Canceled
//!            \----------------(no delay)----------------------^
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::scheduler::{Scheduler, TimerCallback};
use crate::target::TargetId;

/// Raw repeat value the engine uses to mean "repeat forever".
pub const REPEAT_FOREVER: u32 = u32::MAX - 1;

/// `elapsed` value of a timer whose clock has not been primed yet.
const NOT_STARTED: f32 = -1.0;

/// How many times a timer fires after its first trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    /// Fire `n + 1` times in total, then cancel.
    Count(u32),
    /// Fire until unscheduled.
    #[default]
    Forever,
}

impl Repeat {
    /// Total number of triggers, or `None` for [`Repeat::Forever`].
    pub fn total_triggers(self) -> Option<u64> {
        match self {
            Repeat::Count(n) => Some(n as u64 + 1),
            Repeat::Forever => None,
        }
    }
}

impl From<u32> for Repeat {
    fn from(raw: u32) -> Self {
        if raw == REPEAT_FOREVER {
            Repeat::Forever
        } else {
            Repeat::Count(raw)
        }
    }
}

/// Name distinguishing the timers registered on one target.
///
/// Cheap to clone; compares by string content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TimerKey(Arc<str>);

impl TimerKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for TimerKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TimerKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl From<&str> for TimerKey {
    fn from(key: &str) -> Self {
        Self(Arc::from(key))
    }
}

impl From<String> for TimerKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl fmt::Debug for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observable phase of a [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// The next update only primes the clock.
    NotStarted,
    /// Waiting for the initial delay to pass.
    Delaying,
    /// Firing every `interval` seconds.
    Repeating,
    /// Exhausted or canceled; never fires again.
    Canceled,
}

/// What a [`Timer`] does when it fires or finishes.
pub trait TimerDriver {
    /// Invoked once per trigger with the slice of elapsed time it consumes.
    fn trigger(&mut self, dt: f32);

    /// Invoked when the timer has exhausted its repeat count.
    fn cancel(&mut self);

    /// Returns true if the timer being driven was removed by one of its own
    /// triggers. The timer stops draining accumulated time when this happens.
    fn is_current_timer_salvaged(&self) -> bool {
        false
    }
}

/// Delay / interval / repeat accounting for one scheduled timer.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    interval: f32,
    delay: f32,
    repeat: u32,
    elapsed: f32,
    times_executed: u32,
    use_delay: bool,
    run_forever: bool,
    canceled: bool,
}

impl Timer {
    /// Creates a timer that has not been primed yet.
    pub fn new(interval: f32, repeat: Repeat, delay: f32) -> Self {
        let mut timer = Self {
            interval: 0.0,
            delay: 0.0,
            repeat: 0,
            elapsed: NOT_STARTED,
            times_executed: 0,
            use_delay: false,
            run_forever: false,
            canceled: false,
        };
        timer.setup(interval, repeat, delay);
        timer
    }

    /// Resets the timer with new parameters. The clock restarts from `NotStarted`.
    pub fn setup(&mut self, interval: f32, repeat: Repeat, delay: f32) {
        self.elapsed = NOT_STARTED;
        self.times_executed = 0;
        self.interval = interval;
        self.delay = delay;
        self.use_delay = delay > 0.0;
        self.canceled = false;
        match repeat {
            Repeat::Count(n) => {
                self.repeat = n;
                self.run_forever = false;
            }
            Repeat::Forever => {
                self.repeat = REPEAT_FOREVER;
                self.run_forever = true;
            }
        }
    }

    /// Advances the clock by `dt` and fires through `driver` as often as due.
    pub fn update<D: TimerDriver + ?Sized>(&mut self, dt: f32, driver: &mut D) {
        if self.canceled {
            return;
        }

        if self.elapsed == NOT_STARTED {
            self.elapsed = 0.0;
            self.times_executed = 0;
            return;
        }

        // an infinite sum would never drain
        self.elapsed = (self.elapsed + dt).min(f32::MAX);

        if self.use_delay {
            if self.elapsed < self.delay {
                return;
            }
            driver.trigger(self.delay);
            self.elapsed -= self.delay;
            self.times_executed += 1;
            self.use_delay = false;
            if self.is_exhausted() {
                self.finish(driver);
                return;
            }
            if driver.is_current_timer_salvaged() {
                return;
            }
        }

        // interval 0 fires once per update with everything accumulated so far
        let interval = if self.interval > 0.0 {
            self.interval
        } else {
            self.elapsed
        };
        while self.elapsed >= interval {
            driver.trigger(interval);
            let remaining = self.elapsed - interval;
            if interval > 0.0 && remaining >= self.elapsed {
                // interval is below the resolution of the accumulated time
                self.elapsed %= interval;
            } else {
                self.elapsed = remaining;
            }
            self.times_executed += 1;

            if self.is_exhausted() {
                self.finish(driver);
                break;
            }
            if self.elapsed <= 0.0 {
                break;
            }
            if driver.is_current_timer_salvaged() {
                break;
            }
        }
    }

    /// Marks the timer as finished. It will not fire again until `setup`.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    fn finish<D: TimerDriver + ?Sized>(&mut self, driver: &mut D) {
        self.cancel();
        driver.cancel();
    }

    fn is_exhausted(&self) -> bool {
        !self.run_forever && self.times_executed > self.repeat
    }

    pub fn state(&self) -> TimerState {
        if self.canceled {
            TimerState::Canceled
        } else if self.elapsed == NOT_STARTED {
            TimerState::NotStarted
        } else if self.use_delay {
            TimerState::Delaying
        } else {
            TimerState::Repeating
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Changes the interval without touching the accumulated time.
    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval;
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn repeat(&self) -> Repeat {
        if self.run_forever {
            Repeat::Forever
        } else {
            Repeat::Count(self.repeat)
        }
    }

    /// Time accumulated since the last trigger, or `None` before the clock is primed.
    pub fn elapsed(&self) -> Option<f32> {
        (self.elapsed != NOT_STARTED).then_some(self.elapsed)
    }

    pub fn times_executed(&self) -> u32 {
        self.times_executed
    }
}

/// Parameters of a timer registration.
///
/// # Example
///
/// ```
/// use redlilium_scheduler::{Repeat, TimerOptions};
///
/// // Fire five times, one second apart, starting half a second from now.
/// let options = TimerOptions::every(1.0).repeat(Repeat::Count(4)).delay(0.5);
/// assert_eq!(options.interval, 1.0);
/// assert!(!options.paused);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerOptions {
    /// Seconds between triggers; `0.0` fires every tick.
    pub interval: f32,
    pub repeat: Repeat,
    /// Seconds to wait before the first trigger.
    pub delay: f32,
    /// Register in the paused state. Ignored if the target already has timers.
    pub paused: bool,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            interval: 0.0,
            repeat: Repeat::Forever,
            delay: 0.0,
            paused: false,
        }
    }
}

impl TimerOptions {
    /// Fire forever, every `interval` seconds.
    pub fn every(interval: f32) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Fire exactly once, `delay` seconds from now.
    pub fn once_after(delay: f32) -> Self {
        Self {
            repeat: Repeat::Count(0),
            delay,
            ..Self::default()
        }
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// A timer bound to a callback, a target, and a key.
///
/// This is the variant the scheduler stores in a target's timer list.
pub struct TimerTargetCallback {
    timer: Timer,
    target: TargetId,
    key: TimerKey,
    callback: TimerCallback,
}

impl TimerTargetCallback {
    pub fn new(
        target: TargetId,
        key: TimerKey,
        options: &TimerOptions,
        callback: TimerCallback,
    ) -> Self {
        Self {
            timer: Timer::new(options.interval, options.repeat, options.delay),
            target,
            key,
            callback,
        }
    }

    pub fn key(&self) -> &TimerKey {
        &self.key
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Advances the timer, invoking the callback with `scheduler` on each trigger.
    ///
    /// The timer must be detached from the scheduler's storage while this runs.
    pub(crate) fn update(&mut self, scheduler: &mut Scheduler, dt: f32) {
        let Self {
            timer,
            target,
            key,
            callback,
        } = self;
        let mut driver = CallbackDriver {
            scheduler,
            callback,
            target: *target,
            key,
        };
        timer.update(dt, &mut driver);
    }
}

impl fmt::Debug for TimerTargetCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerTargetCallback")
            .field("target", &self.target)
            .field("key", &self.key)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

struct CallbackDriver<'a> {
    scheduler: &'a mut Scheduler,
    callback: &'a mut TimerCallback,
    target: TargetId,
    key: &'a TimerKey,
}

impl TimerDriver for CallbackDriver<'_> {
    fn trigger(&mut self, dt: f32) {
        (self.callback)(self.scheduler, dt);
    }

    fn cancel(&mut self) {
        self.scheduler.unschedule(self.key, self.target);
    }

    fn is_current_timer_salvaged(&self) -> bool {
        self.scheduler.is_current_timer_salvaged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingDriver {
        triggers: Vec<f32>,
        canceled: bool,
        /// Report salvage once this many triggers have happened.
        salvage_after: Option<usize>,
    }

    impl TimerDriver for RecordingDriver {
        fn trigger(&mut self, dt: f32) {
            self.triggers.push(dt);
        }

        fn cancel(&mut self) {
            self.canceled = true;
        }

        fn is_current_timer_salvaged(&self) -> bool {
            self.salvage_after
                .is_some_and(|after| self.triggers.len() >= after)
        }
    }

    #[test]
    fn test_first_update_only_primes() {
        let mut timer = Timer::new(1.0, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        assert_eq!(timer.state(), TimerState::NotStarted);
        assert_eq!(timer.elapsed(), None);

        timer.update(5.0, &mut driver);
        assert!(driver.triggers.is_empty());
        assert_eq!(timer.elapsed(), Some(0.0));
        assert_eq!(timer.state(), TimerState::Repeating);
    }

    #[test]
    fn test_drains_multiple_intervals_in_one_update() {
        let mut timer = Timer::new(2.0, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(5.0, &mut driver);

        assert_eq!(driver.triggers, vec![2.0, 2.0]);
        assert_eq!(timer.elapsed(), Some(1.0));
        assert_eq!(timer.times_executed(), 2);
    }

    #[test]
    fn test_delay_fires_with_delay_slice() {
        let mut timer = Timer::new(0.5, Repeat::Forever, 1.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.3, &mut driver);
        assert_eq!(timer.state(), TimerState::Delaying);

        for _ in 0..3 {
            timer.update(0.3, &mut driver);
            assert!(driver.triggers.is_empty());
        }
        timer.update(0.3, &mut driver);
        assert_eq!(driver.triggers, vec![1.0]);
        assert_eq!(timer.state(), TimerState::Repeating);
    }

    #[test]
    fn test_repeat_exhaustion_cancels() {
        let mut timer = Timer::new(1.0, Repeat::Count(2), 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        for _ in 0..10 {
            timer.update(1.0, &mut driver);
        }

        assert_eq!(driver.triggers.len(), 3);
        assert!(driver.canceled);
        assert_eq!(timer.state(), TimerState::Canceled);
    }

    #[test]
    fn test_exhaustion_inside_one_drain() {
        let mut timer = Timer::new(1.0, Repeat::Count(1), 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(10.0, &mut driver);

        assert_eq!(driver.triggers, vec![1.0, 1.0]);
        assert!(driver.canceled);
    }

    #[test]
    fn test_once_after_delay() {
        let options = TimerOptions::once_after(0.5);
        let mut timer = Timer::new(options.interval, options.repeat, options.delay);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(1.0, &mut driver);
        timer.update(1.0, &mut driver);

        assert_eq!(driver.triggers, vec![0.5]);
        assert!(driver.canceled);
    }

    #[test]
    fn test_zero_interval_fires_every_update_with_accumulated_time() {
        let mut timer = Timer::new(0.0, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.25, &mut driver);
        timer.update(0.25, &mut driver);
        timer.update(0.5, &mut driver);

        assert_eq!(driver.triggers, vec![0.25, 0.5]);
        assert_eq!(timer.elapsed(), Some(0.0));
    }

    #[test]
    fn test_salvage_stops_draining() {
        let mut timer = Timer::new(1.0, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver {
            salvage_after: Some(1),
            ..RecordingDriver::default()
        };
        timer.update(0.0, &mut driver);
        timer.update(4.0, &mut driver);

        assert_eq!(driver.triggers, vec![1.0]);
        assert!(!driver.canceled);
    }

    #[test]
    fn test_interval_below_elapsed_resolution_terminates() {
        let mut timer = Timer::new(1e-8, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(1.0, &mut driver);

        assert!(!driver.triggers.is_empty());
        assert!(timer.elapsed().unwrap() < 1e-8);
        assert!(!driver.canceled);
    }

    #[test]
    fn test_huge_dt_terminates() {
        let mut timer = Timer::new(1.0, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(f32::MAX, &mut driver);
        timer.update(f32::MAX, &mut driver);

        assert_eq!(driver.triggers, vec![1.0, 1.0]);
        assert_eq!(timer.elapsed(), Some(0.0));
    }

    #[test]
    fn test_elapsed_saturates_instead_of_overflowing() {
        let mut timer = Timer::new(f32::MAX, Repeat::Forever, 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(f32::MAX * 0.75, &mut driver);
        assert!(driver.triggers.is_empty());

        timer.update(f32::MAX * 0.75, &mut driver);
        assert_eq!(driver.triggers, vec![f32::MAX]);
        assert_eq!(timer.elapsed(), Some(0.0));
    }

    #[test]
    fn test_setup_restarts_clock() {
        let mut timer = Timer::new(1.0, Repeat::Count(0), 0.0);
        let mut driver = RecordingDriver::default();
        timer.update(0.0, &mut driver);
        timer.update(1.0, &mut driver);
        assert_eq!(timer.state(), TimerState::Canceled);

        timer.setup(2.0, Repeat::Forever, 0.0);
        assert_eq!(timer.state(), TimerState::NotStarted);
        assert_eq!(timer.repeat(), Repeat::Forever);
        assert_eq!(timer.interval(), 2.0);
    }

    #[test]
    fn test_repeat_from_raw() {
        assert_eq!(Repeat::from(REPEAT_FOREVER), Repeat::Forever);
        assert_eq!(Repeat::from(3), Repeat::Count(3));
        assert_eq!(Repeat::Count(3).total_triggers(), Some(4));
        assert_eq!(Repeat::Forever.total_triggers(), None);
    }

    #[test]
    fn test_timer_key_compares_by_content() {
        let a = TimerKey::from("spawn");
        let b = TimerKey::from(String::from("spawn"));
        assert_eq!(a, b);
        assert!(a == *"spawn");
        assert_eq!(a.to_string(), "spawn");
    }
}
