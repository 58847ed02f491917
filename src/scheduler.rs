//! The per-frame callback scheduler.
//!
//! Two kinds of recurring work are driven from a single `update(dt)` call
//! per host tick:
//!
//! - **update callbacks**: one per target, invoked every tick in priority order
//! - **timers**: any number per target, keyed by name, fired after an optional
//!   delay and then every `interval` seconds, a fixed number of times or forever
//!
//! Callbacks receive `&mut Scheduler` and may schedule, unschedule, pause or
//! resume anything, including themselves, while a tick is being dispatched.
//! Structural changes made during a pass never disturb the pass itself:
//!
//! - removed update registrations are marked and purged once the tick ends
//! - removed timers of the target being walked leave an empty slot that is
//!   compacted when the walk over that target finishes
//! - registrations created during a pass start running on the next tick
//!   (new timers on an already-walked target are still primed this tick)
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use redlilium_scheduler::{Priority, Repeat, Scheduler, TargetId, TimerOptions};
//!
//! let mut scheduler = Scheduler::new();
//! let player = TargetId::new(1, 0);
//!
//! let frames = Rc::new(Cell::new(0));
//! let seen = frames.clone();
//! scheduler.schedule_update(player, Priority::MEDIUM, false, move |_, _dt| {
//!     seen.set(seen.get() + 1);
//! });
//!
//! let shots = Rc::new(Cell::new(0));
//! let fired = shots.clone();
//! scheduler
//!     .schedule(
//!         "fire",
//!         player,
//!         TimerOptions::every(0.5).repeat(Repeat::Count(1)),
//!         move |_, _dt| fired.set(fired.get() + 1),
//!     )
//!     .unwrap();
//!
//! for _ in 0..4 {
//!     scheduler.update(0.5).unwrap();
//! }
//! assert_eq!(frames.get(), 4);
//! assert_eq!(shots.get(), 2);
//! assert!(!scheduler.is_scheduled("fire", player));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use redlilium_core::pool::{EntryPool, PoolStats};

use crate::config::SchedulerConfig;
use crate::entries::{HashTimerEntry, HashUpdateEntry, ListEntry};
use crate::error::{SchedulerError, SchedulerResult, is_valid_seconds};
use crate::priority::Priority;
use crate::target::TargetId;
use crate::timer::{TimerKey, TimerOptions, TimerTargetCallback};
use crate::update_lists::{ListSlot, UpdateLists};

/// Callback invoked once per tick for an update registration.
pub type UpdateCallback = Box<dyn FnMut(&mut Scheduler, f32)>;

/// Callback invoked on every trigger of a timer, with the slice of time the
/// trigger consumed.
pub type TimerCallback = Box<dyn FnMut(&mut Scheduler, f32)>;

/// Usage counters of the scheduler's entry pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerPoolStats {
    pub update_entries: PoolStats,
    pub timer_entries: PoolStats,
}

/// Drives update callbacks and timers once per host tick.
///
/// Single-threaded by design: callbacks are not `Send` and the scheduler is
/// expected to live on the thread that runs the frame loop.
pub struct Scheduler {
    time_scale: f32,
    update_lists: UpdateLists,
    hash_for_updates: HashMap<TargetId, HashUpdateEntry>,
    hash_for_timers: HashMap<TargetId, HashTimerEntry>,
    /// Timer targets in registration order; dispatch follows this order.
    timer_targets: Vec<TargetId>,
    /// Timer target being walked by the current dispatch pass.
    current_target: Option<TargetId>,
    update_hash_locked: bool,
    update_entry_pool: EntryPool<HashUpdateEntry>,
    timer_entry_pool: EntryPool<HashTimerEntry>,
    slot_scratch: Vec<ListSlot>,
    target_scratch: Vec<TargetId>,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::build(SchedulerConfig::default())
    }

    /// Creates a scheduler from a validated configuration.
    pub fn with_config(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SchedulerConfig) -> Self {
        log::debug!(
            "Scheduler created (pool capacity {}, time scale {})",
            config.pool_capacity,
            config.time_scale
        );
        Self {
            time_scale: config.time_scale,
            update_lists: UpdateLists::new(),
            hash_for_updates: HashMap::new(),
            hash_for_timers: HashMap::new(),
            timer_targets: Vec::new(),
            current_target: None,
            update_hash_locked: false,
            update_entry_pool: EntryPool::new(config.pool_capacity),
            timer_entry_pool: EntryPool::new(config.pool_capacity),
            slot_scratch: Vec::new(),
            target_scratch: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Time scale
    // ------------------------------------------------------------------

    /// Multiplier applied to `dt` before both update and timer dispatch.
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Sets the `dt` multiplier. Values below 1.0 slow everything down,
    /// values above speed it up.
    pub fn set_time_scale(&mut self, time_scale: f32) -> SchedulerResult<()> {
        if !is_valid_seconds(time_scale) {
            return Err(SchedulerError::InvalidTimeScale(time_scale));
        }
        self.time_scale = time_scale;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// True while the timer being driven has been unscheduled by its own callback.
    pub fn is_current_timer_salvaged(&self) -> bool {
        self.current_target
            .and_then(|target| self.hash_for_timers.get(&target))
            .is_some_and(|entry| entry.current_timer_salvaged)
    }

    /// True while `update` is dispatching. Update removals are deferred meanwhile.
    pub fn is_update_hash_locked(&self) -> bool {
        self.update_hash_locked
    }

    /// Number of live update registrations.
    pub fn update_count(&self) -> usize {
        self.hash_for_updates
            .values()
            .filter(|record| !record.entry.marked_for_deletion)
            .count()
    }

    /// Number of targets that currently own at least one timer entry.
    pub fn timer_target_count(&self) -> usize {
        self.hash_for_timers.len()
    }

    /// Number of live timers across all targets.
    pub fn timer_count(&self) -> usize {
        self.hash_for_timers
            .values()
            .map(HashTimerEntry::live_count)
            .sum()
    }

    pub fn pool_stats(&self) -> SchedulerPoolStats {
        SchedulerPoolStats {
            update_entries: self.update_entry_pool.stats(),
            timer_entries: self.timer_entry_pool.stats(),
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Runs one tick: every update callback in priority order, then every
    /// due timer, then the purge of update registrations removed meanwhile.
    ///
    /// Must not be called from inside a callback; doing so returns
    /// [`SchedulerError::ReentrantUpdate`] and changes nothing.
    pub fn update(&mut self, dt: f32) -> SchedulerResult<()> {
        if self.update_hash_locked {
            return Err(SchedulerError::ReentrantUpdate);
        }
        if !is_valid_seconds(dt) {
            return Err(SchedulerError::InvalidDeltaTime(dt));
        }
        redlilium_core::profile_scope!("scheduler_update");

        self.update_hash_locked = true;
        // finite inputs can still overflow once scaled
        let dt = (dt * self.time_scale).min(f32::MAX);

        self.dispatch_updates(dt);
        self.dispatch_timers(dt);
        self.purge_marked_updates();

        self.update_hash_locked = false;
        self.current_target = None;

        redlilium_core::profile_plot!("scheduler_updates", self.hash_for_updates.len());
        redlilium_core::profile_plot!("scheduler_timer_targets", self.hash_for_timers.len());
        Ok(())
    }

    fn dispatch_updates(&mut self, dt: f32) {
        redlilium_core::profile_scope!("scheduler_update_pass");
        let mut snapshot = std::mem::take(&mut self.slot_scratch);
        snapshot.clear();
        snapshot.extend(self.update_lists.iter().copied());

        for slot in &snapshot {
            self.invoke_update(slot.target, dt);
        }

        snapshot.clear();
        self.slot_scratch = snapshot;
    }

    fn invoke_update(&mut self, target: TargetId, dt: f32) {
        let Some(record) = self.hash_for_updates.get_mut(&target) else {
            return;
        };
        if record.entry.paused || record.entry.marked_for_deletion {
            return;
        }
        let Some(mut callback) = record.callback.take() else {
            return;
        };

        callback(self, dt);

        // A callback that re-registered itself has already installed its replacement.
        if let Some(record) = self.hash_for_updates.get_mut(&target) {
            if record.callback.is_none() {
                record.callback = Some(callback);
            }
        }
    }

    fn dispatch_timers(&mut self, dt: f32) {
        redlilium_core::profile_scope!("scheduler_timer_pass");
        let mut targets = std::mem::take(&mut self.target_scratch);
        targets.clear();
        targets.extend_from_slice(&self.timer_targets);

        for &target in &targets {
            let Some(entry) = self.hash_for_timers.get(&target) else {
                continue;
            };
            let paused = entry.paused;
            self.current_target = Some(target);
            if !paused {
                self.walk_timers(target, dt);
            }
            self.finish_timer_walk(target);
        }
        self.current_target = None;

        targets.clear();
        self.target_scratch = targets;
    }

    /// Drives every timer of `target` by slot index. Slots stay put while the
    /// walk runs, so callbacks may add or remove timers on this target freely.
    fn walk_timers(&mut self, target: TargetId, dt: f32) {
        let mut index = 0;
        loop {
            let Some(entry) = self.hash_for_timers.get_mut(&target) else {
                return;
            };
            if index >= entry.timers.len() {
                return;
            }
            entry.timer_index = index;
            let Some(mut timer) = entry.timers[index].take() else {
                index += 1;
                continue;
            };
            entry.current_timer = Some(timer.key().clone());
            entry.current_timer_salvaged = false;
            entry.pending_interval = None;

            timer.update(self, dt);

            let Some(entry) = self.hash_for_timers.get_mut(&target) else {
                return;
            };
            if !entry.current_timer_salvaged {
                if let Some(interval) = entry.pending_interval {
                    timer.timer_mut().set_interval(interval);
                }
                entry.timers[entry.timer_index] = Some(timer);
            }
            entry.current_timer = None;
            entry.current_timer_salvaged = false;
            entry.pending_interval = None;
            index = entry.timer_index + 1;
        }
    }

    fn finish_timer_walk(&mut self, target: TargetId) {
        let Some(entry) = self.hash_for_timers.get_mut(&target) else {
            return;
        };
        entry.compact();
        entry.timer_index = 0;
        if entry.timers.is_empty() {
            self.remove_timer_entry(target);
        }
    }

    fn purge_marked_updates(&mut self) {
        let records = &self.hash_for_updates;
        let mut purged = std::mem::take(&mut self.target_scratch);
        purged.clear();

        self.update_lists.retain(|slot| {
            let marked = match records.get(&slot.target) {
                Some(record) => record.entry.marked_for_deletion,
                None => true,
            };
            if marked {
                purged.push(slot.target);
            }
            !marked
        });

        for target in purged.drain(..) {
            if let Some(record) = self.hash_for_updates.remove(&target) {
                self.update_entry_pool.release(record);
            }
        }
        self.target_scratch = purged;
    }

    // ------------------------------------------------------------------
    // Update registrations
    // ------------------------------------------------------------------

    /// Registers `callback` to run every tick for `target` at `priority`.
    ///
    /// If the target is already registered, its `paused` flag and callback are
    /// replaced and a pending removal is cancelled. A priority change moves the
    /// target to its new position, unless a dispatch pass is running, in which
    /// case the old priority is kept.
    pub fn schedule_update(
        &mut self,
        target: TargetId,
        priority: Priority,
        paused: bool,
        callback: impl FnMut(&mut Scheduler, f32) + 'static,
    ) {
        let callback: UpdateCallback = Box::new(callback);

        if let Some(record) = self.hash_for_updates.get_mut(&target) {
            if record.entry.priority == priority || self.update_hash_locked {
                if record.entry.priority != priority {
                    log::warn!(
                        "Cannot move {target} from {:?} to {priority:?} while updates are dispatching; keeping the old priority",
                        record.entry.priority
                    );
                }
                record.entry.marked_for_deletion = false;
                record.entry.paused = paused;
                record.callback = Some(callback);
                return;
            }
            self.remove_update_record(target);
        }

        let mut record = self.update_entry_pool.acquire();
        record.entry = ListEntry {
            target,
            priority,
            paused,
            marked_for_deletion: false,
        };
        record.list = Some(self.update_lists.insert(target, priority));
        record.callback = Some(callback);
        self.hash_for_updates.insert(target, record);
        log::debug!("Scheduled update for {target} at {priority:?}");
    }

    /// Removes the update registration of `target`. No-op if there is none.
    ///
    /// During a dispatch pass the registration is only marked; it stops being
    /// invoked immediately and is purged at the end of the tick.
    pub fn unschedule_update(&mut self, target: TargetId) {
        if self.update_hash_locked {
            if let Some(record) = self.hash_for_updates.get_mut(&target) {
                record.entry.marked_for_deletion = true;
            }
        } else {
            self.remove_update_record(target);
        }
    }

    fn remove_update_record(&mut self, target: TargetId) {
        if let Some(record) = self.hash_for_updates.remove(&target) {
            if let Some(bucket) = record.list {
                self.update_lists.remove(bucket, target);
            }
            self.update_entry_pool.release(record);
            log::debug!("Unscheduled update for {target}");
        }
    }

    /// True if `target` has an update registration that is not pending removal.
    pub fn is_update_scheduled(&self, target: TargetId) -> bool {
        self.hash_for_updates
            .get(&target)
            .is_some_and(|record| !record.entry.marked_for_deletion)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Registers a timer named `key` on `target`.
    ///
    /// If a timer with that key is already registered on the target, only its
    /// interval is updated. `options.paused` only applies when this is the
    /// target's first timer; afterwards the target's existing paused state wins.
    pub fn schedule(
        &mut self,
        key: impl Into<TimerKey>,
        target: TargetId,
        options: TimerOptions,
        callback: impl FnMut(&mut Scheduler, f32) + 'static,
    ) -> SchedulerResult<()> {
        if !is_valid_seconds(options.interval) {
            return Err(SchedulerError::InvalidInterval(options.interval));
        }
        if !is_valid_seconds(options.delay) {
            return Err(SchedulerError::InvalidDelay(options.delay));
        }
        let key = key.into();

        let pool = &mut self.timer_entry_pool;
        let order = &mut self.timer_targets;
        let entry = self.hash_for_timers.entry(target).or_insert_with(|| {
            let mut entry = pool.acquire();
            entry.target = target;
            entry.paused = options.paused;
            order.push(target);
            entry
        });
        if options.paused && !entry.paused {
            log::warn!("Timer target {target} is already running; ignoring paused = true");
        } else if entry.paused != options.paused {
            log::debug!(
                "Timer target {target} is already {}; ignoring paused = {}",
                if entry.paused { "paused" } else { "running" },
                options.paused
            );
        }

        if entry.is_running(&key) {
            log::warn!(
                "Timer '{key}' on {target} is already scheduled; updating its interval to {}",
                options.interval
            );
            entry.pending_interval = Some(options.interval);
            return Ok(());
        }
        if let Some(timer) = entry
            .position(&key)
            .and_then(|index| entry.timers[index].as_mut())
        {
            log::warn!(
                "Timer '{key}' on {target} is already scheduled; updating its interval {} -> {}",
                timer.timer().interval(),
                options.interval
            );
            timer.timer_mut().set_interval(options.interval);
            return Ok(());
        }

        log::debug!("Scheduled timer '{key}' on {target}: {options:?}");
        entry.timers.push(Some(TimerTargetCallback::new(
            target,
            key,
            &options,
            Box::new(callback),
        )));
        Ok(())
    }

    /// Registers a timer that fires once, `delay` seconds from now.
    pub fn schedule_once(
        &mut self,
        key: impl Into<TimerKey>,
        target: TargetId,
        delay: f32,
        callback: impl FnMut(&mut Scheduler, f32) + 'static,
    ) -> SchedulerResult<()> {
        self.schedule(key, target, TimerOptions::once_after(delay), callback)
    }

    /// Removes the timer named `key` from `target`. No-op if there is none.
    pub fn unschedule(&mut self, key: &str, target: TargetId) {
        let walking = self.current_target == Some(target);
        let Some(entry) = self.hash_for_timers.get_mut(&target) else {
            return;
        };

        if entry.is_running(key) {
            entry.current_timer_salvaged = true;
            entry.pending_interval = None;
        } else if let Some(index) = entry.position(key) {
            if walking {
                entry.timers[index] = None;
            } else {
                entry.timers.remove(index);
            }
        } else {
            return;
        }
        log::debug!("Unscheduled timer '{key}' on {target}");

        if entry.live_count() == 0 && !walking {
            self.remove_timer_entry(target);
        }
    }

    /// True if a timer named `key` is registered on `target`.
    pub fn is_scheduled(&self, key: &str, target: TargetId) -> bool {
        self.hash_for_timers
            .get(&target)
            .is_some_and(|entry| entry.contains(key))
    }

    fn unschedule_timers_for_target(&mut self, target: TargetId) {
        let walking = self.current_target == Some(target);
        let Some(entry) = self.hash_for_timers.get_mut(&target) else {
            return;
        };
        if walking {
            if entry.current_timer.is_some() {
                entry.current_timer_salvaged = true;
                entry.pending_interval = None;
            }
            entry.timers.iter_mut().for_each(|slot| *slot = None);
        } else {
            self.remove_timer_entry(target);
        }
    }

    fn remove_timer_entry(&mut self, target: TargetId) {
        if let Some(entry) = self.hash_for_timers.remove(&target) {
            log::debug!("Released timer entry of {}", entry.target);
            self.timer_targets.retain(|existing| *existing != target);
            self.timer_entry_pool.release(entry);
        }
    }

    // ------------------------------------------------------------------
    // Bulk removal
    // ------------------------------------------------------------------

    /// Removes every timer and the update registration of `target`.
    pub fn unschedule_all_for_target(&mut self, target: TargetId) {
        self.unschedule_timers_for_target(target);
        self.unschedule_update(target);
    }

    /// Removes every timer and every update registration, system ones included.
    pub fn unschedule_all(&mut self) {
        self.unschedule_all_with_min_priority(Priority::SCHEDULER);
    }

    /// Removes every timer and every update registration with a priority of
    /// at least `min_priority`.
    ///
    /// User code should pass [`Priority::NON_SYSTEM_MIN`] or higher so the
    /// engine's own system callbacks survive.
    pub fn unschedule_all_with_min_priority(&mut self, min_priority: Priority) {
        redlilium_core::profile_function!();
        let timer_targets = self.timer_targets.clone();
        for target in timer_targets {
            self.unschedule_timers_for_target(target);
        }

        let doomed: Vec<TargetId> = self
            .update_lists
            .iter()
            .filter(|slot| slot.priority >= min_priority)
            .map(|slot| slot.target)
            .collect();
        for target in doomed {
            self.unschedule_update(target);
        }
        log::debug!("Unscheduled everything at or above {min_priority:?}");
    }

    // ------------------------------------------------------------------
    // Pause / resume
    // ------------------------------------------------------------------

    /// Pauses the update callback and all timers of `target`. They stay
    /// registered, with their accumulated time frozen.
    pub fn pause_target(&mut self, target: TargetId) {
        self.set_target_paused(target, true);
    }

    /// Resumes a paused target. No-op if the target is unknown.
    pub fn resume_target(&mut self, target: TargetId) {
        self.set_target_paused(target, false);
    }

    fn set_target_paused(&mut self, target: TargetId, paused: bool) {
        if let Some(entry) = self.hash_for_timers.get_mut(&target) {
            entry.paused = paused;
        }
        if let Some(record) = self.hash_for_updates.get_mut(&target) {
            record.entry.paused = paused;
        }
    }

    /// Whether `target` is paused. Unknown targets are not paused.
    pub fn is_target_paused(&self, target: TargetId) -> bool {
        if let Some(entry) = self.hash_for_timers.get(&target) {
            return entry.paused;
        }
        self.hash_for_updates
            .get(&target)
            .is_some_and(|record| record.entry.paused)
    }

    /// Pauses every target, system ones included. Returns the paused targets.
    pub fn pause_all_targets(&mut self) -> Vec<TargetId> {
        self.pause_all_targets_with_min_priority(Priority::SCHEDULER)
    }

    /// Pauses every timer target and every update target with a priority of
    /// at least `min_priority`.
    ///
    /// Returns each affected target once, so the caller can undo exactly this
    /// call with [`resume_targets`](Self::resume_targets).
    pub fn pause_all_targets_with_min_priority(&mut self, min_priority: Priority) -> Vec<TargetId> {
        let mut seen = HashSet::new();
        let mut paused = Vec::new();

        for target in &self.timer_targets {
            if let Some(entry) = self.hash_for_timers.get_mut(target) {
                entry.paused = true;
                if seen.insert(*target) {
                    paused.push(*target);
                }
            }
        }
        for slot in self.update_lists.iter() {
            if slot.priority < min_priority {
                continue;
            }
            if let Some(record) = self
                .hash_for_updates
                .get_mut(&slot.target)
                .filter(|record| !record.entry.marked_for_deletion)
            {
                record.entry.paused = true;
                if seen.insert(slot.target) {
                    paused.push(slot.target);
                }
            }
        }
        paused
    }

    /// Resumes every target in `targets`.
    pub fn resume_targets(&mut self, targets: &[TargetId]) {
        for &target in targets {
            self.resume_target(target);
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("time_scale", &self.time_scale)
            .field("updates", &self.update_lists.len())
            .field("timer_targets", &self.timer_targets)
            .field("locked", &self.update_hash_locked)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::timer::Repeat;

    fn target(id: u32) -> TargetId {
        TargetId::new(id, 1)
    }

    fn log() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_unschedule_during_pass_is_deferred() {
        let mut scheduler = Scheduler::new();
        let calls = log();

        let seen = calls.clone();
        scheduler.schedule_update(target(1), Priority::LOW, false, move |scheduler, _| {
            seen.borrow_mut().push("a");
            scheduler.unschedule_update(target(2));
            assert!(scheduler.is_update_hash_locked());
            assert!(!scheduler.is_update_scheduled(target(2)));
        });
        let seen = calls.clone();
        scheduler.schedule_update(target(2), Priority::MEDIUM, false, move |_, _| {
            seen.borrow_mut().push("b");
        });

        scheduler.update(0.1).unwrap();
        assert_eq!(*calls.borrow(), vec!["a"]);
        assert!(!scheduler.is_update_hash_locked());
        assert_eq!(scheduler.hash_for_updates.len(), 1);
        assert_eq!(scheduler.update_lists.len(), 1);
    }

    #[test]
    fn test_exhausted_timer_releases_entry() {
        let mut scheduler = Scheduler::new();
        scheduler
            .schedule_once("once", target(1), 0.0, |_, _| {})
            .unwrap();
        assert_eq!(scheduler.timer_target_count(), 1);

        scheduler.update(0.1).unwrap();
        assert_eq!(scheduler.timer_count(), 1);
        scheduler.update(0.1).unwrap();

        assert_eq!(scheduler.timer_target_count(), 0);
        assert!(scheduler.timer_targets.is_empty());
        assert_eq!(scheduler.timer_entry_pool.len(), 1);
    }

    #[test]
    fn test_rescheduling_running_timer_defers_interval() {
        let mut scheduler = Scheduler::new();
        let fired = Rc::new(RefCell::new(0));
        let count = fired.clone();
        scheduler
            .schedule("tick", target(1), TimerOptions::every(1.0), move |scheduler, _| {
                *count.borrow_mut() += 1;
                scheduler
                    .schedule("tick", target(1), TimerOptions::every(3.0), |_, _| {})
                    .unwrap();
            })
            .unwrap();

        scheduler.update(0.0).unwrap();
        scheduler.update(1.0).unwrap();
        assert_eq!(*fired.borrow(), 1);

        let entry = &scheduler.hash_for_timers[&target(1)];
        let timer = entry.timers[0].as_ref().unwrap();
        assert_eq!(timer.timer().interval(), 3.0);
        assert!(entry.pending_interval.is_none());

        scheduler.update(1.0).unwrap();
        scheduler.update(1.0).unwrap();
        assert_eq!(*fired.borrow(), 1);
        scheduler.update(1.0).unwrap();
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn test_removed_sibling_leaves_slot_until_walk_ends() {
        let mut scheduler = Scheduler::new();
        let calls = log();
        let owner = target(1);

        let seen = calls.clone();
        scheduler
            .schedule("a", owner, TimerOptions::every(1.0), move |scheduler, _| {
                seen.borrow_mut().push("a");
                scheduler.unschedule("b", owner);
                scheduler.unschedule("a", owner);
                assert!(scheduler.is_current_timer_salvaged());
                let entry = &scheduler.hash_for_timers[&owner];
                assert_eq!(entry.timers.len(), 3);
                assert!(entry.timers[1].is_none());
            })
            .unwrap();
        for key in ["b", "c"] {
            let seen = calls.clone();
            scheduler
                .schedule(key, owner, TimerOptions::every(1.0), move |_, _| {
                    seen.borrow_mut().push(key);
                })
                .unwrap();
        }

        scheduler.update(0.0).unwrap();
        scheduler.update(1.0).unwrap();

        assert_eq!(*calls.borrow(), vec!["a", "c"]);
        assert!(!scheduler.is_current_timer_salvaged());
        assert_eq!(scheduler.hash_for_timers[&owner].timers.len(), 1);
        assert!(scheduler.is_scheduled("c", owner));
        assert_eq!(scheduler.timer_count(), 1);
    }

    #[test]
    fn test_update_entries_are_recycled() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_update(target(1), Priority::LOW, false, |_, _| {});
        scheduler.unschedule_update(target(1));
        scheduler.schedule_update(target(2), Priority::HIGH, false, |_, _| {});

        let stats = scheduler.pool_stats().update_entries;
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn test_priority_change_outside_pass_moves_target() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_update(target(1), Priority::LOW, false, |_, _| {});
        scheduler.schedule_update(target(2), Priority::MEDIUM, false, |_, _| {});
        scheduler.schedule_update(target(1), Priority::HIGH, true, |_, _| {});

        let order: Vec<u32> = scheduler.update_lists.iter().map(|s| s.target.id()).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(scheduler.is_target_paused(target(1)));
        assert_eq!(scheduler.update_count(), 2);
    }

    #[test]
    fn test_timer_target_order_follows_registration() {
        let mut scheduler = Scheduler::new();
        let calls = log();
        for (id, label) in [(3, "third"), (1, "first"), (2, "second")] {
            let seen = calls.clone();
            scheduler
                .schedule(
                    "t",
                    target(id),
                    TimerOptions::every(0.5).repeat(Repeat::Count(0)),
                    move |_, _| seen.borrow_mut().push(label),
                )
                .unwrap();
        }

        scheduler.update(0.0).unwrap();
        scheduler.update(0.5).unwrap();
        assert_eq!(*calls.borrow(), vec!["third", "first", "second"]);
        assert_eq!(scheduler.timer_target_count(), 0);
    }

    #[test]
    fn test_with_config_rejects_bad_time_scale() {
        let config = SchedulerConfig {
            time_scale: f32::NAN,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            Scheduler::with_config(config),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }
}
