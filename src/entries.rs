//! Bookkeeping records for update and timer registrations.
//!
//! The hash records are recycled through
//! [`EntryPool`](redlilium_core::pool::EntryPool); a [`ListEntry`] travels
//! inside its update record, so one pool serves the pair. `reset` drops any
//! callback a record holds so a pooled record never keeps user state alive.

use redlilium_core::pool::Poolable;

use crate::priority::Priority;
use crate::scheduler::UpdateCallback;
use crate::target::TargetId;
use crate::timer::{TimerKey, TimerTargetCallback};
use crate::update_lists::Bucket;

/// State of one target's update registration.
///
/// `marked_for_deletion` means the registration was removed while a
/// dispatch pass was running; the entry is skipped and physically purged
/// at the end of that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListEntry {
    pub target: TargetId,
    pub priority: Priority,
    pub paused: bool,
    pub marked_for_deletion: bool,
}

impl Poolable for ListEntry {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Update hash record: the list entry plus the callback bound to it.
#[derive(Default)]
pub(crate) struct HashUpdateEntry {
    pub list: Option<Bucket>,
    pub entry: ListEntry,
    /// `None` only while the callback is being invoked.
    pub callback: Option<UpdateCallback>,
}

impl Poolable for HashUpdateEntry {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.list = None;
        self.entry.reset();
        self.callback = None;
    }
}

/// Timer hash record: every timer registered on one target.
///
/// Timers sit in index-stable slots. While the target is being walked by a
/// dispatch pass, the running timer's slot is empty (the timer is detached
/// and named by `current_timer`), removed timers leave an empty slot behind,
/// and new timers are appended.
#[derive(Debug, Default)]
pub(crate) struct HashTimerEntry {
    pub target: TargetId,
    pub timers: Vec<Option<TimerTargetCallback>>,
    pub timer_index: usize,
    pub current_timer: Option<TimerKey>,
    pub current_timer_salvaged: bool,
    pub paused: bool,
    /// Interval requested for the running timer by its own callback.
    pub pending_interval: Option<f32>,
}

impl HashTimerEntry {
    /// Slot index of a stored (not running) timer.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.timers
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|timer| timer.key().as_str() == key))
    }

    /// True if `key` names the timer currently being driven and it is still registered.
    pub fn is_running(&self, key: &str) -> bool {
        !self.current_timer_salvaged
            && self
                .current_timer
                .as_ref()
                .is_some_and(|current| current.as_str() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.is_running(key) || self.position(key).is_some()
    }

    /// Number of registered timers, counting the running one.
    pub fn live_count(&self) -> usize {
        let stored = self.timers.iter().filter(|slot| slot.is_some()).count();
        let running = usize::from(self.current_timer.is_some() && !self.current_timer_salvaged);
        stored + running
    }

    /// Drops empty slots left behind by removals.
    pub fn compact(&mut self) {
        self.timers.retain(Option::is_some);
    }
}

impl Poolable for HashTimerEntry {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.target = TargetId::default();
        self.timers.clear();
        self.timer_index = 0;
        self.current_timer = None;
        self.current_timer_salvaged = false;
        self.paused = false;
        self.pending_interval = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::timer::TimerOptions;

    fn timer(key: &str) -> Option<TimerTargetCallback> {
        Some(TimerTargetCallback::new(
            TargetId::new(1, 1),
            TimerKey::from(key),
            &TimerOptions::every(1.0),
            Box::new(|_: &mut Scheduler, _: f32| {}),
        ))
    }

    #[test]
    fn test_timer_entry_lookup() {
        let mut entry = HashTimerEntry::new_empty();
        entry.timers.push(timer("a"));
        entry.timers.push(None);
        entry.timers.push(timer("b"));

        assert_eq!(entry.position("a"), Some(0));
        assert_eq!(entry.position("b"), Some(2));
        assert_eq!(entry.position("c"), None);
        assert_eq!(entry.live_count(), 2);

        entry.compact();
        assert_eq!(entry.position("b"), Some(1));
    }

    #[test]
    fn test_running_timer_counts_until_salvaged() {
        let mut entry = HashTimerEntry::new_empty();
        entry.timers.push(None);
        entry.current_timer = Some(TimerKey::from("tick"));

        assert!(entry.contains("tick"));
        assert_eq!(entry.live_count(), 1);

        entry.current_timer_salvaged = true;
        assert!(!entry.contains("tick"));
        assert_eq!(entry.live_count(), 0);
    }

    #[test]
    fn test_reset_keeps_capacity_and_drops_timers() {
        let mut entry = HashTimerEntry::new_empty();
        for key in ["a", "b", "c", "d"] {
            entry.timers.push(timer(key));
        }
        entry.paused = true;
        entry.reset();

        assert!(entry.timers.is_empty());
        assert!(entry.timers.capacity() >= 4);
        assert!(!entry.paused);
    }

    #[test]
    fn test_update_entry_reset_drops_callback() {
        let mut entry = HashUpdateEntry::new_empty();
        entry.list = Some(Bucket::Zero);
        entry.entry.paused = true;
        entry.callback = Some(Box::new(|_: &mut Scheduler, _: f32| {}));
        entry.reset();

        assert!(entry.callback.is_none());
        assert!(entry.list.is_none());
        assert_eq!(entry.entry, ListEntry::default());
    }
}
