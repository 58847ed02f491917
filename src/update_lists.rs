//! Priority-bucketed update lists.
//!
//! Update registrations live in three ordered sequences that are dispatched
//! back to back: negative priorities, priority zero, positive priorities.
//! The negative and positive buckets are kept sorted by ascending priority
//! with ties in registration order; the zero bucket is a plain append list.

use crate::priority::Priority;
use crate::target::TargetId;

/// One of the three update sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Negative,
    Zero,
    Positive,
}

impl Bucket {
    /// The bucket a priority belongs to, by sign.
    pub fn for_priority(priority: Priority) -> Self {
        match priority.value() {
            v if v < 0 => Bucket::Negative,
            0 => Bucket::Zero,
            _ => Bucket::Positive,
        }
    }
}

/// A target's position in a bucket.
///
/// The priority is fixed for the lifetime of the slot; a priority change is
/// a remove followed by a fresh insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListSlot {
    pub target: TargetId,
    pub priority: Priority,
}

#[derive(Debug, Default)]
pub(crate) struct UpdateLists {
    negative: Vec<ListSlot>,
    zero: Vec<ListSlot>,
    positive: Vec<ListSlot>,
}

impl UpdateLists {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<ListSlot> {
        match bucket {
            Bucket::Negative => &mut self.negative,
            Bucket::Zero => &mut self.zero,
            Bucket::Positive => &mut self.positive,
        }
    }

    /// Inserts a target according to the sign of its priority and returns the
    /// bucket it landed in. The caller guarantees the target is not listed yet.
    pub fn insert(&mut self, target: TargetId, priority: Priority) -> Bucket {
        let bucket = Bucket::for_priority(priority);
        let slot = ListSlot { target, priority };
        match bucket {
            Bucket::Zero => Self::append_in(&mut self.zero, slot),
            _ => Self::priority_in(self.bucket_mut(bucket), slot),
        }
        bucket
    }

    /// Inserts before the first slot with a strictly higher priority, so
    /// equal priorities keep registration order.
    fn priority_in(list: &mut Vec<ListSlot>, slot: ListSlot) {
        let index = list
            .iter()
            .position(|existing| slot.priority < existing.priority)
            .unwrap_or(list.len());
        list.insert(index, slot);
    }

    fn append_in(list: &mut Vec<ListSlot>, slot: ListSlot) {
        list.push(slot);
    }

    /// Removes a target from the given bucket. Returns false if it was not there.
    pub fn remove(&mut self, bucket: Bucket, target: TargetId) -> bool {
        let list = self.bucket_mut(bucket);
        match list.iter().position(|slot| slot.target == target) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Keeps only the slots for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&ListSlot) -> bool) {
        self.negative.retain(&mut keep);
        self.zero.retain(&mut keep);
        self.positive.retain(&mut keep);
    }

    /// All slots in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &ListSlot> {
        self.negative
            .iter()
            .chain(self.zero.iter())
            .chain(self.positive.iter())
    }

    pub fn len(&self) -> usize {
        self.negative.len() + self.zero.len() + self.positive.len()
    }
}
