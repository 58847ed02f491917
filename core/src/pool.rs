//! Bounded free-list pools for allocation reuse.
//!
//! This module provides [`EntryPool<T>`], a LIFO free list of retired values
//! that are handed out again instead of being rebuilt. A retired value is
//! [`reset`](Poolable::reset) before it is stored, which drops whatever it
//! was holding (callbacks, handles) but keeps its own allocations such as
//! `Vec` capacity.
//!
//! # Motivation
//!
//! Frame-driven bookkeeping (scheduler entries, per-target timer lists) is
//! created and retired constantly while a game runs. Recycling those entries
//! keeps the steady state free of heap churn. The pool is strictly a cache:
//! a value obtained from [`acquire`](EntryPool::acquire) is indistinguishable
//! from a freshly constructed one, and a pool with capacity `0` is a valid
//! way to turn recycling off.
//!
//! # Example
//!
//! ```
//! use redlilium_core::pool::{EntryPool, Poolable};
//!
//! #[derive(Debug, Default)]
//! struct Batch {
//!     items: Vec<u32>,
//! }
//!
//! impl Poolable for Batch {
//!     fn new_empty() -> Self {
//!         Self::default()
//!     }
//!     fn reset(&mut self) {
//!         self.items.clear();
//!     }
//! }
//!
//! let mut pool = EntryPool::<Batch>::new(4);
//!
//! let mut batch = pool.acquire();
//! batch.items.extend_from_slice(&[1, 2, 3]);
//! pool.release(batch);
//!
//! // The next acquire hands back the same allocation, already cleared.
//! let batch = pool.acquire();
//! assert!(batch.items.is_empty());
//! assert!(batch.items.capacity() >= 3);
//! assert_eq!(pool.stats().reused, 1);
//! ```

/// Default number of retired entries a pool keeps around.
pub const DEFAULT_POOL_CAPACITY: usize = 20;

/// Trait for types that can be pooled and reused.
///
/// Implementors must be able to create an empty instance and clear their
/// contents while preserving allocated capacity.
pub trait Poolable {
    /// Create a new empty instance, used when the pool has nothing to hand out.
    fn new_empty() -> Self;

    /// Reset the value to an empty state, preserving allocated capacity.
    ///
    /// Must drop every payload reference the value holds, so that a pooled
    /// entry never keeps a callback or a foreign handle alive.
    fn reset(&mut self);
}

/// Counters describing how a pool has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values handed out from the free list.
    pub reused: u64,
    /// Values constructed because the free list was empty.
    pub allocated: u64,
    /// Values dropped on release because the pool was full.
    pub discarded: u64,
}

/// A bounded LIFO free list of reusable values.
///
/// `release` accepts any value of `T`, including ones that were never drawn
/// from this pool. Values beyond the capacity are simply dropped.
#[derive(Debug)]
pub struct EntryPool<T: Poolable> {
    free: Vec<T>,
    capacity: usize,
    stats: PoolStats,
}

impl<T: Poolable> EntryPool<T> {
    /// Create an empty pool that retains at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Take a value out of the pool, or construct an empty one.
    ///
    /// The returned value is always in its reset state.
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(value) => {
                self.stats.reused += 1;
                value
            }
            None => {
                self.stats.allocated += 1;
                T::new_empty()
            }
        }
    }

    /// Reset a value and keep it for reuse if the pool has room.
    pub fn release(&mut self, mut value: T) {
        value.reset();
        if self.free.len() < self.capacity {
            self.free.push(value);
        } else {
            self.stats.discarded += 1;
            if self.capacity > 0 {
                log::debug!(
                    "{} pool is full ({} entries), dropping released value",
                    std::any::type_name::<T>(),
                    self.capacity
                );
            }
        }
    }

    /// Number of values currently waiting in the free list.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Returns true if the free list is empty.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Maximum number of values the pool retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Usage counters since construction.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every retained value.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Poolable> Default for EntryPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
