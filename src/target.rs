use std::fmt;

/// Opaque identity of something callbacks are attached to.
///
/// Layout: `u32 id` + `u64 uuid`. The scheduler uses the pair only as a hash
/// key; it never looks behind it and never owns the object it names. Two
/// identities are equal if both halves match.
///
/// # Example
///
/// ```
/// use redlilium_scheduler::TargetId;
///
/// let player = TargetId::new(7, 0x5eed);
/// assert_eq!(player.id(), 7);
/// assert_ne!(player, TargetId::new(7, 0x5eee));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetId {
    id: u32,
    uuid: u64,
}

impl TargetId {
    /// Creates an identity from its two halves.
    pub const fn new(id: u32, uuid: u64) -> Self {
        Self { id, uuid }
    }

    /// Returns the id half.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the uuid half.
    pub fn uuid(&self) -> u64 {
        self.uuid
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({}#{:x})", self.id, self.uuid)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({}#{:x})", self.id, self.uuid)
    }
}

/// Anything that can be scheduled by identity.
///
/// Host objects (systems, components, game objects) implement this so they
/// can be handed to the scheduler without giving it ownership.
pub trait Schedulable {
    /// The stable identity used as the scheduler's hash key.
    fn target_id(&self) -> TargetId;
}

impl Schedulable for TargetId {
    fn target_id(&self) -> TargetId {
        *self
    }
}

/// Allocates and recycles target identities.
///
/// For hosts that have no identity scheme of their own. A released slot is
/// reused by a later `allocate`, with its uuid bumped so the stale identity
/// never compares equal to the new one.
#[derive(Debug, Default)]
pub struct TargetIdAllocator {
    /// Current uuid for each slot. Index = id.
    uuids: Vec<u64>,
    /// Alive flag per slot.
    alive: Vec<bool>,
    /// Recyclable ids (LIFO stack).
    free_list: Vec<u32>,
}

impl TargetIdAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh identity, reusing a released slot if one is available.
    pub fn allocate(&mut self) -> TargetId {
        if let Some(id) = self.free_list.pop() {
            let idx = id as usize;
            self.alive[idx] = true;
            TargetId::new(id, self.uuids[idx])
        } else {
            let id = self.uuids.len() as u32;
            self.uuids.push(0);
            self.alive.push(true);
            TargetId::new(id, 0)
        }
    }

    /// Releases an identity. Returns false if it is stale or already released.
    pub fn release(&mut self, target: TargetId) -> bool {
        if !self.is_alive(target) {
            return false;
        }
        let idx = target.id() as usize;
        self.alive[idx] = false;
        self.uuids[idx] = self.uuids[idx].wrapping_add(1);
        self.free_list.push(target.id());
        true
    }

    /// Returns whether the identity is currently allocated.
    pub fn is_alive(&self, target: TargetId) -> bool {
        let idx = target.id() as usize;
        idx < self.alive.len() && self.alive[idx] && self.uuids[idx] == target.uuid()
    }

    /// Number of identities currently allocated.
    pub fn len(&self) -> usize {
        self.alive.len() - self.free_list.len()
    }

    /// Returns true if no identity is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
