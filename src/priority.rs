use std::fmt;

/// Dispatch priority of an update callback.
///
/// Lower values run first. Negative priorities run before the zero tier,
/// which runs before positive priorities. Within one value, callbacks run
/// in registration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(i32);

impl Priority {
    /// Ordinary gameplay callbacks.
    pub const LOW: Priority = Priority(0);
    pub const MEDIUM: Priority = Priority(100);
    pub const HIGH: Priority = Priority(200);
    /// Reserved for the engine's own systems: `1 << 31` as a signed value,
    /// so it sorts ahead of everything else.
    pub const SCHEDULER: Priority = Priority(i32::MIN);
    /// Lowest priority user code should pass to the bulk pause/unschedule calls.
    pub const NON_SYSTEM_MIN: Priority = Priority(i32::MIN + 1);

    /// Creates a priority from a raw value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SCHEDULER => write!(f, "Priority::SCHEDULER"),
            Self::LOW => write!(f, "Priority::LOW"),
            Self::MEDIUM => write!(f, "Priority::MEDIUM"),
            Self::HIGH => write!(f, "Priority::HIGH"),
            Self(value) => write!(f, "Priority({value})"),
        }
    }
}
