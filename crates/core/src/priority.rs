//! Active-object priorities and priority sets.
//!
//! Larger numbers are higher priorities. Level 0 belongs to the idle loop and
//! is never assigned to an active object.

use core::fmt;

/// Priority of an active object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Priority(u8);

impl Priority {
    /// Priority of the idle loop.
    pub const IDLE: Priority = Priority(0);
    /// Highest assignable priority level.
    pub const MAX: u8 = 63;

    /// Wraps a raw level; range is validated where priorities are registered.
    pub const fn new(raw: u8) -> Self {
        Priority(raw)
    }

    pub fn checked(raw: u8) -> Option<Self> {
        let prio = Priority(raw);
        prio.is_valid().then_some(prio)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for levels an active object may occupy.
    pub const fn is_valid(self) -> bool {
        self.0 >= 1 && self.0 <= Self::MAX
    }

    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Priority {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Priority({})", self.0);
    }
}

/// Bitmap of priorities, one bit per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrioritySet(u64);

impl PrioritySet {
    pub const EMPTY: Self = Self(0);

    pub const fn new() -> Self {
        Self::EMPTY
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn insert(&mut self, prio: Priority) {
        crate::require!(prio.0 <= Priority::MAX, 100);
        self.0 |= 1u64 << prio.0;
    }

    pub fn remove(&mut self, prio: Priority) {
        crate::require!(prio.0 <= Priority::MAX, 110);
        self.0 &= !(1u64 << prio.0);
    }

    pub const fn contains(self, prio: Priority) -> bool {
        prio.0 <= Priority::MAX && (self.0 & (1u64 << prio.0)) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn highest(self) -> Option<Priority> {
        if self.0 == 0 {
            None
        } else {
            Some(Priority(63 - self.0.leading_zeros() as u8))
        }
    }

    pub const fn lowest(self) -> Option<Priority> {
        if self.0 == 0 {
            None
        } else {
            Some(Priority(self.0.trailing_zeros() as u8))
        }
    }

    /// Members from the highest priority down.
    pub fn iter(self) -> Descending {
        Descending(self.0)
    }
}

impl FromIterator<Priority> for PrioritySet {
    fn from_iter<I: IntoIterator<Item = Priority>>(iter: I) -> Self {
        let mut set = PrioritySet::new();
        for prio in iter {
            set.insert(prio);
        }
        set
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PrioritySet {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "PrioritySet({=u64:b})", self.0);
    }
}

/// Iterator over a [`PrioritySet`], highest first.
pub struct Descending(u64);

impl Iterator for Descending {
    type Item = Priority;

    fn next(&mut self) -> Option<Priority> {
        if self.0 == 0 {
            return None;
        }
        let top = 63 - self.0.leading_zeros() as u8;
        self.0 &= !(1u64 << top);
        Some(Priority(top))
    }
}
