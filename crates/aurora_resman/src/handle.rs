//! Tokens identifying mounts, and mount priorities.

use std::{fmt, num::NonZeroU64};

/// Identifies everything one mount call added to a [`ResourceManager`](crate::ResourceManager)
///
/// Handles are never reused by the manager that issued them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeHandle(NonZeroU64);

impl ChangeHandle {
    pub(crate) fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// The raw id of the handle
    pub fn id(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ChangeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rank of a mount, higher priorities shadow lower ones
///
/// Any `i32` is a valid priority. The constants are the tiers a game usually mounts its
/// containers at.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    /// Base game data
    pub const BASE: Priority = Priority(0);
    /// Expansion packs
    pub const EXPANSION: Priority = Priority(100);
    /// The currently loaded module
    pub const MODULE: Priority = Priority(200);
    /// Hak packs of the current module
    pub const HAK: Priority = Priority(300);
    /// Loose override files
    pub const OVERRIDE: Priority = Priority(1000);
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
