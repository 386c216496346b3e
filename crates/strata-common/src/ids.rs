//! ID types for regions and physics bodies.

use serde::{Deserialize, Serialize};

use crate::coords::RegionCoord;

/// Identifies one region of a density field (and its terrain region).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId {
    /// Position in the region grid
    pub coord: RegionCoord,
    /// Row-major index in the region grid
    pub index: usize,
}

impl RegionId {
    /// Creates a region ID from its grid position.
    #[must_use]
    pub const fn new(x: u32, y: u32, columns: u32) -> Self {
        Self {
            coord: RegionCoord::new(x, y),
            index: (y as usize) * (columns as usize) + (x as usize),
        }
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region({},{})", self.coord.x, self.coord.y)
    }
}

/// Opaque handle to a collision body owned by an external physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u64);

impl BodyHandle {
    /// Creates a body handle from a raw value issued by a physics world.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid body handle.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) handle.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}
