//! Geometry primitives shared by the terrain pipeline.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// The [`Aabb::EMPTY`] sentinel is inverted (`min = +inf`, `max = -inf`), so
/// unioning any point into it yields a box around exactly that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Lower corner
    pub min: Vec2,
    /// Upper corner
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Inverted sentinel box containing nothing.
    pub const EMPTY: Self = Self {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    /// Creates a box from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a box from centre point and half extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns true if the box contains no point (the sentinel, or any
    /// inverted box).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Grows the box to include `point`.
    pub fn union_point(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Returns the union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the size of the box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns the centre point of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Checks if the box contains a point (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if this box intersects with another.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Checks if this box fully contains another.
    #[must_use]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Returns the four corners, counter-clockwise from `min`.
    #[must_use]
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Returns the point inside the box closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Position and rotation snapshot of a scene node.
///
/// Placement is owned by the scene hierarchy; the terrain only reads it once
/// per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    /// World position
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
}

impl Placement {
    /// Placement at the origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
    };

    /// Creates a new placement.
    #[must_use]
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Creates an unrotated placement at `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_sentinel() {
        let aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());
        assert!(!aabb.contains_point(Vec2::ZERO));
    }

    #[test]
    fn test_union_point_from_sentinel() {
        let mut aabb = Aabb::EMPTY;
        aabb.union_point(Vec2::new(3.0, 4.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Vec2::new(3.0, 4.0));
        assert_eq!(aabb.max, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::new(Vec2::splat(5.0), Vec2::splat(15.0));
        let c = Aabb::new(Vec2::splat(2.0), Vec2::splat(3.0));
        assert!(a.intersects(&b));
        assert!(a.contains(&c));
        assert!(!a.contains(&b));
    }

    proptest! {
        #[test]
        fn prop_union_bounds_every_point(points in prop::collection::vec((-1000.0f32..1000.0, -1000.0f32..1000.0), 1..64)) {
            let mut aabb = Aabb::EMPTY;
            for &(x, y) in &points {
                aabb.union_point(Vec2::new(x, y));
            }
            for &(x, y) in &points {
                prop_assert!(aabb.contains_point(Vec2::new(x, y)));
            }
        }
    }
}
