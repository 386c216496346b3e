//! Edit brushes and their box containment test.

use glam::Vec2;
use strata_common::Aabb;

/// Relation between a brush shape and a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// No overlap
    Disjoint,
    /// Partial overlap
    Intersects,
    /// The box lies entirely inside the brush
    Contains,
}

/// A positioned edit shape.
pub trait TerrainBrush {
    /// Brush centre in world space.
    fn position(&self) -> Vec2;

    /// Moves the brush.
    fn set_position(&mut self, position: Vec2);

    /// Classifies `aabb` against the brush shape.
    fn contains(&self, aabb: &Aabb) -> Containment;

    /// World-space bounds of the brush shape.
    fn bounds(&self) -> Aabb;
}

/// Disc-shaped brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleBrush {
    /// Centre
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl CircleBrush {
    /// Creates a new circle brush.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl TerrainBrush for CircleBrush {
    fn position(&self) -> Vec2 {
        self.center
    }

    fn set_position(&mut self, position: Vec2) {
        self.center = position;
    }

    fn contains(&self, aabb: &Aabb) -> Containment {
        if aabb.is_empty() {
            return Containment::Disjoint;
        }
        let r2 = self.radius * self.radius;
        if aabb
            .corners()
            .iter()
            .all(|corner| corner.distance_squared(self.center) <= r2)
        {
            return Containment::Contains;
        }
        if aabb.closest_point(self.center).distance_squared(self.center) <= r2 {
            Containment::Intersects
        } else {
            Containment::Disjoint
        }
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, Vec2::splat(self.radius))
    }
}
