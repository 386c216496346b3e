//! Collision body seam.
//!
//! The terrain never owns a physics engine. Regions create and remove static
//! convex bodies through [`PhysicsWorld`], which the caller passes in for the
//! duration of a single call.

use ahash::AHashMap;
use glam::Vec2;
use strata_common::{BodyHandle, PhysicsError, Placement};
use tracing::trace;

/// Physics backend used by terrain regions.
pub trait PhysicsWorld {
    /// Creates a static body with one convex polygon fixture.
    ///
    /// `polygon` is counter-clockwise, in region-local world units.
    fn create_convex_body(&mut self, polygon: &[Vec2], density: f32) -> Result<BodyHandle, PhysicsError>;

    /// Removes a body. Unknown handles are ignored.
    fn remove_body(&mut self, handle: BodyHandle);

    /// Moves a body to the given placement.
    fn set_body_placement(&mut self, handle: BodyHandle, placement: Placement);
}

/// Body record kept by [`BodyRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRecord {
    /// Fixture outline
    pub polygon: Vec<Vec2>,
    /// Fixture density
    pub density: f32,
    /// Last placement applied
    pub placement: Placement,
}

/// In-memory physics world.
///
/// Records bodies without simulating them. Counts every create and remove,
/// which makes it useful for checking how much work a regeneration did.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: AHashMap<BodyHandle, BodyRecord>,
    next_id: u64,
    created: u64,
    removed: u64,
}

impl BodyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if no body is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Looks up a live body.
    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&BodyRecord> {
        self.bodies.get(&handle)
    }

    /// Total bodies created since construction.
    #[must_use]
    pub const fn created(&self) -> u64 {
        self.created
    }

    /// Total bodies removed since construction.
    #[must_use]
    pub const fn removed(&self) -> u64 {
        self.removed
    }
}

impl PhysicsWorld for BodyRegistry {
    fn create_convex_body(&mut self, polygon: &[Vec2], density: f32) -> Result<BodyHandle, PhysicsError> {
        if polygon.len() < 3 {
            return Err(PhysicsError::InvalidShape {
                vertices: polygon.len(),
                reason: "a convex body needs at least 3 vertices".into(),
            });
        }

        self.next_id += 1;
        let handle = BodyHandle::from_raw(self.next_id);
        self.bodies.insert(
            handle,
            BodyRecord {
                polygon: polygon.to_vec(),
                density,
                placement: Placement::IDENTITY,
            },
        );
        self.created += 1;
        Ok(handle)
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if self.bodies.remove(&handle).is_some() {
            self.removed += 1;
        } else {
            trace!("Ignoring removal of unknown body {}", handle.raw());
        }
    }

    fn set_body_placement(&mut self, handle: BodyHandle, placement: Placement) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.placement = placement;
        }
    }
}
