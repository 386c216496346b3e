//! # Strata Terrain
//!
//! Destructible 2D terrain built from a signed density field.
//!
//! This crate handles:
//! - Density storage and region views
//! - Marching squares contour extraction per cell
//! - Convex decomposition into collision bodies
//! - Render meshes and incremental regeneration of edited cells
//! - Brushes, queued edits and procedural planets

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod brush;
pub mod config;
pub mod density;
pub mod edits;
pub mod generation;
pub mod marching;
pub mod mesh;
pub mod physics;
pub mod polygon;
#[cfg(feature = "rapier")]
pub mod rapier;
pub mod region;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::brush::*;
    pub use crate::config::*;
    pub use crate::density::*;
    pub use crate::edits::*;
    pub use crate::generation::*;
    pub use crate::mesh::*;
    pub use crate::physics::*;
    pub use crate::region::*;
    pub use crate::terrain::*;
    pub use strata_common::prelude::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_planet_terrain_end_to_end() {
        let planet = PlanetGenerator::new(PlanetConfig {
            size: 200,
            region_size: 100,
            falloff: 1.2 / 100.0,
            ..Default::default()
        });
        let field = planet.generate().expect("field");
        let mut terrain = Terrain::new(Vec2::splat(100.0), field, TerrainConfig::default()).expect("terrain");
        let mut world = BodyRegistry::new();

        terrain
            .attach(Placement::at(Vec2::new(0.0, -100.0)), Some(&mut world))
            .expect("attach");
        let before = terrain.stats();
        assert_eq!(before.regions, 4);
        assert!(before.totals.bodies > 0);

        // Impact on the planet surface, like a missile hit.
        terrain.draw_circle(Vec2::new(0.0, -100.0), 6.0, EMPTY);
        terrain.regenerate_terrain(Some(&mut world)).expect("regenerate");
        let after = terrain.stats();
        assert!(after.totals.rebuilt_cells > 0);
        assert!(after.totals.rebuilt_cells < 4 * 4);
        assert_eq!(after.totals.bodies, world.len());

        terrain.detach(Some(&mut world)).expect("detach");
        assert!(world.is_empty());
    }
}
