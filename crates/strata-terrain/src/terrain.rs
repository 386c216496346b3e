//! Terrain: a density field split into regions placed in the world.

use glam::Vec2;
use rayon::prelude::*;
use strata_common::{Placement, RegionId, TerrainError, TerrainResult};
use tracing::{debug, info};

use crate::brush::{CircleBrush, Containment, TerrainBrush};
use crate::config::TerrainConfig;
use crate::density::DensityField;
use crate::edits::{EditQueue, TerrainEdit};
use crate::physics::PhysicsWorld;
use crate::region::{CellRebuild, RegionStats, TerrainRegion};

/// Largest accepted difference between the world and region grid aspect
/// ratios.
const ASPECT_TOLERANCE: f32 = 1e-4;

/// Aggregated counters for a terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerrainStats {
    /// Attached regions
    pub regions: usize,
    /// Sum over all regions
    pub totals: RegionStats,
}

/// Destructible terrain.
///
/// Owns the density field and, while attached, one [`TerrainRegion`] per
/// field region. Edits go through the terrain so the touched regions are
/// marked dirty; [`Terrain::regenerate_terrain`] then rebuilds only what
/// changed.
#[derive(Debug)]
pub struct Terrain {
    size: Vec2,
    field: DensityField,
    config: TerrainConfig,
    region_world_size: f32,
    placement: Placement,
    regions: Vec<TerrainRegion>,
}

impl Terrain {
    /// Creates a terrain of `size` world units over `field`.
    ///
    /// The world aspect ratio must match the field's region grid.
    pub fn new(size: Vec2, field: DensityField, config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;

        let regions_x = field.region_count_x();
        let regions_y = field.region_count_y();
        let mismatch = || TerrainError::AspectMismatch {
            width: size.x,
            height: size.y,
            regions_x,
            regions_y,
        };
        if !(size.x > 0.0 && size.y > 0.0 && size.is_finite()) {
            return Err(mismatch());
        }
        let world_ratio = size.y / size.x;
        let grid_ratio = regions_y as f32 / regions_x as f32;
        if (world_ratio - grid_ratio).abs() > ASPECT_TOLERANCE * grid_ratio {
            return Err(mismatch());
        }

        Ok(Self {
            size,
            region_world_size: size.x / regions_x as f32,
            field,
            config,
            placement: Placement::IDENTITY,
            regions: Vec::new(),
        })
    }

    /// World size.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// World size of one region.
    #[must_use]
    pub const fn region_world_size(&self) -> f32 {
        self.region_world_size
    }

    /// Density field.
    #[must_use]
    pub const fn field(&self) -> &DensityField {
        &self.field
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Current placement.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns true while regions exist.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.regions.is_empty()
    }

    /// Attached regions in row-major order.
    #[must_use]
    pub fn regions(&self) -> &[TerrainRegion] {
        &self.regions
    }

    /// Looks up an attached region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&TerrainRegion> {
        self.regions.get(id.index).filter(|region| region.id() == id)
    }

    fn require_physics(&self, physics: Option<&(dyn PhysicsWorld + '_)>) -> TerrainResult<()> {
        if self.config.physics && physics.is_none() {
            return Err(TerrainError::PhysicsUnavailable);
        }
        Ok(())
    }

    /// Creates one region per field region at `placement` and extracts
    /// each of them. Existing regions are disposed first.
    pub fn attach(
        &mut self,
        placement: Placement,
        mut physics: Option<&mut (dyn PhysicsWorld + '_)>,
    ) -> TerrainResult<()> {
        self.require_physics(physics.as_deref())?;
        if self.is_attached() {
            self.detach(physics.as_deref_mut())?;
        }

        self.placement = placement;
        let size = self.size;
        let world_size = self.region_world_size;
        let config = &self.config;
        self.regions = self
            .field
            .regions()
            .map(|region| TerrainRegion::new(region, size, world_size, placement, config))
            .collect();

        self.regenerate_terrain(physics)?;
        info!(
            "Attached terrain {}x{} with {} regions, {} polygons",
            self.size.x,
            self.size.y,
            self.regions.len(),
            self.stats().totals.polygons
        );
        Ok(())
    }

    /// Disposes every region, removing its bodies.
    pub fn detach(&mut self, mut physics: Option<&mut (dyn PhysicsWorld + '_)>) -> TerrainResult<()> {
        for region in &mut self.regions {
            region.dispose(physics.as_deref_mut())?;
        }
        let count = self.regions.len();
        self.regions.clear();
        info!("Detached terrain ({} regions)", count);
        Ok(())
    }

    /// Stores this tick's placement and moves every body to it.
    pub fn update(&mut self, placement: Placement, mut physics: Option<&mut (dyn PhysicsWorld + '_)>) {
        self.placement = placement;
        for region in &mut self.regions {
            region.update(placement, physics.as_deref_mut());
        }
    }

    /// Region owning the sample under `world_point`.
    #[must_use]
    pub fn region_at(&self, world_point: Vec2) -> Option<RegionId> {
        let local = (world_point - self.placement.position + self.size * 0.5) / self.region_world_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (x, y) = (local.x as u32, local.y as u32);
        if x >= self.field.region_count_x() || y >= self.field.region_count_y() {
            return None;
        }
        self.field.region(x, y).ok().map(|region| region.id())
    }

    /// Writes `value` under `world_point` in every region reading it.
    ///
    /// Returns true if a sample was written.
    pub fn modify_terrain(&mut self, world_point: Vec2, value: i8) -> bool {
        let mut written = false;
        for region in &mut self.regions {
            if region.world_bounds().contains_point(world_point) {
                written |= region.modify_terrain(&mut self.field, world_point, value);
            }
        }
        written
    }

    /// Stamps a disc into every region the disc touches.
    ///
    /// Returns the number of writes.
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, value: i8) -> usize {
        let brush = CircleBrush::new(center, radius);
        let mut written = 0;
        for region in &mut self.regions {
            if brush.contains(&region.world_bounds()) != Containment::Disjoint {
                written += region.draw_circle(&mut self.field, brush.position(), radius, value);
            }
        }
        written
    }

    /// Applies every queued edit. Returns the number of edits applied.
    pub fn apply_edits(&mut self, queue: &EditQueue) -> usize {
        let edits = queue.drain();
        for edit in &edits {
            match *edit {
                TerrainEdit::Point { position, value } => {
                    self.modify_terrain(position, value);
                },
                TerrainEdit::Circle {
                    center,
                    radius,
                    value,
                } => {
                    self.draw_circle(center, radius, value);
                },
            }
        }
        if !edits.is_empty() {
            debug!("Applied {} queued edits", edits.len());
        }
        edits.len()
    }

    /// Rebuilds the dirty cells of every region.
    ///
    /// Extraction runs per region (in parallel when
    /// `config.parallel_regeneration` is set); bodies and meshes are then
    /// updated on the calling thread.
    pub fn regenerate_terrain(&mut self, mut physics: Option<&mut (dyn PhysicsWorld + '_)>) -> TerrainResult<()> {
        self.require_physics(physics.as_deref())?;

        let field = &self.field;
        let rebuilds: Vec<CellRebuild> = if self.config.parallel_regeneration {
            self.regions
                .par_iter()
                .map(|region| region.extract_dirty(field))
                .collect()
        } else {
            self.regions
                .iter()
                .map(|region| region.extract_dirty(field))
                .collect()
        };

        let mut rebuilt = 0;
        for (region, rebuild) in self.regions.iter_mut().zip(rebuilds) {
            rebuilt += rebuild.rect().len();
            region.apply_rebuild(rebuild, physics.as_deref_mut())?;
        }
        if rebuilt > 0 {
            debug!("Regenerated {} cells across {} regions", rebuilt, self.regions.len());
        }
        self.field.take_changed();
        Ok(())
    }

    /// Aggregated counters.
    #[must_use]
    pub fn stats(&self) -> TerrainStats {
        let mut totals = RegionStats::default();
        for region in &self.regions {
            totals += region.stats();
        }
        TerrainStats {
            regions: self.regions.len(),
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{EMPTY, SOLID};
    use crate::physics::BodyRegistry;
    use strata_common::CellCoord;

    fn field(size: u32, region_size: u32) -> DensityField {
        DensityField::new(size, size, region_size, EMPTY).expect("field")
    }

    #[test]
    fn test_aspect_mismatch_is_rejected() {
        let result = Terrain::new(Vec2::new(100.0, 50.0), field(100, 10), TerrainConfig::default());
        assert!(matches!(result, Err(TerrainError::AspectMismatch { .. })));

        let result = Terrain::new(Vec2::new(100.0, 100.0), field(100, 10), TerrainConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TerrainConfig {
            cell_size: 0,
            ..TerrainConfig::default()
        };
        let result = Terrain::new(Vec2::splat(100.0), field(100, 100), config);
        assert!(matches!(result, Err(TerrainError::InvalidConfig(_))));
    }

    #[test]
    fn test_attach_requires_physics() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 50), TerrainConfig::default())
            .expect("terrain");
        assert!(matches!(
            terrain.attach(Placement::IDENTITY, None),
            Err(TerrainError::PhysicsUnavailable)
        ));
        assert!(!terrain.is_attached());
    }

    #[test]
    fn test_attach_and_detach() {
        let solid = DensityField::new(100, 100, 50, SOLID).expect("field");
        let mut terrain = Terrain::new(Vec2::splat(100.0), solid, TerrainConfig::default()).expect("terrain");
        let mut world = BodyRegistry::new();

        terrain
            .attach(Placement::IDENTITY, Some(&mut world))
            .expect("attach");
        let stats = terrain.stats();
        assert_eq!(stats.regions, 4);
        assert!(stats.totals.bodies > 0);
        assert_eq!(stats.totals.bodies, world.len());

        // Re-attaching replaces the bodies instead of leaking them.
        terrain
            .attach(Placement::IDENTITY, Some(&mut world))
            .expect("attach");
        assert_eq!(terrain.stats().totals.bodies, world.len());

        terrain.detach(Some(&mut world)).expect("detach");
        assert!(world.is_empty());
        assert_eq!(terrain.stats(), TerrainStats::default());
    }

    #[test]
    fn test_region_at() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 50), TerrainConfig::render_only())
            .expect("terrain");
        terrain.attach(Placement::IDENTITY, None).expect("attach");

        let id = terrain.region_at(Vec2::new(-10.0, 20.0)).expect("region");
        assert_eq!((id.coord.x, id.coord.y), (0, 1));
        assert!(terrain.region(id).is_some());
        assert!(terrain.region_at(Vec2::new(60.0, 0.0)).is_none());
        assert!(terrain.region_at(Vec2::new(0.0, -51.0)).is_none());
    }

    #[test]
    fn test_disc_stamp_through_terrain() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 100), TerrainConfig::default())
            .expect("terrain");
        let mut world = BodyRegistry::new();
        terrain
            .attach(Placement::at(Vec2::splat(50.0)), Some(&mut world))
            .expect("attach");
        assert_eq!(terrain.stats().totals.polygons, 0);

        assert!(terrain.draw_circle(Vec2::new(25.0, 25.0), 10.0, SOLID) > 0);
        terrain.regenerate_terrain(Some(&mut world)).expect("regenerate");

        let region = &terrain.regions()[0];
        assert_eq!(region.stats().rebuilt_cells, 1);
        assert!(!region.cell_polygons(CellCoord::new(0, 0)).is_empty());
        assert!(region.cell_polygons(CellCoord::new(1, 1)).is_empty());
        assert_eq!(world.len(), terrain.stats().totals.bodies);

        terrain.detach(Some(&mut world)).expect("detach");
    }

    #[test]
    fn test_edit_across_region_border() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 50), TerrainConfig::render_only())
            .expect("terrain");
        terrain.attach(Placement::IDENTITY, None).expect("attach");

        // Disc centred on the vertical border between region (0,0) and (1,0).
        terrain.draw_circle(Vec2::new(0.0, -25.0), 5.0, SOLID);
        assert!(!terrain.regions()[0].dirty().is_empty());
        assert!(!terrain.regions()[1].dirty().is_empty());
        assert!(terrain.regions()[2].dirty().is_empty());

        terrain.regenerate_terrain(None).expect("regenerate");
        assert!(terrain.regions()[0].stats().polygons > 0);
        assert!(terrain.regions()[1].stats().polygons > 0);
        assert!(terrain.regions().iter().all(|r| r.dirty().is_empty()));
    }

    #[test]
    fn test_edit_on_shared_border_column_refreshes_both_regions() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 50), TerrainConfig::render_only())
            .expect("terrain");
        // World space equals sample space.
        terrain.attach(Placement::at(Vec2::splat(50.0)), None).expect("attach");

        // Sample column 50 is owned by region (1,0) and read by region (0,0).
        assert!(terrain.draw_circle(Vec2::new(50.7, 10.5), 0.3, SOLID) > 0);
        assert!(!terrain.regions()[0].dirty().is_empty());
        assert!(!terrain.regions()[1].dirty().is_empty());

        terrain.regenerate_terrain(None).expect("regenerate");
        let cell = CellCoord::new(0, 0);
        assert!(!terrain.regions()[0].cell_polygons(cell).is_empty());
        for region in &terrain.regions()[..2] {
            let fresh = region.extract_cell(terrain.field(), cell);
            assert_eq!(region.cell_polygons(cell), fresh.as_slice());
        }
    }

    #[test]
    fn test_parallel_and_serial_regeneration_agree() {
        let build = |parallel: bool| {
            let config = TerrainConfig {
                parallel_regeneration: parallel,
                ..TerrainConfig::render_only()
            };
            let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 50), config).expect("terrain");
            terrain.attach(Placement::IDENTITY, None).expect("attach");
            terrain.draw_circle(Vec2::new(3.0, 4.0), 20.0, SOLID);
            terrain.draw_circle(Vec2::new(10.0, 0.0), 6.0, EMPTY);
            terrain.regenerate_terrain(None).expect("regenerate");
            terrain
                .regions()
                .iter()
                .map(|r| r.mesh().clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(true), build(false));
    }

    #[test]
    fn test_apply_queued_edits() {
        let mut terrain = Terrain::new(Vec2::splat(100.0), field(100, 100), TerrainConfig::render_only())
            .expect("terrain");
        terrain.attach(Placement::IDENTITY, None).expect("attach");

        let queue = EditQueue::new(16);
        queue.publish(TerrainEdit::Circle {
            center: Vec2::ZERO,
            radius: 8.0,
            value: SOLID,
        });
        queue.publish(TerrainEdit::Point {
            position: Vec2::new(-30.0, -30.0),
            value: SOLID,
        });

        assert_eq!(terrain.apply_edits(&queue), 2);
        assert_eq!(terrain.field().get(20, 20), Some(SOLID));
        assert_eq!(terrain.field().get(50, 50), Some(SOLID));
        terrain.regenerate_terrain(None).expect("regenerate");
        assert!(terrain.stats().totals.polygons > 0);
        assert_eq!(terrain.apply_edits(&queue), 0);
    }

    #[test]
    fn test_update_moves_bodies() {
        let solid = DensityField::new(100, 100, 100, SOLID).expect("field");
        let mut terrain = Terrain::new(Vec2::splat(100.0), solid, TerrainConfig::default()).expect("terrain");
        let mut world = BodyRegistry::new();
        terrain
            .attach(Placement::IDENTITY, Some(&mut world))
            .expect("attach");

        let placement = Placement::new(Vec2::new(0.0, -100.0), 0.1);
        terrain.update(placement, Some(&mut world));
        for region in terrain.regions() {
            for handle in region.bodies() {
                assert_eq!(world.get(handle).expect("body").placement, placement);
            }
        }
        terrain.detach(Some(&mut world)).expect("detach");
    }
}
