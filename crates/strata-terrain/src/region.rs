//! Terrain regions: edit, dirty tracking and incremental regeneration.
//!
//! A [`TerrainRegion`] covers one [`Region`] of the density field. Its
//! samples are divided into square cells of `cell_size` samples; each cell
//! keeps its convex pieces and the collision bodies built from them, so an
//! edit only rebuilds the cells its dirty box touches.
//!
//! Neighbouring cells share their border sample column and row. A cell
//! window reaches one sample past its own last column and row, and the last
//! cell of a region reads the first samples of the next region.

use glam::Vec2;
use strata_common::{Aabb, BodyHandle, CellCoord, CellRect, Placement, RegionId, TerrainError, TerrainResult};
use tracing::{debug, trace, warn};

use crate::config::TerrainConfig;
use crate::density::{DensityField, Region};
use crate::marching::{ContourExtractor, ContourGrid};
use crate::mesh::{MeshBuilder, TerrainMesh};
use crate::physics::PhysicsWorld;
use crate::polygon::{collinear_simplify, convex_partition, force_counter_clockwise, remove_duplicates, signed_area, Polygon};

/// Per-cell cache.
#[derive(Debug, Clone, Default)]
struct CellState {
    polygons: Vec<Polygon>,
    bodies: Vec<BodyHandle>,
}

/// Freshly extracted pieces for a rectangle of cells.
///
/// Produced by [`TerrainRegion::extract_dirty`] without touching the region,
/// consumed by [`TerrainRegion::apply_rebuild`].
#[derive(Debug, Clone, Default)]
pub struct CellRebuild {
    rect: CellRect,
    cells: Vec<Vec<Polygon>>,
}

impl CellRebuild {
    /// Rebuilt cell rectangle.
    #[must_use]
    pub const fn rect(&self) -> CellRect {
        self.rect
    }

    /// Returns true if no cell is rebuilt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
}

/// Region counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    /// Convex pieces across all cells
    pub polygons: usize,
    /// Live collision bodies
    pub bodies: usize,
    /// Mesh vertices
    pub vertices: usize,
    /// Mesh indices
    pub indices: usize,
    /// Cells rebuilt by the last regeneration
    pub rebuilt_cells: usize,
}

impl std::ops::AddAssign for RegionStats {
    fn add_assign(&mut self, other: Self) {
        self.polygons += other.polygons;
        self.bodies += other.bodies;
        self.vertices += other.vertices;
        self.indices += other.indices;
        self.rebuilt_cells += other.rebuilt_cells;
    }
}

/// Renderable, collidable share of a terrain.
#[derive(Debug)]
pub struct TerrainRegion {
    region: Region,
    config: TerrainConfig,
    /// World size of the whole terrain
    terrain_size: Vec2,
    /// Density samples per world unit
    samples_per_unit: f32,
    columns: u32,
    rows: u32,
    squares_per_cell: u32,
    cells: Vec<CellState>,
    mesh: TerrainMesh,
    /// Touched samples since the last regeneration, region-local
    dirty: Aabb,
    placement: Placement,
    rebuilt_cells: usize,
}

impl TerrainRegion {
    /// Creates a region covering `region`, whose share of the terrain is
    /// `world_size` units wide.
    ///
    /// The region starts fully dirty; its first regeneration extracts every
    /// cell.
    #[must_use]
    pub fn new(
        region: Region,
        terrain_size: Vec2,
        world_size: f32,
        placement: Placement,
        config: &TerrainConfig,
    ) -> Self {
        let size = region.size();
        let cell_size = config.cell_size.max(1);
        let columns = size.div_ceil(cell_size);
        let samples_per_unit = size as f32 / world_size;
        let points_per_unit = (samples_per_unit.ceil() as u32).max(1);
        let squares_per_cell = config
            .squares_per_cell
            .unwrap_or(cell_size / points_per_unit)
            .max(1);

        let last = (size - 1) as f32;
        Self {
            region,
            config: config.clone(),
            terrain_size,
            samples_per_unit,
            columns,
            rows: columns,
            squares_per_cell,
            cells: vec![CellState::default(); (columns * columns) as usize],
            mesh: TerrainMesh::default(),
            dirty: Aabb::new(Vec2::ZERO, Vec2::splat(last)),
            placement,
            rebuilt_cells: 0,
        }
    }

    /// Region identifier.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.region.id()
    }

    /// Density window of this region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Combined render mesh.
    #[must_use]
    pub const fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    /// Placement applied by the last update.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Cell grid dimensions `(columns, rows)`.
    #[must_use]
    pub const fn cell_grid(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Dirty box in region-local samples (empty after a regeneration).
    #[must_use]
    pub const fn dirty(&self) -> Aabb {
        self.dirty
    }

    /// Density samples per world unit.
    #[must_use]
    pub const fn samples_per_unit(&self) -> f32 {
        self.samples_per_unit
    }

    /// Convex pieces of a cell, in terrain-local world units.
    #[must_use]
    pub fn cell_polygons(&self, cell: CellCoord) -> &[Polygon] {
        match self.cell_index(cell) {
            Some(index) => &self.cells[index].polygons,
            None => &[],
        }
    }

    /// Collision bodies of a cell.
    #[must_use]
    pub fn cell_bodies(&self, cell: CellCoord) -> &[BodyHandle] {
        match self.cell_index(cell) {
            Some(index) => &self.cells[index].bodies,
            None => &[],
        }
    }

    /// Iterates every live body handle.
    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.cells.iter().flat_map(|cell| cell.bodies.iter().copied())
    }

    /// World-space bounds of the samples this region reads.
    ///
    /// Includes the whole footprint of the border sample column and row
    /// shared with the next region.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        let origin = self.placement.position - self.terrain_size * 0.5;
        let min = Vec2::new(self.region.offset_x() as f32, self.region.offset_y() as f32);
        let max = min + Vec2::splat((self.region.size() + 1) as f32);
        Aabb::new(
            origin + min / self.samples_per_unit,
            origin + max / self.samples_per_unit,
        )
    }

    /// Counters for this region.
    #[must_use]
    pub fn stats(&self) -> RegionStats {
        RegionStats {
            polygons: self.cells.iter().map(|c| c.polygons.len()).sum(),
            bodies: self.cells.iter().map(|c| c.bodies.len()).sum(),
            vertices: self.mesh.vertices.len(),
            indices: self.mesh.indices.len(),
            rebuilt_cells: self.rebuilt_cells,
        }
    }

    fn cell_index(&self, cell: CellCoord) -> Option<usize> {
        (cell.x < self.columns && cell.y < self.rows).then(|| cell.to_index(self.columns))
    }

    /// Global sample coordinate under a world point.
    fn global_sample(&self, world_point: Vec2) -> (i64, i64) {
        let local = (world_point - self.placement.position + self.terrain_size * 0.5) * self.samples_per_unit;
        (local.x.floor() as i64, local.y.floor() as i64)
    }

    /// Writes `value` under `world_point` and marks it dirty.
    ///
    /// Points outside the region are dropped. A point on the shared border
    /// with the next region is not written here but still marks the cells
    /// that read it. Returns true if a sample was written.
    pub fn modify_terrain(&mut self, field: &mut DensityField, world_point: Vec2, value: i8) -> bool {
        let (gx, gy) = self.global_sample(world_point);
        let x = gx - i64::from(self.region.offset_x());
        let y = gy - i64::from(self.region.offset_y());
        let size = i64::from(self.region.size());
        if x < 0 || y < 0 || x > size || y > size {
            return false;
        }

        self.dirty.union_point(Vec2::new(x as f32, y as f32));
        if x == size || y == size {
            return false;
        }
        self.region
            .set_point(field, x as i32, y as i32, value)
            .is_ok()
    }

    /// Stamps `value` over a disc, sampling the world at `config.stamp_step`.
    ///
    /// Returns the number of writes.
    pub fn draw_circle(&mut self, field: &mut DensityField, center: Vec2, radius: f32, value: i8) -> usize {
        let step = self.config.stamp_step;
        let steps = ((radius * 2.0) / step).ceil() as u32;
        let r2 = radius * radius;
        let origin = center - Vec2::splat(radius);

        let mut written = 0;
        for j in 0..=steps {
            for i in 0..=steps {
                let point = origin + Vec2::new(i as f32, j as f32) * step;
                if point.distance_squared(center) < r2 && self.modify_terrain(field, point, value) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Cells covered by the dirty box.
    ///
    /// A sample on a cell border also belongs to the previous cell. An
    /// untouched box yields an empty rectangle.
    #[must_use]
    pub fn dirty_cells(&self) -> CellRect {
        if self.dirty.is_empty() {
            return CellRect::EMPTY;
        }
        let cs = self.config.cell_size.max(1) as f32;
        let lower = |v: f32| ((v / cs).ceil() as i64 - 1).max(0) as u32;
        let upper = |v: f32, n: u32| (((v / cs).floor() as i64 + 1).max(0) as u32).min(n);
        CellRect::new(
            lower(self.dirty.min.x).min(self.columns),
            upper(self.dirty.max.x, self.columns),
            lower(self.dirty.min.y).min(self.rows),
            upper(self.dirty.max.y, self.rows),
        )
    }

    /// Marching lattice over one cell window.
    fn cell_window(&self, cell: CellCoord) -> ContourGrid {
        let cs = self.config.cell_size.max(1);
        let size = self.region.size();
        let corner = cell.to_sample_coord(cs);
        let (lx, ly) = (corner.x as u32, corner.y as u32);
        let width = cs.min(size - lx);
        let height = cs.min(size - ly);
        let squares = |extent: u32| (extent * self.squares_per_cell).div_ceil(cs).max(1);
        ContourGrid {
            x0: i64::from(self.region.offset_x() + lx),
            y0: i64::from(self.region.offset_y() + ly),
            width,
            height,
            squares_x: squares(width),
            squares_y: squares(height),
        }
    }

    /// Extracts the convex pieces of one cell.
    #[must_use]
    pub fn extract_cell(&self, field: &DensityField, cell: CellCoord) -> Vec<Polygon> {
        let loops = ContourExtractor::new(field, self.cell_window(cell), self.config.iterations).extract();
        loops
            .into_iter()
            .flat_map(|contour| self.decompose(contour))
            .collect()
    }

    /// Turns a sample-space loop into convex pieces in terrain-local units.
    fn decompose(&self, mut contour: Polygon) -> Vec<Polygon> {
        let half = self.terrain_size * 0.5;
        for point in &mut contour {
            *point = *point / self.samples_per_unit - half;
        }
        remove_duplicates(&mut contour, f32::EPSILON);
        force_counter_clockwise(&mut contour);
        let simplified = collinear_simplify(&contour, self.config.collinear_tolerance);
        if simplified.len() < 3 {
            trace!("{}: dropping degenerate loop of {} vertices", self.id(), contour.len());
            return Vec::new();
        }

        convex_partition(&simplified, self.config.max_polygon_vertices)
            .into_iter()
            .filter(|piece| {
                let keep = piece.len() >= 3 && signed_area(piece).abs() > f32::EPSILON;
                if !keep {
                    trace!("{}: dropping degenerate piece of {} vertices", self.id(), piece.len());
                }
                keep
            })
            .collect()
    }

    /// Extracts every dirty cell without modifying the region.
    #[must_use]
    pub fn extract_dirty(&self, field: &DensityField) -> CellRebuild {
        let rect = self.dirty_cells();
        CellRebuild {
            rect,
            cells: rect.iter().map(|cell| self.extract_cell(field, cell)).collect(),
        }
    }

    /// Replaces the cells of `rebuild`, their bodies and the mesh, then
    /// clears the dirty box.
    pub fn apply_rebuild(
        &mut self,
        rebuild: CellRebuild,
        physics: Option<&mut (dyn PhysicsWorld + '_)>,
    ) -> TerrainResult<()> {
        let mut world = match (self.config.physics, physics) {
            (true, None) => return Err(TerrainError::PhysicsUnavailable),
            (true, Some(world)) => Some(world),
            (false, _) => None,
        };

        let id = self.id();
        let CellRebuild { rect, cells } = rebuild;
        let mut created = 0;
        let mut removed = 0;
        let mut rejected = 0;
        for (cell, polygons) in rect.iter().zip(cells) {
            let Some(index) = self.cell_index(cell) else {
                continue;
            };
            let state = &mut self.cells[index];
            state.polygons = polygons;

            if let Some(world) = &mut world {
                for handle in state.bodies.drain(..) {
                    world.remove_body(handle);
                    removed += 1;
                }
                // A piece the backend rejects is dropped from the mesh too,
                // so every cached piece has exactly one body.
                let pieces = std::mem::take(&mut state.polygons);
                for polygon in pieces {
                    match world.create_convex_body(&polygon, self.config.body_density) {
                        Ok(handle) => {
                            world.set_body_placement(handle, self.placement);
                            state.bodies.push(handle);
                            state.polygons.push(polygon);
                            created += 1;
                        },
                        Err(err) => {
                            debug!("{id}: dropping piece in cell ({}, {}): {err}", cell.x, cell.y);
                            rejected += 1;
                        },
                    }
                }
            }
        }

        if !rect.is_empty() {
            self.rebuild_mesh();
            debug!(
                "{}: rebuilt {} cells, {} bodies removed, {} created, {} rejected, {} mesh vertices",
                id,
                rect.len(),
                removed,
                created,
                rejected,
                self.mesh.vertices.len()
            );
        }
        self.rebuilt_cells = rect.len();
        self.dirty = Aabb::EMPTY;
        Ok(())
    }

    /// Rebuilds every dirty cell and the mesh.
    pub fn regenerate_terrain(
        &mut self,
        field: &DensityField,
        physics: Option<&mut (dyn PhysicsWorld + '_)>,
    ) -> TerrainResult<()> {
        if self.config.physics && physics.is_none() {
            return Err(TerrainError::PhysicsUnavailable);
        }
        let rebuild = self.extract_dirty(field);
        self.apply_rebuild(rebuild, physics)
    }

    fn rebuild_mesh(&mut self) {
        let mut builder = MeshBuilder::new(self.config.color);
        for (index, state) in self.cells.iter().enumerate() {
            builder.push_cell(CellCoord::from_index(index, self.columns), &state.polygons);
        }
        self.mesh = builder.build();
    }

    /// Stores this tick's placement and moves every body to it.
    pub fn update(&mut self, placement: Placement, physics: Option<&mut (dyn PhysicsWorld + '_)>) {
        self.placement = placement;
        if let Some(world) = physics {
            for handle in self.cells.iter().flat_map(|cell| cell.bodies.iter()) {
                world.set_body_placement(*handle, placement);
            }
        }
    }

    /// Removes every body and drops the mesh and cached pieces.
    pub fn dispose(&mut self, physics: Option<&mut (dyn PhysicsWorld + '_)>) -> TerrainResult<()> {
        let live = self.cells.iter().any(|cell| !cell.bodies.is_empty());
        match physics {
            Some(world) => {
                for handle in self.cells.iter_mut().flat_map(|cell| cell.bodies.drain(..)) {
                    world.remove_body(handle);
                }
            },
            None if live => return Err(TerrainError::PhysicsUnavailable),
            None => {},
        }
        for cell in &mut self.cells {
            cell.polygons.clear();
        }
        self.mesh = TerrainMesh::default();
        self.dirty = Aabb::EMPTY;
        self.rebuilt_cells = 0;
        Ok(())
    }
}

impl Drop for TerrainRegion {
    fn drop(&mut self) {
        let live = self.bodies().count();
        if live > 0 {
            warn!("{} dropped with {} live bodies", self.id(), live);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{EMPTY, SOLID};
    use crate::physics::BodyRegistry;
    use strata_common::PhysicsError;

    /// Registry that refuses every `reject_every`-th shape.
    struct PickyWorld {
        registry: BodyRegistry,
        calls: usize,
        reject_every: usize,
    }

    impl PhysicsWorld for PickyWorld {
        fn create_convex_body(&mut self, polygon: &[Vec2], density: f32) -> Result<BodyHandle, PhysicsError> {
            self.calls += 1;
            if self.calls % self.reject_every == 0 {
                return Err(PhysicsError::InvalidShape {
                    vertices: polygon.len(),
                    reason: "refused".into(),
                });
            }
            self.registry.create_convex_body(polygon, density)
        }

        fn remove_body(&mut self, handle: BodyHandle) {
            self.registry.remove_body(handle);
        }

        fn set_body_placement(&mut self, handle: BodyHandle, placement: Placement) {
            self.registry.set_body_placement(handle, placement);
        }
    }

    const CELLS: [(u32, u32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

    fn setup(field: &DensityField, config: &TerrainConfig) -> TerrainRegion {
        let region = field.region(0, 0).expect("region");
        TerrainRegion::new(
            region,
            Vec2::splat(100.0),
            100.0,
            Placement::at(Vec2::splat(50.0)),
            config,
        )
    }

    fn cell(x: u32, y: u32) -> CellCoord {
        CellCoord::new(x, y)
    }

    #[test]
    fn test_new_region_is_fully_dirty() {
        let field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let region = setup(&field, &TerrainConfig::default());
        assert_eq!(region.cell_grid(), (2, 2));
        assert_eq!(region.dirty_cells(), CellRect::new(0, 2, 0, 2));
    }

    #[test]
    fn test_disc_stamp_rebuilds_one_cell() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut world = BodyRegistry::new();
        let mut region = setup(&field, &TerrainConfig::default());
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");
        assert!(region.mesh().is_empty());
        assert_eq!(region.stats().polygons, 0);

        let written = region.draw_circle(&mut field, Vec2::new(25.0, 25.0), 10.0, SOLID);
        assert!(written > 0);

        let dirty = region.dirty();
        assert!(dirty.min.x >= 15.0 && dirty.max.x <= 35.0);
        assert!(dirty.min.y >= 15.0 && dirty.max.y <= 35.0);
        assert_eq!(region.dirty_cells(), CellRect::new(0, 1, 0, 1));

        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");
        assert_eq!(region.stats().rebuilt_cells, 1);
        assert!(!region.cell_polygons(cell(0, 0)).is_empty());
        for (x, y) in &CELLS[1..] {
            assert!(region.cell_polygons(cell(*x, *y)).is_empty());
        }
        assert!(!region.mesh().is_empty());
        assert_eq!(world.len(), region.stats().polygons);
        assert!(region.dirty().is_empty());

        region.dispose(Some(&mut world)).expect("dispose");
    }

    #[test]
    fn test_disc_pieces_are_convex_and_centred() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut region = setup(&field, &TerrainConfig::render_only());
        region.draw_circle(&mut field, Vec2::new(25.0, 25.0), 10.0, SOLID);
        region.regenerate_terrain(&field, None).expect("regenerate");

        let pieces = region.cell_polygons(cell(0, 0));
        let area: f32 = pieces.iter().map(|p| signed_area(p)).sum();
        // pi * 10^2 ~ 314, terrain-local centre at (-25, -25).
        assert!(area > 250.0 && area < 420.0, "area was {area}");
        for piece in pieces {
            assert!(piece.len() <= 8);
            assert!(signed_area(piece) > 0.0);
            for p in piece {
                assert!(p.distance(Vec2::splat(-25.0)) < 12.5);
            }
        }
    }

    #[test]
    fn test_rejected_shapes_are_dropped() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut world = PickyWorld {
            registry: BodyRegistry::new(),
            calls: 0,
            reject_every: 2,
        };
        let mut region = setup(&field, &TerrainConfig::default());
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");

        region.draw_circle(&mut field, Vec2::new(25.0, 25.0), 10.0, SOLID);
        let pieces = region.extract_cell(&field, cell(0, 0)).len();
        assert!(pieces >= 2);
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");

        let kept = region.cell_polygons(cell(0, 0));
        assert_eq!(world.calls, pieces);
        assert_eq!(kept.len(), pieces - pieces / 2);
        assert_eq!(region.cell_bodies(cell(0, 0)).len(), kept.len());
        assert_eq!(world.registry.len(), kept.len());
        let vertices: usize = kept.iter().map(Vec::len).sum();
        assert_eq!(region.mesh().vertices.len(), vertices);
        assert!(region.dirty().is_empty());

        region.dispose(Some(&mut world)).expect("dispose");
        assert!(world.registry.is_empty());
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut world = BodyRegistry::new();
        let mut region = setup(&field, &TerrainConfig::default());
        region.draw_circle(&mut field, Vec2::new(40.0, 60.0), 15.0, SOLID);
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");

        let mesh = region.mesh().clone();
        let (created, removed) = (world.created(), world.removed());
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");

        assert_eq!(region.mesh(), &mesh);
        assert_eq!(world.created(), created);
        assert_eq!(world.removed(), removed);
        assert_eq!(region.stats().rebuilt_cells, 0);

        region.dispose(Some(&mut world)).expect("dispose");
    }

    #[test]
    fn test_untouched_cells_keep_their_pieces() {
        let mut field = DensityField::from_fn(100, 100, 100, |_, y| if y < 60 { SOLID } else { EMPTY })
            .expect("field");
        let mut region = setup(&field, &TerrainConfig::render_only());
        region.regenerate_terrain(&field, None).expect("regenerate");

        let before: Vec<(Vec<Polygon>, Vec<_>)> = CELLS
            .iter()
            .map(|&(x, y)| {
                (
                    region.cell_polygons(cell(x, y)).to_vec(),
                    region.mesh().cell_vertices(cell(x, y)).to_vec(),
                )
            })
            .collect();

        region.draw_circle(&mut field, Vec2::new(25.0, 25.0), 5.0, EMPTY);
        assert_eq!(region.dirty_cells(), CellRect::new(0, 1, 0, 1));
        region.regenerate_terrain(&field, None).expect("regenerate");

        assert_ne!(region.cell_polygons(cell(0, 0)), before[0].0.as_slice());
        for (i, &(x, y)) in CELLS.iter().enumerate().skip(1) {
            assert_eq!(region.cell_polygons(cell(x, y)), before[i].0.as_slice());
            assert_eq!(region.mesh().cell_vertices(cell(x, y)), before[i].1.as_slice());
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let field = DensityField::from_fn(100, 100, 100, |x, y| {
            let (dx, dy) = (x as f32 - 50.0, y as f32 - 50.0);
            if dx * dx + dy * dy < 900.0 {
                SOLID
            } else {
                EMPTY
            }
        })
        .expect("field");
        let region = setup(&field, &TerrainConfig::render_only());
        for &(x, y) in &CELLS {
            assert_eq!(region.extract_cell(&field, cell(x, y)), region.extract_cell(&field, cell(x, y)));
        }
    }

    #[test]
    fn test_edit_outside_region_is_dropped() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut region = setup(&field, &TerrainConfig::render_only());
        region.regenerate_terrain(&field, None).expect("regenerate");

        assert!(!region.modify_terrain(&mut field, Vec2::new(-10.0, 20.0), SOLID));
        assert!(!region.modify_terrain(&mut field, Vec2::new(20.0, 250.0), SOLID));
        assert_eq!(field.revision(), 0);
        assert!(region.dirty().is_empty());
        assert_eq!(region.dirty_cells(), CellRect::EMPTY);
    }

    #[test]
    fn test_border_sample_dirties_both_cells() {
        let mut field = DensityField::new(100, 100, 100, EMPTY).expect("field");
        let mut region = setup(&field, &TerrainConfig::render_only());
        region.regenerate_terrain(&field, None).expect("regenerate");

        assert!(region.modify_terrain(&mut field, Vec2::new(50.5, 10.5), SOLID));
        assert_eq!(field.get(50, 10), Some(SOLID));
        assert_eq!(region.dirty_cells(), CellRect::new(0, 2, 0, 1));
    }

    #[test]
    fn test_physics_required() {
        let field = DensityField::new(100, 100, 100, SOLID).expect("field");
        let mut region = setup(&field, &TerrainConfig::default());
        assert!(matches!(
            region.regenerate_terrain(&field, None),
            Err(TerrainError::PhysicsUnavailable)
        ));
        // Nothing was consumed.
        assert_eq!(region.dirty_cells(), CellRect::new(0, 2, 0, 2));
    }

    #[test]
    fn test_update_moves_every_body() {
        let field = DensityField::new(100, 100, 100, SOLID).expect("field");
        let mut world = BodyRegistry::new();
        let mut region = setup(&field, &TerrainConfig::default());
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");
        assert!(!world.is_empty());

        let placement = Placement::new(Vec2::new(1.0, 2.0), 0.25);
        region.update(placement, Some(&mut world));
        for handle in region.bodies() {
            assert_eq!(world.get(handle).expect("body").placement, placement);
        }

        region.dispose(Some(&mut world)).expect("dispose");
        assert!(world.is_empty());
        assert!(region.mesh().is_empty());
        assert_eq!(region.stats(), RegionStats::default());
    }

    #[test]
    fn test_dispose_without_world_keeps_bodies() {
        let field = DensityField::new(100, 100, 100, SOLID).expect("field");
        let mut world = BodyRegistry::new();
        let mut region = setup(&field, &TerrainConfig::default());
        region
            .regenerate_terrain(&field, Some(&mut world))
            .expect("regenerate");

        assert!(matches!(region.dispose(None), Err(TerrainError::PhysicsUnavailable)));
        assert!(region.bodies().count() > 0);
        region.dispose(Some(&mut world)).expect("dispose");
    }
}
