//! Terrain configuration.

use serde::{Deserialize, Serialize};
use strata_common::{TerrainError, TerrainResult};

/// Default cell edge length in samples.
pub const DEFAULT_CELL_SIZE: u32 = 50;

/// Default world-space step used by the circle stamp.
pub const DEFAULT_STAMP_STEP: f32 = 0.1;

/// Largest vertex count of a single convex piece.
pub const DEFAULT_MAX_POLYGON_VERTICES: usize = 8;

/// Tunables for region extraction, meshing and collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Cell edge length in samples (unit of incremental regeneration)
    pub cell_size: u32,
    /// Bisection steps used to place each contour crossing
    pub iterations: u32,
    /// Marching squares per cell side (None = cell_size / points_per_unit)
    pub squares_per_cell: Option<u32>,
    /// World-space sampling step of `draw_circle`
    pub stamp_step: f32,
    /// Cross-product tolerance for collinear vertex removal
    pub collinear_tolerance: f32,
    /// Vertex cap for one convex piece
    pub max_polygon_vertices: usize,
    /// Density passed to the physics world for every body
    pub body_density: f32,
    /// Vertex colour (RGBA)
    pub color: [u8; 4],
    /// Require a physics world when attaching
    pub physics: bool,
    /// Extract dirty cells of distinct regions in parallel
    pub parallel_regeneration: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            iterations: 2,
            squares_per_cell: None,
            stamp_step: DEFAULT_STAMP_STEP,
            collinear_tolerance: 1e-4,
            max_polygon_vertices: DEFAULT_MAX_POLYGON_VERTICES,
            body_density: 1.0,
            color: [124, 88, 30, 255],
            physics: true,
            parallel_regeneration: true,
        }
    }
}

impl TerrainConfig {
    /// Configuration for render-only terrain (no collision bodies).
    #[must_use]
    pub fn render_only() -> Self {
        Self {
            physics: false,
            ..Self::default()
        }
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.cell_size == 0 {
            return Err(TerrainError::InvalidConfig("cell_size must be positive".into()));
        }
        if self.squares_per_cell == Some(0) {
            return Err(TerrainError::InvalidConfig(
                "squares_per_cell must be positive".into(),
            ));
        }
        if !(self.stamp_step.is_finite() && self.stamp_step > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "stamp_step must be a positive number, got {}",
                self.stamp_step
            )));
        }
        if self.max_polygon_vertices < 3 {
            return Err(TerrainError::InvalidConfig(
                "max_polygon_vertices must be at least 3".into(),
            ));
        }
        if self.collinear_tolerance < 0.0 {
            return Err(TerrainError::InvalidConfig(
                "collinear_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}
