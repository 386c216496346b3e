//! Error types for Strata.

use thiserror::Error;

/// Top-level error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Terrain/density errors
    #[error("Terrain error: {0}")]
    Terrain(#[from] TerrainError),

    /// Physics backend errors
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terrain and density field errors.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Field dimensions are not a multiple of the region size
    #[error("Field of {width}x{height} samples cannot be split into regions of {region_size}")]
    InvalidDimensions {
        /// Field width in samples
        width: usize,
        /// Field height in samples
        height: usize,
        /// Requested region size in samples
        region_size: usize,
    },

    /// Terrain world size ratio differs from the region grid ratio
    #[error(
        "Terrain size {width}x{height} does not match the {regions_x}x{regions_y} region grid ratio"
    )]
    AspectMismatch {
        /// Terrain world width
        width: f32,
        /// Terrain world height
        height: f32,
        /// Regions on the X axis
        regions_x: u32,
        /// Regions on the Y axis
        regions_y: u32,
    },

    /// Region index outside the region grid
    #[error("Region ({x}, {y}) outside the {regions_x}x{regions_y} region grid")]
    RegionOutOfRange {
        /// Requested column
        x: u32,
        /// Requested row
        y: u32,
        /// Regions on the X axis
        regions_x: u32,
        /// Regions on the Y axis
        regions_y: u32,
    },

    /// Point outside a region's sample window
    #[error("Point ({x}, {y}) outside region of size {size}")]
    PointOutOfRange {
        /// Requested X
        x: i32,
        /// Requested Y
        y: i32,
        /// Region size in samples
        size: u32,
    },

    /// Physics was required but no physics world was supplied
    #[error("Physics is enabled but no physics world is available")]
    PhysicsUnavailable,

    /// Invalid configuration value
    #[error("Invalid terrain configuration: {0}")]
    InvalidConfig(String),

    /// Physics backend failure during regeneration
    #[error("Physics backend failed: {0}")]
    Physics(#[from] PhysicsError),
}

/// Physics backend errors.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// The backend rejected a polygon as a convex shape
    #[error("Invalid convex shape with {vertices} vertices: {reason}")]
    InvalidShape {
        /// Number of vertices supplied
        vertices: usize,
        /// Backend-specific reason
        reason: String,
    },

    /// The handle does not name a live body
    #[error("Unknown body handle {0}")]
    UnknownBody(u64),
}

/// Result type alias for Strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Result type alias for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
