//! # Strata Common
//!
//! Common types, utilities, and shared abstractions for Strata.
//!
//! This crate provides foundational types used across the terrain pipeline:
//! - Coordinate types (sample, cell, region)
//! - ID types (RegionId, BodyHandle)
//! - Geometry primitives (Aabb, Placement)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod geometry;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
}

pub use prelude::*;
