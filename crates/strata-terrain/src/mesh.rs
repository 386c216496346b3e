//! Render mesh built from convex terrain pieces.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use strata_common::CellCoord;
use tracing::warn;

use crate::polygon::Polygon;

/// Vertex layout consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TerrainVertex {
    /// Position (z is always 0)
    pub position: [f32; 3],
    /// RGBA colour
    pub color: [u8; 4],
}

impl TerrainVertex {
    /// Creates a vertex on the z = 0 plane.
    #[must_use]
    pub const fn new(position: Vec2, color: [u8; 4]) -> Self {
        Self {
            position: [position.x, position.y, 0.0],
            color,
        }
    }
}

/// Primitive topology of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Every three indices form one triangle
    #[default]
    TriangleList,
}

/// Vertex and index ranges contributed by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSpan {
    /// Contributing cell
    pub cell: CellCoord,
    /// First vertex
    pub first_vertex: u32,
    /// Vertex count
    pub vertex_count: u32,
    /// First index
    pub first_index: u32,
    /// Index count
    pub index_count: u32,
}

/// Triangle mesh for one terrain region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainMesh {
    /// Vertex buffer
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer
    pub indices: Vec<u16>,
    /// Per-cell ranges, in assembly order (cells without pieces are skipped)
    pub spans: Vec<MeshSpan>,
    /// Primitive topology
    pub topology: Topology,
}

impl TerrainMesh {
    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the span recorded for `cell`.
    #[must_use]
    pub fn span(&self, cell: CellCoord) -> Option<&MeshSpan> {
        self.spans.iter().find(|span| span.cell == cell)
    }

    /// Vertices contributed by `cell`.
    #[must_use]
    pub fn cell_vertices(&self, cell: CellCoord) -> &[TerrainVertex] {
        match self.span(cell) {
            Some(span) => {
                let start = span.first_vertex as usize;
                &self.vertices[start..start + span.vertex_count as usize]
            },
            None => &[],
        }
    }

    /// Vertex bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index bytes for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Assembles a [`TerrainMesh`] cell by cell.
#[derive(Debug)]
pub struct MeshBuilder {
    mesh: TerrainMesh,
    color: [u8; 4],
    overflowed: bool,
}

impl MeshBuilder {
    /// Creates a builder emitting vertices of the given colour.
    #[must_use]
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            mesh: TerrainMesh::default(),
            color,
            overflowed: false,
        }
    }

    /// Appends a triangle fan for every convex piece of `cell`.
    ///
    /// Once the 16-bit index space is exhausted the remaining pieces are
    /// skipped and a warning is logged once.
    pub fn push_cell(&mut self, cell: CellCoord, polygons: &[Polygon]) {
        let first_vertex = self.mesh.vertices.len() as u32;
        let first_index = self.mesh.indices.len() as u32;

        for polygon in polygons {
            if polygon.len() < 3 || self.overflowed {
                continue;
            }
            let base = self.mesh.vertices.len();
            if base + polygon.len() > usize::from(u16::MAX) + 1 {
                warn!(
                    "Terrain mesh exceeds {} vertices, skipping remaining polygons",
                    usize::from(u16::MAX) + 1
                );
                self.overflowed = true;
                continue;
            }

            self.mesh
                .vertices
                .extend(polygon.iter().map(|&p| TerrainVertex::new(p, self.color)));
            let base = base as u16;
            for k in 1..(polygon.len() as u16 - 1) {
                self.mesh.indices.extend_from_slice(&[base, base + k, base + k + 1]);
            }
        }

        let vertex_count = self.mesh.vertices.len() as u32 - first_vertex;
        if vertex_count > 0 {
            self.mesh.spans.push(MeshSpan {
                cell,
                first_vertex,
                vertex_count,
                first_index,
                index_count: self.mesh.indices.len() as u32 - first_index,
            });
        }
    }

    /// Finishes the mesh.
    #[must_use]
    pub fn build(self) -> TerrainMesh {
        self.mesh
    }
}
