//! Coordinate types for density samples, region cells, and regions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Sample coordinate inside a density region (region-local).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct SampleCoord {
    /// X coordinate in sample space
    pub x: i32,
    /// Y coordinate in sample space
    pub y: i32,
}

impl SampleCoord {
    /// Creates a new sample coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true if the sample lies in `[0, size)` on both axes.
    #[must_use]
    pub const fn is_within(self, size: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < size && (self.y as u32) < size
    }
}

/// Cell coordinate (identifies a cell in a region's cell grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct CellCoord {
    /// X coordinate in cell space
    pub x: u32,
    /// Y coordinate in cell space
    pub y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Converts to a row-major linear index for a grid `columns` cells wide.
    #[must_use]
    pub const fn to_index(self, columns: u32) -> usize {
        (self.y as usize) * (columns as usize) + (self.x as usize)
    }

    /// Creates from a row-major linear index.
    #[must_use]
    pub const fn from_index(index: usize, columns: u32) -> Self {
        let columns = columns as usize;
        Self {
            x: (index % columns) as u32,
            y: (index / columns) as u32,
        }
    }

    /// Returns the sample coordinate of the cell's lower-left corner.
    #[must_use]
    pub const fn to_sample_coord(self, cell_size: u32) -> SampleCoord {
        SampleCoord {
            x: (self.x * cell_size) as i32,
            y: (self.y * cell_size) as i32,
        }
    }
}

/// Half-open rectangle of cells `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellRect {
    /// First column
    pub x0: u32,
    /// One past the last column
    pub x1: u32,
    /// First row
    pub y0: u32,
    /// One past the last row
    pub y1: u32,
}

impl CellRect {
    /// The empty rectangle.
    pub const EMPTY: Self = Self {
        x0: 0,
        x1: 0,
        y0: 0,
        y1: 0,
    };

    /// Creates a new cell rectangle.
    #[must_use]
    pub const fn new(x0: u32, x1: u32, y0: u32, y1: u32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// Returns true if no cell lies inside the rectangle.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Returns true if the cell lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x >= self.x0 && cell.x < self.x1 && cell.y >= self.y0 && cell.y < self.y1
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.x1 - self.x0) as usize) * ((self.y1 - self.y0) as usize)
        }
    }

    /// Iterates the covered cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> {
        let Self { x0, x1, y0, y1 } = *self;
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| CellCoord::new(x, y)))
    }
}

/// Region coordinate inside the density field's region grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct RegionCoord {
    /// Region column
    pub x: u32,
    /// Region row
    pub y: u32,
}

impl RegionCoord {
    /// Creates a new region coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_roundtrip() {
        let cell = CellCoord::new(3, 2);
        let index = cell.to_index(4);
        assert_eq!(index, 11);
        assert_eq!(CellCoord::from_index(index, 4), cell);
    }

    #[test]
    fn test_cell_rect_iteration_order() {
        let rect = CellRect::new(0, 2, 0, 2);
        let cells: Vec<_> = rect.iter().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
            ]
        );
        assert_eq!(rect.len(), 4);
    }

    #[test]
    fn test_empty_rect() {
        assert!(CellRect::EMPTY.is_empty());
        assert_eq!(CellRect::EMPTY.iter().count(), 0);
        assert!(!CellRect::new(0, 1, 0, 1).is_empty());
    }

    #[test]
    fn test_sample_within() {
        assert!(SampleCoord::new(0, 99).is_within(100));
        assert!(!SampleCoord::new(-1, 0).is_within(100));
        assert!(!SampleCoord::new(100, 0).is_within(100));
    }
}
