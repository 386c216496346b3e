//! Marching squares contour extraction.
//!
//! Extracts closed loops around the solid samples of one rectangular window
//! of a [`DensityField`]. Nodes outside the window count as empty, and a
//! crossing between a window node and an outside node snaps onto the window
//! node, so every loop is closed and clipped to the window:
//!
//! ```text
//!   o   o   o   o      o = virtual (empty) node outside the window
//!     +---+---+
//!   o | # | # | o      # = solid window node
//!     +---+---+        loops run along the window border where the
//!   o | # |   | o          solid region touches it
//!     +---+---+
//!   o   o   o   o
//! ```
//!
//! Loops are oriented with solid on the left, so outer boundaries come out
//! counter-clockwise. A window containing an enclosed empty pocket (a
//! clockwise loop) is split through its middle node column or row until no
//! pocket remains; the pieces together cover the same solid area.

use ahash::{AHashMap, AHashSet};
use glam::Vec2;
use tracing::trace;

use crate::density::{is_solid, DensityField};
use crate::polygon::{remove_duplicates, signed_area, Polygon};

/// Loops with absolute area below this (in samples squared) are noise.
const MIN_LOOP_AREA: f32 = 1e-6;

/// Sampling lattice over one window of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourGrid {
    /// Global sample X of the window's lower-left corner
    pub x0: i64,
    /// Global sample Y of the window's lower-left corner
    pub y0: i64,
    /// Window width in samples
    pub width: u32,
    /// Window height in samples
    pub height: u32,
    /// Marching squares along X
    pub squares_x: u32,
    /// Marching squares along Y
    pub squares_y: u32,
}

impl ContourGrid {
    /// Global sample X of node column `i`.
    fn sample_x(&self, i: i32) -> i64 {
        self.x0 + i64::from(i) * i64::from(self.width) / i64::from(self.squares_x)
    }

    /// Global sample Y of node row `j`.
    fn sample_y(&self, j: i32) -> i64 {
        self.y0 + i64::from(j) * i64::from(self.height) / i64::from(self.squares_y)
    }
}

/// Inclusive node range `[i0, i1] x [j0, j1]` of a (sub-)window.
#[derive(Debug, Clone, Copy)]
struct NodeRange {
    i0: i32,
    i1: i32,
    j0: i32,
    j1: i32,
}

impl NodeRange {
    fn contains(&self, i: i32, j: i32) -> bool {
        i >= self.i0 && i <= self.i1 && j >= self.j0 && j <= self.j1
    }

    /// Splits through the middle node of the longer axis.
    fn split(&self) -> Option<(NodeRange, NodeRange)> {
        let (w, h) = (self.i1 - self.i0, self.j1 - self.j0);
        if w >= h && w >= 2 {
            let m = self.i0 + w / 2;
            Some((NodeRange { i1: m, ..*self }, NodeRange { i0: m, ..*self }))
        } else if h >= 2 {
            let m = self.j0 + h / 2;
            Some((NodeRange { j1: m, ..*self }, NodeRange { j0: m, ..*self }))
        } else {
            None
        }
    }
}

/// Lattice edge: horizontal `(i, j)-(i+1, j)` or vertical `(i, j)-(i, j+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    Horizontal(i32, i32),
    Vertical(i32, i32),
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

/// Directed segments (solid on the left) for a square case.
///
/// Case bits: 1 = bottom-left, 2 = bottom-right, 4 = top-right, 8 = top-left.
fn case_segments(case: u8, center_solid: bool) -> &'static [(Side, Side)] {
    use Side::{Bottom as B, Left as L, Right as R, Top as T};
    match case {
        1 => &[(B, L)],
        2 => &[(R, B)],
        3 => &[(R, L)],
        4 => &[(T, R)],
        5 if center_solid => &[(B, R), (T, L)],
        5 => &[(B, L), (T, R)],
        6 => &[(T, B)],
        7 => &[(T, L)],
        8 => &[(L, T)],
        9 => &[(B, T)],
        10 if center_solid => &[(L, B), (R, T)],
        10 => &[(R, B), (L, T)],
        11 => &[(R, T)],
        12 => &[(L, R)],
        13 => &[(B, R)],
        14 => &[(L, B)],
        _ => &[],
    }
}

/// Extracts contour loops from a field window.
pub struct ContourExtractor<'a> {
    field: &'a DensityField,
    grid: ContourGrid,
    iterations: u32,
}

impl<'a> ContourExtractor<'a> {
    /// Creates an extractor over `grid`, refining crossings with
    /// `iterations` bisection steps.
    #[must_use]
    pub fn new(field: &'a DensityField, grid: ContourGrid, iterations: u32) -> Self {
        Self {
            field,
            grid,
            iterations,
        }
    }

    /// Returns counter-clockwise loops in global sample coordinates.
    #[must_use]
    pub fn extract(&self) -> Vec<Polygon> {
        let mut loops = Vec::new();
        if self.grid.squares_x == 0 || self.grid.squares_y == 0 {
            return loops;
        }
        let range = NodeRange {
            i0: 0,
            i1: self.grid.squares_x as i32,
            j0: 0,
            j1: self.grid.squares_y as i32,
        };
        self.extract_range(range, &mut loops);
        loops
    }

    fn extract_range(&self, range: NodeRange, out: &mut Vec<Polygon>) {
        let traced = self.trace_loops(range);
        let has_pocket = traced.iter().any(|l| signed_area(l) < -MIN_LOOP_AREA);

        if has_pocket {
            if let Some((a, b)) = range.split() {
                self.extract_range(a, out);
                self.extract_range(b, out);
                return;
            }
            trace!("Unsplittable pocket in {:?}, keeping outer loops only", range);
        }

        out.extend(traced.into_iter().filter(|l| signed_area(l) > MIN_LOOP_AREA));
    }

    fn solid(&self, range: &NodeRange, i: i32, j: i32) -> bool {
        range.contains(i, j)
            && is_solid(
                self.field
                    .sample_clamped(self.grid.sample_x(i), self.grid.sample_y(j)),
            )
    }

    fn node_position(&self, i: i32, j: i32) -> Vec2 {
        Vec2::new(self.grid.sample_x(i) as f32, self.grid.sample_y(j) as f32)
    }

    /// Bisects the sign change between samples `from` and `to` along one
    /// axis; `at` maps a coordinate on that axis to a density sample.
    fn refine<F>(&self, from: i64, to: i64, at: F) -> f32
    where
        F: Fn(i64) -> bool,
    {
        let origin = at(from);
        let (mut lo, mut hi) = (from, to);
        for _ in 0..self.iterations {
            if hi - lo <= 1 {
                break;
            }
            let mid = lo + (hi - lo) / 2;
            if at(mid) == origin {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) as f32 * 0.5
    }

    /// Crossing point on a lattice edge known to change sign.
    fn edge_position(&self, range: &NodeRange, key: EdgeKey) -> Vec2 {
        let (a, b) = match key {
            EdgeKey::Horizontal(i, j) => ((i, j), (i + 1, j)),
            EdgeKey::Vertical(i, j) => ((i, j), (i, j + 1)),
        };
        match (range.contains(a.0, a.1), range.contains(b.0, b.1)) {
            (true, true) => match key {
                EdgeKey::Horizontal(i, j) => {
                    let y = self.grid.sample_y(j);
                    let x = self.refine(self.grid.sample_x(i), self.grid.sample_x(i + 1), |x| {
                        is_solid(self.field.sample_clamped(x, y))
                    });
                    Vec2::new(x, y as f32)
                },
                EdgeKey::Vertical(i, j) => {
                    let x = self.grid.sample_x(i);
                    let y = self.refine(self.grid.sample_y(j), self.grid.sample_y(j + 1), |y| {
                        is_solid(self.field.sample_clamped(x, y))
                    });
                    Vec2::new(x as f32, y)
                },
            },
            (true, false) => self.node_position(a.0, a.1),
            _ => self.node_position(b.0, b.1),
        }
    }

    fn trace_loops(&self, range: NodeRange) -> Vec<Polygon> {
        let mut next: AHashMap<EdgeKey, EdgeKey> = AHashMap::new();
        let mut positions: AHashMap<EdgeKey, Vec2> = AHashMap::new();
        let mut starts: Vec<EdgeKey> = Vec::new();

        for j in (range.j0 - 1)..=range.j1 {
            for i in (range.i0 - 1)..=range.i1 {
                let case = u8::from(self.solid(&range, i, j))
                    | u8::from(self.solid(&range, i + 1, j)) << 1
                    | u8::from(self.solid(&range, i + 1, j + 1)) << 2
                    | u8::from(self.solid(&range, i, j + 1)) << 3;
                if case == 0 || case == 15 {
                    continue;
                }

                let center_solid = (case == 5 || case == 10)
                    && range.contains(i, j)
                    && range.contains(i + 1, j + 1)
                    && is_solid(self.field.sample_clamped(
                        (self.grid.sample_x(i) + self.grid.sample_x(i + 1)) / 2,
                        (self.grid.sample_y(j) + self.grid.sample_y(j + 1)) / 2,
                    ));

                let key = |side: Side| match side {
                    Side::Bottom => EdgeKey::Horizontal(i, j),
                    Side::Top => EdgeKey::Horizontal(i, j + 1),
                    Side::Left => EdgeKey::Vertical(i, j),
                    Side::Right => EdgeKey::Vertical(i + 1, j),
                };

                for &(from, to) in case_segments(case, center_solid) {
                    let (from, to) = (key(from), key(to));
                    for edge in [from, to] {
                        positions
                            .entry(edge)
                            .or_insert_with(|| self.edge_position(&range, edge));
                    }
                    next.insert(from, to);
                    starts.push(from);
                }
            }
        }

        let mut visited: AHashSet<EdgeKey> = AHashSet::with_capacity(starts.len());
        let mut loops = Vec::new();

        'starts: for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let mut points = Vec::new();
            let mut current = start;
            loop {
                visited.insert(current);
                points.push(positions[&current]);
                match next.get(&current) {
                    Some(&following) if following == start => break,
                    Some(&following) if !visited.contains(&following) => current = following,
                    _ => {
                        trace!("Open contour at {:?}, dropping", current);
                        continue 'starts;
                    },
                }
            }

            remove_duplicates(&mut points, 1e-4);
            if points.len() >= 3 {
                loops.push(points);
            }
        }

        loops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{EMPTY, SOLID};

    fn grid(size: u32, squares: u32) -> ContourGrid {
        ContourGrid {
            x0: 0,
            y0: 0,
            width: size,
            height: size,
            squares_x: squares,
            squares_y: squares,
        }
    }

    #[test]
    fn test_empty_field_has_no_loops() {
        let field = DensityField::new(20, 20, 20, EMPTY).expect("field");
        let loops = ContourExtractor::new(&field, grid(20, 20), 2).extract();
        assert!(loops.is_empty());
    }

    #[test]
    fn test_full_field_is_clipped_to_window() {
        let field = DensityField::new(20, 20, 20, SOLID).expect("field");
        let loops = ContourExtractor::new(&field, grid(10, 10), 2).extract();
        assert_eq!(loops.len(), 1);
        let area = signed_area(&loops[0]);
        assert!((area - 100.0).abs() < 1e-3, "area was {area}");
    }

    #[test]
    fn test_disc_loop_is_counter_clockwise() {
        let field = DensityField::from_fn(40, 40, 40, |x, y| {
            let (dx, dy) = (x as f32 - 20.0, y as f32 - 20.0);
            if dx * dx + dy * dy < 64.0 {
                SOLID
            } else {
                EMPTY
            }
        })
        .expect("field");
        let loops = ContourExtractor::new(&field, grid(40, 40), 2).extract();
        assert_eq!(loops.len(), 1);
        let area = signed_area(&loops[0]);
        // pi * 8^2 ~ 201; the lattice approximation stays close.
        assert!(area > 150.0 && area < 260.0, "area was {area}");
    }

    #[test]
    fn test_pocket_is_split_away() {
        let field = DensityField::from_fn(20, 20, 20, |x, y| {
            if (8..12).contains(&x) && (8..12).contains(&y) {
                EMPTY
            } else {
                SOLID
            }
        })
        .expect("field");
        let loops = ContourExtractor::new(&field, grid(20, 20), 2).extract();
        assert!(loops.len() >= 2);
        for l in &loops {
            assert!(signed_area(l) > 0.0);
        }
        let total: f32 = loops.iter().map(|l| signed_area(l)).sum();
        assert!(total < 400.0 && total > 350.0, "total was {total}");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let field = DensityField::from_fn(30, 30, 30, |x, y| {
            if (x * 7 + y * 3) % 11 < 5 {
                SOLID
            } else {
                EMPTY
            }
        })
        .expect("field");
        let a = ContourExtractor::new(&field, grid(30, 15), 2).extract();
        let b = ContourExtractor::new(&field, grid(30, 15), 2).extract();
        assert_eq!(a, b);
    }
}
