//! Polygon tools: winding, simplification, and convex decomposition.
//!
//! Polygons are plain vertex lists in counter-clockwise order (positive
//! signed area, y axis up). The last vertex connects back to the first.

use glam::Vec2;
use tracing::trace;

/// A closed polygon as an ordered vertex list.
pub type Polygon = Vec<Vec2>;

/// Twice the signed area of triangle `(a, b, c)`; positive when
/// counter-clockwise.
#[inline]
fn area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

#[inline]
fn left(a: Vec2, b: Vec2, c: Vec2) -> bool {
    area(a, b, c) > 0.0
}

#[inline]
fn left_on(a: Vec2, b: Vec2, c: Vec2) -> bool {
    area(a, b, c) >= 0.0
}

#[inline]
fn right(a: Vec2, b: Vec2, c: Vec2) -> bool {
    area(a, b, c) < 0.0
}

#[inline]
fn right_on(a: Vec2, b: Vec2, c: Vec2) -> bool {
    area(a, b, c) <= 0.0
}

/// Signed area of a polygon (positive when counter-clockwise).
#[must_use]
pub fn signed_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let doubled: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum();
    doubled * 0.5
}

/// Returns true if the polygon winds counter-clockwise.
#[must_use]
pub fn is_counter_clockwise(points: &[Vec2]) -> bool {
    signed_area(points) > 0.0
}

/// Reverses the vertex order of a clockwise polygon.
pub fn force_counter_clockwise(points: &mut [Vec2]) {
    if signed_area(points) < 0.0 {
        points.reverse();
    }
}

/// Returns true if every corner of the polygon turns left (or is straight).
#[must_use]
pub fn is_convex(points: &[Vec2], tolerance: f32) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| area(points[i], points[(i + 1) % n], points[(i + 2) % n]) >= -tolerance)
}

/// Removes consecutive vertices closer than `epsilon`, including a closing
/// vertex that repeats the first one.
pub fn remove_duplicates(points: &mut Vec<Vec2>, epsilon: f32) {
    let epsilon_sq = epsilon * epsilon;
    points.dedup_by(|next, prev| next.distance_squared(*prev) <= epsilon_sq);
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if first.distance_squared(last) <= epsilon_sq {
            points.pop();
        } else {
            break;
        }
    }
}

/// Drops every vertex lying on the line through its two neighbours.
///
/// `tolerance` bounds twice the area of the triangle formed with the
/// neighbours; zero removes exactly collinear vertices only.
#[must_use]
pub fn collinear_simplify(points: &[Vec2], tolerance: f32) -> Polygon {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            area(prev, points[i], next).abs() > tolerance
        })
        .map(|i| points[i])
        .collect()
}

/// Intersection of the infinite lines `p1p2` and `q1q2`.
fn line_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = a1 * p1.x + b1 * p1.y;
    let a2 = q2.y - q1.y;
    let b2 = q1.x - q2.x;
    let c2 = a2 * q1.x + b2 * q1.y;
    let det = a1 * b2 - a2 * b1;
    if det.abs() <= f32::EPSILON {
        return None;
    }
    Some(Vec2::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det))
}

/// Returns true if segments `p1p2` and `p3p4` intersect anywhere other than
/// at their shared start.
fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    let a = p4.y - p3.y;
    let b = p2.x - p1.x;
    let c = p4.x - p3.x;
    let d = p2.y - p1.y;
    let denom = a * b - c * d;
    if denom.abs() <= f32::EPSILON {
        return false;
    }
    let e = p1.y - p3.y;
    let f = p1.x - p3.x;
    let ua = (c * e - a * f) / denom;
    if !(0.0..=1.0).contains(&ua) {
        return false;
    }
    let ub = (b * e - d * f) / denom;
    (0.0..=1.0).contains(&ub) && (ua != 0.0 || ub != 0.0)
}

/// Cyclic view over a vertex slice addressed with signed indices.
struct Ring<'a> {
    vertices: &'a [Vec2],
}

impl Ring<'_> {
    fn len(&self) -> isize {
        self.vertices.len() as isize
    }

    fn at(&self, i: isize) -> Vec2 {
        self.vertices[i.rem_euclid(self.len()) as usize]
    }

    fn is_reflex(&self, i: isize) -> bool {
        right(self.at(i - 1), self.at(i), self.at(i + 1))
    }

    /// Vertices `i..=j`, wrapping around the end.
    fn copy(&self, i: isize, j: isize) -> Polygon {
        let mut j = j;
        while j < i {
            j += self.len();
        }
        (i..=j).map(|k| self.at(k)).collect()
    }

    fn can_see(&self, i: isize, j: isize) -> bool {
        let n = self.len();
        let (i, j) = (i.rem_euclid(n), j.rem_euclid(n));
        let (vi, vj) = (self.at(i), self.at(j));

        if self.is_reflex(i) {
            if left_on(vi, self.at(i - 1), vj) && right_on(vi, self.at(i + 1), vj) {
                return false;
            }
        } else if right_on(vi, self.at(i + 1), vj) || left_on(vi, self.at(i - 1), vj) {
            return false;
        }

        if self.is_reflex(j) {
            if left_on(vj, self.at(j - 1), vi) && right_on(vj, self.at(j + 1), vi) {
                return false;
            }
        } else if right_on(vj, self.at(j + 1), vi) || left_on(vj, self.at(j - 1), vi) {
            return false;
        }

        for k in 0..n {
            let k1 = (k + 1) % n;
            if k1 == i || k == i || k1 == j || k == j {
                continue;
            }
            if segments_intersect(vi, vj, self.at(k), self.at(k1)) {
                return false;
            }
        }
        true
    }
}

/// Splits a simple counter-clockwise polygon into convex pieces of at most
/// `max_vertices` vertices (Bayazit's decomposition).
///
/// Degenerate input yields fewer (possibly zero) pieces rather than an error.
#[must_use]
pub fn convex_partition(polygon: &[Vec2], max_vertices: usize) -> Vec<Polygon> {
    let mut pieces = Vec::new();
    let mut budget = 16 * polygon.len() + 64;
    partition_into(polygon, max_vertices.max(3), &mut budget, &mut pieces);
    pieces
}

fn partition_into(vertices: &[Vec2], max_vertices: usize, budget: &mut usize, out: &mut Vec<Polygon>) {
    if vertices.len() < 3 {
        return;
    }
    if *budget == 0 {
        trace!("Convex partition budget exhausted, dropping {} vertices", vertices.len());
        return;
    }
    *budget -= 1;

    let ring = Ring { vertices };
    let n = ring.len();

    for i in 0..n {
        if !ring.is_reflex(i) {
            continue;
        }

        let mut lower_dist = f32::MAX;
        let mut upper_dist = f32::MAX;
        let mut lower_int = Vec2::ZERO;
        let mut upper_int = Vec2::ZERO;
        let mut lower_index = 0;
        let mut upper_index = 0;

        for j in 0..n {
            if left(ring.at(i - 1), ring.at(i), ring.at(j))
                && right_on(ring.at(i - 1), ring.at(i), ring.at(j - 1))
            {
                if let Some(p) = line_intersect(ring.at(i - 1), ring.at(i), ring.at(j), ring.at(j - 1)) {
                    if right(ring.at(i + 1), ring.at(i), p) {
                        let d = ring.at(i).distance_squared(p);
                        if d < lower_dist {
                            lower_dist = d;
                            lower_int = p;
                            lower_index = j;
                        }
                    }
                }
            }

            if left(ring.at(i + 1), ring.at(i), ring.at(j + 1))
                && right_on(ring.at(i + 1), ring.at(i), ring.at(j))
            {
                if let Some(p) = line_intersect(ring.at(i + 1), ring.at(i), ring.at(j), ring.at(j + 1)) {
                    if left(ring.at(i - 1), ring.at(i), p) {
                        let d = ring.at(i).distance_squared(p);
                        if d < upper_dist {
                            upper_dist = d;
                            upper_index = j;
                            upper_int = p;
                        }
                    }
                }
            }
        }

        if lower_dist == f32::MAX || upper_dist == f32::MAX {
            trace!("Reflex vertex {i} has no opposite edge, dropping polygon");
            return;
        }

        let (lower, upper) = if lower_index == (upper_index + 1) % n {
            // No vertex to connect to: cut through the middle of the edge.
            let p = (lower_int + upper_int) * 0.5;
            let mut lower = ring.copy(i, upper_index);
            lower.push(p);
            let mut upper = ring.copy(lower_index, i);
            upper.push(p);
            (lower, upper)
        } else {
            let mut highest_score = 0.0f64;
            let mut best_index = lower_index;
            let mut upper_index = upper_index;
            while upper_index < lower_index {
                upper_index += n;
            }
            for j in lower_index..=upper_index {
                if !ring.can_see(i, j) {
                    continue;
                }
                let mut score = 1.0 / (f64::from(ring.at(i).distance_squared(ring.at(j))) + 1.0);
                if ring.is_reflex(j) {
                    if right_on(ring.at(j - 1), ring.at(j), ring.at(i))
                        && left_on(ring.at(j + 1), ring.at(j), ring.at(i))
                    {
                        score += 3.0;
                    } else {
                        score += 2.0;
                    }
                } else {
                    score += 1.0;
                }
                if score > highest_score {
                    best_index = j;
                    highest_score = score;
                }
            }
            (ring.copy(i, best_index), ring.copy(best_index, i))
        };

        partition_into(&lower, max_vertices, budget, out);
        partition_into(&upper, max_vertices, budget, out);
        return;
    }

    // Already convex; split only to respect the vertex cap.
    if vertices.len() > max_vertices {
        let half = n / 2;
        partition_into(&ring.copy(0, half), max_vertices, budget, out);
        partition_into(&ring.copy(half, 0), max_vertices, budget, out);
    } else {
        out.push(vertices.to_vec());
    }
}
