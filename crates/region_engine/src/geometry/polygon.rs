//! Validated polygon snapshots and the containment test.

use super::predicates::{distance_to_segment, orientation, segments_intersect};
use crate::error::GeometryError;
use crate::types::{BoundingBox, Position, Vertex, VerticalBounds};

/// Minimum number of vertices a region polygon needs.
pub const MIN_VERTICES: usize = 3;

/// Polygons with an absolute area below this are rejected as degenerate.
pub const AREA_EPSILON: f64 = 1e-6;

/// Points closer than this to an edge are on the boundary, and therefore inside.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// Winding order of a polygon on the (x, z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

/// An immutable, validated region boundary.
///
/// A `Polygon` can only be obtained through [`Polygon::new`] or one of the edit
/// operations, all of which run [`validate`]. Edits return a fresh value, so a
/// region holding the previous snapshot never observes a half-edited boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    vertical_bounds: Option<VerticalBounds>,
    bounds: BoundingBox,
}

impl Polygon {
    /// Validates the vertex ring and builds a polygon from it.
    pub fn new(
        vertices: Vec<Vertex>,
        vertical_bounds: Option<VerticalBounds>,
    ) -> Result<Self, GeometryError> {
        validate(&vertices, vertical_bounds)?;
        let bounds = BoundingBox::enclosing(&vertices).ok_or_else(|| {
            GeometryError::DegeneratePolygon("polygon has no vertices".to_string())
        })?;

        Ok(Self {
            vertices,
            vertical_bounds,
            bounds,
        })
    }

    /// Vertices in ring order; the closing edge is implicit.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertical_bounds(&self) -> Option<VerticalBounds> {
        self.vertical_bounds
    }

    /// Axis-aligned box enclosing all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    /// Iterates over `(start, end)` pairs for every edge, including the
    /// closing edge from the last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn winding(&self) -> Winding {
        if self.signed_area() >= 0.0 {
            Winding::CounterClockwise
        } else {
            Winding::Clockwise
        }
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Full 3D containment: horizontal test plus the vertical interval when set.
    ///
    /// Boundary points (on an edge, on a vertex, or exactly at `min_y`/`max_y`)
    /// are inside.
    pub fn contains_point(&self, position: &Position) -> bool {
        if let Some(vertical) = self.vertical_bounds {
            if !vertical.contains(position.y) {
                return false;
            }
        }
        self.contains_xz(position.x, position.z)
    }

    /// Horizontal-only containment using the crossing number rule.
    pub fn contains_xz(&self, x: f64, z: f64) -> bool {
        if !(x.is_finite() && z.is_finite()) {
            return false;
        }

        let expanded = BoundingBox::new(
            self.bounds.min_x - BOUNDARY_EPSILON,
            self.bounds.min_z - BOUNDARY_EPSILON,
            self.bounds.max_x + BOUNDARY_EPSILON,
            self.bounds.max_z + BOUNDARY_EPSILON,
        );
        if !expanded.contains(x, z) {
            return false;
        }

        let point = Vertex::new(x, z);
        let mut inside = false;
        for (a, b) in self.edges() {
            if distance_to_segment(a, b, point) <= BOUNDARY_EPSILON {
                return true;
            }

            if (a.z > z) != (b.z > z) {
                let crossing_x = a.x + (z - a.z) * (b.x - a.x) / (b.z - a.z);
                if x < crossing_x {
                    inside = !inside;
                }
            }
        }

        inside
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

/// Shoelace formula over an implicitly closed ring.
pub fn signed_area(vertices: &[Vertex]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.z - b.x * a.z
        })
        .sum();

    twice_area / 2.0
}

/// Checks that `vertices` form a simple polygon.
///
/// Checks run in this order: vertical bounds, finite coordinates, vertex
/// count, distinct vertices, repeated consecutive vertices, area, then edge
/// intersections. A ring whose lobes cancel out to zero area is therefore
/// reported as degenerate rather than self-intersecting.
pub fn validate(
    vertices: &[Vertex],
    vertical_bounds: Option<VerticalBounds>,
) -> Result<(), GeometryError> {
    if let Some(bounds) = vertical_bounds {
        if !bounds.is_valid() {
            return Err(GeometryError::InvalidVerticalBounds {
                min_y: bounds.min_y,
                max_y: bounds.max_y,
            });
        }
    }

    if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(GeometryError::DegeneratePolygon(format!(
            "vertex {index} has a non-finite coordinate"
        )));
    }

    let n = vertices.len();
    if n < MIN_VERTICES {
        return Err(GeometryError::DegeneratePolygon(format!(
            "{n} vertices given, at least {MIN_VERTICES} required"
        )));
    }

    let distinct = vertices
        .iter()
        .enumerate()
        .filter(|(i, v)| !vertices[..*i].contains(v))
        .count();
    if distinct < MIN_VERTICES {
        return Err(GeometryError::DegeneratePolygon(format!(
            "only {distinct} distinct vertices"
        )));
    }

    for i in 0..n {
        let next = (i + 1) % n;
        if vertices[i] == vertices[next] {
            return Err(GeometryError::DegeneratePolygon(format!(
                "vertices {i} and {next} coincide"
            )));
        }
    }

    let area = signed_area(vertices).abs();
    if area < AREA_EPSILON {
        return Err(GeometryError::DegeneratePolygon(format!(
            "area {area} is below {AREA_EPSILON}"
        )));
    }

    // Adjacent edges share a vertex; they only conflict when the ring folds back.
    for i in 0..n {
        let prev = vertices[(i + n - 1) % n];
        let current = vertices[i];
        let next = vertices[(i + 1) % n];
        let backtracks = (current.x - prev.x) * (next.x - current.x)
            + (current.z - prev.z) * (next.z - current.z)
            < 0.0;
        if orientation(prev, current, next) == 0 && backtracks {
            return Err(GeometryError::SelfIntersecting {
                first_edge: (i + n - 1) % n,
                second_edge: i,
            });
        }
    }

    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = (vertices[i], vertices[(i + 1) % n]);
            let (b1, b2) = (vertices[j], vertices[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return Err(GeometryError::SelfIntersecting {
                    first_edge: i,
                    second_edge: j,
                });
            }
        }
    }

    Ok(())
}
