//! Low-level planar predicates used by the polygon routines.

use crate::types::Vertex;

/// Tolerance below which a cross product is treated as collinear.
pub const COLLINEAR_EPSILON: f64 = 1e-12;

/// Twice the signed area of triangle `(a, b, c)`.
///
/// Positive when `c` lies to the left of `a -> b` (counter-clockwise turn).
pub fn cross(a: Vertex, b: Vertex, c: Vertex) -> f64 {
    (b.x - a.x) * (c.z - a.z) - (b.z - a.z) * (c.x - a.x)
}

/// Sign of the turn `a -> b -> c`: 1, -1 or 0 for collinear points.
pub fn orientation(a: Vertex, b: Vertex, c: Vertex) -> i8 {
    let value = cross(a, b, c);
    let scale = (b.x - a.x).abs().max((b.z - a.z).abs()).max(1.0);
    if value.abs() <= COLLINEAR_EPSILON * scale * scale {
        0
    } else if value > 0.0 {
        1
    } else {
        -1
    }
}

/// Whether collinear point `p` lies within the bounding box of segment `a-b`.
fn within_segment_box(a: Vertex, b: Vertex, p: Vertex) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.z >= a.z.min(b.z) && p.z <= a.z.max(b.z)
}

/// Closed-segment intersection test, including touching endpoints and
/// collinear overlap.
pub fn segments_intersect(p1: Vertex, p2: Vertex, q1: Vertex, q2: Vertex) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_segment_box(p1, p2, q1))
        || (o2 == 0 && within_segment_box(p1, p2, q2))
        || (o3 == 0 && within_segment_box(q1, q2, p1))
        || (o4 == 0 && within_segment_box(q1, q2, p2))
}

/// Closest point to `p` on segment `a-b`.
///
/// A zero-length segment yields `a`.
pub fn closest_point_on_segment(a: Vertex, b: Vertex, p: Vertex) -> Vertex {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let length_squared = dx * dx + dz * dz;
    if length_squared == 0.0 {
        return a;
    }

    let t = ((p.x - a.x) * dx + (p.z - a.z) * dz) / length_squared;
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        Vertex::new(a.x + t * dx, a.z + t * dz)
    }
}

/// Distance from `p` to the closed segment `a-b`.
pub fn distance_to_segment(a: Vertex, b: Vertex, p: Vertex) -> f64 {
    p.distance(closest_point_on_segment(a, b, p))
}
