//! # Geometry Kernel
//!
//! Polygon representation and the planar algorithms regions are built on:
//! validation, point containment, area and perimeter, copy-on-write vertex
//! edits and outline rasterization.
//!
//! Boundary rule: a point lying on an edge or vertex (within
//! [`BOUNDARY_EPSILON`]) is inside the polygon.

mod edit;
mod polygon;
mod predicates;
mod raster;

pub use edit::nearest_edge_insert_index;
pub use polygon::{
    signed_area, validate, Polygon, Winding, AREA_EPSILON, BOUNDARY_EPSILON, MIN_VERTICES,
};
pub use predicates::{closest_point_on_segment, distance_to_segment, segments_intersect};
pub use raster::{trace_edge, Cell};
