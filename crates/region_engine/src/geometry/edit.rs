//! Copy-on-write polygon edits.
//!
//! Every operation validates the edited ring and returns a new [`Polygon`];
//! the receiver is left untouched.

use super::polygon::Polygon;
use super::predicates::distance_to_segment;
use crate::error::GeometryError;
use crate::types::{Vertex, VerticalBounds};

/// Index at which `vertex` should be inserted into the ring `points`.
///
/// The vertex goes into the edge it is closest to, so a player clicking near
/// an existing edge bends that edge instead of spanning the whole shape.
/// Ties resolve to the earliest edge. An empty ring inserts at 0; with no
/// usable edge the vertex is appended.
pub fn nearest_edge_insert_index(points: &[Vertex], vertex: Vertex) -> usize {
    if points.is_empty() {
        return 0;
    }

    let mut min_distance = f64::MAX;
    let mut insert_index = points.len();

    for i in 0..points.len() {
        let start = points[i];
        let end = points[(i + 1) % points.len()];
        if start == end {
            continue;
        }

        let distance = distance_to_segment(start, end, vertex);
        if distance < min_distance {
            min_distance = distance;
            insert_index = i + 1;
        }
    }

    insert_index
}

impl Polygon {
    /// Adds a vertex on the edge nearest to it.
    pub fn add_vertex(&self, vertex: Vertex) -> Result<Polygon, GeometryError> {
        let index = nearest_edge_insert_index(self.vertices(), vertex);
        self.insert_vertex(index, vertex)
    }

    /// Inserts a vertex before position `index` (`index == len` appends).
    pub fn insert_vertex(&self, index: usize, vertex: Vertex) -> Result<Polygon, GeometryError> {
        let len = self.len();
        if index > len {
            return Err(GeometryError::VertexIndexOutOfRange { index, len });
        }

        let mut vertices = self.vertices().to_vec();
        vertices.insert(index, vertex);
        Polygon::new(vertices, self.vertical_bounds())
    }

    /// Removes the vertex at `index`; fails if fewer than three would remain.
    pub fn remove_vertex(&self, index: usize) -> Result<Polygon, GeometryError> {
        let len = self.len();
        if index >= len {
            return Err(GeometryError::VertexIndexOutOfRange { index, len });
        }

        let mut vertices = self.vertices().to_vec();
        vertices.remove(index);
        Polygon::new(vertices, self.vertical_bounds())
    }

    /// Moves the vertex at `index` to `vertex`.
    pub fn move_vertex(&self, index: usize, vertex: Vertex) -> Result<Polygon, GeometryError> {
        let len = self.len();
        if index >= len {
            return Err(GeometryError::VertexIndexOutOfRange { index, len });
        }

        let mut vertices = self.vertices().to_vec();
        vertices[index] = vertex;
        Polygon::new(vertices, self.vertical_bounds())
    }

    /// Replaces (or clears) the vertical interval.
    pub fn with_vertical_bounds(
        &self,
        vertical_bounds: Option<VerticalBounds>,
    ) -> Result<Polygon, GeometryError> {
        Polygon::new(self.vertices().to_vec(), vertical_bounds)
    }
}
