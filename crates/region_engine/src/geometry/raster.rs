//! Boundary rasterization onto the block grid.
//!
//! Used to place walls or fences along a region outline: every edge is walked
//! as a 4-connected line between the floored vertex coordinates, so the
//! resulting cells form a gap-free border a player cannot slip through
//! diagonally.

use super::polygon::Polygon;
use crate::types::Vertex;
use std::collections::BTreeSet;

/// Integer block cell on the horizontal plane, `(x, z)`.
pub type Cell = (i64, i64);

fn to_cell(vertex: Vertex) -> Cell {
    (vertex.x.floor() as i64, vertex.z.floor() as i64)
}

/// Adds every cell on the 4-connected line from `from` to `to` (both ends
/// included) to `cells`.
pub fn trace_edge(from: Cell, to: Cell, cells: &mut BTreeSet<Cell>) {
    let (mut x, mut z) = from;
    let mut delta_x = (to.0 - from.0).abs();
    let mut delta_z = (to.1 - from.1).abs();
    let step_x = if to.0 > from.0 { 1 } else { -1 };
    let step_z = if to.1 > from.1 { 1 } else { -1 };

    let mut error = delta_x - delta_z;
    let steps = 1 + delta_x + delta_z;
    delta_x *= 2;
    delta_z *= 2;

    for _ in 0..steps {
        cells.insert((x, z));
        if error > 0 {
            x += step_x;
            error -= delta_z;
        } else {
            z += step_z;
            error += delta_x;
        }
    }
}

impl Polygon {
    /// All block cells along the polygon outline, including the closing edge.
    pub fn boundary_cells(&self) -> BTreeSet<Cell> {
        let mut cells = BTreeSet::new();
        for (start, end) in self.edges() {
            trace_edge(to_cell(start), to_cell(end), &mut cells);
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_axis_aligned_edges() {
        let mut cells = BTreeSet::new();
        trace_edge((0, 0), (3, 0), &mut cells);
        assert_eq!(cells.into_iter().collect::<Vec<_>>(), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);

        let mut cells = BTreeSet::new();
        trace_edge((0, 2), (0, -1), &mut cells);
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&(0, -1)));
        assert!(cells.contains(&(0, 2)));
    }

    #[test]
    fn test_trace_diagonal_is_four_connected() {
        let mut cells = BTreeSet::new();
        trace_edge((0, 0), (2, 2), &mut cells);
        assert_eq!(cells.len(), 5);
        assert!(cells.contains(&(0, 0)));
        assert!(cells.contains(&(2, 2)));

        // Every consecutive cell pair along the walk shares a side.
        let ordered = [(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)];
        for cell in ordered {
            assert!(cells.contains(&cell), "missing {cell:?}");
        }
    }

    #[test]
    fn test_square_outline() {
        let polygon = Polygon::new(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(4.0, 0.0),
                Vertex::new(4.0, 4.0),
                Vertex::new(0.0, 4.0),
            ],
            None,
        )
        .unwrap();

        let cells = polygon.boundary_cells();
        // A 5x5 block ring: 25 cells minus the 3x3 interior.
        assert_eq!(cells.len(), 16);
        assert!(cells.contains(&(0, 0)));
        assert!(cells.contains(&(4, 2)));
        assert!(!cells.contains(&(2, 2)));
    }

    #[test]
    fn test_fractional_vertices_floor_to_block() {
        let polygon = Polygon::new(
            vec![
                Vertex::new(0.5, 0.5),
                Vertex::new(2.5, 0.5),
                Vertex::new(2.5, 2.5),
                Vertex::new(0.5, 2.5),
            ],
            None,
        )
        .unwrap();

        let cells = polygon.boundary_cells();
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&(1, 1)));
        assert!(cells.contains(&(2, 2)));
    }
}
