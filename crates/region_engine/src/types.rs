//! # Core Type Definitions
//!
//! Fundamental value types shared by the geometry kernel, the region store and
//! the query layer.
//!
//! ## Key Types
//!
//! - [`Vertex`] - A point on the horizontal (x, z) world plane
//! - [`Position`] - A full 3D world position used for queries and markers
//! - [`VerticalBounds`] - Inclusive vertical interval of a region
//! - [`BoundingBox`] - Axis-aligned box on the horizontal plane
//! - [`PlayerId`] - Identifier for region owners and members

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player.
///
/// Wraps a UUID so player ids cannot be confused with region keys or other
/// identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from its hyphenated string form.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A polygon corner on the horizontal world plane.
///
/// Serialized as a two element array `[x, z]` to keep region documents compact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vertex {
    pub x: f64,
    pub z: f64,
}

impl Vertex {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Euclidean distance on the horizontal plane.
    pub fn distance(&self, other: Vertex) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 2]> for Vertex {
    fn from([x, z]: [f64; 2]) -> Self {
        Self { x, z }
    }
}

impl From<Vertex> for [f64; 2] {
    fn from(vertex: Vertex) -> Self {
        [vertex.x, vertex.z]
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, z): (f64, f64)) -> Self {
        Self { x, z }
    }
}

/// 3D world position with double precision.
///
/// `y` is the vertical axis; regions are extruded polygons on the (x, z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projects the position onto the horizontal plane.
    pub fn horizontal(&self) -> Vertex {
        Vertex::new(self.x, self.z)
    }

    pub fn distance(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Inclusive vertical interval `[min_y, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalBounds {
    pub min_y: f64,
    pub max_y: f64,
}

impl VerticalBounds {
    pub const fn new(min_y: f64, max_y: f64) -> Self {
        Self { min_y, max_y }
    }

    /// Checks whether `y` lies inside the interval (both ends inclusive).
    pub fn contains(&self, y: f64) -> bool {
        y >= self.min_y && y <= self.max_y
    }

    pub fn is_valid(&self) -> bool {
        self.min_y.is_finite() && self.max_y.is_finite() && self.min_y <= self.max_y
    }
}

/// Axis-aligned box on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl BoundingBox {
    pub const fn new(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Smallest box enclosing every vertex, or `None` for an empty slice.
    pub fn enclosing(vertices: &[Vertex]) -> Option<Self> {
        let first = vertices.first()?;
        let mut bounds = Self::new(first.x, first.z, first.x, first.z);
        for vertex in &vertices[1..] {
            bounds.min_x = bounds.min_x.min(vertex.x);
            bounds.min_z = bounds.min_z.min(vertex.z);
            bounds.max_x = bounds.max_x.max(vertex.x);
            bounds.max_z = bounds.max_z.max(vertex.z);
        }
        Some(bounds)
    }

    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Touching boxes count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }
}
