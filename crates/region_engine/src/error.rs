//! Error types for the region engine.
//!
//! Each layer has its own enum so callers can tell a rejected polygon apart
//! from a missing region or an unreadable region file.

use thiserror::Error;

/// Reasons a vertex list cannot form a region polygon.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate polygon: {0}")]
    DegeneratePolygon(String),

    #[error("Self-intersecting polygon: edge {first_edge} crosses edge {second_edge}")]
    SelfIntersecting { first_edge: usize, second_edge: usize },

    #[error("Invalid vertical bounds: min_y {min_y} is above max_y {max_y}")]
    InvalidVerticalBounds { min_y: f64, max_y: f64 },

    #[error("Vertex index {index} out of range for polygon with {len} vertices")]
    VertexIndexOutOfRange { index: usize, len: usize },
}

/// Errors returned by region store mutations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Region already exists: {0}")]
    DuplicateKey(String),

    #[error("Region not found: {0}")]
    NotFound(String),

    #[error("Invalid geometry for region {key}: {source}")]
    InvalidGeometry {
        key: String,
        #[source]
        source: GeometryError,
    },
}

/// Errors raised while encoding or decoding a region document.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed region document: {0}")]
    MalformedDocument(String),

    #[error("Unsupported schema version {found} (expected {expected})")]
    SchemaVersionMismatch { found: String, expected: u32 },

    #[error("Region {key} failed geometry validation: {source}")]
    GeometryValidationFailed {
        key: String,
        #[source]
        source: GeometryError,
    },

    #[error("Failed to encode region document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised while reading or writing the region file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to replace region file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Errors raised by marker selection sessions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("A marker is already placed at this position")]
    AlreadyPlaced,

    #[error("No markers placed")]
    NoMarkers,

    #[error("No marker at this position")]
    NotAMarker,

    #[error("Only {placed} of {required} markers placed")]
    NotEnoughMarkers { placed: usize, required: usize },

    #[error("Region name contains invalid characters: {invalid}")]
    InvalidRegionName { invalid: String },
}

/// Errors raised by the engine lifecycle.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
}
