//! JSON document format for the region store.
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "regions": [
//!     {
//!       "key": "spawn",
//!       "vertices": [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
//!       "vertical_bounds": { "min_y": -64.0, "max_y": 320.0 },
//!       "priority": 0,
//!       "owners": [],
//!       "members": [],
//!       "flags": { "tnt": "deny" },
//!       "created_at": 1700000000,
//!       "modified_at": 1700000000
//!     }
//!   ]
//! }
//! ```
//!
//! Regions are written in key order. Decoding re-validates every polygon.

use crate::error::CodecError;
use crate::geometry::Polygon;
use crate::region::{Flags, Region};
use crate::store::RegionStore;
use crate::types::{PlayerId, Vertex, VerticalBounds};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Version written by [`serialize`] and the only one [`deserialize`] accepts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    schema_version: u32,
    regions: Vec<RegionRecord>,
}

/// Read first so a newer document is reported as a version mismatch rather
/// than as whatever field it happens to break. Any JSON value is accepted
/// here; only the integer 1 passes.
#[derive(Debug, Deserialize)]
struct VersionHeader {
    schema_version: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegionRecord {
    key: String,
    vertices: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertical_bounds: Option<VerticalBounds>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    owners: BTreeSet<PlayerId>,
    #[serde(default)]
    members: BTreeSet<PlayerId>,
    #[serde(default)]
    flags: Flags,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    modified_at: u64,
}

impl From<&Region> for RegionRecord {
    fn from(region: &Region) -> Self {
        Self {
            key: region.key.clone(),
            vertices: region.polygon.vertices().to_vec(),
            vertical_bounds: region.polygon.vertical_bounds(),
            priority: region.priority,
            owners: region.owners.clone(),
            members: region.members.clone(),
            flags: region.flags.clone(),
            created_at: region.created_at,
            modified_at: region.modified_at,
        }
    }
}

impl RegionRecord {
    fn into_region(self) -> Result<Region, CodecError> {
        let polygon = Polygon::new(self.vertices, self.vertical_bounds).map_err(|source| {
            CodecError::GeometryValidationFailed {
                key: self.key.clone(),
                source,
            }
        })?;

        Ok(Region {
            key: self.key,
            polygon,
            priority: self.priority,
            owners: self.owners,
            members: self.members,
            flags: self.flags,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// Encodes regions (already in key order) as a pretty-printed document.
pub fn encode_regions<'a, I>(regions: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = &'a Region>,
{
    let document = Document {
        schema_version: SCHEMA_VERSION,
        regions: regions.into_iter().map(RegionRecord::from).collect(),
    };
    let bytes = serde_json::to_vec_pretty(&document)?;
    debug!(
        "Encoded {} regions into {} bytes",
        document.regions.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Serializes a consistent snapshot of `store`.
///
/// The store's read guard is held for the whole encoding, so no mutation can
/// land halfway through.
pub fn serialize(store: &RegionStore) -> Result<Vec<u8>, CodecError> {
    serialize_counted(store).map(|(bytes, _)| bytes)
}

/// Like [`serialize`], also returning how many regions the snapshot held.
pub(crate) fn serialize_counted(store: &RegionStore) -> Result<(Vec<u8>, usize), CodecError> {
    store.with_snapshot(|regions| {
        let count = regions.len();
        encode_regions(regions).map(|bytes| (bytes, count))
    })
}

/// Decodes and validates every region of a document.
pub fn decode_regions(bytes: &[u8]) -> Result<Vec<Region>, CodecError> {
    let header: VersionHeader = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;

    match header.schema_version {
        Some(version) if version.as_u64() == Some(u64::from(SCHEMA_VERSION)) => {}
        Some(found) => {
            return Err(CodecError::SchemaVersionMismatch {
                found: found.to_string(),
                expected: SCHEMA_VERSION,
            })
        }
        None => {
            return Err(CodecError::MalformedDocument(
                "missing field `schema_version`".to_string(),
            ))
        }
    }

    let document: Document = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;

    let mut seen = HashSet::with_capacity(document.regions.len());
    let mut regions = Vec::with_capacity(document.regions.len());
    for record in document.regions {
        if !seen.insert(record.key.clone()) {
            return Err(CodecError::MalformedDocument(format!(
                "duplicate region key `{}`",
                record.key
            )));
        }
        regions.push(record.into_region()?);
    }

    debug!("Decoded {} regions", regions.len());
    Ok(regions)
}

/// Decodes a document into a fresh store with its index bulk loaded.
pub fn deserialize(bytes: &[u8]) -> Result<RegionStore, CodecError> {
    decode_regions(bytes).map(RegionStore::from_regions)
}
