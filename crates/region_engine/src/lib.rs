//! # Region Engine
//!
//! Polygonal region protection for block-based worlds: players outline an
//! area with markers, the outline becomes a named region with owners, members
//! and flags, and the host asks on every interaction which regions cover a
//! position and whether an action is allowed there.
//!
//! ## Components
//!
//! - **Geometry** ([`geometry`]): polygon validation, point containment with
//!   inclusive boundaries, copy-on-write vertex edits, boundary rasterization
//! - **Store** ([`store`]): concurrent key → region map kept in step with an
//!   R*-tree over region bounding boxes
//! - **Query** ([`query`]): ordered `regions_at`, flag resolution and the
//!   owner/member bypass
//! - **Codec** ([`codec`]) and **Persistence** ([`persistence`]): versioned
//!   JSON documents written atomically to disk
//! - **Selections** ([`selection`]): per-player marker sessions
//! - **Engine** ([`engine`]): owns all of the above for a host process
//!
//! ## Example
//!
//! ```rust,no_run
//! use region_engine::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = RegionEngine::init(EngineConfig::new("regions.json"))?;
//!
//!     let spawn = RegionDefinition::new(
//!         "spawn",
//!         vec![
//!             Vertex::new(0.0, 0.0),
//!             Vertex::new(10.0, 0.0),
//!             Vertex::new(10.0, 10.0),
//!             Vertex::new(0.0, 10.0),
//!         ],
//!     )
//!     .with_flag("pvp", FlagState::Deny);
//!     engine.store().define(spawn, DefineMode::CreateOnly)?;
//!
//!     let here = Position::new(5.0, 64.0, 5.0);
//!     assert!(!engine.query().is_allowed(&here, "pvp", true));
//!
//!     engine.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod persistence;
pub mod query;
pub mod region;
pub mod selection;
pub mod store;
pub mod types;
pub mod utils;

pub use codec::{decode_regions, deserialize, serialize, SCHEMA_VERSION};
pub use engine::{EngineConfig, LoadFailurePolicy, RegionEngine};
pub use error::{
    CodecError, EngineError, GeometryError, PersistenceError, SelectionError, StoreError,
};
pub use geometry::{Polygon, Winding};
pub use persistence::RegionFile;
pub use query::{QueryService, QueryStats};
pub use region::{protective_flags, FlagState, Flags, Region, RegionDefinition};
pub use selection::{MarkerPlacement, MarkerRemoval, RegionDefaults, SelectionStore};
pub use store::{DefineMode, RegionStore, StoreStats};
pub use types::{BoundingBox, PlayerId, Position, Vertex, VerticalBounds};
