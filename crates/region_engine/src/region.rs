//! Region and flag types.
//!
//! Decoupled from store and query logic so region rules can be reused or
//! tested independently.

use crate::geometry::Polygon;
use crate::types::{PlayerId, Vertex, VerticalBounds};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// State of a single region flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    Allow,
    Deny,
}

impl FlagState {
    pub fn is_allowed(self) -> bool {
        matches!(self, FlagState::Allow)
    }
}

/// Flag name to state, ordered by name so documents are stable.
pub type Flags = BTreeMap<String, FlagState>;

/// Flags applied to newly confirmed regions: every destructive interaction is
/// denied for non-members.
pub fn protective_flags() -> Flags {
    [
        "block-break",
        "chest-access",
        "block-place",
        "destroy-vehicle",
        "fire-spread",
        "mob-damage",
        "tnt",
    ]
    .into_iter()
    .map(|flag| (flag.to_string(), FlagState::Deny))
    .collect()
}

/// A named, prioritized polygonal area with owners, members and flags.
///
/// Regions handed out by the store are immutable `Arc<Region>` snapshots; a
/// mutation builds a new `Region` and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub key: String,
    pub polygon: Polygon,
    /// Higher priority wins where regions overlap.
    pub priority: i32,
    pub owners: BTreeSet<PlayerId>,
    pub members: BTreeSet<PlayerId>,
    pub flags: Flags,
    /// Unix seconds
    pub created_at: u64,
    /// Unix seconds
    pub modified_at: u64,
}

impl Region {
    /// Creates a region with no owners, members or flags, stamped now.
    pub fn new(key: impl Into<String>, polygon: Polygon, priority: i32) -> Self {
        let now = current_timestamp();
        Self {
            key: key.into(),
            polygon,
            priority,
            owners: BTreeSet::new(),
            members: BTreeSet::new(),
            flags: Flags::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Returns the state of `flag` if this region defines it.
    pub fn flag(&self, flag: &str) -> Option<FlagState> {
        self.flags.get(flag).copied()
    }

    /// Returns true if the player owns the region or is a member of it.
    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.owners.contains(player) || self.members.contains(player)
    }
}

/// Unvalidated input for [`RegionStore::define`](crate::store::RegionStore::define).
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDefinition {
    pub key: String,
    pub vertices: Vec<Vertex>,
    pub vertical_bounds: Option<VerticalBounds>,
    pub priority: i32,
    pub owners: BTreeSet<PlayerId>,
    pub members: BTreeSet<PlayerId>,
    pub flags: Flags,
}

impl RegionDefinition {
    pub fn new(key: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        Self {
            key: key.into(),
            vertices,
            vertical_bounds: None,
            priority: 0,
            owners: BTreeSet::new(),
            members: BTreeSet::new(),
            flags: Flags::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_vertical_bounds(mut self, bounds: VerticalBounds) -> Self {
        self.vertical_bounds = Some(bounds);
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>, state: FlagState) -> Self {
        self.flags.insert(flag.into(), state);
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owners.insert(owner);
        self
    }

    pub fn with_member(mut self, member: PlayerId) -> Self {
        self.members.insert(member);
        self
    }
}
