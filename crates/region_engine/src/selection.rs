//! Per-player marker sessions used to draft a polygon before it becomes a
//! region.
//!
//! Markers keep their full position so a marker can be matched again by the
//! block it was placed on; only `x` and `z` shape the polygon.

use crate::error::SelectionError;
use crate::geometry::{nearest_edge_insert_index, MIN_VERTICES};
use crate::region::{protective_flags, Flags, Region, RegionDefinition};
use crate::types::{PlayerId, Position, Vertex, VerticalBounds};
use crate::utils::validate_region_key;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings applied to regions created from a marker selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefaults {
    #[serde(default = "default_min_y")]
    pub min_y: f64,
    #[serde(default = "default_max_y")]
    pub max_y: f64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "protective_flags")]
    pub flags: Flags,
}

fn default_min_y() -> f64 {
    -64.0
}

fn default_max_y() -> f64 {
    320.0
}

impl Default for RegionDefaults {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
            priority: 0,
            flags: protective_flags(),
        }
    }
}

impl RegionDefaults {
    pub fn vertical_bounds(&self) -> VerticalBounds {
        VerticalBounds::new(self.min_y, self.max_y)
    }
}

/// Where a new marker landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPlacement {
    /// Position of the marker in the ring.
    pub index: usize,
    /// Markers in the session after the insert.
    pub total: usize,
}

/// Which marker was taken out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRemoval {
    pub index: usize,
    pub remaining: usize,
}

/// Marker sessions keyed by player.
#[derive(Debug, Default)]
pub struct SelectionStore {
    sessions: DashMap<PlayerId, Vec<Position>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a marker on the ring edge nearest to it.
    pub fn add_marker(
        &self,
        player: PlayerId,
        position: Position,
    ) -> Result<MarkerPlacement, SelectionError> {
        let mut markers = self.sessions.entry(player).or_default();
        if markers.contains(&position) {
            return Err(SelectionError::AlreadyPlaced);
        }

        let ring: Vec<Vertex> = markers.iter().map(Position::horizontal).collect();
        let index = nearest_edge_insert_index(&ring, position.horizontal());
        markers.insert(index, position);

        let placement = MarkerPlacement {
            index,
            total: markers.len(),
        };
        debug!(
            "Player {} placed marker {} of {}",
            player, placement.index, placement.total
        );
        Ok(placement)
    }

    /// Removes the marker placed exactly at `position`.
    pub fn remove_marker(
        &self,
        player: PlayerId,
        position: Position,
    ) -> Result<MarkerRemoval, SelectionError> {
        let mut markers = match self.sessions.get_mut(&player) {
            Some(markers) if !markers.is_empty() => markers,
            _ => return Err(SelectionError::NoMarkers),
        };

        let index = markers
            .iter()
            .position(|marker| *marker == position)
            .ok_or(SelectionError::NotAMarker)?;
        markers.remove(index);

        Ok(MarkerRemoval {
            index,
            remaining: markers.len(),
        })
    }

    /// Drops the player's session; returns how many markers it held.
    pub fn clear(&self, player: &PlayerId) -> usize {
        self.sessions
            .remove(player)
            .map(|(_, markers)| markers.len())
            .unwrap_or(0)
    }

    /// Copy of the player's markers in ring order.
    pub fn markers(&self, player: &PlayerId) -> Vec<Position> {
        self.sessions
            .get(player)
            .map(|markers| markers.clone())
            .unwrap_or_default()
    }

    pub fn has_session(&self, player: &PlayerId) -> bool {
        self.sessions.contains_key(player)
    }

    /// Number of players with an open session.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Replaces the player's session with the vertices of `region`, so its
    /// outline can be edited and confirmed again.
    pub fn load_region(&self, player: PlayerId, region: &Region) -> usize {
        let y = region
            .polygon
            .vertical_bounds()
            .map(|bounds| bounds.min_y)
            .unwrap_or(0.0);
        let markers: Vec<Position> = region
            .polygon
            .vertices()
            .iter()
            .map(|vertex| Position::new(vertex.x, y, vertex.z))
            .collect();
        let count = markers.len();
        self.sessions.insert(player, markers);
        count
    }

    /// Builds a region definition from the player's markers.
    ///
    /// The session is kept; callers clear it once the region is stored.
    pub fn confirm(
        &self,
        player: PlayerId,
        key: &str,
        defaults: &RegionDefaults,
    ) -> Result<RegionDefinition, SelectionError> {
        self.confirm_snapshot(player, key, defaults)
            .map(|(definition, _)| definition)
    }

    /// Like [`confirm`](Self::confirm), also returning the markers the
    /// definition was built from for [`clear_if_unchanged`](Self::clear_if_unchanged).
    pub(crate) fn confirm_snapshot(
        &self,
        player: PlayerId,
        key: &str,
        defaults: &RegionDefaults,
    ) -> Result<(RegionDefinition, Vec<Position>), SelectionError> {
        let markers = self.markers(&player);
        if markers.is_empty() {
            return Err(SelectionError::NoMarkers);
        }
        if markers.len() < MIN_VERTICES {
            return Err(SelectionError::NotEnoughMarkers {
                placed: markers.len(),
                required: MIN_VERTICES,
            });
        }
        validate_region_key(key).map_err(|invalid| SelectionError::InvalidRegionName { invalid })?;

        let vertices = markers.iter().map(Position::horizontal).collect();
        let definition = RegionDefinition::new(key, vertices)
            .with_vertical_bounds(defaults.vertical_bounds())
            .with_priority(defaults.priority)
            .with_flags(defaults.flags.clone())
            .with_owner(player);
        Ok((definition, markers))
    }

    /// Drops the player's session only if it still holds exactly `expected`.
    /// Returns whether it was dropped.
    pub fn clear_if_unchanged(&self, player: &PlayerId, expected: &[Position]) -> bool {
        self.sessions
            .remove_if(player, |_, markers| markers.as_slice() == expected)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::region::FlagState;

    fn at(x: f64, z: f64) -> Position {
        Position::new(x, 64.0, z)
    }

    fn place_square(store: &SelectionStore, player: PlayerId) {
        for position in [at(0.0, 0.0), at(10.0, 0.0), at(10.0, 10.0), at(0.0, 10.0)] {
            store.add_marker(player, position).unwrap();
        }
    }

    #[test]
    fn test_markers_follow_nearest_edge() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        place_square(&store, player);
        assert_eq!(
            store.markers(&player),
            vec![at(0.0, 0.0), at(0.0, 10.0), at(10.0, 10.0), at(10.0, 0.0)]
        );

        // Closest to the closing edge (10, 0) -> (0, 0), so it is appended.
        let placement = store.add_marker(player, at(5.0, -2.0)).unwrap();
        assert_eq!(placement, MarkerPlacement { index: 4, total: 5 });

        let placement = store.add_marker(player, at(-1.0, 5.0)).unwrap();
        assert_eq!(placement, MarkerPlacement { index: 1, total: 6 });
        assert_eq!(store.markers(&player)[1], at(-1.0, 5.0));
    }

    #[test]
    fn test_duplicate_marker_rejected() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        store.add_marker(player, at(1.0, 1.0)).unwrap();
        assert_eq!(
            store.add_marker(player, at(1.0, 1.0)),
            Err(SelectionError::AlreadyPlaced)
        );
        // Same column, different height is a different block.
        assert!(store.add_marker(player, Position::new(1.0, 70.0, 1.0)).is_ok());
    }

    #[test]
    fn test_remove_marker() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        assert_eq!(
            store.remove_marker(player, at(0.0, 0.0)),
            Err(SelectionError::NoMarkers)
        );

        place_square(&store, player);
        assert_eq!(
            store.remove_marker(player, at(3.0, 3.0)),
            Err(SelectionError::NotAMarker)
        );
        assert_eq!(
            store.remove_marker(player, at(10.0, 0.0)),
            Ok(MarkerRemoval {
                index: 3,
                remaining: 3
            })
        );
        assert_eq!(store.markers(&player).len(), 3);
    }

    #[test]
    fn test_sessions_are_per_player() {
        let store = SelectionStore::new();
        let alice = PlayerId::new();
        let bob = PlayerId::new();
        place_square(&store, alice);
        store.add_marker(bob, at(50.0, 50.0)).unwrap();

        assert_eq!(store.markers(&alice).len(), 4);
        assert_eq!(store.markers(&bob).len(), 1);
        assert_eq!(store.session_count(), 2);

        assert_eq!(store.clear(&alice), 4);
        assert!(!store.has_session(&alice));
        assert_eq!(store.clear(&alice), 0);
        assert!(store.has_session(&bob));
    }

    #[test]
    fn test_confirm_errors() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        let defaults = RegionDefaults::default();

        assert_eq!(
            store.confirm(player, "home", &defaults),
            Err(SelectionError::NoMarkers)
        );

        store.add_marker(player, at(0.0, 0.0)).unwrap();
        store.add_marker(player, at(5.0, 0.0)).unwrap();
        assert_eq!(
            store.confirm(player, "home", &defaults),
            Err(SelectionError::NotEnoughMarkers {
                placed: 2,
                required: 3
            })
        );

        store.add_marker(player, at(0.0, 5.0)).unwrap();
        assert_eq!(
            store.confirm(player, "my home!", &defaults),
            Err(SelectionError::InvalidRegionName {
                invalid: "  !".to_string()
            })
        );
    }

    #[test]
    fn test_confirm_applies_defaults() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        place_square(&store, player);

        let definition = store
            .confirm(player, "home", &RegionDefaults::default())
            .unwrap();
        assert_eq!(definition.key, "home");
        assert_eq!(definition.vertices.len(), 4);
        assert_eq!(
            definition.vertical_bounds,
            Some(VerticalBounds::new(-64.0, 320.0))
        );
        assert_eq!(definition.flags.get("block-break"), Some(&FlagState::Deny));
        assert!(definition.owners.contains(&player));
        assert!(store.has_session(&player), "confirm must not drop the session");
    }

    #[test]
    fn test_clear_if_unchanged_keeps_newer_markers() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        place_square(&store, player);

        let (definition, snapshot) = store
            .confirm_snapshot(player, "home", &RegionDefaults::default())
            .unwrap();
        assert_eq!(definition.vertices.len(), snapshot.len());

        store.add_marker(player, at(20.0, 5.0)).unwrap();
        assert!(!store.clear_if_unchanged(&player, &snapshot));
        assert_eq!(store.markers(&player).len(), 5);

        let snapshot = store.markers(&player);
        assert!(store.clear_if_unchanged(&player, &snapshot));
        assert!(!store.has_session(&player));
        assert!(!store.clear_if_unchanged(&player, &snapshot));
    }

    #[test]
    fn test_load_region_replaces_session() {
        let store = SelectionStore::new();
        let player = PlayerId::new();
        store.add_marker(player, at(99.0, 99.0)).unwrap();

        let polygon = Polygon::new(
            vec![Vertex::new(0.0, 0.0), Vertex::new(6.0, 0.0), Vertex::new(0.0, 6.0)],
            Some(VerticalBounds::new(12.0, 40.0)),
        )
        .unwrap();
        let region = Region::new("plot", polygon, 0);

        assert_eq!(store.load_region(player, &region), 3);
        assert_eq!(
            store.markers(&player),
            vec![
                Position::new(0.0, 12.0, 0.0),
                Position::new(6.0, 12.0, 0.0),
                Position::new(0.0, 12.0, 6.0)
            ]
        );
    }
}
