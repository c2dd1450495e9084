//! # Region Store
//!
//! Maps region keys to immutable region snapshots and keeps an R-tree of their
//! bounding boxes in step with the map.
//!
//! ## Concurrency
//!
//! Map and index sit behind one `RwLock`. Queries take the read side and may
//! run in parallel; `define`, `update` and `remove` take the write side, so a
//! query never sees the map and the index disagree. Every mutation validates
//! its input before the lock is taken, which keeps a failed call from leaving
//! partial state behind.

mod index;

pub use index::{IndexStats, RegionIndex};

use crate::error::StoreError;
use crate::geometry::Polygon;
use crate::region::{FlagState, Flags, Region, RegionDefinition};
use crate::types::{BoundingBox, Position};
use crate::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// How `define` treats an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefineMode {
    /// Fail with [`StoreError::DuplicateKey`] if the key exists.
    #[default]
    CreateOnly,
    /// Replace the existing region, keeping its creation time.
    Overwrite,
}

/// Snapshot of store size and index activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub regions: usize,
    pub index: IndexStats,
}

#[derive(Debug, Default)]
struct StoreState {
    regions: HashMap<Arc<str>, Arc<Region>>,
    index: RegionIndex,
}

impl StoreState {
    fn from_regions(regions: Vec<Region>) -> Self {
        let regions: HashMap<Arc<str>, Arc<Region>> = regions
            .into_iter()
            .map(|region| (Arc::from(region.key.as_str()), Arc::new(region)))
            .collect();
        let index = RegionIndex::bulk_load(
            regions
                .iter()
                .map(|(key, region)| (key.clone(), region.polygon.bounding_box())),
        );
        Self { regions, index }
    }

    fn put(&mut self, region: Region) -> Arc<Region> {
        let key: Arc<str> = Arc::from(region.key.as_str());
        let region = Arc::new(region);
        self.index.insert(key.clone(), region.polygon.bounding_box());
        self.regions.insert(key, region.clone());
        region
    }

    /// Applies `edit` to a copy of the region stored under `key` and swaps the
    /// result in.
    fn modify<F>(&mut self, key: &str, edit: F) -> Result<Arc<Region>, StoreError>
    where
        F: FnOnce(&mut Region),
    {
        let current = self
            .regions
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let mut next = Region::clone(current);
        edit(&mut next);
        next.modified_at = current_timestamp();
        Ok(self.put(next))
    }
}

/// Concurrent, indexed region map.
#[derive(Debug, Default)]
pub struct RegionStore {
    state: RwLock<StoreState>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already validated regions, bulk loading the index.
    ///
    /// A later region with the same key replaces an earlier one.
    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self {
            state: RwLock::new(StoreState::from_regions(regions)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates `definition` and inserts it into the map and the index.
    pub fn define(
        &self,
        definition: RegionDefinition,
        mode: DefineMode,
    ) -> Result<Arc<Region>, StoreError> {
        let RegionDefinition {
            key,
            vertices,
            vertical_bounds,
            priority,
            owners,
            members,
            flags,
        } = definition;

        let polygon = Polygon::new(vertices, vertical_bounds).map_err(|source| {
            StoreError::InvalidGeometry {
                key: key.clone(),
                source,
            }
        })?;

        let mut region = Region::new(key, polygon, priority);
        region.owners = owners;
        region.members = members;
        region.flags = flags;

        let mut state = self.write();
        if let Some(existing) = state.regions.get(region.key.as_str()) {
            match mode {
                DefineMode::CreateOnly => {
                    return Err(StoreError::DuplicateKey(region.key));
                }
                DefineMode::Overwrite => region.created_at = existing.created_at,
            }
        }

        let region = state.put(region);
        drop(state);

        info!(
            "📐 Defined region '{}' ({} vertices, priority {})",
            region.key,
            region.polygon.len(),
            region.priority
        );
        Ok(region)
    }

    /// Swaps in a new polygon for `key` and moves its index box with it.
    pub fn update(&self, key: &str, polygon: Polygon) -> Result<Arc<Region>, StoreError> {
        let region = self.write().modify(key, |region| region.polygon = polygon)?;
        debug!("Updated polygon of region '{}'", key);
        Ok(region)
    }

    /// Replaces every flag of `key`.
    pub fn update_flags(&self, key: &str, flags: Flags) -> Result<Arc<Region>, StoreError> {
        let region = self.write().modify(key, |region| region.flags = flags)?;
        debug!("Updated flags of region '{}'", key);
        Ok(region)
    }

    /// Sets or overwrites a single flag of `key`.
    pub fn set_flag(
        &self,
        key: &str,
        flag: &str,
        state: FlagState,
    ) -> Result<Arc<Region>, StoreError> {
        self.write().modify(key, |region| {
            region.flags.insert(flag.to_string(), state);
        })
    }

    pub fn set_priority(&self, key: &str, priority: i32) -> Result<Arc<Region>, StoreError> {
        self.write().modify(key, |region| region.priority = priority)
    }

    /// Removes `key` from both the map and the index.
    pub fn remove(&self, key: &str) -> Result<Arc<Region>, StoreError> {
        let mut state = self.write();
        let region = state
            .regions
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        state.index.remove(key);
        drop(state);

        info!("🗑️ Removed region '{}'", key);
        Ok(region)
    }

    /// Atomically replaces the whole content of the store.
    pub fn replace_all(&self, regions: Vec<Region>) {
        let next = StoreState::from_regions(regions);
        let count = next.regions.len();
        *self.write() = next;
        info!("🔄 Region store reloaded with {} regions", count);
    }

    pub fn get(&self, key: &str) -> Option<Arc<Region>> {
        self.read().regions.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().regions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().regions.is_empty()
    }

    /// All keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().regions.keys().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }

    /// Consistent snapshot of every region, ordered by key.
    pub fn regions(&self) -> Vec<Arc<Region>> {
        let mut regions: Vec<Arc<Region>> = self.read().regions.values().cloned().collect();
        regions.sort_by(|a, b| a.key.cmp(&b.key));
        regions
    }

    /// Regions whose bounding boxes intersect `bounds`, ordered by key.
    pub fn overlapping(&self, bounds: &BoundingBox) -> Vec<Arc<Region>> {
        let state = self.read();
        let keys = state.index.candidates_intersecting(*bounds);
        let mut regions: Vec<Arc<Region>> = keys
            .iter()
            .filter_map(|key| state.regions.get(key).cloned())
            .collect();
        drop(state);
        regions.sort_by(|a, b| a.key.cmp(&b.key));
        regions
    }

    /// Regions whose polygon contains `position`, unordered.
    ///
    /// Candidate lookup and exact tests happen under one read guard.
    pub(crate) fn containing(&self, position: &Position) -> Vec<Arc<Region>> {
        let state = self.read();
        let regions = state
            .index
            .candidates_at(position.x, position.z)
            .into_iter()
            .filter_map(|key| state.regions.get(&key).cloned())
            .filter(|region| region.polygon.contains_point(position))
            .collect();
        regions
    }

    /// Runs `f` with a read guard held, so no mutation can interleave.
    pub(crate) fn with_snapshot<T>(&self, f: impl FnOnce(Vec<&Region>) -> T) -> T {
        let state = self.read();
        let mut regions: Vec<&Region> = state.regions.values().map(|r| r.as_ref()).collect();
        regions.sort_by(|a, b| a.key.cmp(&b.key));
        f(regions)
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.read();
        StoreStats {
            regions: state.regions.len(),
            index: state.index.stats(),
        }
    }

    /// Rebalances the spatial index.
    pub fn rebuild_index(&self) {
        self.write().index.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::types::{PlayerId, Vertex};

    fn square(key: &str, min: f64, max: f64) -> RegionDefinition {
        RegionDefinition::new(
            key,
            vec![
                Vertex::new(min, min),
                Vertex::new(max, min),
                Vertex::new(max, max),
                Vertex::new(min, max),
            ],
        )
    }

    #[test]
    fn test_define_then_get_returns_region() {
        let store = RegionStore::new();
        let owner = PlayerId::new();
        let defined = store
            .define(
                square("spawn", 0.0, 10.0)
                    .with_priority(1)
                    .with_owner(owner)
                    .with_flag("pvp", FlagState::Deny),
                DefineMode::CreateOnly,
            )
            .unwrap();

        let fetched = store.get("spawn").unwrap();
        assert_eq!(fetched, defined);
        assert_eq!(fetched.priority, 1);
        assert_eq!(fetched.polygon.len(), 4);
        assert!(fetched.owners.contains(&owner));
        assert_eq!(fetched.flag("pvp"), Some(FlagState::Deny));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected_unless_overwrite() {
        let store = RegionStore::new();
        store.define(square("a", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        let result = store.define(square("a", 0.0, 5.0), DefineMode::CreateOnly);
        assert_eq!(result, Err(StoreError::DuplicateKey("a".to_string())));
        assert_eq!(store.get("a").unwrap().polygon.area(), 100.0);

        let replaced = store
            .define(square("a", 0.0, 5.0).with_priority(3), DefineMode::Overwrite)
            .unwrap();
        assert_eq!(replaced.polygon.area(), 25.0);
        assert_eq!(replaced.priority, 3);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.stats().index.entries,
            1,
            "overwrite must not leave a stale index entry"
        );
    }

    #[test]
    fn test_invalid_geometry_leaves_store_unchanged() {
        let store = RegionStore::new();
        store.define(square("a", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        let flat = RegionDefinition::new(
            "a",
            vec![Vertex::new(0.0, 0.0), Vertex::new(1.0, 0.0), Vertex::new(2.0, 0.0)],
        );
        let result = store.define(flat, DefineMode::Overwrite);
        assert!(matches!(
            result,
            Err(StoreError::InvalidGeometry {
                source: GeometryError::DegeneratePolygon(_),
                ..
            })
        ));
        assert_eq!(store.get("a").unwrap().polygon.area(), 100.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_moves_index_box() {
        let store = RegionStore::new();
        let original = store.define(square("a", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        let moved = Polygon::new(
            vec![
                Vertex::new(100.0, 100.0),
                Vertex::new(110.0, 100.0),
                Vertex::new(110.0, 110.0),
            ],
            None,
        )
        .unwrap();
        let updated = store.update("a", moved).unwrap();

        assert_eq!(updated.created_at, original.created_at);
        assert!(store.containing(&Position::new(5.0, 0.0, 5.0)).is_empty());
        assert_eq!(store.containing(&Position::new(108.0, 0.0, 101.0)).len(), 1);
        assert!(store
            .overlapping(&BoundingBox::new(-1.0, -1.0, 11.0, 11.0))
            .is_empty());

        // The old snapshot handed out earlier is unaffected.
        assert_eq!(original.polygon.area(), 100.0);
    }

    #[test]
    fn test_update_missing_region() {
        let store = RegionStore::new();
        let polygon = Polygon::new(
            vec![Vertex::new(0.0, 0.0), Vertex::new(1.0, 0.0), Vertex::new(1.0, 1.0)],
            None,
        )
        .unwrap();
        assert_eq!(
            store.update("ghost", polygon),
            Err(StoreError::NotFound("ghost".to_string()))
        );
        assert_eq!(
            store.set_priority("ghost", 4),
            Err(StoreError::NotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_remove_twice() {
        let store = RegionStore::new();
        store.define(square("a", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        let removed = store.remove("a").unwrap();
        assert_eq!(removed.key, "a");
        assert!(store.get("a").is_none());
        assert!(store.containing(&Position::new(5.0, 0.0, 5.0)).is_empty());
        assert_eq!(store.remove("a"), Err(StoreError::NotFound("a".to_string())));
        assert_eq!(store.stats().index.entries, 0);
    }

    #[test]
    fn test_flag_and_priority_updates() {
        let store = RegionStore::new();
        store.define(square("a", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        store.set_flag("a", "build", FlagState::Allow).unwrap();
        store.set_priority("a", 7).unwrap();
        let region = store.get("a").unwrap();
        assert_eq!(region.flag("build"), Some(FlagState::Allow));
        assert_eq!(region.priority, 7);

        store.update_flags("a", Flags::new()).unwrap();
        assert!(store.get("a").unwrap().flags.is_empty());
    }

    #[test]
    fn test_overlapping_is_sorted_and_pruned() {
        let store = RegionStore::new();
        store.define(square("b", 0.0, 10.0), DefineMode::CreateOnly).unwrap();
        store.define(square("a", 5.0, 15.0), DefineMode::CreateOnly).unwrap();
        store.define(square("far", 500.0, 510.0), DefineMode::CreateOnly).unwrap();

        let keys: Vec<String> = store
            .overlapping(&BoundingBox::new(6.0, 6.0, 8.0, 8.0))
            .iter()
            .map(|r| r.key.clone())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(store.keys(), vec!["a", "b", "far"]);
    }

    #[test]
    fn test_replace_all() {
        let store = RegionStore::new();
        store.define(square("old", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        let fresh = RegionStore::new();
        fresh.define(square("new", 0.0, 10.0), DefineMode::CreateOnly).unwrap();
        let regions = fresh.regions().iter().map(|r| Region::clone(r)).collect();

        store.replace_all(regions);
        assert_eq!(store.keys(), vec!["new"]);
        assert_eq!(store.containing(&Position::new(1.0, 0.0, 1.0)).len(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_consistent_state() {
        let store = Arc::new(RegionStore::new());
        store.define(square("moving", 0.0, 10.0), DefineMode::CreateOnly).unwrap();

        std::thread::scope(|scope| {
            let writer = store.clone();
            scope.spawn(move || {
                for i in 0..200 {
                    let offset = if i % 2 == 0 { 1000.0 } else { 0.0 };
                    writer
                        .define(square("moving", offset, offset + 10.0), DefineMode::Overwrite)
                        .unwrap();
                }
            });

            for _ in 0..4 {
                let reader = store.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        let near = reader.containing(&Position::new(5.0, 0.0, 5.0));
                        let far = reader.containing(&Position::new(1005.0, 0.0, 1005.0));
                        // Exactly one of the two placements is live at any time.
                        assert_eq!(near.len() + far.len(), 1);
                    }
                });
            }
        });
    }
}
