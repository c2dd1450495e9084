//! R*-tree over region bounding boxes.
//!
//! Narrows point and box queries to a handful of candidate keys before the
//! exact polygon tests run. Backed by the `rstar` crate.

use crate::geometry::BOUNDARY_EPSILON;
use crate::types::BoundingBox;
use rstar::{Envelope, RTree, RTreeObject, SelectionFunction, AABB};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Entry stored inside the R-tree.
#[derive(Debug, Clone)]
struct IndexEntry {
    key: Arc<str>,
    envelope: AABB<[f64; 2]>,
}

impl IndexEntry {
    fn new(key: Arc<str>, bounds: BoundingBox) -> Self {
        let envelope = AABB::from_corners([bounds.min_x, bounds.min_z], [bounds.max_x, bounds.max_z]);
        Self { key, envelope }
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Selects entries whose box intersects a query box (touching included).
struct IntersectsBox {
    envelope: AABB<[f64; 2]>,
}

impl SelectionFunction<IndexEntry> for IntersectsBox {
    fn should_unpack_parent(&self, envelope: &AABB<[f64; 2]>) -> bool {
        envelope.intersects(&self.envelope)
    }

    fn should_unpack_leaf(&self, leaf: &IndexEntry) -> bool {
        leaf.envelope.intersects(&self.envelope)
    }
}

/// Counters for monitoring index usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_insertions: usize,
    pub total_removals: usize,
    pub total_queries: usize,
    pub total_rebuilds: usize,
    pub entries: usize,
}

/// Spatial index keyed by region key.
///
/// Not synchronized on its own; the store guards it together with the region
/// map so both always change in the same critical section.
#[derive(Debug, Default)]
pub struct RegionIndex {
    tree: RTree<IndexEntry>,
    /// Cached entries for efficient updates/removals
    entries: HashMap<Arc<str>, IndexEntry>,
    stats: IndexStats,
    /// Bumped from shared borrows, so kept outside `stats`.
    queries: AtomicUsize,
}

impl RegionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk loads a fresh tree; later duplicates of a key win.
    pub fn bulk_load<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Arc<str>, BoundingBox)>,
    {
        let mut entries = HashMap::new();
        for (key, bounds) in items {
            entries.insert(key.clone(), IndexEntry::new(key, bounds));
        }

        let tree = RTree::bulk_load(entries.values().cloned().collect());
        let stats = IndexStats {
            total_rebuilds: 1,
            entries: entries.len(),
            ..IndexStats::default()
        };

        Self {
            tree,
            entries,
            stats,
            queries: AtomicUsize::new(0),
        }
    }

    /// Inserts or replaces the box for `key` in O(log n).
    pub fn insert(&mut self, key: Arc<str>, bounds: BoundingBox) {
        if let Some(existing) = self.entries.remove(&key) {
            self.tree.remove(&existing);
        }

        let entry = IndexEntry::new(key.clone(), bounds);
        self.tree.insert(entry.clone());
        self.entries.insert(key, entry);
        self.stats.total_insertions += 1;
        self.stats.entries = self.entries.len();
    }

    /// Removes `key`; returns whether it was indexed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(existing) = self.entries.remove(key) else {
            return false;
        };

        let removed = self.tree.remove(&existing).is_some();
        self.stats.total_removals += 1;
        self.stats.entries = self.entries.len();
        removed
    }

    /// Keys whose boxes contain the horizontal point `(x, z)`, or lie within
    /// [`BOUNDARY_EPSILON`] of it, matching the polygon boundary tolerance.
    pub fn candidates_at(&self, x: f64, z: f64) -> Vec<Arc<str>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let envelope = AABB::from_corners(
            [x - BOUNDARY_EPSILON, z - BOUNDARY_EPSILON],
            [x + BOUNDARY_EPSILON, z + BOUNDARY_EPSILON],
        );
        self.tree
            .locate_with_selection_function(IntersectsBox { envelope })
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Keys whose boxes intersect `bounds`.
    pub fn candidates_intersecting(&self, bounds: BoundingBox) -> Vec<Arc<str>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let envelope = AABB::from_corners([bounds.min_x, bounds.min_z], [bounds.max_x, bounds.max_z]);
        self.tree
            .locate_with_selection_function(IntersectsBox { envelope })
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Indexed box for `key`.
    pub fn bounds_of(&self, key: &str) -> Option<BoundingBox> {
        self.entries.get(key).map(|entry| {
            let lower = entry.envelope.lower();
            let upper = entry.envelope.upper();
            BoundingBox::new(lower[0], lower[1], upper[0], upper[1])
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_queries: self.queries.load(Ordering::Relaxed),
            ..self.stats.clone()
        }
    }

    /// Rebuilds the tree for better balance after many edits.
    pub fn rebuild(&mut self) {
        let entries: Vec<_> = self.entries.values().cloned().collect();
        self.tree = RTree::bulk_load(entries);
        self.stats.total_rebuilds += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn test_insert_and_query() {
        let mut index = RegionIndex::new();
        index.insert(key("a"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        index.insert(key("b"), BoundingBox::new(50.0, 50.0, 60.0, 60.0));

        assert_eq!(index.len(), 2);
        assert!(index.contains("a"));
        assert!(index.contains("b"));

        let hits = index.candidates_at(5.0, 5.0);
        assert_eq!(hits, vec![key("a")]);

        // Box edges are inclusive.
        assert_eq!(index.candidates_at(10.0, 10.0), vec![key("a")]);
        assert!(index.candidates_at(30.0, 30.0).is_empty());
    }

    #[test]
    fn test_point_just_outside_box_within_tolerance() {
        let mut index = RegionIndex::new();
        index.insert(key("a"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(index.candidates_at(-5e-10, 5.0), vec![key("a")]);
        assert_eq!(index.candidates_at(10.0 + 5e-10, 10.0 + 5e-10), vec![key("a")]);
        assert!(index.candidates_at(-1e-6, 5.0).is_empty());
    }

    #[test]
    fn test_update_region_bounds() {
        let mut index = RegionIndex::new();
        index.insert(key("a"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        index.insert(key("a"), BoundingBox::new(20.0, 20.0, 30.0, 30.0));

        assert_eq!(index.len(), 1);
        assert!(index.candidates_at(5.0, 5.0).is_empty(), "old box should be gone");
        assert_eq!(index.candidates_at(25.0, 25.0), vec![key("a")]);
        assert_eq!(
            index.bounds_of("a"),
            Some(BoundingBox::new(20.0, 20.0, 30.0, 30.0))
        );
    }

    #[test]
    fn test_remove_region() {
        let mut index = RegionIndex::new();
        index.insert(key("a"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.is_empty());
        assert!(index.candidates_at(5.0, 5.0).is_empty());
    }

    #[test]
    fn test_intersecting_boxes() {
        let mut index = RegionIndex::new();
        index.insert(key("a"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        index.insert(key("b"), BoundingBox::new(10.0, 0.0, 20.0, 10.0));
        index.insert(key("c"), BoundingBox::new(100.0, 100.0, 110.0, 110.0));

        let mut hits = index.candidates_intersecting(BoundingBox::new(5.0, 5.0, 15.0, 6.0));
        hits.sort();
        assert_eq!(hits, vec![key("a"), key("b")]);
    }

    #[test]
    fn test_bulk_load_and_rebuild() {
        let items = (0..100).map(|i| {
            let offset = i as f64 * 20.0;
            (
                Arc::from(format!("r{i}")),
                BoundingBox::new(offset, 0.0, offset + 10.0, 10.0),
            )
        });
        let mut index = RegionIndex::bulk_load(items);
        assert_eq!(index.len(), 100);
        assert_eq!(index.candidates_at(405.0, 5.0), vec![key("r20")]);

        index.rebuild();
        assert_eq!(index.stats().total_rebuilds, 2);
        assert_eq!(index.stats().total_queries, 1);
        assert_eq!(index.candidates_at(405.0, 5.0), vec![key("r20")]);
    }
}
