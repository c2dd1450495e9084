//! Point queries used by the host on every player action.

use crate::region::{FlagState, Region};
use crate::store::RegionStore;
use crate::types::{PlayerId, Position};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Query counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    /// Queries that matched at least one region.
    pub total_hits: u64,
}

/// Read-only view over a [`RegionStore`].
///
/// Cheap to clone; every clone shares the store and the counters.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<RegionStore>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    queries: AtomicU64,
    hits: AtomicU64,
}

impl QueryService {
    pub fn new(store: Arc<RegionStore>) -> Self {
        Self {
            store,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Regions containing `position`, highest priority first, ties by key.
    pub fn regions_at(&self, position: &Position) -> Vec<Arc<Region>> {
        let mut regions = self.store.containing(position);
        regions.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.key.cmp(&b.key)));

        self.counters.queries.fetch_add(1, Ordering::Relaxed);
        if !regions.is_empty() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }
        trace!(
            "Query at ({}, {}, {}) matched {} regions",
            position.x,
            position.y,
            position.z,
            regions.len()
        );
        regions
    }

    /// Highest-priority region at `position` that defines `flag`.
    fn deciding_region(&self, position: &Position, flag: &str) -> Option<(Arc<Region>, FlagState)> {
        self.regions_at(position)
            .into_iter()
            .find_map(|region| region.flag(flag).map(|state| (region, state)))
    }

    /// State of `flag` in the deciding region, if any region defines it.
    pub fn flag_at(&self, position: &Position, flag: &str) -> Option<FlagState> {
        self.deciding_region(position, flag).map(|(_, state)| state)
    }

    /// Whether `flag` is allowed at `position`, falling back to `default` when
    /// no containing region defines it.
    pub fn is_allowed(&self, position: &Position, flag: &str, default: bool) -> bool {
        self.flag_at(position, flag)
            .map(FlagState::is_allowed)
            .unwrap_or(default)
    }

    /// Like [`is_allowed`](Self::is_allowed), but owners and members of the
    /// deciding region are always allowed.
    pub fn is_allowed_for(
        &self,
        position: &Position,
        flag: &str,
        player: &PlayerId,
        default: bool,
    ) -> bool {
        match self.deciding_region(position, flag) {
            Some((region, _)) if region.is_member(player) => true,
            Some((_, state)) => state.is_allowed(),
            None => default,
        }
    }

    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.counters.queries.load(Ordering::Relaxed),
            total_hits: self.counters.hits.load(Ordering::Relaxed),
        }
    }
}
