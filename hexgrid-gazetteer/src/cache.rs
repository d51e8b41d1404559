//! The gazetteer's concurrent query cache.
//!
//! Two subtree multimaps record per-tile facts: `positive` maps a tile
//! to the keys known to intersect it, `negative` to the keys known
//! disjoint from it. Each sits behind its own short-held mutex so
//! unrelated queries do not serialize, and no lock is ever held across
//! geometry code. Entries only accumulate true facts, so races at
//! worst repeat work.

use std::hash::Hash;

use hexgrid_subtree::{Raster, SubtreeMultimap};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

pub(crate) struct QueryCache<K> {
    positive: Mutex<SubtreeMultimap<K>>,
    negative: Mutex<SubtreeMultimap<K>>,
    /// Memoized total feature count, set after the first full scan.
    /// Zero means not yet confirmed.
    confirmed: Mutex<usize>,
}

impl<K: Clone + Eq + Hash> QueryCache<K> {
    pub(crate) fn new() -> Self {
        QueryCache {
            positive: Mutex::new(SubtreeMultimap::new()),
            negative: Mutex::new(SubtreeMultimap::new()),
            confirmed: Mutex::new(0),
        }
    }

    /// Keys known to intersect at least one cell of `raster`. A key
    /// partially covering a tile counts.
    pub(crate) fn known_positive(&self, raster: &Raster) -> FxHashSet<K> {
        let positive = self.positive.lock();
        let mut out = FxHashSet::default();
        for tile in raster.tiles() {
            positive.visit(tile.index(), true, &mut |key| {
                out.insert(key.clone());
                true
            });
        }
        out
    }

    /// Keys known disjoint from every cell of `raster`: a running
    /// intersection of full-tile coverage across all its tiles,
    /// short-circuiting once empty.
    pub(crate) fn known_negative(&self, raster: &Raster) -> FxHashSet<K> {
        let negative = self.negative.lock();
        let mut running: Option<FxHashSet<K>> = None;
        for tile in raster.tiles() {
            let here = negative.find(tile.index(), false);
            let next = match running.take() {
                None => here,
                Some(mut acc) => {
                    acc.retain(|key| here.contains(key));
                    acc
                }
            };
            if next.is_empty() {
                return next;
            }
            running = Some(next);
        }
        running.unwrap_or_default()
    }

    pub(crate) fn record_positive(&self, raster: &Raster, key: &K) {
        let mut positive = self.positive.lock();
        for tile in raster.tiles() {
            positive.insert(tile.index(), key.clone());
        }
    }

    pub(crate) fn record_negative(&self, raster: &Raster, key: &K) {
        let mut negative = self.negative.lock();
        for tile in raster.tiles() {
            negative.insert(tile.index(), key.clone());
        }
    }

    /// The confirmed feature count, zero while unconfirmed.
    pub(crate) fn confirmed(&self) -> usize {
        *self.confirmed.lock()
    }

    /// Records the feature count after a full scan. Concurrent
    /// confirmations must agree; disagreement is a defect, not a race
    /// to win.
    pub(crate) fn confirm(&self, total: usize) {
        let mut confirmed = self.confirmed.lock();
        if *confirmed == 0 {
            *confirmed = total;
        } else {
            debug_assert_eq!(*confirmed, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexgrid_cell::CellIndex;

    fn raster(cells: &[&str]) -> Raster {
        let mut raster = Raster::new(1).unwrap();
        for cell in cells {
            let index: CellIndex = cell.parse().unwrap();
            raster.insert_cell(&index).unwrap();
        }
        raster
    }

    #[test]
    fn test_positive_includes_partial_tiles() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.record_positive(&raster(&["10400"]), &1);

        // A query covering both siblings touches the recorded tile.
        let query = raster(&["10400", "10401"]);
        assert!(cache.known_positive(&query).contains(&1));
        assert!(cache.known_positive(&raster(&["00500"])).is_empty());
    }

    #[test]
    fn test_negative_requires_every_tile() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.record_negative(&raster(&["10400"]), &1);

        assert!(cache.known_negative(&raster(&["10400"])).contains(&1));
        // The second tile has no negative fact yet.
        let query = raster(&["10400", "10401"]);
        assert!(cache.known_negative(&query).is_empty());

        cache.record_negative(&raster(&["10401"]), &1);
        assert!(cache.known_negative(&query).contains(&1));
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let cache: QueryCache<u32> = QueryCache::new();
        assert_eq!(cache.confirmed(), 0);
        cache.confirm(5);
        cache.confirm(5);
        assert_eq!(cache.confirmed(), 5);
    }
}
