//! A set of cells, stored as a [`SubtreeMap`] of membership flags.

use hexgrid_cell::{CellIndex, Level};

use crate::map::SubtreeMap;

/// A subtree set: cell membership with the same subtree semantics and
/// canonical form as [`SubtreeMap`]. Inserting a cell inserts its
/// entire subtree; adjacent full subtrees consolidate into their
/// parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreeSet {
    map: SubtreeMap<bool>,
}

impl SubtreeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `index` and its entire subtree to the set.
    pub fn insert(&mut self, index: &CellIndex) {
        self.map.insert(index, true);
    }

    /// Removes `index` and its entire subtree from the set.
    pub fn remove(&mut self, index: &CellIndex) {
        self.map.remove(index);
    }

    /// Whether `index` is covered by the set.
    pub fn contains(&self, index: &CellIndex) -> bool {
        self.map.get(index).is_some()
    }

    /// The covering index of the stored subtree containing `index`, if
    /// any.
    pub fn covering(&self, index: &CellIndex) -> Option<CellIndex> {
        self.map.find(index).map(|(_, covering)| covering)
    }

    /// Iterates the maximal disjoint subtrees of the set, by covering
    /// index, in index order.
    pub fn subtrees(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.map.iter().map(|(index, _)| index)
    }

    /// Number of maximal disjoint subtrees.
    pub fn subtree_count(&self) -> usize {
        self.map.leaf_count()
    }

    /// Number of member cells at exactly `level`, saturating at
    /// `u64::MAX`.
    pub fn cell_count_at(&self, level: Level) -> u64 {
        self.map.cell_count_at(level)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl Extend<CellIndex> for SubtreeSet {
    fn extend<T: IntoIterator<Item = CellIndex>>(&mut self, iter: T) {
        for index in iter {
            self.insert(&index);
        }
    }
}

impl FromIterator<CellIndex> for SubtreeSet {
    fn from_iter<T: IntoIterator<Item = CellIndex>>(iter: T) -> Self {
        let mut set = SubtreeSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(s: &str) -> CellIndex {
        s.parse().expect("valid index")
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = SubtreeSet::new();
        set.insert(&idx("104"));
        assert!(set.contains(&idx("104")));
        assert!(set.contains(&idx("10401")));
        assert!(!set.contains(&idx("105")));
        assert!(!set.contains(&CellIndex::root()));
        assert_eq!(set.covering(&idx("10401")), Some(idx("104")));
    }

    #[test]
    fn test_sibling_consolidation() {
        let mut set = SubtreeSet::new();
        set.insert(&idx("10400"));
        set.insert(&idx("10401"));
        assert_eq!(set.subtree_count(), 1);
        assert_eq!(set.subtrees().collect::<Vec<_>>(), vec![idx("104")]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut set = SubtreeSet::new();
        set.insert(&CellIndex::root());
        set.remove(&idx("10401"));
        assert!(set.contains(&idx("10400")));
        assert!(!set.contains(&idx("10401")));
        assert!(set.contains(&idx("001")));

        set.insert(&idx("10401"));
        let mut full = SubtreeSet::new();
        full.insert(&CellIndex::root());
        assert_eq!(set, full);
    }

    #[test]
    fn test_from_iterator() {
        let set: SubtreeSet = [idx("10400"), idx("10401"), idx("001")]
            .into_iter()
            .collect();
        assert_eq!(
            set.subtrees().collect::<Vec<_>>(),
            vec![idx("001"), idx("104")]
        );
    }

    #[test]
    fn test_cell_count() {
        let mut set = SubtreeSet::new();
        set.insert(&idx("10401"));
        assert_eq!(set.cell_count_at(Level::new(5).unwrap()), 1);
        assert_eq!(set.cell_count_at(Level::new(4).unwrap()), 0);
    }
}
