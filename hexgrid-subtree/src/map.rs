//! A map from cells to values, stored as a path-compressed trie over
//! the cell hierarchy.
//!
//! Every cell of the grid, at every level, has a value; cells with no
//! explicit assignment carry `V::default()`. Assigning a value to a
//! cell assigns it to the cell's entire subtree. The trie is kept in
//! canonical form at all times, so equal maps have equal structure and
//! structural equality is semantic equality regardless of the order of
//! operations that produced them.

use hexgrid_cell::{CellIndex, Level, Site, Step};

use crate::edge::{common_prefix, trim_trailing_forced, Edge};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<V> {
    /// Everything below here carries the default value.
    Empty,
    /// Everything below `edge` carries `value`.
    Leaf { edge: Edge, value: V },
    /// One child per step at the position reached through `edge`.
    Branch { edge: Edge, children: Vec<Node<V>> },
}

impl<V> Node<V> {
    fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }
}

/// A subtree map in canonical form.
///
/// Canonical form maintains three invariants: no stored leaf carries
/// the default value, every branch sits at a position with at least two
/// children, and no branch has all children equal (such a branch is
/// consolidated into a single leaf one level up). Leaf edges never end
/// on a forced step, matching [`CellIndex::trimmed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeMap<V> {
    root: Node<V>,
}

impl<V> Default for SubtreeMap<V> {
    fn default() -> Self {
        SubtreeMap { root: Node::Empty }
    }
}

impl<V: Clone + Eq + Default> SubtreeMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` to `index` and its entire subtree.
    ///
    /// Assigning the default value erases the subtree. Positions that
    /// name the same cells (an index and its forced extensions) are
    /// interchangeable.
    pub fn insert(&mut self, index: &CellIndex, value: V) {
        let trimmed = index.trimmed();
        insert_node(
            &mut self.root,
            Site::ROOT,
            trimmed.steps(),
            value,
            &V::default(),
        );
    }

    /// Restores `index` and its subtree to the default value.
    pub fn remove(&mut self, index: &CellIndex) {
        self.insert(index, V::default());
    }

    /// The value covering `index`, together with the coarsest stored
    /// position that assigned it. `None` when the cell carries the
    /// default value.
    pub fn find(&self, index: &CellIndex) -> Option<(&V, CellIndex)> {
        let trimmed = index.trimmed();
        let mut path = trimmed.steps();
        let mut node = &self.root;
        let mut pos = CellIndex::root();
        loop {
            match node {
                Node::Empty => return None,
                Node::Leaf { edge, value } => {
                    // Covered iff the query continues along the edge; a
                    // query shorter than the edge names a strict
                    // ancestor of the leaf, which is not covered.
                    if path.len() >= edge.len() && common_prefix(edge, path) == edge.len() {
                        return Some((value, pos.extended(edge)));
                    }
                    return None;
                }
                Node::Branch { edge, children } => {
                    if path.len() <= edge.len() || common_prefix(edge, path) != edge.len() {
                        return None;
                    }
                    let step = path[edge.len()];
                    pos = pos.extended(edge).extended(&[step]);
                    node = &children[step.value() as usize];
                    path = &path[edge.len() + 1..];
                }
            }
        }
    }

    /// The value covering `index`, if any non-default value does.
    pub fn get(&self, index: &CellIndex) -> Option<&V> {
        self.find(index).map(|(value, _)| value)
    }

    /// Iterates stored leaves as `(covering index, value)` in index
    /// order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: vec![(&self.root, CellIndex::root())],
        }
    }

    /// Number of stored leaves.
    pub fn leaf_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn clear(&mut self) {
        self.root = Node::Empty;
    }

    /// Number of non-default cells at exactly `level`, saturating at
    /// `u64::MAX`.
    pub fn cell_count_at(&self, level: Level) -> u64 {
        let mut total: u64 = 0;
        for (index, _) in self.iter() {
            let leaf_level = index.level().value();
            if leaf_level > level.value() {
                continue;
            }
            let depth = (level.value() - leaf_level) as u16;
            total = total.saturating_add(index.site().descendant_count(depth));
        }
        total
    }
}

/// Leaf iterator over a [`SubtreeMap`], in index order.
pub struct Iter<'a, V> {
    stack: Vec<(&'a Node<V>, CellIndex)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (CellIndex, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, pos)) = self.stack.pop() {
            match node {
                Node::Empty => {}
                Node::Leaf { edge, value } => return Some((pos.extended(edge), value)),
                Node::Branch { edge, children } => {
                    let branch_pos = pos.extended(edge);
                    for (i, child) in children.iter().enumerate().rev() {
                        if !child.is_empty() {
                            let step = Step::new_unchecked(i as u8);
                            self.stack.push((child, branch_pos.extended(&[step])));
                        }
                    }
                }
            }
        }
        None
    }
}

impl<'a, V: Clone + Eq + Default> IntoIterator for &'a SubtreeMap<V> {
    type Item = (CellIndex, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn insert_node<V: Clone + Eq>(
    node: &mut Node<V>,
    entry: Site,
    path: &[Step],
    value: V,
    default: &V,
) {
    let (edge_len, k) = match node {
        Node::Empty => {
            if value != *default {
                *node = Node::Leaf {
                    edge: Edge::from_slice(path),
                    value,
                };
            }
            return;
        }
        Node::Leaf { edge, .. } | Node::Branch { edge, .. } => {
            (edge.len(), common_prefix(edge, path))
        }
    };

    if k == path.len() {
        // The assignment covers this node entirely.
        *node = leaf_or_empty(Edge::from_slice(path), value, default);
        return;
    }

    if k < edge_len {
        // Divergence inside the edge. Everything off the edge carries
        // the default value, so a default assignment changes nothing.
        if value == *default {
            return;
        }
        split_at_divergence(node, entry, k, path, value);
        consolidate(node, entry);
        return;
    }

    // The assignment lands strictly inside this node's subtree.
    if let Node::Leaf { edge, value: old } = node {
        if *old == value {
            return;
        }
        // Materialize children at the nearest multi-child position,
        // carrying the old value through any forced chain. The path
        // must follow that chain since forced positions admit only one
        // step.
        let old_value = old.clone();
        let mut branch_edge = std::mem::take(edge);
        let mut site = entry.walk(&branch_edge);
        let mut m = k;
        while site.is_forced() {
            branch_edge.push(path[m]);
            site = site.step(path[m]);
            m += 1;
        }
        let children = (0..site.child_count())
            .map(|_| Node::Leaf {
                edge: Edge::new(),
                value: old_value.clone(),
            })
            .collect();
        *node = Node::Branch {
            edge: branch_edge,
            children,
        };
        descend(node, entry, &path[m..], value, default);
    } else {
        descend(node, entry, &path[k..], value, default);
    }
    consolidate(node, entry);
}

/// Recurse into the branch child selected by `rest[0]`.
fn descend<V: Clone + Eq>(
    node: &mut Node<V>,
    entry: Site,
    rest: &[Step],
    value: V,
    default: &V,
) {
    if let Node::Branch { edge, children } = node {
        let branch_site = entry.walk(edge);
        let step = rest[0];
        insert_node(
            &mut children[step.value() as usize],
            branch_site.step(step),
            &rest[1..],
            value,
            default,
        );
    }
}

fn leaf_or_empty<V: Eq>(edge: Edge, value: V, default: &V) -> Node<V> {
    if value == *default {
        Node::Empty
    } else {
        Node::Leaf { edge, value }
    }
}

/// Replace `node` with a branch at the divergence position `k` along
/// its edge, keeping the old content in one child slot and a new leaf
/// in another.
fn split_at_divergence<V: Clone + Eq>(
    node: &mut Node<V>,
    entry: Site,
    k: usize,
    path: &[Step],
    value: V,
) {
    let old = std::mem::replace(node, Node::Empty);
    let (full_edge, old_rest) = match old {
        Node::Leaf { edge, value } => {
            let suffix = Edge::from_slice(&edge[k + 1..]);
            (edge, Node::Leaf { edge: suffix, value })
        }
        Node::Branch { edge, children } => {
            let suffix = Edge::from_slice(&edge[k + 1..]);
            (
                edge,
                Node::Branch {
                    edge: suffix,
                    children,
                },
            )
        }
        Node::Empty => unreachable!("divergence on an empty node"),
    };
    let div_edge = Edge::from_slice(&full_edge[..k]);
    let div_site = entry.walk(&div_edge);
    let mut children: Vec<Node<V>> = (0..div_site.child_count()).map(|_| Node::Empty).collect();
    children[full_edge[k].value() as usize] = old_rest;
    children[path[k].value() as usize] = Node::Leaf {
        edge: Edge::from_slice(&path[k + 1..]),
        value,
    };
    *node = Node::Branch {
        edge: div_edge,
        children,
    };
}

/// Restore canonical form at a branch after a child changed: an all
/// default branch collapses to empty, a branch whose children are all
/// equal full leaves consolidates into one leaf, and a branch with a
/// single occupied child splices that child into its own edge.
fn consolidate<V: Clone + Eq>(node: &mut Node<V>, entry: Site) {
    let Node::Branch { edge, children } = node else {
        return;
    };
    let occupied = children.iter().filter(|c| !c.is_empty()).count();

    if occupied == 0 {
        *node = Node::Empty;
        return;
    }

    if occupied == children.len() {
        let all_equal_leaves = children.windows(2).all(|w| w[0] == w[1])
            && matches!(&children[0], Node::Leaf { edge, .. } if edge.is_empty());
        if all_equal_leaves {
            let mut new_edge = std::mem::take(edge);
            trim_trailing_forced(entry, &mut new_edge);
            let Node::Leaf { value, .. } = children.swap_remove(0) else {
                unreachable!()
            };
            *node = Node::Leaf {
                edge: new_edge,
                value,
            };
        }
        return;
    }

    if occupied == 1 {
        let i = children
            .iter()
            .position(|c| !c.is_empty())
            .unwrap_or_default();
        let mut new_edge = std::mem::take(edge);
        new_edge.push(Step::new_unchecked(i as u8));
        match std::mem::replace(&mut children[i], Node::Empty) {
            Node::Leaf { edge, value } => {
                new_edge.extend(edge);
                *node = Node::Leaf {
                    edge: new_edge,
                    value,
                };
            }
            Node::Branch { edge, children } => {
                new_edge.extend(edge);
                *node = Node::Branch {
                    edge: new_edge,
                    children,
                };
            }
            Node::Empty => unreachable!("occupied slot was empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(s: &str) -> CellIndex {
        s.parse().expect("valid index")
    }

    #[test]
    fn test_empty_map() {
        let map: SubtreeMap<u32> = SubtreeMap::new();
        assert!(map.is_empty());
        assert_eq!(map.leaf_count(), 0);
        assert_eq!(map.find(&idx("10401")), None);
        assert_eq!(map.find(&CellIndex::root()), None);
    }

    #[test]
    fn test_insert_two_disjoint_leaves() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10401"), 19u32);
        map.insert(&idx("0010"), 401);
        assert_eq!(map.leaf_count(), 2);

        assert_eq!(map.find(&idx("10401")), Some((&19, idx("10401"))));
        // "0010" trims to "001": the trailing step is forced.
        assert_eq!(map.find(&idx("0010")), Some((&401, idx("001"))));
        assert_eq!(map.find(&idx("001")), Some((&401, idx("001"))));
        assert_eq!(map.find(&idx("10400")), None);
        assert_eq!(map.find(&CellIndex::root()), None);
    }

    #[test]
    fn test_sibling_insert_consolidates() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10401"), 19u32);
        map.insert(&idx("0010"), 401);
        // "1040" has exactly two children; the second sibling with the
        // same value consolidates both into one leaf, and the forced
        // chain above folds it up to "104".
        map.insert(&idx("10400"), 19);
        assert_eq!(map.leaf_count(), 2);
        assert_eq!(map.find(&idx("10400")), Some((&19, idx("104"))));
        assert_eq!(map.find(&idx("10401")), Some((&19, idx("104"))));
        assert_eq!(map.find(&idx("104")), Some((&19, idx("104"))));
        assert_eq!(map.find(&idx("0010")), Some((&401, idx("001"))));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut a = SubtreeMap::new();
        a.insert(&idx("10401"), 7u32);
        let mut b = a.clone();
        b.insert(&idx("10401"), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_consolidation_order_independent() {
        // Filling all six children of "1050" one at a time, in any
        // order, equals assigning "1050" directly.
        let mut direct = SubtreeMap::new();
        direct.insert(&idx("1050"), 5u32);

        for rotation in 0..6 {
            let mut piecewise = SubtreeMap::new();
            for i in 0..6u8 {
                let s = (i + rotation) % 6;
                piecewise.insert(&idx(&format!("1050{s}")), 5);
            }
            assert_eq!(piecewise, direct);
        }
    }

    #[test]
    fn test_deconsolidate_then_reconsolidate() {
        let mut map = SubtreeMap::new();
        map.insert(&CellIndex::root(), 1u32);
        let snapshot = map.clone();

        map.insert(&idx("10401"), 2);
        assert_eq!(map.find(&idx("10401")), Some((&2, idx("10401"))));
        assert_eq!(map.find(&idx("10400")), Some((&1, idx("10400"))));
        assert_eq!(map.find(&idx("0")), Some((&1, idx("0"))));
        assert_ne!(map, snapshot);

        // Writing the original value back collapses the whole structure
        // to the single root leaf it started as.
        map.insert(&idx("10401"), 1);
        assert_eq!(map, snapshot);
        assert_eq!(map.leaf_count(), 1);
        assert_eq!(map.find(&idx("10401")), Some((&1, CellIndex::root())));
    }

    #[test]
    fn test_remove_carves_hole_in_leaf() {
        let mut map = SubtreeMap::new();
        map.insert(&CellIndex::root(), 5u32);
        map.remove(&idx("0"));
        assert_eq!(map.find(&idx("0")), None);
        assert_eq!(map.find(&idx("001")), None);
        assert_eq!(map.find(&idx("1")), Some((&5, idx("1"))));
        assert_eq!(map.leaf_count(), 1);

        // Refilling the hole restores the original root leaf.
        map.insert(&idx("0"), 5);
        let mut full = SubtreeMap::new();
        full.insert(&CellIndex::root(), 5u32);
        assert_eq!(map, full);
    }

    #[test]
    fn test_remove_on_empty_is_noop() {
        let mut map: SubtreeMap<u32> = SubtreeMap::new();
        map.remove(&idx("10401"));
        assert!(map.is_empty());
        map.insert(&idx("003"), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_deep_overwrite_splits_and_merges() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("105"), 1u32);
        map.insert(&idx("10502"), 2);
        assert_eq!(map.find(&idx("10502")), Some((&2, idx("10502"))));
        assert_eq!(map.find(&idx("10501")), Some((&1, idx("10501"))));
        assert_eq!(map.find(&idx("105")), None);
        assert_eq!(map.leaf_count(), 6);

        map.insert(&idx("10502"), 1);
        assert_eq!(map.leaf_count(), 1);
        assert_eq!(map.find(&idx("10502")), Some((&1, idx("105"))));
    }

    #[test]
    fn test_forced_positions_are_interchangeable() {
        let mut a = SubtreeMap::new();
        a.insert(&idx("1040"), 9u32);
        let mut b = SubtreeMap::new();
        b.insert(&idx("104"), 9u32);
        assert_eq!(a, b);
        assert_eq!(a.find(&idx("1040")), Some((&9, idx("104"))));
    }

    #[test]
    fn test_iter_in_index_order() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("005"), 3u32);
        map.insert(&idx("0010"), 1);
        map.insert(&idx("10401"), 2);
        let leaves: Vec<(CellIndex, u32)> =
            map.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(
            leaves,
            vec![(idx("001"), 1), (idx("005"), 3), (idx("10401"), 2)]
        );
    }

    #[test]
    fn test_cell_count_at_level() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10401"), 1u32);
        // A single level-5 cell.
        assert_eq!(map.cell_count_at(Level::new(5).unwrap()), 1);
        // Leaves above the requested level contribute nothing.
        assert_eq!(map.cell_count_at(Level::new(4).unwrap()), 0);
        // One level down the leaf governs its own children.
        assert_eq!(
            map.cell_count_at(Level::new(6).unwrap()),
            idx("10401").descendant_count(1)
        );

        let mut root_map = SubtreeMap::new();
        root_map.insert(&CellIndex::root(), 1u32);
        assert_eq!(root_map.cell_count_at(Level::ROOT), 1);
        assert_eq!(root_map.cell_count_at(Level::new(1).unwrap()), 2);
        assert_eq!(root_map.cell_count_at(Level::new(2).unwrap()), 2);
        assert_eq!(root_map.cell_count_at(Level::new(3).unwrap()), 12);
    }

    #[test]
    fn test_distinct_values_no_consolidation() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10500"), 1u32);
        map.insert(&idx("10501"), 2);
        map.insert(&idx("10502"), 3);
        assert_eq!(map.leaf_count(), 3);
        assert_eq!(map.find(&idx("10501")), Some((&2, idx("10501"))));
        assert_eq!(map.find(&idx("10503")), None);
    }

    #[test]
    fn test_overwrite_root_subsumes_everything() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10401"), 1u32);
        map.insert(&idx("0010"), 2);
        map.insert(&CellIndex::root(), 9);
        assert_eq!(map.leaf_count(), 1);
        assert_eq!(map.find(&idx("0010")), Some((&9, CellIndex::root())));
    }

    #[test]
    fn test_clear() {
        let mut map = SubtreeMap::new();
        map.insert(&idx("10401"), 1u32);
        map.clear();
        assert_eq!(map, SubtreeMap::new());
    }

    #[test]
    fn test_random_ops_match_naive_model() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let level = Level::new(6).unwrap();
        let cells: Vec<CellIndex> = CellIndex::root().descendants(6).collect();
        let positions = crate::test_support::trimmed_positions(&cells);

        let mut rng = StdRng::seed_from_u64(11);
        let mut map: SubtreeMap<u8> = SubtreeMap::new();
        let mut model: Vec<u8> = vec![0; cells.len()];
        for _ in 0..400 {
            let pos = &positions[rng.gen_range(0..positions.len())];
            let value = rng.gen_range(0..3u8);
            map.insert(pos, value);
            for (cell, slot) in cells.iter().zip(model.iter_mut()) {
                if cell.steps().starts_with(pos.steps()) {
                    *slot = value;
                }
            }
        }

        for (cell, slot) in cells.iter().zip(model.iter()) {
            match map.get(cell) {
                Some(v) => assert_eq!(v, slot, "cell {cell}"),
                None => assert_eq!(*slot, 0, "cell {cell}"),
            }
        }
        let assigned = model.iter().filter(|v| **v != 0).count() as u64;
        assert_eq!(map.cell_count_at(level), assigned);
    }
}
