//! A multimap from cells to sets of values, one independent subtree
//! coverage per value.
//!
//! Each value behaves like its own [`SubtreeSet`](crate::SubtreeSet):
//! inserting a value at a cell covers the cell's entire subtree with
//! it, sibling coverage consolidates upward, and removal carves holes
//! by pushing coverage down to the surviving siblings. All values
//! share one trie so a lookup walks the structure once regardless of
//! how many values are stored.

use std::hash::Hash;

use hexgrid_cell::{CellIndex, Site, Step};
use rustc_hash::FxHashSet;

use crate::edge::{common_prefix, trim_trailing_forced, Edge};
use crate::set::SubtreeSet;

/// One trie node. `here` holds values covering this node's entire
/// subtree; `below` holds values present somewhere strictly inside it.
/// The two are disjoint per node: a value hoisted into `here` is
/// stripped from everything underneath.
///
/// `trunk` compresses the step run from the node's position down to
/// its branch point; `branches` holds one child per step there and is
/// empty exactly when `below` is.
#[derive(Debug, Clone)]
struct MultiNode<V> {
    here: FxHashSet<V>,
    below: FxHashSet<V>,
    trunk: Edge,
    branches: Vec<MultiNode<V>>,
}

impl<V: Eq + Hash> PartialEq for MultiNode<V> {
    fn eq(&self, other: &Self) -> bool {
        self.here == other.here
            && self.below == other.below
            && self.trunk == other.trunk
            && self.branches == other.branches
    }
}

impl<V: Eq + Hash> Eq for MultiNode<V> {}

impl<V> Default for MultiNode<V> {
    fn default() -> Self {
        MultiNode {
            here: FxHashSet::default(),
            below: FxHashSet::default(),
            trunk: Edge::new(),
            branches: Vec::new(),
        }
    }
}

impl<V> MultiNode<V> {
    fn is_vacant(&self) -> bool {
        self.here.is_empty() && self.below.is_empty()
    }
}

/// A subtree multimap in canonical form.
///
/// Canonical form is per value: a value never sits in `here` at two
/// positions where one contains the other, a branch point whose
/// children all carry a value in `here` hoists it, and a node whose
/// only occupied child carries no `here` values merges that child into
/// its trunk. Equal contents produce equal structure regardless of
/// operation order.
#[derive(Debug, Clone)]
pub struct SubtreeMultimap<V> {
    root: MultiNode<V>,
}

impl<V: Eq + Hash> PartialEq for SubtreeMultimap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl<V: Eq + Hash> Eq for SubtreeMultimap<V> {}

impl<V> Default for SubtreeMultimap<V> {
    fn default() -> Self {
        SubtreeMultimap {
            root: MultiNode::default(),
        }
    }
}

impl<V: Clone + Eq + Hash> SubtreeMultimap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Covers `index` and its entire subtree with `value`. Coverage
    /// already implied by an enclosing insertion is a no-op.
    pub fn insert(&mut self, index: &CellIndex, value: V) {
        let trimmed = index.trimmed();
        insert_rel(&mut self.root, Site::ROOT, trimmed.steps(), &value);
    }

    /// Removes `value` from `index` and its entire subtree. Coverage
    /// from an enclosing insertion is pushed down to the sibling
    /// subtrees the removal does not touch. Returns whether anything
    /// changed.
    pub fn remove(&mut self, index: &CellIndex, value: &V) -> bool {
        let trimmed = index.trimmed();
        remove_rel(&mut self.root, Site::ROOT, trimmed.steps(), value).0
    }

    /// Removes `value` everywhere. Returns whether anything changed.
    pub fn remove_value(&mut self, value: &V) -> bool {
        remove_rel(&mut self.root, Site::ROOT, &[], value).0
    }

    /// Calls `f` for each value covering the whole subtree at `index`;
    /// with `include_partial`, also for each value present somewhere
    /// inside it. Each value is reported once. Stops early when `f`
    /// returns `false`; the return value is `false` iff it did.
    pub fn visit<F>(&self, index: &CellIndex, include_partial: bool, f: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        let trimmed = index.trimmed();
        let mut path = trimmed.steps();
        let mut node = &self.root;
        loop {
            for v in &node.here {
                if !f(v) {
                    return false;
                }
            }
            let k = common_prefix(&node.trunk, path);
            if k == path.len() {
                // The target sits at or above the branch point, so
                // everything below this node is inside its subtree.
                if include_partial {
                    for v in &node.below {
                        if !f(v) {
                            return false;
                        }
                    }
                }
                return true;
            }
            if k < node.trunk.len() || node.branches.is_empty() {
                return true;
            }
            let step = path[k];
            node = &node.branches[step.value() as usize];
            path = &path[k + 1..];
        }
    }

    /// The values covering (or, with `include_partial`, touching) the
    /// subtree at `index`.
    pub fn find(&self, index: &CellIndex, include_partial: bool) -> FxHashSet<V> {
        let mut out = FxHashSet::default();
        self.visit(index, include_partial, &mut |v| {
            out.insert(v.clone());
            true
        });
        out
    }

    /// Whether `value` covers the whole subtree at `index`.
    pub fn contains(&self, index: &CellIndex, value: &V) -> bool {
        let mut found = false;
        self.visit(index, false, &mut |v| {
            if v == value {
                found = true;
                return false;
            }
            true
        });
        found
    }

    /// Whether `value` is present anywhere.
    pub fn contains_value(&self, value: &V) -> bool {
        self.root.here.contains(value) || self.root.below.contains(value)
    }

    /// The maximal disjoint subtrees fully covered by `value`.
    pub fn subtrees(&self, value: &V) -> SubtreeSet {
        let mut set = SubtreeSet::new();
        collect_subtrees(&self.root, CellIndex::root(), value, &mut set);
        set
    }

    /// Iterates every stored value once, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.root.here.iter().chain(self.root.below.iter())
    }

    /// Total number of explicit subtree assignments, one per maximal
    /// covered subtree per value.
    pub fn len(&self) -> usize {
        fn count<V>(node: &MultiNode<V>) -> usize {
            node.here.len() + node.branches.iter().map(count::<V>).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_vacant()
    }

    pub fn clear(&mut self) {
        self.root = MultiNode::default();
    }
}

fn collect_subtrees<V: Clone + Eq + Hash>(
    node: &MultiNode<V>,
    pos: CellIndex,
    value: &V,
    out: &mut SubtreeSet,
) {
    if node.here.contains(value) {
        out.insert(&pos);
        return;
    }
    if !node.below.contains(value) {
        return;
    }
    let branch_pos = pos.extended(&node.trunk);
    for (i, child) in node.branches.iter().enumerate() {
        let step = Step::new_unchecked(i as u8);
        collect_subtrees(child, branch_pos.extended(&[step]), value, out);
    }
}

/// Insert `value` covering the subtree `path` steps below `site`.
/// Returns whether `value` now covers this node's entire subtree.
fn insert_rel<V: Clone + Eq + Hash>(
    node: &mut MultiNode<V>,
    site: Site,
    path: &[Step],
    value: &V,
) -> bool {
    if node.here.contains(value) {
        return true;
    }
    if path.is_empty() {
        strip_subtree(node, site, value);
        node.here.insert(value.clone());
        return true;
    }
    if node.branches.is_empty() {
        // No structure below: lay a fresh spine down to the target.
        // The path is trimmed, so its last step sits at a position
        // with at least two children.
        let (upper, last) = path.split_at(path.len() - 1);
        let branch = site.walk(upper);
        node.trunk = Edge::from_slice(upper);
        node.branches = vacant_children(branch);
        node.branches[last[0].value() as usize]
            .here
            .insert(value.clone());
        node.below.insert(value.clone());
        return false;
    }

    let k = common_prefix(&node.trunk, path);
    if k == node.trunk.len() && k < path.len() {
        // Pass through the branch point.
        let branch = site.walk(&node.trunk);
        let step = path[k];
        let covered = insert_rel(
            &mut node.branches[step.value() as usize],
            branch.step(step),
            &path[k + 1..],
            value,
        );
        if covered {
            return hoist_if_consolidated(node, site, value);
        }
        node.below.insert(value.clone());
        return false;
    }

    if k == path.len() {
        // The target sits on the trunk, at or above the branch point:
        // split there and cover the lower part entirely.
        let mut mid = MultiNode {
            here: FxHashSet::default(),
            below: std::mem::take(&mut node.below),
            trunk: Edge::from_slice(&node.trunk[k..]),
            branches: std::mem::take(&mut node.branches),
        };
        let mid_site = site.walk(path);
        strip_subtree(&mut mid, mid_site, value);
        mid.here.insert(value.clone());

        let (upper, last) = path.split_at(path.len() - 1);
        let upper_site = site.walk(upper);
        node.below = mid.below.clone();
        node.below.extend(mid.here.iter().cloned());
        node.trunk = Edge::from_slice(upper);
        node.branches = vacant_children(upper_site);
        node.branches[last[0].value() as usize] = mid;
        return false;
    }

    // Divergence strictly inside the trunk: the old structure and the
    // new spine become siblings at the divergence position.
    let div_site = site.walk(&node.trunk[..k]);
    let old_step = node.trunk[k];
    let old_sub = MultiNode {
        here: FxHashSet::default(),
        below: node.below.clone(),
        trunk: Edge::from_slice(&node.trunk[k + 1..]),
        branches: std::mem::take(&mut node.branches),
    };
    let new_step = path[k];
    let mut new_sub = MultiNode::default();
    insert_rel(&mut new_sub, div_site.step(new_step), &path[k + 1..], value);

    node.trunk.truncate(k);
    node.branches = vacant_children(div_site);
    node.branches[old_step.value() as usize] = old_sub;
    node.branches[new_step.value() as usize] = new_sub;
    node.below.insert(value.clone());
    false
}

/// A child just became fully covered by `value`: hoist it if every
/// sibling is too. Returns whether `value` now covers this node's
/// entire subtree.
fn hoist_if_consolidated<V: Clone + Eq + Hash>(
    node: &mut MultiNode<V>,
    site: Site,
    value: &V,
) -> bool {
    if !node.branches.iter().all(|c| c.here.contains(value)) {
        node.below.insert(value.clone());
        return false;
    }
    for child in &mut node.branches {
        child.here.remove(value);
    }

    // The covering position folds up through any forced chain.
    let mut covering = node.trunk.clone();
    trim_trailing_forced(site, &mut covering);

    if covering.is_empty() {
        node.below.remove(value);
        node.here.insert(value.clone());
        cleanup(node);
        return true;
    }

    // The value now covers a position strictly between this node and
    // the branch point: split the trunk there.
    let mut mid_below = node.below.clone();
    mid_below.remove(value);
    let mut mid = MultiNode {
        here: std::iter::once(value.clone()).collect(),
        below: mid_below,
        trunk: Edge::from_slice(&node.trunk[covering.len()..]),
        branches: std::mem::take(&mut node.branches),
    };
    cleanup(&mut mid);

    let (upper, last) = covering.split_at(covering.len() - 1);
    let upper_site = site.walk(upper);
    node.trunk = Edge::from_slice(upper);
    node.branches = vacant_children(upper_site);
    node.branches[last[0].value() as usize] = mid;
    false
}

/// Remove `value` from the subtree `path` steps below `site`. Returns
/// `(changed, still_present_in_this_node)`.
fn remove_rel<V: Clone + Eq + Hash>(
    node: &mut MultiNode<V>,
    site: Site,
    path: &[Step],
    value: &V,
) -> (bool, bool) {
    if node.here.remove(value) {
        if path.is_empty() {
            return (true, false);
        }
        // The value covered this whole subtree: push it down to every
        // sibling subtree the removal does not touch. The removed
        // chain itself never regains the value, so none of these
        // insertions can consolidate back up.
        for j in 0..path.len() {
            let pos = site.walk(&path[..j]);
            for s in 0..pos.child_count() {
                let step = Step::new_unchecked(s);
                if step == path[j] {
                    continue;
                }
                let mut sibling = Edge::from_slice(&path[..j]);
                sibling.push(step);
                insert_rel(node, site, &sibling, value);
            }
        }
        return (true, node.below.contains(value));
    }

    if !node.below.contains(value) {
        return (false, false);
    }

    let k = common_prefix(&node.trunk, path);
    if k == path.len() {
        // The target encloses the branch point, and with it every
        // occurrence of the value in this node.
        strip_subtree(node, site, value);
        return (true, false);
    }
    if k < node.trunk.len() {
        // The target diverges off the trunk: nothing to remove there.
        return (false, true);
    }

    let branch = site.walk(&node.trunk);
    let step = path[k];
    let (changed, still) = remove_rel(
        &mut node.branches[step.value() as usize],
        branch.step(step),
        &path[k + 1..],
        value,
    );
    if !changed {
        return (false, true);
    }
    if !still {
        let elsewhere = node
            .branches
            .iter()
            .any(|c| c.here.contains(value) || c.below.contains(value));
        if !elsewhere {
            node.below.remove(value);
        }
    }
    cleanup(node);
    (true, node.below.contains(value))
}

/// Remove `value` from this node and everything below it.
fn strip_subtree<V: Clone + Eq + Hash>(node: &mut MultiNode<V>, site: Site, value: &V) {
    node.here.remove(value);
    if node.below.remove(value) {
        let branch = site.walk(&node.trunk);
        for (i, child) in node.branches.iter_mut().enumerate() {
            let step = Step::new_unchecked(i as u8);
            strip_subtree(child, branch.step(step), value);
        }
        cleanup(node);
    }
}

fn vacant_children<V>(branch: Site) -> Vec<MultiNode<V>> {
    (0..branch.child_count())
        .map(|_| MultiNode::default())
        .collect()
}

/// Restore canonical structure after content changed: an empty `below`
/// drops the branches, and a single occupied child with no `here`
/// values merges into the trunk.
fn cleanup<V>(node: &mut MultiNode<V>) {
    if node.below.is_empty() {
        node.trunk.clear();
        node.branches.clear();
        return;
    }
    let mut occupied = node
        .branches
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_vacant());
    let first = occupied.next().map(|(i, _)| i);
    let lone = match (first, occupied.next()) {
        (Some(i), None) => i,
        _ => return,
    };
    if node.branches[lone].here.is_empty() {
        let child = std::mem::take(&mut node.branches[lone]);
        node.trunk.push(Step::new_unchecked(lone as u8));
        node.trunk.extend(child.trunk);
        node.branches = child.branches;
    }
}
