//! Compressed-edge helpers shared by the subtree structures.

use hexgrid_cell::{Site, Step};
use smallvec::SmallVec;

/// A compressed run of steps between explicit trie nodes.
pub(crate) type Edge = SmallVec<[Step; 8]>;

/// Length of the longest common prefix of two step runs.
pub(crate) fn common_prefix(a: &[Step], b: &[Step]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Drop trailing forced steps from `edge`, anchoring it at the nearest
/// true multi-child position. Mirrors `CellIndex::trimmed` for edges
/// hanging off `entry`.
pub(crate) fn trim_trailing_forced(entry: Site, edge: &mut Edge) {
    let mut counts: SmallVec<[u8; 8]> = SmallVec::with_capacity(edge.len());
    let mut site = entry;
    for &step in edge.iter() {
        counts.push(site.child_count());
        site = site.step(step);
    }
    let mut len = edge.len();
    while len > 0 && counts[len - 1] == 1 {
        len -= 1;
    }
    edge.truncate(len);
}
