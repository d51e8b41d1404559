//! Hierarchical cell indices.
//!
//! A [`CellIndex`] is an ordered sequence of steps from the root of the
//! hierarchy; the root is the empty sequence. Equality and ordering are
//! lexicographic over the steps, which matches the depth-first
//! enumeration order of [`CellIndex::descendants`].
//!
//! The textual form is one decimal digit per step ("" is the root);
//! parsing applies [`CellIndex::step_to_child`] per character and fails
//! on any digit that is not a valid selector at its position.

use crate::descendants::Descendants;
use crate::error::{CellError, Result};
use crate::step::{Level, Step};
use crate::topology::Site;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Inline capacity covers every index up to resolution 12 without a
/// heap allocation.
pub(crate) type StepVec = SmallVec<[Step; 16]>;

/// A cell address: the step path from the root.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex {
    steps: StepVec,
}

impl CellIndex {
    /// The root index (empty step sequence).
    pub fn root() -> Self {
        Self::default()
    }

    /// The steps from the root, in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps; equals the level's numeric value.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is the root index.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// The node's level (tree depth).
    pub fn level(&self) -> Level {
        // Step count is bounded by Level::MAX via step_to_child.
        Level::new(self.steps.len() as u8).unwrap_or(Level::MAX)
    }

    /// The cell's resolution, if the level carries one.
    pub fn resolution(&self) -> Option<u8> {
        self.level().resolution()
    }

    /// The position summary for this index.
    pub fn site(&self) -> Site {
        Site::ROOT.walk(&self.steps)
    }

    /// Number of children of this node.
    pub fn child_count(&self) -> u8 {
        self.site().child_count()
    }

    /// The last step, unless this is the root.
    pub fn last_step(&self) -> Option<Step> {
        self.steps.last().copied()
    }

    /// Whether this is a center cell: the last step is the center
    /// selector, or the index is the root.
    pub fn is_center(&self) -> bool {
        self.steps.last().map_or(true, |s| s.is_center())
    }

    /// Whether this is a resolution-bearing hexagon cell.
    pub fn is_hexagon(&self) -> bool {
        use crate::topology::CellClass;
        self.level().has_resolution()
            && matches!(
                self.site().class(),
                CellClass::CenterHexagon | CellClass::VertexHexagon
            )
    }

    /// Whether this is a resolution-bearing pentagon cell.
    pub fn is_pentagon(&self) -> bool {
        self.level().has_resolution() && self.site().class() == crate::topology::CellClass::Pentagon
    }

    /// Append a step, selecting a child of this node.
    ///
    /// Fails with a range error (the index is left unchanged) if the
    /// step is not a valid selector here, or if the node is at the
    /// deepest representable level.
    pub fn step_to_child(&mut self, step: Step) -> Result<()> {
        let count = self.child_count();
        if count == 0 {
            return Err(CellError::DepthExceeded(Level::MAX.value()));
        }
        if step.value() >= count {
            return Err(CellError::StepOutOfRange {
                step: step.value(),
                child_count: count,
            });
        }
        self.steps.push(step);
        Ok(())
    }

    /// The selected child, as a new index.
    pub fn child(&self, step: Step) -> Result<CellIndex> {
        let mut child = self.clone();
        child.step_to_child(step)?;
        Ok(child)
    }

    /// Remove the last step. A no-op at the root.
    pub fn step_to_parent(&mut self) {
        let _ = self.steps.pop();
    }

    /// Remove the last `n` steps, or empty the index if `n` exceeds its
    /// step count.
    pub fn step_to_ancestor(&mut self, n: usize) {
        let keep = self.steps.len().saturating_sub(n);
        self.steps.truncate(keep);
    }

    /// The parent index, unless this is the root.
    pub fn parent(&self) -> Option<CellIndex> {
        if self.is_root() {
            return None;
        }
        let mut parent = self.clone();
        parent.step_to_parent();
        Some(parent)
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &CellIndex) -> bool {
        self.steps.len() < other.steps.len() && other.steps.starts_with(&self.steps)
    }

    /// Whether `self` is a strict descendant of `other`.
    pub fn is_descendant_of(&self, other: &CellIndex) -> bool {
        other.is_ancestor_of(self)
    }

    /// Drop trailing steps whose parent has a single child.
    ///
    /// Single-child nodes never need explicit representation: the
    /// trimmed index names the same subtree of cells, anchored at the
    /// nearest true multi-child position. The subtree structures trim
    /// every incoming index before mutating.
    pub fn trimmed(&self) -> CellIndex {
        let mut counts: SmallVec<[u8; 16]> = SmallVec::with_capacity(self.steps.len());
        let mut site = Site::ROOT;
        for &step in &self.steps {
            counts.push(site.child_count());
            site = site.step(step);
        }
        let mut len = self.steps.len();
        while len > 0 && counts[len - 1] == 1 {
            len -= 1;
        }
        CellIndex {
            steps: SmallVec::from_slice(&self.steps[..len]),
        }
    }

    /// The index extended by the given steps.
    ///
    /// The steps must be valid selectors along the way; this is the
    /// unchecked companion to [`CellIndex::child`] used when
    /// reassembling indices from compressed trie edges.
    pub fn extended(&self, steps: &[Step]) -> CellIndex {
        let mut out = self.clone();
        out.steps.extend_from_slice(steps);
        out
    }

    /// Lazily enumerate every index exactly `depth` steps below this
    /// one, in lexicographic (depth-first child 0..n) order.
    ///
    /// The sequence is finite and restartable; its cardinality equals
    /// [`CellIndex::descendant_count`] for every depth.
    pub fn descendants(&self, depth: u16) -> Descendants {
        Descendants::new(self.clone(), depth)
    }

    /// Number of descendants exactly `depth` steps below this node.
    pub fn descendant_count(&self, depth: u16) -> u64 {
        self.site().descendant_count(depth)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellIndex(\"{self}\")")
    }
}

impl FromStr for CellIndex {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self> {
        let mut index = CellIndex::root();
        for (position, character) in s.chars().enumerate() {
            let step = Step::try_from(character)
                .map_err(|_| CellError::Parse { position, character })?;
            index.step_to_child(step)?;
        }
        Ok(index)
    }
}

impl Serialize for CellIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(s: &str) -> CellIndex {
        s.parse().unwrap()
    }

    #[test]
    fn test_root_child_count() {
        assert_eq!(CellIndex::root().child_count(), 2);
        assert_eq!(index("10").child_count(), 6);
        assert_eq!(index("105010").child_count(), 7);
        assert_eq!(index("10500").child_count(), 6);
    }

    #[test]
    fn test_parse_rejects_out_of_range_digits() {
        // The root has 2 children: digit 2 is out of range at position 0.
        assert_eq!(
            "2".parse::<CellIndex>(),
            Err(CellError::StepOutOfRange {
                step: 2,
                child_count: 2
            })
        );
        // "10" has 6 children: 6 is out of range at position 2.
        assert!(matches!(
            "106".parse::<CellIndex>(),
            Err(CellError::StepOutOfRange { step: 6, .. })
        ));
        assert_eq!(
            "1a".parse::<CellIndex>(),
            Err(CellError::Parse {
                position: 1,
                character: 'a'
            })
        );
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["", "1", "10", "104", "10401", "105010", "0010"] {
            let i = index(s);
            assert_eq!(i.to_string(), s);
            assert_eq!(s.parse::<CellIndex>().unwrap(), i);
        }
    }

    #[test]
    fn test_step_to_child_leaves_index_unchanged_on_error() {
        let mut i = index("10");
        assert!(i.step_to_child(Step::new(6).unwrap()).is_err());
        assert_eq!(i, index("10"));
    }

    #[test]
    fn test_stepping() {
        let mut i = index("10401");
        i.step_to_parent();
        assert_eq!(i, index("1040"));
        i.step_to_ancestor(2);
        assert_eq!(i, index("10"));
        i.step_to_ancestor(10);
        assert!(i.is_root());
        i.step_to_parent(); // no-op at root
        assert!(i.is_root());
    }

    #[test]
    fn test_ancestor_tests() {
        assert!(index("10").is_ancestor_of(&index("10401")));
        assert!(!index("10").is_ancestor_of(&index("10")));
        assert!(!index("00").is_ancestor_of(&index("10401")));
        assert!(!index("10400").is_ancestor_of(&index("10401")));
        assert!(index("10401").is_descendant_of(&index("1040")));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut v = vec![index("10401"), index("0"), index("104"), index("10400")];
        v.sort();
        assert_eq!(
            v,
            vec![index("0"), index("104"), index("10400"), index("10401")]
        );
    }

    #[test]
    fn test_is_center() {
        assert!(CellIndex::root().is_center());
        assert!(index("10400").is_center());
        assert!(!index("10401").is_center());
    }

    #[test]
    fn test_cell_shapes() {
        assert!(index("10500").is_pentagon());
        assert!(!index("10500").is_hexagon());
        assert!(index("10401").is_hexagon());
        // Abstract nodes are neither.
        assert!(!index("105").is_pentagon());
        assert!(!index("105").is_hexagon());
    }

    #[test]
    fn test_trimmed() {
        // "0010" ends in the forced centroid step of a vertex child.
        assert_eq!(index("0010").trimmed(), index("001"));
        // "1040" ends in the forced step out of a level-3 node, which
        // itself hangs off the six-child vertex node.
        assert_eq!(index("1040").trimmed(), index("104"));
        // "10400" ends at a two-child position: nothing to trim.
        assert_eq!(index("10400").trimmed(), index("10400"));
        assert_eq!(CellIndex::root().trimmed(), CellIndex::root());
    }

    #[test]
    fn test_serde_round_trip() {
        let i = index("10401");
        let json = serde_json::to_string(&i).unwrap();
        assert_eq!(json, "\"10401\"");
        assert_eq!(serde_json::from_str::<CellIndex>(&json).unwrap(), i);
    }

    #[test]
    fn test_max_depth() {
        let mut i = CellIndex::root();
        while i.child_count() > 0 {
            i.step_to_child(Step::CENTER).unwrap();
        }
        assert_eq!(i.level(), Level::MAX);
        assert_eq!(
            i.step_to_child(Step::CENTER),
            Err(CellError::DepthExceeded(Level::MAX.value()))
        );
    }
}
