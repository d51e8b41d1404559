//! The grid topology state machine.
//!
//! Child counts in the hierarchy are a deterministic function of a
//! node's class and level, so the whole address-space shape is captured
//! by a six-state machine: two abstract hemisphere nodes under the
//! root, a forced globe node, six icosahedron vertices, and from there
//! a pentagon lineage (the vertex-aligned child chain) or a hexagon
//! lineage. Pentagons subdivide into 6 children, center hexagons into
//! 7, vertex cells into a single centroid child.
//!
//! Anchor counts, by level:
//!
//! | level | node                | children |
//! |-------|---------------------|----------|
//! | 0     | root                | 2        |
//! | 1     | globe               | 1        |
//! | 2     | icosahedron vertex  | 6        |
//! | 3     | any                 | 1        |
//! | 4     | pentagon lineage    | 6        |
//! | 4     | hexagon lineage     | 2        |
//! | >= 5  | pentagon            | 6        |
//! | >= 5  | vertex hexagon      | 1        |
//! | >= 5  | center hexagon      | 7        |

use crate::step::{Level, Step};

/// Structural class of a node in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// The empty index.
    Root,
    /// Hemisphere node (level 1), a forced single-child chain.
    Globe,
    /// Icosahedron vertex node (level 2).
    Vertex,
    /// Pentagon lineage: the vertex-aligned cells. 12 per resolution.
    Pentagon,
    /// Hexagon whose center coincides with its parent's center.
    CenterHexagon,
    /// Hexagon sitting on a parent's vertex; has a single centroid child.
    VertexHexagon,
}

impl CellClass {
    /// Number of children of a node of this class at `level`.
    ///
    /// Zero past [`Level::MAX`]: the hierarchy is undefined below it,
    /// and enumeration terminates there naturally.
    pub fn child_count(self, level: Level) -> u8 {
        if level >= Level::MAX {
            return 0;
        }
        self.raw_child_count(level.value())
    }

    /// Child count without the max-level cutoff.
    fn raw_child_count(self, level: u8) -> u8 {
        match self {
            CellClass::Root => 2,
            CellClass::Globe => 1,
            CellClass::Vertex => 6,
            CellClass::Pentagon => {
                if level == 3 {
                    1
                } else {
                    6
                }
            }
            CellClass::CenterHexagon => match level {
                3 => 1,
                4 => 2,
                _ => 7,
            },
            CellClass::VertexHexagon => 1,
        }
    }

    /// Class of the child selected by `step`.
    ///
    /// The vertex-aligned child of an icosahedron vertex (step 5) seeds
    /// the pentagon lineage; every other child seeds hexagons. Within a
    /// lineage, the center child keeps its parent's alignment and
    /// non-center children land on vertices.
    pub fn child(self, step: Step) -> CellClass {
        match self {
            CellClass::Root => CellClass::Globe,
            CellClass::Globe => CellClass::Vertex,
            CellClass::Vertex => {
                if step.value() == 5 {
                    CellClass::Pentagon
                } else {
                    CellClass::CenterHexagon
                }
            }
            CellClass::Pentagon => {
                if step.is_center() {
                    CellClass::Pentagon
                } else {
                    CellClass::VertexHexagon
                }
            }
            CellClass::CenterHexagon => {
                if step.is_center() {
                    CellClass::CenterHexagon
                } else {
                    CellClass::VertexHexagon
                }
            }
            CellClass::VertexHexagon => CellClass::CenterHexagon,
        }
    }

    fn ordinal(self) -> usize {
        match self {
            CellClass::Root => 0,
            CellClass::Globe => 1,
            CellClass::Vertex => 2,
            CellClass::Pentagon => 3,
            CellClass::CenterHexagon => 4,
            CellClass::VertexHexagon => 5,
        }
    }
}

/// Child counts and transitions are stationary from this level on.
const STATIONARY_LEVEL: u8 = 5;

/// A position summary: the class and level of a node, without the path
/// that led there.
///
/// The subtree structures use sites to compute child counts along
/// compressed edges without materializing full indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Site {
    class: CellClass,
    level: Level,
}

impl Site {
    /// The root position.
    pub const ROOT: Site = Site {
        class: CellClass::Root,
        level: Level::ROOT,
    };

    /// The node's class.
    pub const fn class(&self) -> CellClass {
        self.class
    }

    /// The node's level.
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Number of children at this position.
    pub fn child_count(&self) -> u8 {
        self.class.child_count(self.level)
    }

    /// Whether this position has exactly one child, so the step into it
    /// carries no information.
    pub fn is_forced(&self) -> bool {
        self.child_count() == 1
    }

    /// The position reached by taking `step`.
    ///
    /// The caller is responsible for step validity; this is the
    /// arithmetic core under the checked index operations.
    pub fn step(&self, step: Step) -> Site {
        debug_assert!(
            step.value() < self.child_count(),
            "step {step} invalid at a {:?} node of level {}",
            self.class,
            self.level
        );
        Site {
            class: self.class.child(step),
            level: self.level.down(),
        }
    }

    /// The position reached by taking every step of `edge` in order.
    pub fn walk(&self, edge: &[Step]) -> Site {
        edge.iter().fold(*self, |site, &s| site.step(s))
    }

    /// Number of descendants exactly `depth` steps below this position.
    ///
    /// Matches the cardinality of [`CellIndex::descendants`]
    /// (crate::CellIndex::descendants) for every valid depth; both are
    /// zero once the walk would pass [`Level::MAX`].
    pub fn descendant_count(&self, depth: u16) -> u64 {
        if depth == 0 {
            return 1;
        }
        if u16::from(self.level.value()) + depth > u16::from(Level::MAX.value()) {
            return 0;
        }
        // DP over (class, level clamped to the stationary zone). With
        // the max-level cutoff pre-checked, raw child counts apply.
        let state = |class: CellClass, level: u8| -> usize {
            class.ordinal() * usize::from(STATIONARY_LEVEL + 1) + usize::from(level.min(STATIONARY_LEVEL))
        };
        let states = 6 * usize::from(STATIONARY_LEVEL + 1);
        let classes = [
            CellClass::Root,
            CellClass::Globe,
            CellClass::Vertex,
            CellClass::Pentagon,
            CellClass::CenterHexagon,
            CellClass::VertexHexagon,
        ];
        let mut counts = vec![1u64; states];
        for _ in 0..depth {
            let mut next = vec![0u64; states];
            for &class in &classes {
                for level in 0..=STATIONARY_LEVEL {
                    let mut total = 0u64;
                    for s in 0..class.raw_child_count(level) {
                        let step = Step::new_unchecked(s);
                        let child = state(class.child(step), level.saturating_add(1));
                        total = total.saturating_add(counts[child]);
                    }
                    next[state(class, level)] = total;
                }
            }
            counts = next;
        }
        counts[state(self.class, self.level.value())]
    }
}
