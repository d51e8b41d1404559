//! Lazy descendant enumeration.

use crate::index::CellIndex;
use crate::step::{Level, Step};
use crate::topology::Site;

/// Iterator over every index exactly `depth` steps below a base index,
/// in lexicographic order (depth-first, children `0..child_count` at
/// each level).
///
/// The sequence is finite; it is empty when the walk would pass
/// [`Level::MAX`]. Cloning the iterator snapshots its position, and a
/// fresh one can always be obtained from
/// [`CellIndex::descendants`].
#[derive(Clone, Debug)]
pub struct Descendants {
    base: CellIndex,
    depth: u16,
    /// Steps below the base; `sites[i]` is the position after
    /// `path[..i]`, so `sites` is one longer than `path` once started.
    path: Vec<Step>,
    sites: Vec<Site>,
    started: bool,
    done: bool,
}

impl Descendants {
    pub(crate) fn new(base: CellIndex, depth: u16) -> Self {
        let exhausted =
            u16::from(base.level().value()) + depth > u16::from(Level::MAX.value());
        Descendants {
            base,
            depth,
            path: Vec::new(),
            sites: Vec::new(),
            started: false,
            done: exhausted,
        }
    }

    fn current(&self) -> CellIndex {
        self.base.extended(&self.path)
    }
}

impl Iterator for Descendants {
    type Item = CellIndex;

    fn next(&mut self) -> Option<CellIndex> {
        if self.done {
            return None;
        }
        if !self.started {
            // First element: the all-centers path. Every node on the way
            // has at least one child (the max-level case was ruled out
            // at construction).
            self.started = true;
            let mut tail = self.base.site();
            self.sites.push(tail);
            for _ in 0..self.depth {
                self.path.push(Step::CENTER);
                tail = tail.step(Step::CENTER);
                self.sites.push(tail);
            }
            return Some(self.current());
        }
        // Advance the variable-arity odometer: bump the deepest step
        // that still has a sibling, reset everything below to center.
        let mut i = self.path.len();
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            let site = self.sites[i];
            let next = self.path[i].value() + 1;
            if next < site.child_count() {
                let step = Step::new_unchecked(next);
                self.path[i] = step;
                self.sites.truncate(i + 1);
                let mut tail = site.step(step);
                self.sites.push(tail);
                for j in i + 1..self.path.len() {
                    self.path[j] = Step::CENTER;
                    tail = tail.step(Step::CENTER);
                    self.sites.push(tail);
                }
                return Some(self.current());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn index(s: &str) -> CellIndex {
        s.parse().unwrap()
    }

    #[test]
    fn test_depth_zero_yields_self() {
        let base = index("104");
        let all: Vec<_> = base.descendants(0).collect();
        assert_eq!(all, vec![base]);
    }

    #[test]
    fn test_enumeration_matches_count() {
        for (base, depth) in [
            ("", 1),
            ("", 3),
            ("", 5),
            ("10", 2),
            ("1040", 1),
            ("1050", 2),
            ("105010", 2),
        ] {
            let base = index(base);
            let produced: Vec<_> = base.descendants(depth).collect();
            assert_eq!(
                produced.len() as u64,
                base.descendant_count(depth),
                "base {base} depth {depth}"
            );
            for d in &produced {
                assert_eq!(d.step_count(), base.step_count() + depth as usize);
                assert!(base.is_ancestor_of(d) || depth == 0);
            }
        }
    }

    #[test]
    fn test_order_is_sorted_and_unique() {
        let base = index("1050");
        let produced: Vec<_> = base.descendants(2).collect();
        let mut sorted = produced.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(produced, sorted);
    }

    #[test]
    fn test_clone_snapshots_position() {
        let mut it = index("10").descendants(2);
        let first = it.next().unwrap();
        let rest_from_clone: Vec<_> = it.clone().collect();
        let rest: Vec<_> = it.collect();
        assert_eq!(rest_from_clone, rest);
        assert!(!rest.contains(&first));
    }

    #[test]
    fn test_past_max_level_is_empty() {
        let base = CellIndex::root();
        let too_deep = u16::from(Level::MAX.value()) + 1;
        assert_eq!(base.descendants(too_deep).count(), 0);
        assert_eq!(base.descendant_count(too_deep), 0);
    }

    #[test]
    fn test_random_bases_agree_with_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..40 {
            // Random walk to a random base index.
            let mut base = CellIndex::root();
            for _ in 0..rng.gen_range(0..8) {
                let count = base.child_count();
                if count == 0 {
                    break;
                }
                let step = Step::new(rng.gen_range(0..count)).unwrap();
                base.step_to_child(step).unwrap();
            }
            let depth = rng.gen_range(0..4u16);
            let produced: Vec<_> = base.descendants(depth).collect();
            assert_eq!(produced.len() as u64, base.descendant_count(depth));
            for d in produced {
                let mut up = d.clone();
                up.step_to_ancestor(depth as usize);
                assert_eq!(up, base);
            }
        }
    }
}
