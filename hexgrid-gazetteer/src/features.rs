//! The immutable feature collection a gazetteer answers queries over.

use std::collections::BTreeMap;
use std::sync::Arc;

/// An ordered, immutable key-to-feature map. Built once, before the
/// gazetteer, and never modified afterwards, so readers need no lock.
#[derive(Debug, Clone)]
pub struct FeatureSet<K, F> {
    map: BTreeMap<K, Arc<F>>,
}

impl<K: Ord, F> FeatureSet<K, F> {
    pub fn get(&self, key: &K) -> Option<&Arc<F>> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Calls `f` for each entry in key order. Stops early when `f`
    /// returns `false`; the return value is `false` iff it did.
    pub fn visit<C>(&self, f: &mut C) -> bool
    where
        C: FnMut(&K, &Arc<F>) -> bool,
    {
        for (key, feature) in &self.map {
            if !f(key, feature) {
                return false;
            }
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<F>)> {
        self.map.iter()
    }
}

impl<K: Ord, F> FromIterator<(K, F)> for FeatureSet<K, F> {
    fn from_iter<T: IntoIterator<Item = (K, F)>>(iter: T) -> Self {
        FeatureSet {
            map: iter
                .into_iter()
                .map(|(key, feature)| (key, Arc::new(feature)))
                .collect(),
        }
    }
}

impl<K: Ord, F> FromIterator<(K, Arc<F>)> for FeatureSet<K, F> {
    fn from_iter<T: IntoIterator<Item = (K, Arc<F>)>>(iter: T) -> Self {
        FeatureSet {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_traversal() {
        let features: FeatureSet<&str, u32> =
            [("b", 2u32), ("a", 1), ("c", 3)].into_iter().collect();
        assert_eq!(features.len(), 3);
        assert_eq!(features.get(&"b").map(|f| **f), Some(2));

        let mut keys = Vec::new();
        let completed = features.visit(&mut |key, _| {
            keys.push(*key);
            true
        });
        assert!(completed);
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_visit_early_stop() {
        let features: FeatureSet<u32, u32> = (0..10).map(|i| (i, i)).collect();
        let mut seen = 0;
        assert!(!features.visit(&mut |_, _| {
            seen += 1;
            seen < 4
        }));
        assert_eq!(seen, 4);
    }
}
