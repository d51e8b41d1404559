//! Cached feature lookup over query rasters.

use std::hash::Hash;
use std::sync::Arc;

use hexgrid_subtree::Raster;
use tracing::{debug, trace};

use crate::cache::QueryCache;
use crate::config::RangeConfig;
use crate::error::{GazetteerError, Result};
use crate::features::FeatureSet;
use crate::region::{IntersectionKind, Region, RegionIntersection};

/// How a [`Gazetteer::visit`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Every intersecting feature was reported.
    Completed,
    /// The callback stopped the visit early.
    Aborted,
}

/// A feature lookup index over a fixed [`FeatureSet`].
///
/// A query asks which features intersect a raster. Answers come from
/// the cache where known and from each feature's [`Region`] otherwise;
/// geometry answers are cached per tile, so repeated or overlapping
/// queries converge to pure cache reads.
pub struct Gazetteer<K, F> {
    features: FeatureSet<K, F>,
    cache: QueryCache<K>,
    config: RangeConfig,
}

impl<K, F> Gazetteer<K, F>
where
    K: Clone + Eq + Ord + Hash,
    F: Region,
{
    pub fn new(features: FeatureSet<K, F>) -> Self {
        Gazetteer {
            features,
            cache: QueryCache::new(),
            config: RangeConfig::default(),
        }
    }

    /// Sets the configuration for background query ranges.
    pub fn with_config(mut self, config: RangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn feature_set(&self) -> &FeatureSet<K, F> {
        &self.features
    }

    pub(crate) fn config(&self) -> &RangeConfig {
        &self.config
    }

    /// Calls `callback` with every feature intersecting `raster`, in
    /// unspecified order. The callback returning `false` aborts the
    /// visit.
    ///
    /// Known-positive keys are reported first from the cache; features
    /// with no cached answer for the raster are tested through their
    /// region, without any cache lock held, and the answers recorded.
    pub fn visit<C>(&self, raster: &Raster, callback: &mut C) -> Result<VisitOutcome>
    where
        C: FnMut(&K, &Arc<F>) -> bool,
    {
        if raster.is_empty() {
            return Ok(VisitOutcome::Completed);
        }

        let positive = self.cache.known_positive(raster);
        let mut known: Vec<&K> = positive.iter().collect();
        known.sort_unstable();
        for key in known {
            if let Some(feature) = self.features.get(key) {
                if !callback(key, feature) {
                    return Ok(VisitOutcome::Aborted);
                }
            }
        }

        let negative = self.cache.known_negative(raster);
        let resolved = positive.len() + negative.len();
        let confirmed = self.cache.confirmed();
        debug!(
            positive = positive.len(),
            negative = negative.len(),
            confirmed,
            "cache consult"
        );
        if confirmed != 0 && resolved == confirmed {
            return Ok(VisitOutcome::Completed);
        }

        // Scan the features the cache could not resolve.
        let mut scan_error: Option<GazetteerError> = None;
        let mut aborted = false;
        let completed = self.features.visit(&mut |key, feature| {
            if positive.contains(key) || negative.contains(key) {
                return true;
            }
            trace!("testing unresolved feature");
            let result = feature.intersect(raster);
            match self.record(raster, key, &result) {
                Ok(()) => {}
                Err(error) => {
                    scan_error = Some(error);
                    return false;
                }
            }
            if result.intersects() && !callback(key, feature) {
                aborted = true;
                return false;
            }
            true
        });
        if let Some(error) = scan_error {
            return Err(error);
        }
        if aborted || !completed {
            return Ok(VisitOutcome::Aborted);
        }

        self.cache.confirm(self.features.len());
        Ok(VisitOutcome::Completed)
    }

    /// The keys of every feature intersecting `raster`, in key order.
    pub fn find(&self, raster: &Raster) -> Result<Vec<K>> {
        let mut keys = Vec::new();
        self.visit(raster, &mut |key, _| {
            keys.push(key.clone());
            true
        })?;
        keys.sort_unstable();
        Ok(keys)
    }

    /// Store one geometry answer in the cache.
    fn record(&self, raster: &Raster, key: &K, result: &RegionIntersection) -> Result<()> {
        match result.kind() {
            IntersectionKind::Complete => {
                self.cache.record_positive(raster, key);
            }
            IntersectionKind::Disjoint => {
                self.cache.record_negative(raster, key);
            }
            IntersectionKind::Partial => {
                for sub in [result.complete_raster(), result.partial_raster()]
                    .into_iter()
                    .flatten()
                {
                    self.validate(raster, sub)?;
                    self.cache.record_positive(sub, key);
                }
                if let Some(outside) = result.outside_raster() {
                    self.validate(raster, outside)?;
                    self.cache.record_negative(outside, key);
                }
            }
        }
        Ok(())
    }

    fn validate(&self, raster: &Raster, sub: &Raster) -> Result<()> {
        if sub.resolution() != raster.resolution() {
            return Err(GazetteerError::Geometry {
                expected: raster.resolution(),
                actual: sub.resolution(),
            });
        }
        Ok(())
    }
}
