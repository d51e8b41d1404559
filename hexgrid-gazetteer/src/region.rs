//! The geometry collaborator interface.
//!
//! The gazetteer never computes real-world geometry itself. It asks a
//! [`Region`] how a query raster relates to the region's shape and
//! only stores and replays the answers.

use hexgrid_subtree::Raster;

/// How a region relates to a query raster as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionKind {
    /// The region covers every cell of the raster.
    Complete,
    /// The region touches some cells of the raster but not all.
    Partial,
    /// The region touches no cell of the raster.
    Disjoint,
}

/// A region's answer for one query raster.
///
/// A partial answer may carry sub-rasters partitioning the query:
/// cells fully inside the region, cells partially covered, and cells
/// outside it. Sub-rasters must be at the query's resolution; the
/// gazetteer rejects anything else. A collaborator unable to partition
/// may omit them, at the cost of that feature being re-tested on later
/// queries.
#[derive(Debug, Clone)]
pub struct RegionIntersection {
    kind: IntersectionKind,
    complete: Option<Raster>,
    partial: Option<Raster>,
    outside: Option<Raster>,
}

impl RegionIntersection {
    /// The region covers the whole raster.
    pub fn complete() -> Self {
        RegionIntersection {
            kind: IntersectionKind::Complete,
            complete: None,
            partial: None,
            outside: None,
        }
    }

    /// The region misses the whole raster.
    pub fn disjoint() -> Self {
        RegionIntersection {
            kind: IntersectionKind::Disjoint,
            complete: None,
            partial: None,
            outside: None,
        }
    }

    /// The region touches part of the raster, partitioned into the
    /// given sub-rasters.
    pub fn partial(
        complete: Option<Raster>,
        partial: Option<Raster>,
        outside: Option<Raster>,
    ) -> Self {
        RegionIntersection {
            kind: IntersectionKind::Partial,
            complete,
            partial,
            outside,
        }
    }

    pub fn kind(&self) -> IntersectionKind {
        self.kind
    }

    /// Whether the region touches the raster at all.
    pub fn intersects(&self) -> bool {
        self.kind != IntersectionKind::Disjoint
    }

    /// Cells fully inside the region.
    pub fn complete_raster(&self) -> Option<&Raster> {
        self.complete.as_ref()
    }

    /// Cells partially covered by the region.
    pub fn partial_raster(&self) -> Option<&Raster> {
        self.partial.as_ref()
    }

    /// Cells outside the region.
    pub fn outside_raster(&self) -> Option<&Raster> {
        self.outside.as_ref()
    }
}

/// A feature's geometry, able to test itself against a raster.
///
/// Implementations are called without any gazetteer lock held and may
/// take their time; answers must be consistent, since the gazetteer
/// caches them permanently.
pub trait Region: Send + Sync {
    fn intersect(&self, raster: &Raster) -> RegionIntersection;
}
