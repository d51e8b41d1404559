//! Feature lookup over hexgrid cell rasters with a concurrent query
//! cache.
//!
//! A [`Gazetteer`] owns an immutable [`FeatureSet`] whose features
//! know their own geometry through the [`Region`] trait. Queries ask
//! which features intersect a raster of cells; each geometry answer is
//! cached per tile in subtree multimaps, so repeated and overlapping
//! queries converge to pure cache reads. Results can be consumed
//! eagerly through [`Gazetteer::visit`] or lazily through a
//! cancellable background [`QueryRange`].

pub mod error;

mod cache;
mod config;
mod features;
mod gazetteer;
mod range;
mod region;

pub use config::RangeConfig;
pub use error::{GazetteerError, Result};
pub use features::FeatureSet;
pub use gazetteer::{Gazetteer, VisitOutcome};
pub use range::{FeatureRange, KeyRange, QueryRange};
pub use region::{IntersectionKind, Region, RegionIntersection};
