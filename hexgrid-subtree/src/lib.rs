//! Consolidating subtree structures over hexgrid cell indices.
//!
//! Cells form a hierarchy, so an assignment to a cell naturally
//! extends to the cell's entire subtree. The structures here exploit
//! that: a [`SubtreeMap`] stores one value per maximal uniformly
//! valued subtree, a [`SubtreeSet`] does the same for membership, and
//! a [`SubtreeMultimap`] tracks an independent coverage per value in a
//! single shared trie. All three keep themselves in canonical form, so
//! equal contents compare structurally equal no matter the order of
//! operations. [`Raster`] and [`Tile`] put the set to work for
//! fixed-resolution cell rasters.

pub mod error;

mod edge;
mod map;
mod multimap;
mod set;
mod tile;

pub use error::{Result, SubtreeError};
pub use map::{Iter as SubtreeMapIter, SubtreeMap};
pub use multimap::SubtreeMultimap;
pub use set::SubtreeSet;
pub use tile::{Raster, Tile};
