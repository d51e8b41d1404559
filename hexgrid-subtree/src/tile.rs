//! Rasters: sets of cells at one fixed resolution, grouped into tiles.
//!
//! A raster answers membership for cells of a single resolution. It is
//! backed by a [`SubtreeSet`], so a contiguous block of cells costs one
//! stored subtree no matter how many cells it spans. A [`Tile`] names
//! such a block: a subtree root together with the depth down to the
//! raster's resolution.

use hexgrid_cell::{CellIndex, Descendants, Level};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtreeError};
use crate::set::SubtreeSet;

/// A block of same-resolution cells: every descendant of `index` that
/// lies `depth` levels below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    index: CellIndex,
    depth: u16,
}

impl Tile {
    pub fn new(index: CellIndex, depth: u16) -> Self {
        Tile { index, depth }
    }

    /// The subtree root the tile hangs from.
    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    /// Levels between the root and the tile's cells.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// The cells of the tile, in index order.
    pub fn cells(&self) -> Descendants {
        self.index.descendants(self.depth)
    }

    /// Number of cells in the tile.
    pub fn cell_count(&self) -> u64 {
        self.index.descendant_count(self.depth)
    }
}

/// A set of cells at one fixed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    level: Level,
    cells: SubtreeSet,
}

impl Raster {
    /// An empty raster bound to `resolution`.
    pub fn new(resolution: u8) -> Result<Self> {
        Ok(Raster {
            level: Level::from_resolution(resolution)?,
            cells: SubtreeSet::new(),
        })
    }

    /// An empty raster bound to `level`, which must carry a
    /// resolution.
    pub fn at_level(level: Level) -> Result<Self> {
        if !level.has_resolution() {
            return Err(SubtreeError::ResolutionMismatch {
                expected: Level::RESOLUTION_OFFSET,
                actual: level.value(),
            });
        }
        Ok(Raster {
            level,
            cells: SubtreeSet::new(),
        })
    }

    pub fn resolution(&self) -> u8 {
        // Bound level always carries a resolution.
        self.level.value() - Level::RESOLUTION_OFFSET
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Adds a single cell, which must sit exactly at the raster's
    /// level.
    pub fn insert_cell(&mut self, index: &CellIndex) -> Result<()> {
        if index.level() != self.level {
            return Err(SubtreeError::ResolutionMismatch {
                expected: self.level.value(),
                actual: index.level().value(),
            });
        }
        self.cells.insert(index);
        Ok(())
    }

    /// Adds every raster-level cell under `index`, which must sit at
    /// or above the raster's level.
    pub fn insert_subtree(&mut self, index: &CellIndex) -> Result<()> {
        if index.level() > self.level {
            return Err(SubtreeError::ResolutionMismatch {
                expected: self.level.value(),
                actual: index.level().value(),
            });
        }
        self.cells.insert(index);
        Ok(())
    }

    /// Whether the raster contains `index` as one of its cells.
    pub fn contains_cell(&self, index: &CellIndex) -> bool {
        index.level() == self.level && self.cells.contains(index)
    }

    /// The raster's cells grouped into maximal tiles, in index order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let level = self.level;
        self.cells.subtrees().map(move |index| {
            let depth = (level.value() - index.level().value()) as u16;
            Tile::new(index, depth)
        })
    }

    /// The raster's cells, in index order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.tiles().flat_map(|tile| tile.cells())
    }

    /// Number of cells, saturating at `u64::MAX`.
    pub fn cell_count(&self) -> u64 {
        self.cells.cell_count_at(self.level)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
