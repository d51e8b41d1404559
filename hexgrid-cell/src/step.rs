//! Step and level value types.
//!
//! A [`Step`] selects one child of a cell's subdivision; a [`Level`]
//! counts tree depth from the root. Levels 0..=3 are abstract nodes
//! that exist only to relate resolution-bearing cells to each other;
//! from level 4 on, `resolution = level - 4`.

use crate::error::{CellError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A child selector within a cell's subdivision, in `0..=6`.
///
/// Step 0 is the distinguished "center" child: the subdivision cell
/// aligned with the parent's own center. How many selectors are valid
/// at a given position depends on the position's
/// [`Site`](crate::Site); only the global bound is checked here.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Step(u8);

impl Step {
    /// The center child selector.
    pub const CENTER: Step = Step(0);

    /// The largest selector any cell can have (center hexagons
    /// subdivide into 7 children).
    pub const MAX: Step = Step(6);

    /// Create a step, failing on selectors above [`Step::MAX`].
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX.0 {
            return Err(CellError::InvalidStep(value));
        }
        Ok(Step(value))
    }

    /// Constructor for selectors already known to be in range, such as
    /// loop counters bounded by a child count.
    pub const fn new_unchecked(value: u8) -> Self {
        debug_assert!(value <= Self::MAX.0);
        Step(value)
    }

    /// The numeric selector.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this is the center child selector.
    pub const fn is_center(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Step {
    type Error = CellError;

    fn try_from(value: u8) -> Result<Self> {
        Step::new(value)
    }
}

impl TryFrom<char> for Step {
    type Error = CellError;

    fn try_from(value: char) -> Result<Self> {
        match value.to_digit(10) {
            Some(d) if d <= u32::from(Step::MAX.0) => Ok(Step(d as u8)),
            _ => Err(CellError::InvalidStep(u8::MAX)),
        }
    }
}

/// A depth counter from the root of the hierarchy.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    /// The root level.
    pub const ROOT: Level = Level(0);

    /// Deepest representable level (resolution 36).
    pub const MAX: Level = Level(40);

    /// Depth offset between levels and cell resolutions.
    pub const RESOLUTION_OFFSET: u8 = 4;

    /// Create a level, failing past [`Level::MAX`].
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX.0 {
            return Err(CellError::InvalidLevel(value, Self::MAX.0));
        }
        Ok(Level(value))
    }

    /// The level carrying cells of the given resolution.
    pub fn from_resolution(resolution: u8) -> Result<Self> {
        resolution
            .checked_add(Self::RESOLUTION_OFFSET)
            .map_or(Err(CellError::InvalidLevel(u8::MAX, Self::MAX.0)), Level::new)
    }

    /// The numeric depth.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether cells at this level carry a real-world resolution.
    ///
    /// Levels below the offset are abstract.
    pub const fn has_resolution(self) -> bool {
        self.0 >= Self::RESOLUTION_OFFSET
    }

    /// The resolution of cells at this level, if it has one.
    pub const fn resolution(self) -> Option<u8> {
        if self.has_resolution() {
            Some(self.0 - Self::RESOLUTION_OFFSET)
        } else {
            None
        }
    }

    /// The level one step down. Saturates at [`Level::MAX`] so that
    /// child-count lookups past the bottom see the 0-children zone.
    pub(crate) const fn down(self) -> Level {
        if self.0 >= Self::MAX.0 {
            Self::MAX
        } else {
            Level(self.0 + 1)
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
