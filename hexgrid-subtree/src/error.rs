//! Error types for the subtree structures.

use thiserror::Error;

/// Subtree structure errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtreeError {
    /// An index at the wrong level for a resolution-bound structure.
    #[error("resolution mismatch: structure is bound to level {expected}, index is at level {actual}")]
    ResolutionMismatch { expected: u8, actual: u8 },

    /// A cell addressing error.
    #[error(transparent)]
    Cell(#[from] hexgrid_cell::CellError),
}

/// Result type for subtree operations.
pub type Result<T> = std::result::Result<T, SubtreeError>;
