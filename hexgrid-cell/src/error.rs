//! Error types for cell addressing.

use thiserror::Error;

/// Cell addressing errors.
///
/// All of these are range/format errors raised synchronously by the
/// operation that detected them; a failed operation never leaves a
/// half-applied index behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// A step selector outside the global `0..=6` range.
    #[error("invalid step {0}: step selectors are 0..=6")]
    InvalidStep(u8),

    /// A step selector valid globally but not at this position.
    #[error("step {step} out of range: cell has {child_count} children")]
    StepOutOfRange { step: u8, child_count: u8 },

    /// A level outside the representable range.
    #[error("invalid level {0}: maximum is {1}")]
    InvalidLevel(u8, u8),

    /// Stepping past the deepest representable level.
    #[error("maximum level {0} exceeded")]
    DepthExceeded(u8),

    /// A character that does not encode a step in the textual format.
    #[error("invalid character {character:?} at position {position} in cell index")]
    Parse { position: usize, character: char },
}

/// Result type for cell operations.
pub type Result<T> = std::result::Result<T, CellError>;
