//! Error types for the gazetteer layer.

use thiserror::Error;

/// Gazetteer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GazetteerError {
    /// A geometry collaborator returned a sub-raster at a resolution
    /// other than the query's.
    #[error("geometry returned resolution {actual}, query is at resolution {expected}")]
    Geometry { expected: u8, actual: u8 },

    /// A subtree structure error.
    #[error(transparent)]
    Subtree(#[from] hexgrid_subtree::SubtreeError),

    /// The query worker thread could not be spawned.
    #[error("failed to spawn query worker: {0}")]
    Worker(String),
}

/// Result type for gazetteer operations.
pub type Result<T> = std::result::Result<T, GazetteerError>;
