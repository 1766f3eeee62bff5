//! Error types for slicescope-rs.

use glam::UVec3;
use thiserror::Error;

/// The main error type for slicescope-rs operations.
#[derive(Error, Debug)]
pub enum SliceError {
    /// Volume dimensions must all be positive.
    #[error("invalid volume dimensions {0}")]
    InvalidDimensions(UVec3),

    /// The index-to-world transform cannot be inverted.
    #[error("index-to-world transform is singular")]
    SingularTransform,

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The slice normal has zero length.
    #[error("slice plane normal is degenerate")]
    DegeneratePlane,

    /// The viewport has a zero or negative extent.
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    /// A draw call was issued with no enabled volumes.
    #[error("no volumes to draw")]
    NoVolumes,

    /// A volume is too large to fit into a volume texture.
    #[error("volume dimensions {dims} exceed texture ceiling {ceiling}")]
    TextureTooLarge { dims: UVec3, ceiling: u32 },

    /// A color map with the given name was not found.
    #[error("color map '{0}' not found")]
    UnknownColorMap(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for slicescope-rs operations.
pub type Result<T> = std::result::Result<T, SliceError>;
