//! Rendering error types.

use slicescope_core::SliceError;
use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Error from the core crate.
    #[error(transparent)]
    Slice(#[from] SliceError),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// The render target has a zero size.
    #[error("invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// Screenshot export failed.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
