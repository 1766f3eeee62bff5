//! Rendering backend for slicescope-rs.
//!
//! This crate turns colored slices into draw calls:
//! - the [`Backend`] trait and the vertex batches it consumes
//! - blend modes and the layer compositor
//! - volume textures and their cache
//! - [`SoftwareBackend`], a CPU rasterizer for headless use
//! - screenshot export

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel and texel math converts between integer and float coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod backend;
pub mod blend;
pub mod compositor;
pub mod error;
pub mod screenshot;
pub mod software;
pub mod texture;

pub use backend::{
    Backend, LineBatch, LineVertex, PixelReadback, QuadBatch, QuadVertex, TexturedQuad,
    TexturedVertex,
};
pub use blend::{apply_opacity, BlendFactor, BlendMode};
pub use compositor::{composite_layers, ColoredLayer, VoxelQuadCollector};
pub use error::{RenderError, RenderResult};
pub use screenshot::{
    save_image, save_image_with_options, save_to_buffer, ScreenshotError, ScreenshotOptions,
};
pub use software::{DrawStats, SoftwareBackend};
pub use texture::{
    build_volume_texture, texture_coordinate, texture_dimensions, TextureCache, TextureFilter,
    TextureVoxelLookup, VolumeTexture,
};
