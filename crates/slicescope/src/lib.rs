//! slicescope-rs: slice rendering for layered voxel volumes.
//!
//! Draws 2D cross-sections through one or more co-registered 3D volumes,
//! such as neuroimaging scans, in single-plane, three-plane, montage, and
//! texture-mapped views, and maps screen pixels back to the voxels that
//! produced them.
//!
//! # Quick Start
//!
//! ```no_run
//! use slicescope::*;
//!
//! fn main() -> RenderResult<()> {
//!     init();
//!
//!     // A 16^3 volume with 1 mm voxels
//!     let mut volume = VolumeGrid::with_spacing(
//!         "brain",
//!         UVec3::splat(16),
//!         Vec3::ZERO,
//!         Vec3::ONE,
//!         VolumeKind::Palette,
//!     )?;
//!     volume.add_map_from_fn(|ijk| (ijk.x + ijk.y) as f32)?;
//!
//!     let policy = ColoringPolicy::Palette(PaletteColorMapping::with_color_map("viridis"));
//!     let mut request = DrawRequest::new(
//!         Viewport::new(0, 0, 256, 256),
//!         vec![LayerDescriptor::new(&volume, &policy)],
//!         Vec3::splat(8.0),
//!     );
//!     request.view_plane = SliceViewPlane::All;
//!
//!     let mut drawer = SliceDrawer::default();
//!     render_to_file("slices.png", &mut drawer, &request, 256, 256)
//! }
//! ```
//!
//! # Architecture
//!
//! - `slicescope-core`: slice geometry, volumes and sampling, coloring,
//!   picking ids, options
//! - `slicescope-render`: the [`Backend`] trait, blending, volume textures,
//!   and the CPU [`SoftwareBackend`]
//! - this crate: the [`SliceDrawer`] that lays out views and drives a
//!   backend, plus headless rendering

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Voxel counts and pixel sizes convert between integers and floats
#![allow(clippy::cast_precision_loss)]

pub mod drawer;
mod headless;
mod init;

pub use drawer::{
    DrawMode, DrawOutcome, DrawRequest, LayerDescriptor, MontageSettings, SliceDrawer,
    VoxelIdentification,
};
pub use headless::{render_to_file, render_to_image};
pub use init::init;

// Re-export core types
pub use slicescope_core::{
    compute_montage_layout, compute_orthographic_extent, compute_screen_corners,
    compute_slice_plane, sample_at_world_point, AllViewLayout, BoundingBox, ColorMap,
    ColorMapRegistry, ColoringPolicy, DrawPath, EngineOptions, FastStatistics, InterpolationMode,
    Label, LabelDrawingType, LabelTable, PaletteColorMapping, PaletteScaleMode, PickingEntry,
    PickingTable, Result, RgbaColoring, SampleValue, SliceCoordinates, SliceDrawingType, SliceError,
    SlicePlane, SliceProjection, SliceViewPlane, ThresholdTest, Viewport, VolumeGrid, VolumeId,
    VolumeKind, VolumeSource,
};
pub use slicescope_core::{IVec3, Mat4, UVec3, Vec2, Vec3, Vec4};

// Re-export render types
pub use slicescope_render::{
    save_image, Backend, BlendMode, LineBatch, RenderError, RenderResult, SoftwareBackend,
    TextureCache,
};
