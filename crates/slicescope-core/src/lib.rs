//! Core computation for slicescope-rs.
//!
//! This crate holds everything about slice rendering that does not touch a
//! graphics backend:
//! - [`geometry`]: slice planes, orthographic extents, screen corners, layout
//! - [`VolumeSource`] and [`VolumeGrid`] for voxel data, plus the [`sampler`]
//! - palette, label and RGBA coloring
//! - the picking id table, options and error types

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Palette settings legitimately have several display flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Voxel math uses single-letter axis names
#![allow(clippy::many_single_char_names)]

pub mod coloring;
pub mod error;
pub mod geometry;
pub mod label_table;
pub mod options;
pub mod palette;
pub mod pick;
pub mod sampler;
pub mod scratch;
pub mod statistics;
pub mod volume;

pub use coloring::{colorize, ColoringContext, ColoringPolicy, RgbaColoring};
pub use error::{Result, SliceError};
pub use geometry::{
    align_to_voxel_grid, compute_montage_layout, compute_orthographic_extent,
    compute_screen_corners, compute_slice_plane, oblique_transform, three_panel_layout,
    transform_to_world, AllViewLayout, BoundingBox, DrawPath, EnumInfo, EnumTable, MontageCell,
    OrthographicExtent, ScreenCorners, SliceCoordinates, SliceDrawingType, SlicePlane,
    SliceProjection, SliceViewPlane, Viewport,
};
pub use label_table::{apply_outline, Label, LabelDrawingType, LabelTable, UNASSIGNED_LABEL_KEY};
pub use options::EngineOptions;
pub use palette::{
    ColorMap, ColorMapDomain, ColorMapRegistry, PaletteColorMapping, PaletteScaleMode,
    ThresholdTest, ZERO_COLOR_ZONE,
};
pub use pick::{
    color_to_index, index_to_color, NearestPick, PickId, PickingEntry, PickingMode, PickingTable,
};
pub use sampler::{
    interpolation_for, sample_at_world_point, InterpolationMode, ResampledSample, SampleValue,
};
pub use scratch::{LayerScratch, ScratchPool};
pub use statistics::FastStatistics;
pub use volume::{VolumeGrid, VolumeId, VolumeKind, VolumeSource};

// Re-export glam types for convenience
pub use glam::{IVec3, Mat4, UVec3, Vec2, Vec3, Vec4};
