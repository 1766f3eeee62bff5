//! Slice geometry: planes, orthographic extents, screen corners, and layout.
//!
//! Everything here is pure math on `glam` types.

pub mod bounds;
pub mod corners;
pub mod extent;
pub mod layout;
pub mod plane;
pub mod view;

pub use bounds::{BoundingBox, Viewport};
pub use corners::{
    align_to_voxel_grid, compute_screen_corners, oblique_transform, transform_to_world,
    ScreenCorners,
};
pub use extent::{compute_orthographic_extent, OrthographicExtent, EXTENT_MARGIN};
pub use layout::{compute_montage_layout, three_panel_layout, AllViewLayout, MontageCell};
pub use plane::{compute_slice_plane, SliceCoordinates, SlicePlane};
pub use view::{DrawPath, EnumInfo, EnumTable, SliceDrawingType, SliceProjection, SliceViewPlane};
