//! Screen corners of a slice and their mapping into world space.

use glam::{Mat4, Vec2, Vec3};

use super::extent::OrthographicExtent;
use super::plane::SlicePlane;

/// Corners of the visible slice region in plane-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCorners {
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
    pub top_right: Vec2,
    pub top_left: Vec2,
}

impl ScreenCorners {
    /// Creates corners from a min/max rectangle.
    #[must_use]
    pub fn from_rect(min: Vec2, max: Vec2) -> Self {
        Self {
            bottom_left: min,
            bottom_right: Vec2::new(max.x, min.y),
            top_right: max,
            top_left: Vec2::new(min.x, max.y),
        }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.bottom_left
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.top_right
    }

    /// Corners in drawing order: bottom left, bottom right, top right, top left.
    #[must_use]
    pub fn to_array(&self) -> [Vec2; 4] {
        [
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            self.top_left,
        ]
    }
}

/// Computes the visible rectangle of a slice in plane-local coordinates.
///
/// `screen_scale` converts orthographic units into model units (1.0 when the
/// extent is already in model units) and `look_at_offset` is the user's pan,
/// which moves the visible window the opposite way.
#[must_use]
pub fn compute_screen_corners(
    extent: &OrthographicExtent,
    look_at_offset: Vec2,
    screen_scale: f32,
) -> ScreenCorners {
    let scale = if screen_scale > 0.0 { screen_scale } else { 1.0 };
    let min = Vec2::new(extent.left, extent.bottom) * scale - look_at_offset;
    let max = Vec2::new(extent.right, extent.top) * scale - look_at_offset;
    ScreenCorners::from_rect(min, max)
}

/// Snaps a screen rectangle so that voxel centers fall on the grid through
/// `grid_origin` (plane-local position of a voxel center).
///
/// Each edge moves to the voxel center nearest to it, then outward by half a
/// voxel, so the rectangle covers whole voxels.
#[must_use]
pub fn align_to_voxel_grid(
    corners: &ScreenCorners,
    voxel_size: f32,
    grid_origin: Vec2,
) -> ScreenCorners {
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
        return *corners;
    }
    let half = voxel_size / 2.0;
    let snap = |v: f32, origin: f32| ((v - origin) / voxel_size).round() * voxel_size + origin;

    let min = corners.min();
    let max = corners.max();
    let first = Vec2::new(snap(min.x, grid_origin.x), snap(min.y, grid_origin.y));
    let last = Vec2::new(snap(max.x, grid_origin.x), snap(max.y, grid_origin.y));
    ScreenCorners::from_rect(first - Vec2::splat(half), last + Vec2::splat(half))
}

/// Transform taking plane-local `(x, y, 0)` to world space.
///
/// Columns are the plane's right, up and normal vectors, translated to the
/// plane point.
#[must_use]
pub fn oblique_transform(plane: &SlicePlane) -> Mat4 {
    Mat4::from_cols(
        plane.right().extend(0.0),
        plane.up().extend(0.0),
        plane.normal().extend(0.0),
        plane.point().extend(1.0),
    )
}

/// Maps screen corners into world space.
///
/// Order of the result matches [`ScreenCorners::to_array`].
#[must_use]
pub fn transform_to_world(corners: &ScreenCorners, transform: &Mat4) -> [Vec3; 4] {
    corners
        .to_array()
        .map(|c| transform.transform_point3(c.extend(0.0)))
}
