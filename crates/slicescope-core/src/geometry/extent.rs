//! Orthographic extents for slice viewports.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::bounds::BoundingBox;
use super::view::SliceViewPlane;
use crate::error::{Result, SliceError};

/// Margin factor that makes the drawn region slightly larger than the model.
pub const EXTENT_MARGIN: f32 = 1.0 / 0.98;

/// Near clipping depth of the slice projection.
pub const NEAR_DEPTH: f32 = -1000.0;

/// Far clipping depth of the slice projection.
pub const FAR_DEPTH: f32 = 1000.0;

/// Bounds of an orthographic projection, centered on the look-at point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthographicExtent {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicExtent {
    /// Horizontal size.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical size.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Right-handed orthographic projection matrix for these bounds.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Computes the orthographic extent for a slice.
///
/// The height is the bounding box extent along the world axis that runs
/// vertically on screen (Y for axial, Z for coronal and parasagittal). With
/// `all_planes` set the height grows to the larger of the Y and Z extents so
/// voxels have the same on-screen size in all three panels. The height is
/// then scaled by [`EXTENT_MARGIN`] and divided by `zoom`; the width is
/// `height * aspect_ratio`.
pub fn compute_orthographic_extent(
    bounds: &BoundingBox,
    view_plane: SliceViewPlane,
    aspect_ratio: f32,
    zoom: f32,
    all_planes: bool,
) -> Result<OrthographicExtent> {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return Err(SliceError::InvalidViewport(format!(
            "aspect ratio {aspect_ratio}"
        )));
    }

    let extent = bounds.extent();
    let (_, vertical_axis) = view_plane.screen_axes();
    let mut height = extent[vertical_axis];
    if all_planes {
        height = height.max(extent.y.max(extent.z));
    }

    let mut scale = EXTENT_MARGIN;
    if zoom > 0.0 {
        scale /= zoom;
    }
    let half_height = height * scale / 2.0;

    Ok(OrthographicExtent {
        left: -half_height * aspect_ratio,
        right: half_height * aspect_ratio,
        bottom: -half_height,
        top: half_height,
        near: NEAR_DEPTH,
        far: FAR_DEPTH,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use proptest::prelude::*;

    fn sample_box() -> BoundingBox {
        BoundingBox::from_corners(Vec3::new(-90.0, -126.0, -72.0), Vec3::new(90.0, 90.0, 108.0))
    }

    #[test]
    fn test_vertical_axis_per_plane() {
        let b = sample_box();
        let axial = compute_orthographic_extent(&b, SliceViewPlane::Axial, 1.0, 1.0, false).unwrap();
        let coronal =
            compute_orthographic_extent(&b, SliceViewPlane::Coronal, 1.0, 1.0, false).unwrap();
        assert!((axial.height() - 216.0 * EXTENT_MARGIN).abs() < 1e-3);
        assert!((coronal.height() - 180.0 * EXTENT_MARGIN).abs() < 1e-3);
        assert_eq!(axial.near, NEAR_DEPTH);
        assert_eq!(axial.far, FAR_DEPTH);
    }

    #[test]
    fn test_all_planes_share_scale() {
        let b = sample_box();
        let heights: Vec<f32> = SliceViewPlane::PANELS
            .iter()
            .map(|&p| {
                compute_orthographic_extent(&b, p, 1.3, 2.0, true)
                    .unwrap()
                    .height()
            })
            .collect();
        assert!((heights[0] - heights[1]).abs() < 1e-3);
        assert!((heights[1] - heights[2]).abs() < 1e-3);
        assert!((heights[0] - 216.0 * EXTENT_MARGIN / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_aspect() {
        let b = sample_box();
        assert!(compute_orthographic_extent(&b, SliceViewPlane::Axial, 0.0, 1.0, false).is_err());
        assert!(
            compute_orthographic_extent(&b, SliceViewPlane::Axial, f32::NAN, 1.0, false).is_err()
        );
    }

    proptest! {
        #[test]
        fn prop_extent_is_aspect_correct(
            dx in 0.1f32..500.0,
            dy in 0.1f32..500.0,
            dz in 0.1f32..500.0,
            aspect in 0.05f32..20.0,
            zoom in 0.1f32..10.0,
            plane in 0usize..3,
            all in any::<bool>(),
        ) {
            let b = BoundingBox::from_corners(Vec3::ZERO, Vec3::new(dx, dy, dz));
            let e = compute_orthographic_extent(&b, SliceViewPlane::PANELS[plane], aspect, zoom, all)
                .unwrap();
            let expected = e.height() * aspect;
            prop_assert!((e.width() - expected).abs() <= 1e-4 * expected.max(1.0));
            prop_assert!(e.height() > 0.0);
        }
    }
}
