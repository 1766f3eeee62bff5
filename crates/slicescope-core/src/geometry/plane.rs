//! Slice plane construction.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::view::{SliceProjection, SliceViewPlane};
use crate::error::{Result, SliceError};

/// Length below which a normal is considered degenerate.
const MIN_NORMAL_LENGTH: f32 = 1.0e-6;

/// World coordinates selected per axis.
///
/// `x` is the parasagittal slice, `y` the coronal slice, `z` the axial slice.
pub type SliceCoordinates = Vec3;

/// A slice plane with its in-plane screen basis.
///
/// `normal`, `right`, and `up` are unit length and mutually orthogonal, and
/// `right = up × normal`, so looking along `-normal` puts `right` on the
/// right of the screen and `up` at its top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePlane {
    normal: Vec3,
    point: Vec3,
    right: Vec3,
    up: Vec3,
}

impl SlicePlane {
    /// Creates a plane from a normal, a point, and an approximate up vector.
    ///
    /// The up vector is re-orthogonalized against the normal.
    pub fn new(normal: Vec3, point: Vec3, up_hint: Vec3) -> Result<Self> {
        if normal.length() < MIN_NORMAL_LENGTH || !normal.is_finite() {
            return Err(SliceError::DegeneratePlane);
        }
        let normal = normal.normalize();

        let mut right = up_hint.cross(normal);
        if right.length() < MIN_NORMAL_LENGTH {
            // Up hint parallel to the normal, pick any perpendicular.
            right = normal.any_orthonormal_vector();
        }
        let right = right.normalize();
        let up = normal.cross(right).normalize();

        Ok(Self {
            normal,
            point,
            right,
            up,
        })
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the point on the plane (the look-at center).
    #[must_use]
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Returns the unit vector pointing to screen right.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Returns the unit vector pointing to screen top.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Returns the plane equation `(a, b, c, d)` with `ax + by + cz + d = 0`.
    #[must_use]
    pub fn equation(&self) -> Vec4 {
        self.normal.extend(-self.normal.dot(self.point))
    }

    /// Signed distance from the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p - self.point)
    }

    /// Projects a world point to plane-local 2D coordinates.
    #[must_use]
    pub fn project(&self, p: Vec3) -> Vec2 {
        let d = p - self.point;
        Vec2::new(d.dot(self.right), d.dot(self.up))
    }

    /// Maps plane-local 2D coordinates back to world space.
    #[must_use]
    pub fn to_world(&self, local: Vec2) -> Vec3 {
        self.point + self.right * local.x + self.up * local.y
    }

    /// Returns a copy with the point moved.
    #[must_use]
    pub fn with_point(&self, point: Vec3) -> Self {
        Self { point, ..*self }
    }

    /// View matrix looking at the plane point from the normal side.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.point + self.normal, self.point, self.up)
    }
}

/// Builds the slice plane for a view.
///
/// Axis-aligned normals are axial = +Z, coronal = −Y, parasagittal = −X; the
/// plane passes through the selected coordinate. In oblique projection the
/// normal and up vector are both rotated by `oblique_rotation`.
pub fn compute_slice_plane(
    view_plane: SliceViewPlane,
    projection: SliceProjection,
    coordinates: SliceCoordinates,
    oblique_rotation: Mat4,
) -> Result<SlicePlane> {
    let (normal, up) = match projection {
        SliceProjection::Orthogonal => (view_plane.normal(), view_plane.up()),
        SliceProjection::Oblique => (
            oblique_rotation.transform_vector3(view_plane.normal()),
            oblique_rotation.transform_vector3(view_plane.up()),
        ),
    };
    SlicePlane::new(normal, coordinates, up)
}
