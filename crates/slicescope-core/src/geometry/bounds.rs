//! Axis-aligned bounding boxes and viewport rectangles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a box from two corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates the smallest box enclosing all points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_corners(first, first), |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    /// Returns the box enclosing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the size along each axis.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns whether the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// An integer rectangle in device pixels, origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns whether both extents are positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width divided by height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Returns whether the pixel lies inside the viewport.
    #[must_use]
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let b = BoundingBox::from_points([
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-2.0, 3.0, 4.0),
            Vec3::new(0.0, 0.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, -1.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 3.0, 4.0));
        assert_eq!(b.extent(), Vec3::new(3.0, 4.0, 5.0));
        assert!(b.contains(Vec3::ZERO));
        assert!(!b.contains(Vec3::new(0.0, 5.0, 0.0)));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_viewport() {
        let vp = Viewport::new(10, 20, 200, 100);
        assert!(vp.is_valid());
        assert!((vp.aspect_ratio() - 2.0).abs() < 1e-6);
        assert!(vp.contains(10, 20));
        assert!(!vp.contains(210, 20));
        assert!(!Viewport::new(0, 0, 0, 10).is_valid());
    }
}
