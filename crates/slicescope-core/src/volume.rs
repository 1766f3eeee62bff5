//! Voxel volumes.
//!
//! [`VolumeSource`] is the capability interface the engine draws from;
//! [`VolumeGrid`] is the dense in-memory implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{IVec3, Mat4, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};
use crate::geometry::BoundingBox;
use crate::statistics::FastStatistics;

/// Determinant magnitude below which an affine is treated as singular.
const SINGULAR_EPSILON: f32 = 1.0e-12;

static NEXT_VOLUME_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a volume, used as the texture cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeId(pub u64);

impl VolumeId {
    /// Allocates a new process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_VOLUME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How the values of a volume are turned into colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VolumeKind {
    /// Continuous scalars colored through a palette.
    #[default]
    Palette,
    /// Integer label keys colored through a label table.
    Label,
    /// Four components per voxel, drawn as they are.
    DirectRgba,
}

impl VolumeKind {
    /// Number of stored components per voxel.
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            VolumeKind::DirectRgba => 4,
            VolumeKind::Palette | VolumeKind::Label => 1,
        }
    }
}

/// Read-only access to a voxel volume.
///
/// Implementors supply storage; index math and bounds are provided.
pub trait VolumeSource {
    /// Identity used for caching derived resources.
    fn id(&self) -> VolumeId;

    /// Display name.
    fn name(&self) -> &str;

    /// Number of voxels along I, J and K.
    fn dimensions(&self) -> UVec3;

    /// Number of maps (frames) in the volume.
    fn num_maps(&self) -> usize;

    /// Coloring family of the data.
    fn kind(&self) -> VolumeKind;

    /// Affine from voxel index to world coordinates.
    fn index_to_world(&self) -> &Mat4;

    /// Inverse of [`VolumeSource::index_to_world`].
    fn world_to_index(&self) -> &Mat4;

    /// Scalar value of a voxel, or `None` when out of range.
    ///
    /// For RGBA volumes this is the red component.
    fn value(&self, ijk: IVec3, map_index: usize) -> Option<f32>;

    /// RGBA components of a voxel, or `None` when out of range.
    ///
    /// Scalar volumes report the value as gray with alpha 1.
    fn rgba(&self, ijk: IVec3, map_index: usize) -> Option<[f32; 4]>;

    /// All scalar values of one map, when stored contiguously.
    fn map_data(&self, map_index: usize) -> Option<&[f32]>;

    /// Statistics of one map, when available.
    fn statistics(&self, map_index: usize) -> Option<&FastStatistics>;

    /// Returns whether the index lies inside the volume.
    fn index_valid(&self, ijk: IVec3) -> bool {
        let dims = self.dimensions().as_ivec3();
        ijk.cmpge(IVec3::ZERO).all() && ijk.cmplt(dims).all()
    }

    /// Continuous voxel index of a world point.
    fn world_to_index_continuous(&self, world: Vec3) -> Vec3 {
        self.world_to_index().transform_point3(world)
    }

    /// Voxel whose cell contains a world point (`floor(index + 0.5)`).
    ///
    /// The result may lie outside the volume.
    fn enclosing_voxel(&self, world: Vec3) -> IVec3 {
        (self.world_to_index_continuous(world) + Vec3::splat(0.5))
            .floor()
            .as_ivec3()
    }

    /// World position of a voxel center.
    fn voxel_center(&self, ijk: IVec3) -> Vec3 {
        self.index_to_world().transform_point3(ijk.as_vec3())
    }

    /// World-space distance between neighbouring voxels along each index axis.
    fn spacing(&self) -> Vec3 {
        let m = self.index_to_world();
        Vec3::new(
            m.x_axis.truncate().length(),
            m.y_axis.truncate().length(),
            m.z_axis.truncate().length(),
        )
    }

    /// Offset of a voxel in a flat `i + I * (j + J * k)` layout.
    #[allow(clippy::cast_sign_loss)]
    fn voxel_offset(&self, ijk: IVec3) -> usize {
        let dims = self.dimensions();
        ijk.x as usize + dims.x as usize * (ijk.y as usize + dims.y as usize * ijk.z as usize)
    }

    /// World bounding box of the voxel cells (centers ± half a voxel).
    fn bounding_box(&self) -> BoundingBox {
        let hi = self.dimensions().as_vec3() - Vec3::splat(0.5);
        let lo = Vec3::splat(-0.5);
        let m = self.index_to_world();
        let corners = (0..8).map(|c| {
            let idx = Vec3::new(
                if c & 1 == 0 { lo.x } else { hi.x },
                if c & 2 == 0 { lo.y } else { hi.y },
                if c & 4 == 0 { lo.z } else { hi.z },
            );
            m.transform_point3(idx)
        });
        BoundingBox::from_points(corners)
            .unwrap_or_else(|| BoundingBox::from_corners(Vec3::ZERO, Vec3::ZERO))
    }
}

/// A dense volume held in memory.
#[derive(Debug, Clone)]
pub struct VolumeGrid {
    id: VolumeId,
    name: String,
    dims: UVec3,
    kind: VolumeKind,
    index_to_world: Mat4,
    world_to_index: Mat4,
    maps: Vec<Vec<f32>>,
    statistics: Vec<FastStatistics>,
}

impl VolumeGrid {
    /// Creates an empty volume.
    ///
    /// Fails if any dimension is zero or the affine is singular.
    pub fn new(
        name: impl Into<String>,
        dims: UVec3,
        index_to_world: Mat4,
        kind: VolumeKind,
    ) -> Result<Self> {
        if dims.cmpeq(UVec3::ZERO).any() {
            return Err(SliceError::InvalidDimensions(dims));
        }
        let det = index_to_world.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(SliceError::SingularTransform);
        }
        Ok(Self {
            id: VolumeId::next(),
            name: name.into(),
            dims,
            kind,
            index_to_world,
            world_to_index: index_to_world.inverse(),
            maps: Vec::new(),
            statistics: Vec::new(),
        })
    }

    /// Creates an empty volume on an axis-aligned grid.
    ///
    /// Voxel `(0, 0, 0)` is centered on `origin`.
    pub fn with_spacing(
        name: impl Into<String>,
        dims: UVec3,
        origin: Vec3,
        spacing: Vec3,
        kind: VolumeKind,
    ) -> Result<Self> {
        let affine = Mat4::from_translation(origin) * Mat4::from_scale(spacing);
        Self::new(name, dims, affine, kind)
    }

    /// Number of values one map holds.
    #[must_use]
    pub fn map_len(&self) -> usize {
        self.voxel_count() * self.kind.components()
    }

    /// Number of voxels in one map.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    /// Appends a map and returns its index.
    ///
    /// RGBA volumes store four interleaved components per voxel.
    pub fn add_map(&mut self, data: Vec<f32>) -> Result<usize> {
        let expected = self.map_len();
        if data.len() != expected {
            return Err(SliceError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let stats = match self.kind {
            VolumeKind::Palette => FastStatistics::new(&data),
            VolumeKind::Label | VolumeKind::DirectRgba => FastStatistics::default(),
        };
        self.maps.push(data);
        self.statistics.push(stats);
        Ok(self.maps.len() - 1)
    }

    /// Builder form of [`VolumeGrid::add_map`].
    pub fn with_map(mut self, data: Vec<f32>) -> Result<Self> {
        self.add_map(data)?;
        Ok(self)
    }

    /// Fills a new map by evaluating `f` at every voxel index.
    pub fn add_map_from_fn(&mut self, mut f: impl FnMut(UVec3) -> f32) -> Result<usize> {
        let mut data = Vec::with_capacity(self.map_len());
        for k in 0..self.dims.z {
            for j in 0..self.dims.y {
                for i in 0..self.dims.x {
                    data.push(f(UVec3::new(i, j, k)));
                }
            }
        }
        self.add_map(data)
    }

    fn component(&self, ijk: IVec3, map_index: usize, component: usize) -> Option<f32> {
        if !self.index_valid(ijk) {
            return None;
        }
        let map = self.maps.get(map_index)?;
        let offset = self.voxel_offset(ijk) * self.kind.components() + component;
        map.get(offset).copied()
    }
}

impl VolumeSource for VolumeGrid {
    fn id(&self) -> VolumeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> UVec3 {
        self.dims
    }

    fn num_maps(&self) -> usize {
        self.maps.len()
    }

    fn kind(&self) -> VolumeKind {
        self.kind
    }

    fn index_to_world(&self) -> &Mat4 {
        &self.index_to_world
    }

    fn world_to_index(&self) -> &Mat4 {
        &self.world_to_index
    }

    fn value(&self, ijk: IVec3, map_index: usize) -> Option<f32> {
        self.component(ijk, map_index, 0)
    }

    fn rgba(&self, ijk: IVec3, map_index: usize) -> Option<[f32; 4]> {
        match self.kind {
            VolumeKind::DirectRgba => Some([
                self.component(ijk, map_index, 0)?,
                self.component(ijk, map_index, 1)?,
                self.component(ijk, map_index, 2)?,
                self.component(ijk, map_index, 3)?,
            ]),
            VolumeKind::Palette | VolumeKind::Label => {
                let v = self.component(ijk, map_index, 0)?;
                Some([v, v, v, 1.0])
            }
        }
    }

    fn map_data(&self, map_index: usize) -> Option<&[f32]> {
        self.maps.get(map_index).map(Vec::as_slice)
    }

    fn statistics(&self, map_index: usize) -> Option<&FastStatistics> {
        self.statistics.get(map_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> VolumeGrid {
        let mut v = VolumeGrid::with_spacing(
            "cube",
            UVec3::splat(4),
            Vec3::ZERO,
            Vec3::ONE,
            VolumeKind::Palette,
        )
        .unwrap();
        v.add_map_from_fn(|ijk| (ijk.x + 10 * ijk.y + 100 * ijk.z) as f32)
            .unwrap();
        v
    }

    #[test]
    fn test_enclosing_voxel_axial_scenario() {
        let v = cube();
        let ijk = v.enclosing_voxel(Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(ijk.z, 2);
        assert_eq!(v.enclosing_voxel(Vec3::new(0.49, 0.0, 0.0)).x, 0);
        assert_eq!(v.enclosing_voxel(Vec3::new(0.5, 0.0, 0.0)).x, 1);
        assert_eq!(v.enclosing_voxel(Vec3::new(-0.6, 0.0, 0.0)).x, -1);
    }

    #[test]
    fn test_value_lookup() {
        let v = cube();
        assert_eq!(v.value(IVec3::new(1, 2, 3), 0), Some(321.0));
        assert_eq!(v.value(IVec3::new(4, 0, 0), 0), None);
        assert_eq!(v.value(IVec3::new(0, 0, 0), 1), None);
        assert_eq!(v.voxel_offset(IVec3::new(1, 2, 3)), 1 + 4 * (2 + 4 * 3));
    }

    #[test]
    fn test_bounds_and_spacing() {
        let v = VolumeGrid::with_spacing(
            "anisotropic",
            UVec3::new(10, 20, 5),
            Vec3::new(-5.0, 0.0, 2.0),
            Vec3::new(1.0, 2.0, 3.0),
            VolumeKind::Label,
        )
        .unwrap();
        assert_eq!(v.spacing(), Vec3::new(1.0, 2.0, 3.0));
        let b = v.bounding_box();
        assert!((b.min - Vec3::new(-5.5, -1.0, 0.5)).length() < 1e-5);
        assert!((b.max - Vec3::new(4.5, 39.0, 15.5)).length() < 1e-5);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            VolumeGrid::new("z", UVec3::new(0, 1, 1), Mat4::IDENTITY, VolumeKind::Palette),
            Err(SliceError::InvalidDimensions(_))
        ));
        assert!(matches!(
            VolumeGrid::new("s", UVec3::ONE, Mat4::ZERO, VolumeKind::Palette),
            Err(SliceError::SingularTransform)
        ));
        let mut v = VolumeGrid::new("r", UVec3::ONE, Mat4::IDENTITY, VolumeKind::DirectRgba)
            .unwrap();
        assert!(matches!(
            v.add_map(vec![1.0]),
            Err(SliceError::SizeMismatch {
                expected: 4,
                actual: 1
            })
        ));
        v.add_map(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(v.rgba(IVec3::ZERO, 0), Some([0.1, 0.2, 0.3, 0.4]));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(cube().id(), cube().id());
    }
}
