//! Point sampling of volumes at world coordinates.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{DrawPath, SliceProjection};
use crate::volume::{VolumeKind, VolumeSource};

/// Slack used when testing whether the cubic stencil fits in the volume.
const CUBIC_EDGE_TOLERANCE: f32 = 0.01;

/// Interpolation used when sampling between voxel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Value of the enclosing voxel.
    #[default]
    Nearest,
    /// Tricubic Catmull-Rom over the 4x4x4 neighbourhood.
    Cubic,
}

/// Picks the interpolation for a volume kind and drawing mode.
///
/// Only palette data is ever interpolated, and only when oblique slices are
/// point sampled; label keys and RGBA data always use the enclosing voxel.
#[must_use]
pub fn interpolation_for(
    kind: VolumeKind,
    projection: SliceProjection,
    path: DrawPath,
) -> InterpolationMode {
    match (kind, projection, path) {
        (VolumeKind::Palette, SliceProjection::Oblique, DrawPath::Voxels) => {
            InterpolationMode::Cubic
        }
        _ => InterpolationMode::Nearest,
    }
}

/// Sampled data at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Scalar(f32),
    Rgba([f32; 4]),
}

/// Result of sampling one volume at one world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledSample {
    /// Where the sample was taken.
    pub world: Vec3,
    /// Sampled data; meaningless when `valid` is false.
    pub value: SampleValue,
    /// Whether the point hit the volume.
    pub valid: bool,
    /// Source voxel, present when valid.
    pub voxel: Option<IVec3>,
}

impl ResampledSample {
    /// A sample that missed the volume.
    #[must_use]
    pub fn invalid(world: Vec3) -> Self {
        Self {
            world,
            value: SampleValue::Scalar(0.0),
            valid: false,
            voxel: None,
        }
    }

    /// Scalar value (red for RGBA samples), `NaN` when invalid.
    #[must_use]
    pub fn scalar(&self) -> f32 {
        if !self.valid {
            return f32::NAN;
        }
        match self.value {
            SampleValue::Scalar(v) => v,
            SampleValue::Rgba(c) => c[0],
        }
    }

    /// RGBA components, transparent when invalid.
    #[must_use]
    pub fn rgba(&self) -> [f32; 4] {
        if !self.valid {
            return [0.0; 4];
        }
        match self.value {
            SampleValue::Scalar(v) => [v, v, v, 1.0],
            SampleValue::Rgba(c) => c,
        }
    }
}

/// Samples a volume at a world point.
///
/// The sample is invalid when the enclosing voxel lies outside the volume or
/// the map does not exist. Cubic interpolation is used only for palette data,
/// only where the whole stencil between neighbouring voxel centers is inside
/// the volume, and only when every dimension has more than one voxel; the
/// outer half voxel and single-slice volumes use the enclosing voxel.
#[must_use]
pub fn sample_at_world_point(
    volume: &dyn VolumeSource,
    world: Vec3,
    map_index: usize,
    mode: InterpolationMode,
) -> ResampledSample {
    if map_index >= volume.num_maps() {
        return ResampledSample::invalid(world);
    }
    let voxel = volume.enclosing_voxel(world);
    if !volume.index_valid(voxel) {
        return ResampledSample::invalid(world);
    }

    let value = match volume.kind() {
        VolumeKind::DirectRgba => volume.rgba(voxel, map_index).map(SampleValue::Rgba),
        VolumeKind::Label => volume.value(voxel, map_index).map(SampleValue::Scalar),
        VolumeKind::Palette => {
            let cubic = match mode {
                InterpolationMode::Cubic => {
                    cubic_value(volume, volume.world_to_index_continuous(world), map_index)
                }
                InterpolationMode::Nearest => None,
            };
            cubic
                .or_else(|| volume.value(voxel, map_index))
                .map(SampleValue::Scalar)
        }
    };

    match value {
        Some(value) => ResampledSample {
            world,
            value,
            valid: true,
            voxel: Some(voxel),
        },
        None => ResampledSample::invalid(world),
    }
}

/// Catmull-Rom weights for offsets -1, 0, 1, 2 at fraction `t`.
fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

#[allow(clippy::cast_possible_truncation)]
fn cubic_value(volume: &dyn VolumeSource, index: Vec3, map_index: usize) -> Option<f32> {
    let dims = volume.dimensions().as_ivec3();
    if dims.cmple(IVec3::ONE).any() {
        return None;
    }
    let lower = (index + Vec3::splat(CUBIC_EDGE_TOLERANCE)).floor().as_ivec3();
    let upper = (index - Vec3::splat(CUBIC_EDGE_TOLERANCE)).ceil().as_ivec3();
    if lower.cmplt(IVec3::ZERO).any() || upper.cmpge(dims).any() {
        return None;
    }

    let base = index.floor();
    let frac = index - base;
    let base = base.as_ivec3();
    let (wx, wy, wz) = (
        catmull_rom_weights(frac.x),
        catmull_rom_weights(frac.y),
        catmull_rom_weights(frac.z),
    );
    let max = dims - IVec3::ONE;

    let mut sum = 0.0;
    for (dk, wk) in wz.iter().enumerate() {
        for (dj, wj) in wy.iter().enumerate() {
            for (di, wi) in wx.iter().enumerate() {
                let offset = IVec3::new(di as i32 - 1, dj as i32 - 1, dk as i32 - 1);
                let ijk = (base + offset).clamp(IVec3::ZERO, max);
                sum += wi * wj * wk * volume.value(ijk, map_index)?;
            }
        }
    }
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeGrid;
    use glam::UVec3;

    fn ramp(kind: VolumeKind) -> VolumeGrid {
        let mut v =
            VolumeGrid::with_spacing("ramp", UVec3::splat(6), Vec3::ZERO, Vec3::ONE, kind).unwrap();
        v.add_map_from_fn(|ijk| ijk.x as f32 * 2.0).unwrap();
        v
    }

    #[test]
    fn test_nearest_sampling() {
        let v = ramp(VolumeKind::Palette);
        let s = sample_at_world_point(&v, Vec3::new(2.4, 1.0, 1.0), 0, InterpolationMode::Nearest);
        assert!(s.valid);
        assert_eq!(s.voxel, Some(IVec3::new(2, 1, 1)));
        assert_eq!(s.scalar(), 4.0);
    }

    #[test]
    fn test_out_of_bounds_is_invalid() {
        let v = ramp(VolumeKind::Palette);
        let s = sample_at_world_point(&v, Vec3::new(-0.6, 0.0, 0.0), 0, InterpolationMode::Cubic);
        assert!(!s.valid);
        assert!(s.voxel.is_none());
        assert!(s.scalar().is_nan());
        let s = sample_at_world_point(&v, Vec3::ONE, 3, InterpolationMode::Nearest);
        assert!(!s.valid);
    }

    #[test]
    fn test_cubic_reproduces_linear_data() {
        let v = ramp(VolumeKind::Palette);
        let s = sample_at_world_point(&v, Vec3::new(2.25, 2.0, 2.0), 0, InterpolationMode::Cubic);
        assert!(s.valid);
        assert!((s.scalar() - 4.5).abs() < 1e-4);
        assert_eq!(s.voxel, Some(IVec3::new(2, 2, 2)));
    }

    #[test]
    fn test_cubic_rim_falls_back_to_nearest() {
        let v = ramp(VolumeKind::Palette);
        let s = sample_at_world_point(&v, Vec3::new(5.3, 2.0, 2.0), 0, InterpolationMode::Cubic);
        assert!(s.valid);
        assert_eq!(s.scalar(), 10.0);
    }

    #[test]
    fn test_labels_never_interpolate() {
        let v = ramp(VolumeKind::Label);
        let s = sample_at_world_point(&v, Vec3::new(2.25, 2.0, 2.0), 0, InterpolationMode::Cubic);
        assert_eq!(s.scalar(), 4.0);
        assert_eq!(
            interpolation_for(VolumeKind::Label, SliceProjection::Oblique, DrawPath::Voxels),
            InterpolationMode::Nearest
        );
        assert_eq!(
            interpolation_for(VolumeKind::Palette, SliceProjection::Oblique, DrawPath::Voxels),
            InterpolationMode::Cubic
        );
        assert_eq!(
            interpolation_for(VolumeKind::Palette, SliceProjection::Orthogonal, DrawPath::Voxels),
            InterpolationMode::Nearest
        );
    }

    #[test]
    fn test_rgba_sample() {
        let mut v = VolumeGrid::new("rgb", UVec3::ONE, glam::Mat4::IDENTITY, VolumeKind::DirectRgba)
            .unwrap();
        v.add_map(vec![1.0, 0.5, 0.25, 1.0]).unwrap();
        let s = sample_at_world_point(&v, Vec3::ZERO, 0, InterpolationMode::Cubic);
        assert_eq!(s.rgba(), [1.0, 0.5, 0.25, 1.0]);
    }
}
