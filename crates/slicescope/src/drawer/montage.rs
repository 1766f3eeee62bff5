//! Montage grids of parallel slices.

use glam::IVec3;
use slicescope_core::{compute_montage_layout, SliceCoordinates, SliceViewPlane, Viewport, VolumeSource};

use super::SliceTarget;

/// Grid size and slice spacing of a montage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageSettings {
    pub rows: u32,
    pub cols: u32,
    /// Slice index step between neighbouring cells.
    pub slice_step: i64,
}

impl Default for MontageSettings {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            slice_step: 1,
        }
    }
}

/// One target per montage cell.
///
/// The selected slice is the underlay voxel enclosing `coordinates` along the
/// montage axis. Each cell replaces only that axis' coordinate with the
/// world position of its slice index.
pub(super) fn montage_targets(
    plane: SliceViewPlane,
    viewport: Viewport,
    coordinates: SliceCoordinates,
    settings: &MontageSettings,
    margin_px: i32,
    underlay: &dyn VolumeSource,
) -> Vec<SliceTarget> {
    let plane = plane.resolved();
    let axis = plane.axis();
    let selected = underlay.enclosing_voxel(coordinates)[axis];
    let dimension = underlay.dimensions()[axis];

    compute_montage_layout(
        viewport,
        settings.rows,
        settings.cols,
        margin_px,
        i64::from(selected),
        settings.slice_step,
        i64::from(dimension),
    )
    .into_iter()
    .filter_map(|cell| {
        let index = i32::try_from(cell.slice_index).ok()?;
        let mut ijk = IVec3::ZERO;
        ijk[axis] = index;
        let mut coordinates = coordinates;
        coordinates[axis] = underlay.voxel_center(ijk)[axis];
        Some(SliceTarget {
            plane,
            viewport: cell.viewport,
            coordinates,
            all_planes: false,
        })
    })
    .collect()
}
