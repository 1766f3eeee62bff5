//! Axis-aligned slices drawn one quad per voxel.

use glam::{IVec3, Vec2};
use slicescope_core::{colorize, sample_at_world_point, InterpolationMode};
use slicescope_render::{apply_opacity, Backend, BlendMode, QuadBatch};

use super::{coloring_context, ActiveLayer, SliceDrawer, SliceView};

impl SliceDrawer {
    /// Draws the voxels each layer has in the slice, culled to the visible
    /// rectangle.
    ///
    /// A layer whose volume does not reach the slice is skipped and does not
    /// count as the first layer drawn.
    #[allow(clippy::cast_sign_loss)]
    pub(super) fn draw_orthogonal(
        &mut self,
        backend: &mut dyn Backend,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
    ) {
        let axis = view.kind.axis();
        let (h, v) = view.kind.screen_axes();
        let (visible_min, visible_max) = (view.corners.min(), view.corners.max());
        let mut drawn = 0;

        for active in layers {
            let volume = active.layer.volume;
            let dims = volume.dimensions().as_ivec3();
            let slice = volume.enclosing_voxel(view.coordinates)[axis];
            if slice < 0 || slice >= dims[axis] {
                log::debug!(
                    "layer {} has no slice at {:?} (index {slice})",
                    active.index,
                    view.kind
                );
                continue;
            }

            let (rows, cols) = (dims[v] as usize, dims[h] as usize);
            let scratch = self.scratch.layer_mut(active.position);
            scratch.samples.clear();
            for row in 0..dims[v] {
                for col in 0..dims[h] {
                    let mut ijk = IVec3::ZERO;
                    ijk[axis] = slice;
                    ijk[h] = col;
                    ijk[v] = row;
                    scratch.samples.push(sample_at_world_point(
                        volume,
                        volume.voxel_center(ijk),
                        active.layer.map_index,
                        InterpolationMode::Nearest,
                    ));
                }
            }

            let context =
                coloring_context(&self.options, &self.color_maps, active, Some((rows, cols)));
            match colorize(&scratch.samples, active.layer.policy, &context) {
                Ok(colors) => scratch.colors = colors,
                Err(e) => {
                    log::warn!("skipping layer {}: {e}", active.index);
                    continue;
                }
            }

            let spacing = volume.spacing();
            let half = Vec2::new(spacing[h], spacing[v]) / 2.0;
            let half_right = view.plane.right() * half.x;
            let half_up = view.plane.up() * half.y;

            let mut batch = QuadBatch::with_capacity(scratch.samples.len());
            for (sample, &color) in scratch.samples.iter().zip(&scratch.colors) {
                let color = apply_opacity(color, active.layer.opacity);
                if color[3] == 0 {
                    continue;
                }
                let local = view.plane.project(sample.world);
                if (local + half).cmplt(visible_min).any() || (local - half).cmpgt(visible_max).any()
                {
                    continue;
                }
                let color = if self.picking.is_picking() {
                    let id = sample.voxel.and_then(|ijk| {
                        self.picking
                            .add_entry(active.index, active.layer.map_index, ijk)
                    });
                    match id {
                        Some(id) => id.color(),
                        None => continue,
                    }
                } else {
                    color
                };
                batch.push_rect(view.plane.to_world(local), half_right, half_up, color);
            }

            log::debug!(
                "layer {}: {} of {} voxels in {:?} slice {slice}",
                active.index,
                batch.quad_count(),
                rows * cols,
                view.kind
            );
            backend.draw_quads(&batch, BlendMode::for_layer(drawn));
            drawn += 1;
        }
    }
}
