//! Rotated slices point sampled on a regular grid.

use glam::{IVec3, Vec2, Vec3};
use slicescope_core::{
    align_to_voxel_grid, colorize, interpolation_for, oblique_transform, sample_at_world_point,
    DrawPath, SliceProjection,
};
use slicescope_render::{Backend, BlendMode, QuadBatch};

use super::{coloring_context, ActiveLayer, SliceDrawer, SliceView};

impl SliceDrawer {
    /// Samples every layer at the centers of a grid of screen quads and
    /// draws the winning color of each quad.
    ///
    /// The grid step is the smallest voxel spacing over all layers, but
    /// never finer than one pixel.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) fn draw_oblique(
        &mut self,
        backend: &mut dyn Backend,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
    ) {
        let Some(underlay) = layers.first().map(|l| l.layer.volume) else {
            return;
        };
        let Some(spacing) = layers
            .iter()
            .map(|l| l.layer.volume.spacing().min_element())
            .filter(|s| s.is_finite() && *s > 0.0)
            .reduce(f32::min)
        else {
            return;
        };
        let pixel_size = view.extent.width() / view.viewport.width as f32;
        let voxel_size = spacing.max(pixel_size);

        let corners = if self.options.oblique_voxel_alignment {
            let grid_origin = view.plane.project(underlay.voxel_center(IVec3::ZERO));
            align_to_voxel_grid(&view.corners, voxel_size, grid_origin)
        } else {
            view.corners
        };
        let size = corners.max() - corners.min();
        let cols = (size.x / voxel_size).round().max(1.0) as usize;
        let rows = (size.y / voxel_size).round().max(1.0) as usize;

        let transform = oblique_transform(&view.plane);
        let origin = corners.min();
        let centers: Vec<Vec3> = (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| {
                    let local = origin + (Vec2::new(col as f32, row as f32) + 0.5) * voxel_size;
                    transform.transform_point3(local.extend(0.0))
                })
            })
            .collect();

        self.collector.reset(centers.len());
        for active in layers {
            let volume = active.layer.volume;
            let mode = interpolation_for(volume.kind(), SliceProjection::Oblique, DrawPath::Voxels);
            let scratch = self.scratch.layer_mut(active.position);
            scratch.samples.clear();
            scratch.samples.extend(
                centers
                    .iter()
                    .map(|&world| sample_at_world_point(volume, world, active.layer.map_index, mode)),
            );

            let context =
                coloring_context(&self.options, &self.color_maps, active, Some((rows, cols)));
            match colorize(&scratch.samples, active.layer.policy, &context) {
                Ok(colors) => scratch.colors = colors,
                Err(e) => {
                    log::warn!("skipping layer {}: {e}", active.index);
                    continue;
                }
            }

            let voxels: Vec<Option<IVec3>> = scratch.samples.iter().map(|s| s.voxel).collect();
            let picking = if self.picking.is_picking() {
                Some(&mut self.picking)
            } else {
                None
            };
            self.collector.add_layer(
                active.index,
                active.layer.map_index,
                &scratch.colors,
                &voxels,
                active.layer.opacity,
                picking,
            );
        }

        let half_right = view.plane.right() * (voxel_size / 2.0);
        let half_up = view.plane.up() * (voxel_size / 2.0);
        let mut batch = QuadBatch::with_capacity(centers.len());
        for (quad, color) in self.collector.resolved() {
            batch.push_rect(centers[quad], half_right, half_up, color);
        }
        log::debug!(
            "oblique {:?} slice: {rows}x{cols} grid, {} quads",
            view.kind,
            batch.quad_count()
        );
        backend.draw_quads(&batch, BlendMode::FirstLayer);
    }
}
