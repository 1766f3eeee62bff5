//! Identification passes: which voxel is under a pixel.

use glam::{IVec3, Vec3};
use slicescope_core::{sample_at_world_point, DrawPath, InterpolationMode, NearestPick, SampleValue};
use slicescope_render::{apply_opacity, Backend, BlendMode, TextureFilter, TextureVoxelLookup};

use super::texture::{slice_corners, textured_quad};
use super::{prepare_backend, ActiveLayer, DrawRequest, SliceDrawer, SliceView};

/// A voxel found under the identification pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelIdentification {
    /// Index into the request's layers.
    pub layer_index: usize,
    pub map_index: usize,
    pub ijk: IVec3,
    /// Center of the voxel.
    pub world: Vec3,
    pub value: SampleValue,
}

impl VoxelIdentification {
    fn new(active: &ActiveLayer<'_>, ijk: IVec3) -> Self {
        let volume = active.layer.volume;
        let world = volume.voxel_center(ijk);
        let sample = sample_at_world_point(
            volume,
            world,
            active.layer.map_index,
            InterpolationMode::Nearest,
        );
        Self {
            layer_index: active.index,
            map_index: active.layer.map_index,
            ijk,
            world,
            value: sample.value,
        }
    }
}

impl SliceDrawer {
    /// Draws one slice in picking mode and resolves `pixel`.
    pub(super) fn identify(
        &mut self,
        backend: &mut dyn Backend,
        request: &DrawRequest<'_>,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
        pixel: (i32, i32),
    ) -> Option<VoxelIdentification> {
        match request.path {
            DrawPath::Texture => self.identify_textured(backend, layers, view, pixel),
            DrawPath::Voxels => self.identify_voxels(backend, request, layers, view, pixel),
        }
    }

    /// Quads carry picking ids; one read-back resolves the topmost.
    fn identify_voxels(
        &mut self,
        backend: &mut dyn Backend,
        request: &DrawRequest<'_>,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
        pixel: (i32, i32),
    ) -> Option<VoxelIdentification> {
        let max_dim = layers
            .iter()
            .map(|l| l.layer.volume.dimensions().max_element() as usize)
            .max()
            .unwrap_or(0);
        self.picking.begin(max_dim * max_dim * layers.len());
        backend.begin_frame([0; 4]);
        prepare_backend(backend, view);
        self.draw_layers(backend, request, layers, view);
        self.picking.end();

        let readback = backend.read_pixel(pixel.0, pixel.1)?;
        let entry = *self.picking.decode_pixel(readback.rgba)?;
        log::debug!(
            "pixel {pixel:?} holds voxel {} of layer {} ({} ids drawn)",
            entry.ijk,
            entry.volume_index,
            self.picking.len()
        );
        let active = layers.iter().find(|l| l.index == entry.volume_index)?;
        Some(VoxelIdentification::new(active, entry.ijk))
    }

    /// Each layer's identification texture is drawn alone, topmost layer
    /// first, and the nearest decoded voxel wins.
    fn identify_textured(
        &mut self,
        backend: &mut dyn Backend,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
        pixel: (i32, i32),
    ) -> Option<VoxelIdentification> {
        let corners = slice_corners(view);
        let mut nearest = NearestPick::new();
        for active in layers.iter().rev() {
            if apply_opacity([0, 0, 0, 255], active.layer.opacity)[3] == 0 {
                log::debug!("layer {} is fully transparent, not identified", active.index);
                continue;
            }
            let Some(texture) = self.layer_texture(active, true) else {
                continue;
            };
            let quad = textured_quad(active, texture, corners, 1.0, Some(TextureFilter::Nearest));
            backend.begin_frame([0; 4]);
            prepare_backend(backend, view);
            backend.draw_textured_quad(&quad, texture, BlendMode::FirstLayer);

            let Some(readback) = backend.read_pixel(pixel.0, pixel.1) else {
                continue;
            };
            let lookup = TextureVoxelLookup::new(active.layer.volume.dimensions());
            if let Some(ijk) = lookup.decode(readback.rgba) {
                nearest.offer(readback.depth, (*active, ijk));
            }
        }
        nearest
            .into_inner()
            .map(|(active, ijk)| VoxelIdentification::new(&active, ijk))
    }
}
