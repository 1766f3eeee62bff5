//! Slices drawn as one textured quad per layer.

use glam::Vec3;
use slicescope_core::{oblique_transform, transform_to_world, SliceProjection};
use slicescope_render::{
    texture_coordinate, Backend, BlendMode, TextureFilter, TexturedQuad, TexturedVertex,
    VolumeTexture,
};

use super::{ActiveLayer, SliceDrawer, SliceView};

impl SliceDrawer {
    /// Draws each layer's volume texture over the visible rectangle.
    ///
    /// Layers whose texture cannot be built are skipped.
    pub(super) fn draw_textured(
        &mut self,
        backend: &mut dyn Backend,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
    ) {
        let corners = slice_corners(view);
        let filter = texture_filter(view);
        let mut drawn = 0;
        for active in layers {
            let Some(texture) = self.layer_texture(active, false) else {
                continue;
            };
            let quad = textured_quad(active, texture, corners, active.layer.opacity, filter);
            backend.draw_textured_quad(&quad, texture, BlendMode::for_layer(drawn));
            drawn += 1;
        }
    }

    /// Cached texture of a layer, `None` when it cannot be built.
    pub(super) fn layer_texture(
        &mut self,
        active: &ActiveLayer<'_>,
        identification: bool,
    ) -> Option<&VolumeTexture> {
        let built = self.textures.get_or_build(
            active.layer.volume,
            active.layer.map_index,
            active.layer.policy,
            identification,
            &self.color_maps,
            &self.options,
        );
        match built {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("skipping layer {} in texture mode: {e}", active.index);
                None
            }
        }
    }
}

/// World corners of the visible rectangle.
pub(super) fn slice_corners(view: &SliceView) -> [Vec3; 4] {
    transform_to_world(&view.corners, &oblique_transform(&view.plane))
}

/// Orthogonal slices never filter linearly.
fn texture_filter(view: &SliceView) -> Option<TextureFilter> {
    match view.projection {
        SliceProjection::Orthogonal => Some(TextureFilter::Nearest),
        SliceProjection::Oblique => None,
    }
}

pub(super) fn textured_quad(
    active: &ActiveLayer<'_>,
    texture: &VolumeTexture,
    corners: [Vec3; 4],
    opacity: f32,
    filter: Option<TextureFilter>,
) -> TexturedQuad {
    TexturedQuad {
        vertices: corners.map(|position| TexturedVertex {
            position: position.to_array(),
            tex_coord: texture_coordinate(active.layer.volume, texture, position).to_array(),
        }),
        opacity,
        filter,
    }
}
