//! Combining colored layers.
//!
//! [`composite_layers`] is the CPU form of what a backend does when the
//! per-layer quads of a slice are drawn in order. [`VoxelQuadCollector`]
//! resolves point-sampled oblique slices, where one output quad may receive
//! colors from several volumes.

use glam::IVec3;
use slicescope_core::PickingTable;

use crate::blend::{apply_opacity, BlendMode};

/// One layer's colors and its opacity.
#[derive(Debug, Clone, Copy)]
pub struct ColoredLayer<'a> {
    pub colors: &'a [[u8; 4]],
    pub opacity: f32,
}

impl<'a> ColoredLayer<'a> {
    #[must_use]
    pub fn new(colors: &'a [[u8; 4]], opacity: f32) -> Self {
        Self { colors, opacity }
    }
}

/// Composites layers bottom to top onto a cleared raster of `len` pixels.
///
/// The first layer drawn uses [`BlendMode::FirstLayer`], later layers
/// [`BlendMode::SourceAlpha`]. Layers whose length differs from `len` are
/// skipped and do not count as the first layer.
#[must_use]
pub fn composite_layers(layers: &[ColoredLayer<'_>], len: usize) -> Vec<[u8; 4]> {
    let mut raster = vec![[0u8; 4]; len];
    let mut drawn = 0;
    for (index, layer) in layers.iter().enumerate() {
        if layer.colors.len() != len {
            log::debug!(
                "skipping layer {index}: {} colors for {len} pixels",
                layer.colors.len()
            );
            continue;
        }
        let mode = BlendMode::for_layer(drawn);
        for (dst, &src) in raster.iter_mut().zip(layer.colors) {
            *dst = mode.blend(apply_opacity(src, layer.opacity), *dst);
        }
        drawn += 1;
    }
    raster
}

/// Winning color per output quad across the layers of a point-sampled slice.
///
/// The last layer with a visible color wins. In picking mode each
/// contributing layer registers an entry and the quad takes that entry's id
/// color instead.
#[derive(Debug, Clone, Default)]
pub struct VoxelQuadCollector {
    colors: Vec<Option<[u8; 4]>>,
}

impl VoxelQuadCollector {
    #[must_use]
    pub fn new(quad_count: usize) -> Self {
        let mut collector = Self::default();
        collector.reset(quad_count);
        collector
    }

    /// Forgets every color and resizes for `quad_count` quads.
    pub fn reset(&mut self, quad_count: usize) {
        self.colors.clear();
        self.colors.resize(quad_count, None);
    }

    /// Offers one layer's colors, indexed like the quads.
    ///
    /// `voxels` holds the source voxel of each sample, needed for picking.
    pub fn add_layer(
        &mut self,
        layer_index: usize,
        map_index: usize,
        colors: &[[u8; 4]],
        voxels: &[Option<IVec3>],
        opacity: f32,
        mut picking: Option<&mut PickingTable>,
    ) {
        for (quad, (&color, voxel)) in colors.iter().zip(voxels).enumerate() {
            let Some(slot) = self.colors.get_mut(quad) else {
                break;
            };
            let color = apply_opacity(color, opacity);
            if color[3] == 0 {
                continue;
            }
            match (picking.as_deref_mut(), voxel) {
                (Some(table), Some(ijk)) => {
                    if let Some(id) = table.add_entry(layer_index, map_index, *ijk) {
                        *slot = Some(id.color());
                    }
                }
                (Some(_), None) => {}
                (None, _) => *slot = Some(color),
            }
        }
    }

    /// Quads that received a color, as `(quad index, color)`.
    pub fn resolved(&self) -> impl Iterator<Item = (usize, [u8; 4])> + '_ {
        self.colors
            .iter()
            .enumerate()
            .filter_map(|(index, color)| color.map(|c| (index, c)))
    }

    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.colors.len()
    }
}
