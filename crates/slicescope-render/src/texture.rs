//! Pre-colored 3D textures of volumes for the texture draw path.

use std::collections::HashMap;

use glam::{IVec3, UVec3, Vec3};
use slicescope_core::pick::MAX_PICK_ID;
use slicescope_core::{
    color_to_index, colorize, index_to_color, ColorMapRegistry, ColoringContext, ColoringPolicy,
    EngineOptions, ResampledSample, SampleValue, SliceError, VolumeId, VolumeKind, VolumeSource,
};

use crate::error::{RenderError, RenderResult};

/// Smallest texture edge allocated for power-of-two textures.
const MIN_TEXTURE_SIZE: u32 = 256;

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// A volume colored ahead of time into an RGBA 3D texture.
#[derive(Debug, Clone)]
pub struct VolumeTexture {
    dims: UVec3,
    volume_dims: UVec3,
    max_str: Vec3,
    min_filter: TextureFilter,
    mag_filter: TextureFilter,
    identification: bool,
    texels: Vec<[u8; 4]>,
}

impl VolumeTexture {
    /// Texture dimensions.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Dimensions of the volume the texture was built from.
    #[must_use]
    pub fn volume_dims(&self) -> UVec3 {
        self.volume_dims
    }

    /// Fraction of the texture coordinate range holding volume data.
    #[must_use]
    pub fn max_str(&self) -> Vec3 {
        self.max_str
    }

    #[must_use]
    pub fn min_filter(&self) -> TextureFilter {
        self.min_filter
    }

    #[must_use]
    pub fn mag_filter(&self) -> TextureFilter {
        self.mag_filter
    }

    /// Whether texels hold voxel offset ids instead of colors.
    #[must_use]
    pub fn is_identification(&self) -> bool {
        self.identification
    }

    /// Texel at an integer coordinate, transparent outside the texture.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn texel(&self, stu: IVec3) -> [u8; 4] {
        if stu.cmplt(IVec3::ZERO).any() || stu.as_uvec3().cmpge(self.dims).any() {
            return [0; 4];
        }
        let (s, t, u) = (stu.x as usize, stu.y as usize, stu.z as usize);
        let (w, h) = (self.dims.x as usize, self.dims.y as usize);
        self.texels[s + w * (t + h * u)]
    }

    /// Samples at a normalized texture coordinate with the given filter.
    ///
    /// Coordinates outside `[0, 1]` read transparent texels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample(&self, str_coord: Vec3, filter: TextureFilter) -> [u8; 4] {
        if str_coord.cmplt(Vec3::ZERO).any() || str_coord.cmpgt(Vec3::ONE).any() {
            return [0; 4];
        }
        let texel_coord = str_coord * self.dims.as_vec3();
        match filter {
            TextureFilter::Nearest => self.texel(texel_coord.floor().as_ivec3()),
            TextureFilter::Linear => {
                let base = texel_coord - Vec3::splat(0.5);
                let lower = base.floor();
                let frac = base - lower;
                let lower = lower.as_ivec3();
                let mut sum = [0.0f32; 4];
                for corner in 0..8 {
                    let offset = IVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
                    let weight = offset
                        .as_vec3()
                        .to_array()
                        .iter()
                        .zip(frac.to_array())
                        .map(|(&o, f)| if o > 0.0 { f } else { 1.0 - f })
                        .product::<f32>();
                    let max = self.dims.as_ivec3() - IVec3::ONE;
                    let texel = self.texel((lower + offset).clamp(IVec3::ZERO, max));
                    for (acc, &c) in sum.iter_mut().zip(&texel) {
                        *acc += weight * f32::from(c);
                    }
                }
                sum.map(|c| c.round().clamp(0.0, 255.0) as u8)
            }
        }
    }
}

/// Texture dimensions for a volume.
///
/// Power-of-two textures start at 256 and grow to hold the largest volume
/// dimension. When that exceeds `texture_size_ceiling` the build fails,
/// unless non-power-of-two textures are supported, in which case the exact
/// volume dimensions are used.
pub fn texture_dimensions(volume_dims: UVec3, options: &EngineOptions) -> RenderResult<UVec3> {
    let largest = volume_dims.max_element();
    let size = largest.max(MIN_TEXTURE_SIZE).next_power_of_two();
    if size <= options.texture_size_ceiling {
        Ok(UVec3::splat(size))
    } else if options.npot_textures_supported {
        Ok(volume_dims)
    } else {
        Err(SliceError::TextureTooLarge {
            dims: volume_dims,
            ceiling: options.texture_size_ceiling,
        }
        .into())
    }
}

/// Colors a volume map into a texture.
///
/// Identification textures store the offset `i + I*(j + J*k)` of every
/// voxel that would be drawn as a 24-bit color with alpha 255; hidden voxels
/// stay transparent. Texels are laid out z-major, then j, then i.
/// Palette textures minify linearly and magnify with nearest; everything
/// else uses nearest both ways. Label outlines are applied per k slab.
pub fn build_volume_texture(
    volume: &dyn VolumeSource,
    map_index: usize,
    policy: &ColoringPolicy,
    identification: bool,
    color_maps: &ColorMapRegistry,
    options: &EngineOptions,
) -> RenderResult<VolumeTexture> {
    if map_index >= volume.num_maps() {
        return Err(RenderError::TextureCreationFailed(format!(
            "volume '{}' has no map {map_index}",
            volume.name()
        )));
    }
    let volume_dims = volume.dimensions();
    let dims = texture_dimensions(volume_dims, options)?;
    let (min_filter, mag_filter) = match (volume.kind(), identification) {
        (VolumeKind::Palette, false) => (TextureFilter::Linear, TextureFilter::Nearest),
        _ => (TextureFilter::Nearest, TextureFilter::Nearest),
    };

    let texel_count = dims.x as usize * dims.y as usize * dims.z as usize;
    let mut texels = vec![[0u8; 4]; texel_count];
    let (vi, vj, vk) = (
        volume_dims.x as usize,
        volume_dims.y as usize,
        volume_dims.z as usize,
    );
    let (tw, th) = (dims.x as usize, dims.y as usize);

    let context = ColoringContext {
        color_maps,
        statistics: volume.statistics(map_index),
        layer_index: 1,
        raster: Some((vj, vi)),
        outline_color: options.label_outline_color,
        base_layer_background: options.base_layer_background,
    };

    let mut slab = Vec::with_capacity(vi * vj);
    for k in 0..vk {
        slab.clear();
        for j in 0..vj {
            for i in 0..vi {
                slab.push(voxel_sample(volume, voxel_index(i, j, k), map_index));
            }
        }
        let colors = colorize(&slab, policy, &context)?;
        let slab_colors = if identification {
            identification_slab(volume, k * vi * vj, &colors)
        } else {
            colors
        };
        for j in 0..vj {
            let row = tw * (j + th * k);
            texels[row..row + vi].copy_from_slice(&slab_colors[j * vi..(j + 1) * vi]);
        }
    }

    log::debug!(
        "built {} texture {dims} for volume '{}' map {map_index}",
        if identification { "identification" } else { "color" },
        volume.name()
    );

    Ok(VolumeTexture {
        dims,
        volume_dims,
        max_str: volume_dims.as_vec3() / dims.as_vec3(),
        min_filter,
        mag_filter,
        identification,
        texels,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn voxel_index(i: usize, j: usize, k: usize) -> IVec3 {
    IVec3::new(i as i32, j as i32, k as i32)
}

fn voxel_sample(volume: &dyn VolumeSource, ijk: IVec3, map_index: usize) -> ResampledSample {
    let value = match volume.kind() {
        VolumeKind::DirectRgba => volume.rgba(ijk, map_index).map(SampleValue::Rgba),
        VolumeKind::Palette | VolumeKind::Label => {
            volume.value(ijk, map_index).map(SampleValue::Scalar)
        }
    };
    match value {
        Some(value) => ResampledSample {
            world: volume.voxel_center(ijk),
            value,
            valid: true,
            voxel: Some(ijk),
        },
        None => ResampledSample::invalid(volume.voxel_center(ijk)),
    }
}

/// Offset ids of the visible voxels of one slab starting at `first`.
fn identification_slab(volume: &dyn VolumeSource, first: usize, colors: &[[u8; 4]]) -> Vec<[u8; 4]> {
    colors
        .iter()
        .enumerate()
        .map(|(n, color)| {
            if color[3] == 0 {
                return [0; 4];
            }
            let offset = first + n;
            match u32::try_from(offset) {
                Ok(id) if id <= MAX_PICK_ID => {
                    let [r, g, b] = index_to_color(id);
                    [r, g, b, 255]
                }
                _ => {
                    log::warn!(
                        "voxel offset {offset} of volume '{}' exceeds the 24-bit id range",
                        volume.name()
                    );
                    [0; 4]
                }
            }
        })
        .collect()
}

/// Texture coordinate of a world point.
///
/// Voxels are cell centered, so the volume spans from half a voxel before
/// the first center to half a voxel after the last.
#[must_use]
pub fn texture_coordinate(volume: &dyn VolumeSource, texture: &VolumeTexture, world: Vec3) -> Vec3 {
    let index = volume.world_to_index_continuous(world);
    (index + Vec3::splat(0.5)) / texture.volume_dims().as_vec3() * texture.max_str()
}

/// Decodes read-back pixels of identification textures into voxel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureVoxelLookup {
    dims: UVec3,
}

impl TextureVoxelLookup {
    #[must_use]
    pub fn new(volume_dims: UVec3) -> Self {
        Self { dims: volume_dims }
    }

    /// Voxel encoded in a pixel; `None` unless alpha is 255 and the offset is
    /// inside the volume.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn decode(&self, rgba: [u8; 4]) -> Option<IVec3> {
        if rgba[3] != 255 {
            return None;
        }
        let offset = u64::from(color_to_index(rgba[0], rgba[1], rgba[2]));
        let (i_dim, j_dim) = (u64::from(self.dims.x), u64::from(self.dims.y));
        let voxel_count = i_dim * j_dim * u64::from(self.dims.z);
        if offset >= voxel_count {
            return None;
        }
        let i = offset % i_dim;
        let j = (offset / i_dim) % j_dim;
        let k = offset / (i_dim * j_dim);
        Some(IVec3::new(i as i32, j as i32, k as i32))
    }
}

/// Built textures kept across frames, keyed by volume and map.
///
/// Entries are never refreshed on their own; whoever changes volume data or
/// coloring calls [`TextureCache::invalidate`].
#[derive(Debug, Default)]
pub struct TextureCache {
    normal: HashMap<(VolumeId, usize), VolumeTexture>,
    identification: HashMap<(VolumeId, usize), VolumeTexture>,
}

impl TextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached texture or builds and caches it.
    ///
    /// Failed builds are not cached.
    pub fn get_or_build(
        &mut self,
        volume: &dyn VolumeSource,
        map_index: usize,
        policy: &ColoringPolicy,
        identification: bool,
        color_maps: &ColorMapRegistry,
        options: &EngineOptions,
    ) -> RenderResult<&VolumeTexture> {
        let cache = if identification {
            &mut self.identification
        } else {
            &mut self.normal
        };
        let key = (volume.id(), map_index);
        if !cache.contains_key(&key) {
            let texture =
                build_volume_texture(volume, map_index, policy, identification, color_maps, options)?;
            cache.insert(key, texture);
        }
        cache
            .get(&key)
            .ok_or_else(|| RenderError::TextureCreationFailed("texture cache miss".to_string()))
    }

    /// Drops every texture of a volume.
    pub fn invalidate(&mut self, id: VolumeId) {
        self.normal.retain(|(volume, _), _| *volume != id);
        self.identification.retain(|(volume, _), _| *volume != id);
    }

    pub fn clear(&mut self) {
        self.normal.clear();
        self.identification.clear();
    }

    /// Number of cached textures, normal and identification.
    #[must_use]
    pub fn len(&self) -> usize {
        self.normal.len() + self.identification.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
