//! CPU reference backend for headless rendering, tests and screenshots.

use glam::{Mat4, Vec2, Vec3};
use slicescope_core::{OrthographicExtent, Viewport};

use crate::backend::{Backend, LineBatch, PixelReadback, QuadBatch, TexturedQuad};
use crate::blend::{apply_opacity, BlendMode};
use crate::error::{RenderError, RenderResult};
use crate::texture::{TextureFilter, VolumeTexture};

/// Parallelogram determinant below which a quad is treated as degenerate.
const DEGENERATE_AREA: f32 = 1e-12;

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Counters of what the backend was asked to draw since the last frame start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub quad_batches: usize,
    pub quads: usize,
    pub textured_quads: usize,
    pub lines: usize,
}

/// Quad projected to window coordinates.
struct WindowQuad {
    origin: Vec2,
    edge_u: Vec2,
    edge_v: Vec2,
    depth: [f32; 3],
}

impl WindowQuad {
    /// Parallelogram coordinates of a window point, if the quad is not
    /// degenerate.
    fn local(&self, p: Vec2) -> Option<Vec2> {
        let det = self.edge_u.perp_dot(self.edge_v);
        if det.abs() < DEGENERATE_AREA {
            return None;
        }
        let d = p - self.origin;
        Some(Vec2::new(
            d.perp_dot(self.edge_v) / det,
            self.edge_u.perp_dot(d) / det,
        ))
    }

    fn depth_at(&self, uv: Vec2) -> f32 {
        self.depth[0] + uv.x * (self.depth[1] - self.depth[0]) + uv.y * (self.depth[2] - self.depth[0])
    }

    fn bounds(&self) -> (Vec2, Vec2) {
        let corners = [
            self.origin,
            self.origin + self.edge_u,
            self.origin + self.edge_v,
            self.origin + self.edge_u + self.edge_v,
        ];
        let min = corners.iter().fold(Vec2::splat(f32::MAX), |a, &c| a.min(c));
        let max = corners.iter().fold(Vec2::splat(f32::MIN), |a, &c| a.max(c));
        (min, max)
    }
}

/// Software rasterizer with an RGBA color buffer and a depth buffer.
///
/// Quads cover the pixels whose centers fall in the half-open parallelogram
/// `[0, 1) x [0, 1)`, so adjacent quads never blend a pixel twice. Depth is
/// written but not tested; slices are drawn in layer order.
pub struct SoftwareBackend {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    viewport: Viewport,
    clip_from_world: Mat4,
    stats: DrawStats,
}

impl SoftwareBackend {
    /// Creates a backend rendering into a `width x height` target.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            color: vec![[0; 4]; len],
            depth: vec![1.0; len],
            viewport: Viewport::new(0, 0, to_i32(width), to_i32(height)),
            clip_from_world: Mat4::IDENTITY,
            stats: DrawStats::default(),
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Viewport covering the whole target.
    #[must_use]
    pub fn full_viewport(&self) -> Viewport {
        Viewport::new(0, 0, to_i32(self.width), to_i32(self.height))
    }

    #[must_use]
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Color of one pixel, origin bottom-left.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.color[i])
    }

    /// RGBA bytes, top row first, as image files expect.
    #[must_use]
    pub fn pixels(&self) -> Vec<u8> {
        let row = self.width as usize;
        self.color
            .chunks_exact(row)
            .rev()
            .flat_map(|line| line.iter().flatten().copied())
            .collect()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width as usize && y < self.height as usize).then(|| x + y * self.width as usize)
    }

    fn to_window(&self, world: Vec3) -> Vec3 {
        let ndc = self.clip_from_world.project_point3(world);
        let vp = self.viewport;
        Vec3::new(
            vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
            vp.y as f32 + (ndc.y + 1.0) * 0.5 * vp.height as f32,
            ndc.z,
        )
    }

    fn window_quad(&self, corners: [Vec3; 3]) -> WindowQuad {
        let [a, b, d] = corners.map(|c| self.to_window(c));
        WindowQuad {
            origin: a.truncate(),
            edge_u: (b - a).truncate(),
            edge_v: (d - a).truncate(),
            depth: [a.z, b.z, d.z],
        }
    }

    /// Pixel rectangle inside both the viewport and the target.
    #[allow(clippy::cast_possible_truncation)]
    fn pixel_range(&self, min: Vec2, max: Vec2) -> Option<(i32, i32, i32, i32)> {
        let vp = self.viewport;
        let x0 = (min.x.floor() as i32).max(vp.x).max(0);
        let y0 = (min.y.floor() as i32).max(vp.y).max(0);
        let x1 = (max.x.ceil() as i32)
            .min(vp.x + vp.width)
            .min(to_i32(self.width));
        let y1 = (max.y.ceil() as i32)
            .min(vp.y + vp.height)
            .min(to_i32(self.height));
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    /// Visits covered pixels with their index and parallelogram coordinates.
    fn rasterize(&mut self, quad: &WindowQuad, mut shade: impl FnMut(&mut Self, usize, Vec2)) {
        let (min, max) = quad.bounds();
        let Some((x0, y0, x1, y1)) = self.pixel_range(min, max) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(uv) = quad.local(center) else {
                    return;
                };
                if uv.x < 0.0 || uv.x >= 1.0 || uv.y < 0.0 || uv.y >= 1.0 {
                    continue;
                }
                if let Some(index) = self.index(x, y) {
                    shade(self, index, uv);
                }
            }
        }
    }
}

impl Backend for SoftwareBackend {
    fn begin_frame(&mut self, clear_color: [u8; 4]) {
        self.color.fill(clear_color);
        self.depth.fill(1.0);
        self.stats = DrawStats::default();
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_camera(&mut self, extent: &OrthographicExtent, view: &Mat4) {
        self.clip_from_world = extent.projection_matrix() * *view;
    }

    fn draw_quads(&mut self, batch: &QuadBatch, blend: BlendMode) {
        self.stats.quad_batches += 1;
        self.stats.quads += batch.quad_count();
        for quad in batch.vertices().chunks_exact(4) {
            let color = quad[0].color;
            let window = self.window_quad([
                Vec3::from(quad[0].position),
                Vec3::from(quad[1].position),
                Vec3::from(quad[3].position),
            ]);
            self.rasterize(&window, |backend, index, uv| {
                backend.color[index] = blend.blend(color, backend.color[index]);
                backend.depth[index] = window.depth_at(uv);
            });
        }
    }

    fn draw_textured_quad(&mut self, quad: &TexturedQuad, texture: &VolumeTexture, blend: BlendMode) {
        self.stats.textured_quads += 1;
        let [v0, v1, _, v3] = quad.vertices;
        let window = self.window_quad([
            Vec3::from(v0.position),
            Vec3::from(v1.position),
            Vec3::from(v3.position),
        ]);
        let tc0 = Vec3::from(v0.tex_coord);
        let tc_u = Vec3::from(v1.tex_coord) - tc0;
        let tc_v = Vec3::from(v3.tex_coord) - tc0;

        // Texels per pixel along the quad edges decides minification.
        let texels = texture.dims().as_vec3();
        let pixels_u = window.edge_u.length().max(f32::EPSILON);
        let pixels_v = window.edge_v.length().max(f32::EPSILON);
        let texels_per_pixel =
            ((tc_u * texels).length() / pixels_u).max((tc_v * texels).length() / pixels_v);
        let filter = if texels_per_pixel > 1.0 {
            texture.min_filter()
        } else {
            texture.mag_filter()
        };
        let filter = if texture.is_identification() {
            TextureFilter::Nearest
        } else {
            quad.filter.unwrap_or(filter)
        };

        self.rasterize(&window, |backend, index, uv| {
            let tc = tc0 + tc_u * uv.x + tc_v * uv.y;
            let texel = apply_opacity(texture.sample(tc, filter), quad.opacity);
            if texel[3] == 0 {
                return;
            }
            backend.color[index] = blend.blend(texel, backend.color[index]);
            backend.depth[index] = window.depth_at(uv);
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_lines(&mut self, batch: &LineBatch) {
        self.stats.lines += batch.line_count();
        for line in batch.vertices().chunks_exact(2) {
            let a = self.to_window(Vec3::from(line[0].position));
            let b = self.to_window(Vec3::from(line[1].position));
            let steps = (b - a).truncate().abs().max_element().ceil().max(1.0) as i32;
            for step in 0..=steps {
                let p = a.lerp(b, step as f32 / steps as f32);
                let (x, y) = (p.x.floor() as i32, p.y.floor() as i32);
                if !self.viewport.contains(x, y) {
                    continue;
                }
                if let Some(index) = self.index(x, y) {
                    self.color[index] = line[0].color;
                    self.depth[index] = p.z;
                }
            }
        }
    }

    fn read_pixel(&self, x: i32, y: i32) -> Option<PixelReadback> {
        self.index(x, y).map(|i| PixelReadback {
            rgba: self.color[i],
            depth: self.depth[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicescope_core::{compute_orthographic_extent, BoundingBox, SliceViewPlane};

    /// Backend whose camera maps world x, y in `[0, 8]` onto an 8x8 target.
    fn unit_backend() -> SoftwareBackend {
        let mut backend = SoftwareBackend::new(8, 8).unwrap();
        let extent = OrthographicExtent {
            left: 0.0,
            right: 8.0,
            bottom: 0.0,
            top: 8.0,
            near: -10.0,
            far: 10.0,
        };
        backend.set_camera(&extent, &Mat4::IDENTITY);
        backend
    }

    #[test]
    fn test_rejects_empty_target() {
        assert!(SoftwareBackend::new(0, 4).is_err());
    }

    #[test]
    fn test_quad_covers_pixels() {
        let mut backend = unit_backend();
        backend.begin_frame([0, 0, 0, 255]);
        let mut batch = QuadBatch::new();
        batch.push_rect(Vec3::new(2.0, 2.0, 0.0), Vec3::X, Vec3::Y, [255, 0, 0, 255]);
        backend.draw_quads(&batch, BlendMode::FirstLayer);
        assert_eq!(backend.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel(3, 3), Some([0, 0, 0, 255]));
        assert_eq!(backend.stats().quads, 1);
    }

    #[test]
    fn test_adjacent_quads_do_not_double_blend() {
        let mut backend = unit_backend();
        backend.begin_frame([0; 4]);
        let mut batch = QuadBatch::new();
        for x in 0..8 {
            batch.push_rect(
                Vec3::new(x as f32 + 0.5, 4.0, 0.0),
                Vec3::X * 0.5,
                Vec3::Y * 4.0,
                [100, 100, 100, 128],
            );
        }
        backend.draw_quads(&batch, BlendMode::SourceAlpha);
        let first = backend.pixel(0, 0).unwrap();
        for x in 0..8 {
            assert_eq!(backend.pixel(x, 3), Some(first));
        }
    }

    #[test]
    fn test_viewport_clips() {
        let mut backend = unit_backend();
        backend.begin_frame([0; 4]);
        backend.set_viewport(Viewport::new(0, 0, 4, 8));
        let mut batch = QuadBatch::new();
        batch.push_rect(Vec3::new(4.0, 4.0, 0.0), Vec3::X * 4.0, Vec3::Y * 4.0, [9, 9, 9, 255]);
        backend.draw_quads(&batch, BlendMode::FirstLayer);
        // The camera now maps [0, 8] onto the 4 pixel wide viewport.
        assert_eq!(backend.pixel(3, 0), Some([9, 9, 9, 255]));
        assert_eq!(backend.pixel(4, 0), Some([0; 4]));
    }

    #[test]
    fn test_pixels_are_top_row_first() {
        let mut backend = unit_backend();
        backend.begin_frame([0; 4]);
        let mut batch = QuadBatch::new();
        batch.push_rect(Vec3::new(0.5, 0.5, 0.0), Vec3::X * 0.5, Vec3::Y * 0.5, [7, 7, 7, 255]);
        backend.draw_quads(&batch, BlendMode::FirstLayer);
        let pixels = backend.pixels();
        let bottom_left = (7 * 8) * 4;
        assert_eq!(&pixels[bottom_left..bottom_left + 4], &[7, 7, 7, 255]);
        assert_eq!(&pixels[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_lines_and_readback() {
        let mut backend = unit_backend();
        backend.begin_frame([0; 4]);
        let mut lines = LineBatch::new();
        lines.push_line(Vec3::new(0.5, 2.5, 0.0), Vec3::new(7.5, 2.5, 0.0), [1, 2, 3, 255]);
        backend.draw_lines(&lines);
        let readback = backend.read_pixel(5, 2).unwrap();
        assert_eq!(readback.rgba, [1, 2, 3, 255]);
        assert!(backend.read_pixel(8, 0).is_none());
    }

    #[test]
    fn test_textured_quad_samples_texels() {
        use crate::backend::TexturedVertex;
        use crate::texture::build_volume_texture;
        use glam::UVec3;
        use slicescope_core::{
            ColorMapRegistry, ColoringPolicy, EngineOptions, LabelTable, VolumeGrid, VolumeKind,
        };

        let mut volume = VolumeGrid::with_spacing(
            "pair",
            UVec3::new(2, 1, 1),
            Vec3::ZERO,
            Vec3::ONE,
            VolumeKind::Label,
        )
        .unwrap();
        volume.add_map(vec![1.0, 2.0]).unwrap();
        let policy = ColoringPolicy::label(
            LabelTable::new()
                .with_label(1, "left", [1.0, 0.0, 0.0, 1.0])
                .with_label(2, "right", [0.0, 1.0, 0.0, 1.0]),
        );
        let options = EngineOptions {
            texture_size_ceiling: 16,
            npot_textures_supported: true,
            ..EngineOptions::default()
        };
        let texture =
            build_volume_texture(&volume, 0, &policy, false, &ColorMapRegistry::new(), &options)
                .unwrap();

        let vertex = |x: f32, y: f32| TexturedVertex {
            position: [x * 8.0, y * 8.0, 0.0],
            tex_coord: [x, y, 0.5],
        };
        let quad = TexturedQuad {
            vertices: [vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0), vertex(0.0, 1.0)],
            opacity: 0.5,
            filter: None,
        };
        let mut backend = unit_backend();
        backend.begin_frame([0; 4]);
        backend.draw_textured_quad(&quad, &texture, BlendMode::FirstLayer);
        assert_eq!(backend.pixel(1, 6), Some([255, 0, 0, 127]));
        assert_eq!(backend.pixel(6, 1), Some([0, 255, 0, 127]));
        assert_eq!(backend.stats().textured_quads, 1);
    }

    #[test]
    fn test_camera_from_extent() {
        let bounds = BoundingBox::from_corners(Vec3::splat(-1.0), Vec3::splat(1.0));
        let extent =
            compute_orthographic_extent(&bounds, SliceViewPlane::Axial, 1.0, 1.0, false).unwrap();
        let mut backend = SoftwareBackend::new(10, 10).unwrap();
        backend.set_camera(&extent, &Mat4::IDENTITY);
        backend.begin_frame([0; 4]);
        let mut batch = QuadBatch::new();
        batch.push_rect(Vec3::ZERO, Vec3::X * 0.1, Vec3::Y * 0.1, [5, 5, 5, 255]);
        backend.draw_quads(&batch, BlendMode::FirstLayer);
        assert_eq!(backend.pixel(5, 5), Some([5, 5, 5, 255]));
        assert_eq!(backend.pixel(0, 0), Some([0; 4]));
    }
}
