//! The drawing backend interface and the batches it consumes.
//!
//! The slice drawer never talks to a graphics API directly. It fills
//! [`QuadBatch`], [`TexturedQuad`] and [`LineBatch`] values and hands them to a
//! [`Backend`], which decides how to rasterize them.

use glam::{Mat4, Vec3};
use slicescope_core::{OrthographicExtent, Viewport};

use crate::blend::BlendMode;
use crate::texture::{TextureFilter, VolumeTexture};

/// Vertex of a colored quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// World position.
    pub position: [f32; 3],
    /// RGBA color.
    pub color: [u8; 4],
}

/// Colored quads, four vertices each.
///
/// Vertices run bottom-left, bottom-right, top-right, top-left. Quads are
/// parallelograms: they are images of voxel faces under affine maps.
#[derive(Debug, Clone, Default)]
pub struct QuadBatch {
    vertices: Vec<QuadVertex>,
}

impl QuadBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
        }
    }

    /// Appends a quad from corners in bottom-left, bottom-right, top-right,
    /// top-left order.
    pub fn push_quad(&mut self, corners: [Vec3; 4], color: [u8; 4]) {
        self.vertices.extend(corners.map(|c| QuadVertex {
            position: c.to_array(),
            color,
        }));
    }

    /// Appends an axis-aligned quad in the plane spanned by `right` and `up`.
    pub fn push_rect(&mut self, center: Vec3, right: Vec3, up: Vec3, color: [u8; 4]) {
        self.push_quad(
            [
                center - right - up,
                center + right - up,
                center + right + up,
                center - right + up,
            ],
            color,
        );
    }

    #[must_use]
    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    /// Raw vertex bytes, ready for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

/// Vertex of a texture-mapped quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex {
    /// World position.
    pub position: [f32; 3],
    /// 3D texture coordinate.
    pub tex_coord: [f32; 3],
}

/// One quad textured from a volume texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedQuad {
    /// Bottom-left, bottom-right, top-right, top-left.
    pub vertices: [TexturedVertex; 4],
    /// Layer opacity multiplied into texel alpha.
    pub opacity: f32,
    /// Filter used for both minification and magnification instead of the
    /// texture's own.
    pub filter: Option<TextureFilter>,
}

/// Vertex of a line segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

/// Line segments, two vertices each.
#[derive(Debug, Clone, Default)]
pub struct LineBatch {
    vertices: Vec<LineVertex>,
}

impl LineBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, from: Vec3, to: Vec3, color: [u8; 4]) {
        self.vertices.push(LineVertex {
            position: from.to_array(),
            color,
        });
        self.vertices.push(LineVertex {
            position: to.to_array(),
            color,
        });
    }

    #[must_use]
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.vertices.len() / 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Color and depth read back from one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelReadback {
    pub rgba: [u8; 4],
    /// Window depth in `[0, 1]`, 0 nearest.
    pub depth: f32,
}

/// A drawing backend, one method per primitive batch.
///
/// Window coordinates have their origin at the bottom-left pixel.
pub trait Backend {
    /// Clears color and depth.
    fn begin_frame(&mut self, clear_color: [u8; 4]);

    /// Restricts drawing to a rectangle.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Sets the orthographic projection and view transform.
    fn set_camera(&mut self, extent: &OrthographicExtent, view: &Mat4);

    fn draw_quads(&mut self, batch: &QuadBatch, blend: BlendMode);

    fn draw_textured_quad(&mut self, quad: &TexturedQuad, texture: &VolumeTexture, blend: BlendMode);

    fn draw_lines(&mut self, batch: &LineBatch);

    /// Reads one pixel; `None` outside the render target.
    fn read_pixel(&self, x: i32, y: i32) -> Option<PixelReadback>;
}
