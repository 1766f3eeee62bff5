//! Drawing slices of layered volumes through a [`Backend`].
//!
//! [`SliceDrawer::draw`] turns one [`DrawRequest`] into backend calls. The
//! request picks the view (one plane, all three, or a montage), the
//! projection and the draw path. Every layer is resampled onto each slice,
//! colored, and drawn in layer order.

mod identify;
mod montage;
mod oblique;
mod orthogonal;
mod texture;

pub use identify::VoxelIdentification;
pub use montage::MontageSettings;

use glam::{Mat4, Vec2, Vec3};
use slicescope_core::{
    compute_orthographic_extent, compute_screen_corners, compute_slice_plane, three_panel_layout,
    ColorMapRegistry, ColoringContext, ColoringPolicy, DrawPath, EngineOptions,
    OrthographicExtent, PickingTable, ScratchPool, ScreenCorners, SliceCoordinates,
    SliceDrawingType, SlicePlane, SliceProjection, SliceViewPlane, Viewport, VolumeSource,
};
use slicescope_render::{Backend, LineBatch, TextureCache, VoxelQuadCollector};

/// One volume map drawn as a layer.
#[derive(Clone, Copy)]
pub struct LayerDescriptor<'a> {
    pub volume: &'a dyn VolumeSource,
    pub map_index: usize,
    /// Opacity in `[0, 1]`, multiplied into every color's alpha.
    pub opacity: f32,
    pub policy: &'a ColoringPolicy,
    pub enabled: bool,
}

impl<'a> LayerDescriptor<'a> {
    /// An enabled, opaque layer showing map 0.
    #[must_use]
    pub fn new(volume: &'a dyn VolumeSource, policy: &'a ColoringPolicy) -> Self {
        Self {
            volume,
            map_index: 0,
            opacity: 1.0,
            policy,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_map(mut self, map_index: usize) -> Self {
        self.map_index = map_index;
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl std::fmt::Debug for LayerDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerDescriptor")
            .field("volume", &self.volume.name())
            .field("map_index", &self.map_index)
            .field("opacity", &self.opacity)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Normal drawing or an identification pass at a window pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Normal,
    /// Draw picking ids and resolve the voxel under `pixel` (origin
    /// bottom-left). The pass clears the backend.
    Identify { pixel: (i32, i32) },
}

/// Everything one draw call needs.
#[derive(Debug, Clone)]
pub struct DrawRequest<'a> {
    pub viewport: Viewport,
    /// Layers in draw order; the first enabled layer is the underlay.
    pub layers: Vec<LayerDescriptor<'a>>,
    pub view_plane: SliceViewPlane,
    pub projection: SliceProjection,
    pub drawing_type: SliceDrawingType,
    pub path: DrawPath,
    /// Rotation applied to oblique slices.
    pub oblique_rotation: Mat4,
    pub coordinates: SliceCoordinates,
    pub montage: MontageSettings,
    pub zoom: f32,
    /// Pan in world units along the screen axes.
    pub view_offset: Vec2,
    pub mode: DrawMode,
    /// Lines drawn over every slice in normal mode, in world coordinates.
    pub overlay_lines: Option<&'a LineBatch>,
}

impl<'a> DrawRequest<'a> {
    /// A single orthogonal axial slice through `coordinates`.
    #[must_use]
    pub fn new(viewport: Viewport, layers: Vec<LayerDescriptor<'a>>, coordinates: Vec3) -> Self {
        Self {
            viewport,
            layers,
            view_plane: SliceViewPlane::Axial,
            projection: SliceProjection::Orthogonal,
            drawing_type: SliceDrawingType::Single,
            path: DrawPath::Voxels,
            oblique_rotation: Mat4::IDENTITY,
            coordinates,
            montage: MontageSettings::default(),
            zoom: 1.0,
            view_offset: Vec2::ZERO,
            mode: DrawMode::Normal,
            overlay_lines: None,
        }
    }
}

/// Result of a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOutcome {
    /// Nothing was drawn: no enabled layers, an empty viewport or a
    /// degenerate slice plane.
    Skipped,
    Drawn,
    /// Result of an identification pass; `None` when no voxel is under the
    /// pixel.
    Identified(Option<VoxelIdentification>),
}

/// An enabled layer with its positions.
#[derive(Debug, Clone, Copy)]
struct ActiveLayer<'a> {
    /// Index into [`DrawRequest::layers`].
    index: usize,
    /// Position among enabled layers; 0 is the underlay.
    position: usize,
    layer: LayerDescriptor<'a>,
}

/// A slice to draw into one viewport.
#[derive(Debug, Clone, Copy)]
struct SliceTarget {
    plane: SliceViewPlane,
    viewport: Viewport,
    coordinates: SliceCoordinates,
    /// Part of the three-plane view, which shares one scale.
    all_planes: bool,
}

/// Geometry of one slice ready for drawing.
#[derive(Debug, Clone, Copy)]
struct SliceView {
    kind: SliceViewPlane,
    projection: SliceProjection,
    viewport: Viewport,
    coordinates: SliceCoordinates,
    /// Slice plane centered on the underlay's bounding box.
    plane: SlicePlane,
    extent: OrthographicExtent,
    /// Visible rectangle, plane-local to `plane`.
    corners: ScreenCorners,
    view: Mat4,
}

/// Draws slices and keeps the state reused across frames.
#[derive(Debug)]
pub struct SliceDrawer {
    options: EngineOptions,
    color_maps: ColorMapRegistry,
    textures: TextureCache,
    scratch: ScratchPool,
    picking: PickingTable,
    collector: VoxelQuadCollector,
}

impl SliceDrawer {
    /// Creates a drawer with the built-in color maps.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            color_maps: ColorMapRegistry::new(),
            textures: TextureCache::new(),
            scratch: ScratchPool::new(),
            picking: PickingTable::new(),
            collector: VoxelQuadCollector::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Changes the options and drops every cached texture.
    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
        self.textures.clear();
    }

    #[must_use]
    pub fn color_maps(&self) -> &ColorMapRegistry {
        &self.color_maps
    }

    pub fn color_maps_mut(&mut self) -> &mut ColorMapRegistry {
        &mut self.color_maps
    }

    /// Texture cache; invalidate entries here when volume data or coloring
    /// changes.
    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// Picking table of the last identification pass.
    #[must_use]
    pub fn picking(&self) -> &PickingTable {
        &self.picking
    }

    /// Draws a request.
    pub fn draw(&mut self, backend: &mut dyn Backend, request: &DrawRequest<'_>) -> DrawOutcome {
        let layers = active_layers(request);
        let Some(underlay) = layers.first().map(|l| l.layer.volume) else {
            log::debug!("no enabled layers, nothing to draw");
            return DrawOutcome::Skipped;
        };
        if !request.viewport.is_valid() {
            log::debug!("invalid viewport {:?}, nothing to draw", request.viewport);
            return DrawOutcome::Skipped;
        }
        self.scratch.reset(layers.len());

        let targets = self.slice_targets(request, underlay);
        if let DrawMode::Identify { pixel } = request.mode {
            let Some(target) = targets
                .iter()
                .find(|t| t.viewport.contains(pixel.0, pixel.1))
            else {
                return DrawOutcome::Identified(None);
            };
            let Some(view) = slice_view(request, underlay, target) else {
                return DrawOutcome::Skipped;
            };
            return DrawOutcome::Identified(self.identify(backend, request, &layers, &view, pixel));
        }

        let mut drawn = false;
        for target in &targets {
            let Some(view) = slice_view(request, underlay, target) else {
                continue;
            };
            prepare_backend(backend, &view);
            self.draw_layers(backend, request, &layers, &view);
            if let Some(lines) = request.overlay_lines {
                backend.draw_lines(lines);
            }
            drawn = true;
        }
        if drawn {
            DrawOutcome::Drawn
        } else {
            DrawOutcome::Skipped
        }
    }

    /// Slices to draw and their viewports.
    fn slice_targets(
        &self,
        request: &DrawRequest<'_>,
        underlay: &dyn VolumeSource,
    ) -> Vec<SliceTarget> {
        if request.view_plane == SliceViewPlane::All {
            return three_panel_layout(request.viewport, self.options.all_view_layout)
                .into_iter()
                .map(|(plane, viewport)| SliceTarget {
                    plane,
                    viewport,
                    coordinates: request.coordinates,
                    all_planes: true,
                })
                .collect();
        }

        let single = SliceTarget {
            plane: request.view_plane,
            viewport: request.viewport,
            coordinates: request.coordinates,
            all_planes: false,
        };
        match (request.drawing_type, request.projection) {
            (SliceDrawingType::Montage, SliceProjection::Orthogonal) => montage::montage_targets(
                request.view_plane,
                request.viewport,
                request.coordinates,
                &request.montage,
                self.options.montage_margin_px,
                underlay,
            ),
            (SliceDrawingType::Montage, SliceProjection::Oblique) => {
                log::debug!("oblique montage is not supported, drawing a single slice");
                vec![single]
            }
            (SliceDrawingType::Single, _) => vec![single],
        }
    }

    /// Draws every layer of one slice with the current backend camera.
    fn draw_layers(
        &mut self,
        backend: &mut dyn Backend,
        request: &DrawRequest<'_>,
        layers: &[ActiveLayer<'_>],
        view: &SliceView,
    ) {
        match (request.path, request.projection) {
            (DrawPath::Texture, _) => self.draw_textured(backend, layers, view),
            (DrawPath::Voxels, SliceProjection::Orthogonal) => {
                self.draw_orthogonal(backend, layers, view);
            }
            (DrawPath::Voxels, SliceProjection::Oblique) => {
                self.draw_oblique(backend, layers, view);
            }
        }
    }
}

impl Default for SliceDrawer {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

/// Coloring inputs for one layer's batch.
fn coloring_context<'c>(
    options: &EngineOptions,
    color_maps: &'c ColorMapRegistry,
    layer: &ActiveLayer<'c>,
    raster: Option<(usize, usize)>,
) -> ColoringContext<'c> {
    ColoringContext {
        color_maps,
        statistics: layer.layer.volume.statistics(layer.layer.map_index),
        layer_index: layer.position,
        raster,
        outline_color: options.label_outline_color,
        base_layer_background: options.base_layer_background,
    }
}

fn active_layers<'a>(request: &DrawRequest<'a>) -> Vec<ActiveLayer<'a>> {
    request
        .layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.enabled)
        .enumerate()
        .map(|(position, (index, layer))| ActiveLayer {
            index,
            position,
            layer: *layer,
        })
        .collect()
}

/// Builds the geometry of one slice, `None` when it cannot be drawn.
fn slice_view(
    request: &DrawRequest<'_>,
    underlay: &dyn VolumeSource,
    target: &SliceTarget,
) -> Option<SliceView> {
    if !target.viewport.is_valid() {
        return None;
    }
    let bounds = underlay.bounding_box();
    let extent = compute_orthographic_extent(
        &bounds,
        target.plane.resolved(),
        target.viewport.aspect_ratio(),
        request.zoom,
        target.all_planes,
    )
    .map_err(|e| log::debug!("skipping {:?} slice: {e}", target.plane))
    .ok()?;
    let plane = compute_slice_plane(
        target.plane.resolved(),
        request.projection,
        target.coordinates,
        request.oblique_rotation,
    )
    .map_err(|e| log::debug!("skipping {:?} slice: {e}", target.plane))
    .ok()?;

    let plane = plane.with_point(plane.to_world(plane.project(bounds.center())));
    let corners = compute_screen_corners(&extent, request.view_offset, 1.0);
    let camera_center = plane.to_world((corners.min() + corners.max()) / 2.0);
    let view = plane.with_point(camera_center).view_matrix();

    Some(SliceView {
        kind: target.plane.resolved(),
        projection: request.projection,
        viewport: target.viewport,
        coordinates: target.coordinates,
        plane,
        extent,
        corners,
        view,
    })
}

fn prepare_backend(backend: &mut dyn Backend, view: &SliceView) {
    backend.set_viewport(view.viewport);
    backend.set_camera(&view.extent, &view.view);
}
