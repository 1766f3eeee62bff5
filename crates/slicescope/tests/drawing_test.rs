//! Drawing through the software backend.
//!
//! The volumes are 4x4x4 grids of 1 mm voxels centered on 0..=3, so an
//! axial slice at zoom 1 in a 64x64 viewport shows the world rectangle
//! around (1.5, 1.5) at 64 * 0.98 / 4 pixels per millimeter.

use slicescope::*;
use slicescope_render::{apply_opacity, composite_layers, ColoredLayer};

const SIZE: u32 = 64;
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Window pixel showing world `(x, y)` of an axial slice at zoom 1.
fn axial_pixel(x: f32, y: f32) -> (i32, i32) {
    let scale = SIZE as f32 * 0.98 / 4.0;
    let half = SIZE as f32 / 2.0;
    (
        (half + (x - 1.5) * scale).floor() as i32,
        (half + (y - 1.5) * scale).floor() as i32,
    )
}

fn label_volume(f: impl FnMut(UVec3) -> f32) -> VolumeGrid {
    let mut volume = VolumeGrid::with_spacing(
        "labels",
        UVec3::splat(4),
        Vec3::ZERO,
        Vec3::ONE,
        VolumeKind::Label,
    )
    .unwrap();
    volume.add_map_from_fn(f).unwrap();
    volume
}

fn label_policy() -> ColoringPolicy {
    ColoringPolicy::label(
        LabelTable::new()
            .with_label(1, "red", [1.0, 0.0, 0.0, 1.0])
            .with_label(2, "green", [0.0, 1.0, 0.0, 1.0])
            .with_label(3, "blue", [0.0, 0.0, 1.0, 1.0]),
    )
}

fn backend() -> SoftwareBackend {
    let mut backend = SoftwareBackend::new(SIZE, SIZE).unwrap();
    backend.begin_frame([0; 4]);
    backend
}

fn pixel_at(backend: &SoftwareBackend, pixel: (i32, i32)) -> [u8; 4] {
    backend.pixel(pixel.0, pixel.1).unwrap()
}

/// Options whose textures use the exact volume size.
fn small_texture_options() -> EngineOptions {
    EngineOptions {
        texture_size_ceiling: 16,
        npot_textures_supported: true,
        ..EngineOptions::default()
    }
}

#[test]
fn orthogonal_axial_slice_shows_voxel_colors() {
    let volume = label_volume(|ijk| if ijk.x < 2 { 1.0 } else { 2.0 });
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 2.0),
    );

    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    assert_eq!(pixel_at(&backend, axial_pixel(0.0, 1.0)), RED);
    assert_eq!(pixel_at(&backend, axial_pixel(3.0, 2.0)), GREEN);
    assert_eq!(backend.stats().quad_batches, 1);
    assert_eq!(backend.stats().quads, 16);
}

#[test]
fn empty_viewport_and_layer_list_skip() {
    let volume = label_volume(|_| 1.0);
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();

    let no_layers = DrawRequest::new(backend.full_viewport(), Vec::new(), Vec3::ZERO);
    assert_eq!(drawer.draw(&mut backend, &no_layers), DrawOutcome::Skipped);

    let empty_viewport = DrawRequest::new(
        Viewport::new(0, 0, 0, 10),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::ZERO,
    );
    assert_eq!(drawer.draw(&mut backend, &empty_viewport), DrawOutcome::Skipped);
    assert_eq!(backend.stats().quads, 0);
}

#[test]
fn overlay_blends_over_underlay() {
    let underlay = label_volume(|_| 1.0);
    let overlay = label_volume(|ijk| if ijk.x < 2 { 0.0 } else { 3.0 });
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let request = DrawRequest::new(
        backend.full_viewport(),
        vec![
            LayerDescriptor::new(&underlay, &policy),
            LayerDescriptor::new(&overlay, &policy).with_opacity(0.5),
        ],
        Vec3::new(0.0, 0.0, 1.0),
    );
    drawer.draw(&mut backend, &request);

    let expected = composite_layers(
        &[ColoredLayer::new(&[RED], 1.0), ColoredLayer::new(&[BLUE], 0.5)],
        1,
    )[0];
    assert_eq!(
        expected,
        BlendMode::SourceAlpha.blend(apply_opacity(BLUE, 0.5), RED)
    );
    assert_eq!(pixel_at(&backend, axial_pixel(3.0, 0.0)), expected);
    // The overlay's unassigned key is transparent.
    assert_eq!(pixel_at(&backend, axial_pixel(0.0, 0.0)), RED);
}

#[test]
fn single_opaque_layer_is_reproduced_unchanged() {
    let volume = label_volume(|ijk| (ijk.x + ijk.y) as f32 % 3.0 + 1.0);
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 3.0),
    );
    drawer.draw(&mut backend, &request);

    let table = match &policy {
        ColoringPolicy::Label { table, .. } => table,
        _ => unreachable!(),
    };
    for j in 0..4 {
        for i in 0..4 {
            let key = ((i + j) % 3 + 1) as i32;
            let pixel = axial_pixel(i as f32, j as f32);
            assert_eq!(pixel_at(&backend, pixel), table.color_bytes(key, 0), "voxel {i},{j}");
        }
    }
}

#[test]
fn layer_outside_its_volume_is_skipped() {
    let volume = label_volume(|_| 1.0);
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 9.0),
    );
    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    assert_eq!(backend.stats().quad_batches, 0);
    assert_eq!(pixel_at(&backend, (32, 32)), [0; 4]);
}

#[test]
fn texture_path_matches_voxel_path() {
    let underlay = label_volume(|ijk| if ijk.y < 2 { 1.0 } else { 2.0 });
    let overlay = label_volume(|ijk| if ijk.x == 3 { 3.0 } else { 0.0 });
    let policy = label_policy();
    let layers = vec![
        LayerDescriptor::new(&underlay, &policy),
        LayerDescriptor::new(&overlay, &policy).with_opacity(0.5),
    ];
    let mut drawer = SliceDrawer::new(small_texture_options());

    let mut voxels = backend();
    let mut request = DrawRequest::new(voxels.full_viewport(), layers, Vec3::new(0.0, 0.0, 2.0));
    drawer.draw(&mut voxels, &request);

    let mut textured = backend();
    request.path = DrawPath::Texture;
    assert_eq!(drawer.draw(&mut textured, &request), DrawOutcome::Drawn);
    assert_eq!(textured.stats().textured_quads, 2);

    for j in 0..4 {
        for i in 0..4 {
            let pixel = axial_pixel(i as f32, j as f32);
            assert_eq!(pixel_at(&textured, pixel), pixel_at(&voxels, pixel), "voxel {i},{j}");
        }
    }
}

#[test]
fn texture_path_leaves_area_outside_the_volume_untouched() {
    let volume = label_volume(|_| 1.0);
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::new(small_texture_options());
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 2.0),
    );
    request.path = DrawPath::Texture;
    request.zoom = 0.5;

    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    assert_eq!(pixel_at(&backend, (32, 32)), RED);
    // No opaque black base outside the underlay, unlike sampled slices.
    assert_eq!(pixel_at(&backend, (1, 1)), [0; 4]);
}

#[test]
fn texture_too_large_skips_only_that_layer() {
    let small = label_volume(|_| 1.0);
    let mut large = VolumeGrid::with_spacing(
        "large",
        UVec3::new(600, 1, 1),
        Vec3::ZERO,
        Vec3::ONE,
        VolumeKind::Label,
    )
    .unwrap();
    large.add_map(vec![2.0; 600]).unwrap();
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::new(EngineOptions {
        texture_size_ceiling: 512,
        npot_textures_supported: false,
        ..small_texture_options()
    });
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![
            LayerDescriptor::new(&small, &policy),
            LayerDescriptor::new(&large, &policy),
        ],
        Vec3::new(1.0, 1.0, 1.0),
    );
    request.path = DrawPath::Texture;
    // The small volume needs a 256^3 texture here, which is allowed.
    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    assert_eq!(backend.stats().textured_quads, 1);
}

#[test]
fn oblique_identity_rotation_draws_voxel_grid() {
    let volume = label_volume(|ijk| if ijk.x < 2 { 1.0 } else { 2.0 });
    let policy = label_policy();
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 2.0),
    );
    request.projection = SliceProjection::Oblique;
    request.zoom = 0.5;

    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    // At zoom 0.5 the volume covers the middle half of the viewport.
    let scale = SIZE as f32 * 0.98 / 8.0;
    let at = |x: f32, y: f32| {
        (
            (32.0 + (x - 1.5) * scale).floor() as i32,
            (32.0 + (y - 1.5) * scale).floor() as i32,
        )
    };
    assert_eq!(pixel_at(&backend, at(0.0, 0.0)), RED);
    assert_eq!(pixel_at(&backend, at(3.0, 3.0)), GREEN);
    // Underlay samples outside the volume are opaque black.
    assert_eq!(pixel_at(&backend, at(-1.0, 1.0)), [0, 0, 0, 255]);
}

#[test]
fn palette_oblique_slice_is_brighter_where_values_are_higher() {
    let mut volume = VolumeGrid::with_spacing(
        "ramp",
        UVec3::splat(4),
        Vec3::ZERO,
        Vec3::ONE,
        VolumeKind::Palette,
    )
    .unwrap();
    volume.add_map_from_fn(|ijk| ijk.x as f32 + 1.0).unwrap();
    let policy = ColoringPolicy::Palette(PaletteColorMapping::default());
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 2.0),
    );
    request.projection = SliceProjection::Oblique;
    request.oblique_rotation = Mat4::from_rotation_z(0.3);
    drawer.draw(&mut backend, &request);

    let low = pixel_at(&backend, axial_pixel(0.3, 1.5));
    let high = pixel_at(&backend, axial_pixel(2.7, 1.5));
    assert!(high[0] > low[0], "{high:?} should be brighter than {low:?}");
}

#[test]
fn montage_cells_show_stepped_slices() {
    let volume = label_volume(|ijk| (ijk.z % 3) as f32 + 1.0);
    let policy = label_policy();
    let mut backend = SoftwareBackend::new(96, 96).unwrap();
    backend.begin_frame([0; 4]);
    let mut drawer = SliceDrawer::default();
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(1.5, 1.5, 2.0),
    );
    request.drawing_type = SliceDrawingType::Montage;

    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    // Cells are 30 px with 3 px margins; slices -2..=6 fill the grid from the
    // bottom left, so only slices 0..=3 exist.
    let cell_center = |row_from_bottom: i32, col: i32| (col * 33 + 15, row_from_bottom * 33 + 15);
    assert_eq!(backend.pixel(cell_center(1, 1).0, cell_center(1, 1).1), Some(BLUE)); // z = 2
    assert_eq!(backend.pixel(cell_center(0, 2).0, cell_center(0, 2).1), Some(RED)); // z = 0
    assert_eq!(backend.pixel(cell_center(1, 2).0, cell_center(1, 2).1), Some(RED)); // z = 3
    assert_eq!(backend.pixel(cell_center(0, 0).0, cell_center(0, 0).1), Some([0; 4]));
    assert_eq!(backend.pixel(cell_center(2, 2).0, cell_center(2, 2).1), Some([0; 4]));
}

#[test]
fn all_view_draws_three_panels() {
    let volume = label_volume(|_| 2.0);
    let policy = label_policy();
    let mut backend = SoftwareBackend::new(128, 128).unwrap();
    backend.begin_frame([0; 4]);
    let mut drawer = SliceDrawer::default();
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::splat(1.5),
    );
    request.view_plane = SliceViewPlane::All;

    assert_eq!(drawer.draw(&mut backend, &request), DrawOutcome::Drawn);
    assert_eq!(backend.stats().quad_batches, 3);
    // Parasagittal top left, coronal top right, axial bottom left.
    assert_eq!(backend.pixel(32, 96), Some(GREEN));
    assert_eq!(backend.pixel(96, 96), Some(GREEN));
    assert_eq!(backend.pixel(32, 32), Some(GREEN));
    assert_eq!(backend.pixel(96, 32), Some([0; 4]));
}

#[test]
fn overlay_lines_are_drawn_after_layers() {
    let volume = label_volume(|_| 1.0);
    let policy = label_policy();
    let mut lines = LineBatch::new();
    lines.push_line(Vec3::new(-0.5, 1.5, 2.0), Vec3::new(3.5, 1.5, 2.0), [255, 255, 0, 255]);
    let mut backend = backend();
    let mut drawer = SliceDrawer::default();
    let mut request = DrawRequest::new(
        backend.full_viewport(),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::new(0.0, 0.0, 2.0),
    );
    request.overlay_lines = Some(&lines);

    drawer.draw(&mut backend, &request);
    assert_eq!(backend.stats().lines, 1);
    // The line runs along the pixel boundary at y = 32.
    assert!([31, 32]
        .iter()
        .any(|&y| backend.pixel(32, y) == Some([255, 255, 0, 255])));
}

#[test]
fn headless_render_writes_pixels_and_files() {
    let volume = label_volume(|_| 1.0);
    let policy = label_policy();
    let request = DrawRequest::new(
        Viewport::new(0, 0, 32, 32),
        vec![LayerDescriptor::new(&volume, &policy)],
        Vec3::splat(1.0),
    );
    let mut drawer = SliceDrawer::default();
    let pixels = render_to_image(&mut drawer, &request, 32, 32).unwrap();
    assert_eq!(pixels.len(), 32 * 32 * 4);
    assert!(pixels.chunks_exact(4).any(|p| p == RED));

    let path = std::env::temp_dir().join("slicescope_headless_test.png");
    render_to_file(path.to_str().unwrap(), &mut drawer, &request, 32, 32).unwrap();
    assert!(path.exists());
    std::fs::remove_file(&path).ok();
}
