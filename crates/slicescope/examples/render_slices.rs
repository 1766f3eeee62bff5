//! Renders a synthetic head phantom with a lesion overlay.
//!
//! Writes `phantom_all.png` (three planes), `phantom_montage.png` and
//! `phantom_oblique.png` to the current directory, then identifies the voxel
//! under the center of the axial view.
//!
//! Run with `RUST_LOG=debug` to see the drawer's decisions.

use slicescope::*;

fn phantom() -> RenderResult<(VolumeGrid, VolumeGrid)> {
    let dims = UVec3::new(64, 72, 60);
    let spacing = Vec3::new(3.0, 3.0, 3.0);
    let origin = Vec3::new(-96.0, -120.0, -80.0);
    let center = (dims.as_vec3() - Vec3::ONE) / 2.0;

    let mut anatomy =
        VolumeGrid::with_spacing("anatomy", dims, origin, spacing, VolumeKind::Palette)?;
    anatomy.add_map_from_fn(|ijk| {
        let r = ((ijk.as_vec3() - center) / center).length();
        if r < 0.8 {
            100.0 + 40.0 * (r * 12.0).sin()
        } else if r < 0.9 {
            250.0
        } else {
            0.0
        }
    })?;

    let lesion_center = center + Vec3::new(8.0, -6.0, 4.0);
    let mut lesion = VolumeGrid::with_spacing("lesion", dims, origin, spacing, VolumeKind::Label)?;
    lesion.add_map_from_fn(|ijk| {
        if ijk.as_vec3().distance(lesion_center) < 6.0 {
            1.0
        } else {
            0.0
        }
    })?;
    Ok((anatomy, lesion))
}

fn main() -> RenderResult<()> {
    init();

    let (anatomy, lesion) = phantom()?;
    let gray = ColoringPolicy::Palette(PaletteColorMapping::default());
    let labels = ColoringPolicy::label(LabelTable::new().with_label(1, "lesion", [1.0, 0.2, 0.1, 1.0]));

    let (width, height) = (512, 512);
    let mut request = DrawRequest::new(
        Viewport::new(0, 0, width, height),
        vec![
            LayerDescriptor::new(&anatomy, &gray),
            LayerDescriptor::new(&lesion, &labels).with_opacity(0.6),
        ],
        Vec3::new(0.0, -18.0, 8.0),
    );
    let mut drawer = SliceDrawer::default();

    request.view_plane = SliceViewPlane::All;
    render_to_file("phantom_all.png", &mut drawer, &request, 512, 512)?;

    request.view_plane = SliceViewPlane::Axial;
    request.drawing_type = SliceDrawingType::Montage;
    request.montage = MontageSettings {
        rows: 4,
        cols: 4,
        slice_step: 3,
    };
    render_to_file("phantom_montage.png", &mut drawer, &request, 512, 512)?;

    request.drawing_type = SliceDrawingType::Single;
    request.projection = SliceProjection::Oblique;
    request.oblique_rotation = Mat4::from_rotation_x(0.4) * Mat4::from_rotation_y(-0.3);
    render_to_file("phantom_oblique.png", &mut drawer, &request, 512, 512)?;

    request.projection = SliceProjection::Orthogonal;
    request.mode = DrawMode::Identify {
        pixel: (width / 2, height / 2),
    };
    let mut backend = SoftwareBackend::new(512, 512)?;
    match drawer.draw(&mut backend, &request) {
        DrawOutcome::Identified(Some(hit)) => log::info!(
            "center pixel shows layer {} voxel {} at {} with value {:?}",
            hit.layer_index,
            hit.ijk,
            hit.world,
            hit.value
        ),
        outcome => log::info!("center pixel: {outcome:?}"),
    }
    Ok(())
}
