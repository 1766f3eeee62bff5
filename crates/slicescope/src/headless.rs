//! Headless rendering of slices to pixel buffers and image files.
//!
//! Draws a request with the [`SoftwareBackend`] and returns or saves the
//! result. Useful for tests, batch processing, and automated screenshots.

use slicescope_render::{save_image, Backend, RenderResult, SoftwareBackend};

use crate::drawer::{DrawOutcome, DrawRequest, SliceDrawer};

/// Renders a request to RGBA pixels, top row first.
///
/// The request's viewport is used as given; pass one inside
/// `width x height`. The frame is cleared to transparent black first.
///
/// # Example
/// ```no_run
/// use slicescope::*;
///
/// let mut volume = VolumeGrid::with_spacing(
///     "ramp", UVec3::splat(8), Vec3::ZERO, Vec3::ONE, VolumeKind::Palette,
/// ).unwrap();
/// volume.add_map_from_fn(|ijk| ijk.x as f32).unwrap();
/// let policy = ColoringPolicy::Palette(PaletteColorMapping::default());
/// let request = DrawRequest::new(
///     Viewport::new(0, 0, 64, 64),
///     vec![LayerDescriptor::new(&volume, &policy)],
///     Vec3::splat(4.0),
/// );
/// let mut drawer = SliceDrawer::default();
/// let pixels = render_to_image(&mut drawer, &request, 64, 64).unwrap();
/// assert_eq!(pixels.len(), 64 * 64 * 4);
/// ```
pub fn render_to_image(
    drawer: &mut SliceDrawer,
    request: &DrawRequest<'_>,
    width: u32,
    height: u32,
) -> RenderResult<Vec<u8>> {
    let mut backend = SoftwareBackend::new(width, height)?;
    backend.begin_frame([0; 4]);
    if drawer.draw(&mut backend, request) == DrawOutcome::Skipped {
        log::debug!("headless render of {width}x{height} drew nothing");
    }
    Ok(backend.pixels())
}

/// Renders a request and saves it as a PNG or JPEG image.
pub fn render_to_file(
    filename: &str,
    drawer: &mut SliceDrawer,
    request: &DrawRequest<'_>,
    width: u32,
    height: u32,
) -> RenderResult<()> {
    let data = render_to_image(drawer, request, width, height)?;
    save_image(filename, &data, width, height)?;
    log::info!("rendered slices to {filename}");
    Ok(())
}
