//! Saving rendered slices to image files.

use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Options for saving screenshots.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    /// Keep pixel alpha (PNG only). When false every pixel is written opaque.
    pub transparent_background: bool,
}

/// Saves top-row-first RGBA pixels to an image file.
///
/// The format follows the extension: `.png`, `.jpg` or `.jpeg`.
pub fn save_image(
    filename: &str,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<(), ScreenshotError> {
    save_image_with_options(filename, data, width, height, &ScreenshotOptions::default())
}

/// Saves top-row-first RGBA pixels to an image file.
pub fn save_image_with_options(
    filename: &str,
    data: &[u8],
    width: u32,
    height: u32,
    options: &ScreenshotOptions,
) -> Result<(), ScreenshotError> {
    let path = Path::new(filename);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let img = to_image(data, width, height, options)?;
    match extension.as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => {
            return Err(ScreenshotError::UnsupportedFormat(extension));
        }
    }

    log::debug!("saved {width}x{height} screenshot to {filename}");
    Ok(())
}

/// Encodes top-row-first RGBA pixels as PNG in memory.
pub fn save_to_buffer(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScreenshotError> {
    let options = ScreenshotOptions {
        transparent_background: true,
    };
    let img = to_image(data, width, height, &options)?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn to_image(
    data: &[u8],
    width: u32,
    height: u32,
    options: &ScreenshotOptions,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>, ScreenshotError> {
    let mut rgba_data = data.to_vec();
    if !options.transparent_background {
        for chunk in rgba_data.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
    }
    ImageBuffer::from_raw(width, height, rgba_data).ok_or(ScreenshotError::InvalidImageData)
}

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}
