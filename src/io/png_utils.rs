// Copyright @yucwang 2026

use image::{ GrayImage, Luma };

use crate::io::exr_utils::ImageIoError;
use crate::math::bitmap::Bitmap;

/// Writes an 8-bit preview scaled so the brightest pixel is white.
/// Negative values clamp to black.
pub fn write_png_preview(image: &Bitmap, file_path: &str) -> Result<(), ImageIoError> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return Err(ImageIoError::EmptyImage);
    }

    let peak = image.max_value();
    let scale = if peak > 0.0 { 255.0 / peak } else { 0.0 };
    let data = image.raw_copy();

    let preview = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let v = data[y as usize * width + x as usize] * scale;
        Luma([v.max(0.0).min(255.0).round() as u8])
    });
    preview.save(file_path)?;

    log::info!("PNG preview written to: {}.", file_path);
    Ok(())
}
