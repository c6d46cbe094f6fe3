/* Copyright 2020 @TwoCookingMice */

use std::fmt;

use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use exr::prelude::*;

#[derive(Debug)]
pub enum ImageIoError {
    Exr(exr::error::Error),
    Image(::image::ImageError),
    EmptyImage,
}

impl From<exr::error::Error> for ImageIoError {
    fn from(err: exr::error::Error) -> Self {
        ImageIoError::Exr(err)
    }
}

impl From<::image::ImageError> for ImageIoError {
    fn from(err: ::image::ImageError) -> Self {
        ImageIoError::Image(err)
    }
}

impl fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageIoError::Exr(err) => write!(f, "exr error: {}", err),
            ImageIoError::Image(err) => write!(f, "image error: {}", err),
            ImageIoError::EmptyImage => write!(f, "image has no pixels"),
        }
    }
}

impl std::error::Error for ImageIoError {}

// Read EXR Image from file, averaging the color channels into one value.
pub fn read_exr_from_file(file_path: &str) -> std::result::Result<Bitmap, ImageIoError> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| Bitmap::with_size(resolution.width(), resolution.height()),
            |bitmap, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                let value = (r as Float + g as Float + b as Float) / 3.0;
                bitmap[(position.x() as i32, position.y() as i32)] = value;
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(file_path)?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

// Write EXR Image to file, the same value in every color channel.
pub fn write_exr_to_file(image: &Bitmap, file_path: &str) -> std::result::Result<(), ImageIoError> {
    log::info!("Starting writing openexr images: {}.", file_path);

    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return Err(ImageIoError::EmptyImage);
    }

    let data = image.raw_copy();
    write_rgb_file(file_path, width, height, |x, y| {
        let v = data[y * width + x] as f32;
        (v, v, v)
    })?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::bounds::Bounds2i;

    #[test]
    fn test_write_and_read_exr() {
        let mut bitmap = Bitmap::with_size(4, 3);
        bitmap[(1, 2)] = 2.5;
        bitmap[(3, 0)] = 0.5;

        let path = std::env::temp_dir().join("photon_array_write_and_read.exr");
        let path = path.to_str().expect("temp path is utf-8");
        write_exr_to_file(&bitmap, path).expect("failed to write exr");

        let loaded = read_exr_from_file(path).expect("failed to read exr");
        assert_eq!(loaded.width(), 4);
        assert_eq!(loaded.height(), 3);
        assert!((loaded[(1, 2)] - 2.5).abs() < 1e-6);
        assert!((loaded[(3, 0)] - 0.5).abs() < 1e-6);
        assert!((loaded.total() - 3.0).abs() < 1e-6);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_write_empty_exr_fails() {
        let bitmap = Bitmap::new(Bounds2i::undefined());
        let path = std::env::temp_dir().join("photon_array_empty.exr");
        let result = write_exr_to_file(&bitmap, path.to_str().expect("temp path is utf-8"));
        assert!(matches!(result, Err(ImageIoError::EmptyImage)));
    }
}
