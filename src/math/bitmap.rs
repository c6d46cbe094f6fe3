// Copyright 2020 @TwoCookingMice

use super::bounds::Bounds2i;
use super::constants::{ Float, Int };

use std::ops;
use std::vec::Vec;

/// Single channel pixel grid addressed by absolute pixel coordinates
/// inside `bounds`.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<Float>,
    bounds: Bounds2i
}

impl ops::Index<(Int, Int)> for Bitmap {
    type Output = Float;

    fn index(&self, index: (Int, Int)) -> &Float {
        let transformed_index = self.offset(index.0, index.1);
        &self.data[transformed_index]
    }
}

impl ops::IndexMut<(Int, Int)> for Bitmap {
    fn index_mut(&mut self, index: (Int, Int)) -> &mut Float {
        let transformed_index = self.offset(index.0, index.1);
        &mut self.data[transformed_index]
    }
}

impl Bitmap {
    pub fn new(bounds: Bounds2i) -> Self {
        Self { data: vec![0.0; bounds.area()],
               bounds }
    }

    /// Bitmap covering `[0, width) x [0, height)`.
    pub fn with_size(width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return Self::new(Bounds2i::undefined());
        }
        Self::new(Bounds2i::from_extent(0, width as Int - 1, 0, height as Int - 1))
    }

    pub fn bounds(&self) -> Bounds2i {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.bounds.width()
    }

    pub fn height(&self) -> usize {
        self.bounds.height()
    }

    pub fn total(&self) -> Float {
        self.data.iter().sum()
    }

    pub fn max_value(&self) -> Float {
        self.data.iter().cloned().fold(0.0, Float::max)
    }

    /// Row-major copy of the pixel values, first row at `p_min.y`.
    pub fn raw_copy(&self) -> Vec<Float> {
        self.data.clone()
    }

    fn offset(&self, x: Int, y: Int) -> usize {
        assert!(self.bounds.includes(x, y),
                "pixel ({}, {}) outside bitmap bounds {:?}", x, y, self.bounds);
        let local_x = (x - self.bounds.p_min.x) as usize;
        let local_y = (y - self.bounds.p_min.y) as usize;
        local_x + self.width() * local_y
    }
}

/* Test for Bitmap */
#[cfg(test)]
mod tests {
    use super::Bitmap;
    use super::Bounds2i;

    #[test]
    fn test_bitmap_basic_functions() {
        let mut bitmap = Bitmap::with_size(256usize, 128usize);
        assert_eq!(bitmap.width(), 256);
        assert_eq!(bitmap.height(), 128);

        bitmap[(5, 6)] = 1.5;
        assert!((bitmap[(5, 6)] - 1.5).abs() < 1e-12);
        assert!(bitmap[(2, 6)].abs() < 1e-12);
        assert!((bitmap.total() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_bitmap_with_offset_origin() {
        let mut bitmap = Bitmap::new(Bounds2i::from_extent(-3, 3, 10, 12));
        assert_eq!(bitmap.width(), 7);
        assert_eq!(bitmap.height(), 3);

        bitmap[(-3, 10)] = 1.0;
        bitmap[(3, 12)] = 2.0;
        let raw = bitmap.raw_copy();
        assert_eq!(raw.len(), 21);
        assert_eq!(raw[0], 1.0);
        assert_eq!(raw[20], 2.0);
        assert_eq!(bitmap.max_value(), 2.0);
    }

    #[test]
    fn test_bitmap_zero_size_is_undefined() {
        let bitmap = Bitmap::with_size(0, 10);
        assert!(!bitmap.bounds().is_defined());
        assert_eq!(bitmap.total(), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_bitmap_index_out_of_bounds() {
        let bitmap = Bitmap::with_size(4, 4);
        let _ = bitmap[(4, 0)];
    }
}
