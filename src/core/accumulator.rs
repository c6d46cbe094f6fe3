// Copyright @yucwang 2026

use crate::math::bitmap::Bitmap;
use crate::math::bounds::Bounds2i;
use crate::math::constants::{ Float, Int };

/// Pixel grid that photons can be scattered into.
pub trait ImageAccumulator {
    fn bounds(&self) -> Bounds2i;

    fn includes(&self, x: Int, y: Int) -> bool {
        self.bounds().includes(x, y)
    }

    /// Callers check `includes` first.
    fn add_value(&mut self, x: Int, y: Int, value: Float);
}

impl ImageAccumulator for Bitmap {
    fn bounds(&self) -> Bounds2i {
        Bitmap::bounds(self)
    }

    fn add_value(&mut self, x: Int, y: Int, value: Float) {
        self[(x, y)] += value;
    }
}
