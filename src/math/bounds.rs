// Copyright 2020 @TwoCookingMice

use super::constants::{ Int, Vector2i };

/// Inclusive integer pixel bounds. The default value is undefined and
/// becomes defined the first time a point is added to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds2i {
    pub p_min: Vector2i,
    pub p_max: Vector2i
}

impl Default for Bounds2i {
    fn default() -> Self {
        Self { p_min: Vector2i::new(Int::MAX, Int::MAX),
               p_max: Vector2i::new(Int::MIN, Int::MIN) }
    }
}

impl Bounds2i {
    pub fn new(p_min: Vector2i, p_max: Vector2i) -> Self {
        Self { p_min: Vector2i::new(p_min.x.min(p_max.x), p_min.y.min(p_max.y)),
               p_max: Vector2i::new(p_max.x.max(p_min.x), p_max.y.max(p_min.y)) }
    }

    pub fn from_extent(xmin: Int, xmax: Int, ymin: Int, ymax: Int) -> Self {
        Self::new(Vector2i::new(xmin, ymin), Vector2i::new(xmax, ymax))
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_defined(&self) -> bool {
        self.p_min.x <= self.p_max.x && self.p_min.y <= self.p_max.y
    }

    pub fn includes(&self, x: Int, y: Int) -> bool {
        x >= self.p_min.x && x <= self.p_max.x &&
        y >= self.p_min.y && y <= self.p_max.y
    }

    pub fn width(&self) -> usize {
        if !self.is_defined() {
            return 0;
        }
        (self.p_max.x as i64 - self.p_min.x as i64 + 1) as usize
    }

    pub fn height(&self) -> usize {
        if !self.is_defined() {
            return 0;
        }
        (self.p_max.y as i64 - self.p_min.y as i64 + 1) as usize
    }

    /// None when the pixel count does not fit in `usize`.
    pub fn checked_area(&self) -> Option<usize> {
        self.width().checked_mul(self.height())
    }

    pub fn area(&self) -> usize {
        self.checked_area().unwrap_or(usize::MAX)
    }

    pub fn expand_by_point(&mut self, x: Int, y: Int) {
        self.p_min.x = self.p_min.x.min(x);
        self.p_min.y = self.p_min.y.min(y);
        self.p_max.x = self.p_max.x.max(x);
        self.p_max.y = self.p_max.y.max(y);
    }
}
