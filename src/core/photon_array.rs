// Copyright @yucwang 2026

use std::fmt;

use crate::core::accumulator::ImageAccumulator;
use crate::core::rng::UniformDeviate;
use crate::math::constants::{ Float, Int };

#[derive(Debug, Clone, PartialEq)]
pub enum PhotonError {
    SizeMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    UndefinedBounds,
}

impl fmt::Display for PhotonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotonError::SizeMismatch { operation, expected, actual } => {
                write!(f, "size mismatch in {}: expected {} photons, got {}", operation, expected, actual)
            }
            PhotonError::UndefinedBounds => {
                write!(f, "cannot add photons to an image with undefined bounds")
            }
        }
    }
}

impl std::error::Error for PhotonError {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Photon {
    pub x: Float,
    pub y: Float,
    pub flux: Float,
}

/// Photons stored as three index-aligned columns.
///
/// `is_correlated` marks arrays that are already the result of a convolution,
/// so that a further convolution with another correlated array pairs the
/// photons through a random permutation instead of by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonArray {
    x: Vec<Float>,
    y: Vec<Float>,
    flux: Vec<Float>,
    is_correlated: bool,
}

impl PhotonArray {
    /// `n` photons at the origin carrying no flux.
    pub fn new(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            flux: vec![0.0; n],
            is_correlated: false,
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            flux: Vec::with_capacity(n),
            is_correlated: false,
        }
    }

    pub fn from_vectors(x: Vec<Float>, y: Vec<Float>, flux: Vec<Float>) -> Result<Self, PhotonError> {
        if y.len() != x.len() {
            return Err(PhotonError::SizeMismatch { operation: "construction", expected: x.len(), actual: y.len() });
        }
        if flux.len() != x.len() {
            return Err(PhotonError::SizeMismatch { operation: "construction", expected: x.len(), actual: flux.len() });
        }
        Ok(Self { x, y, flux, is_correlated: false })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.x.reserve(additional);
        self.y.reserve(additional);
        self.flux.reserve(additional);
    }

    pub fn push(&mut self, x: Float, y: Float, flux: Float) {
        self.x.push(x);
        self.y.push(y);
        self.flux.push(flux);
    }

    pub fn set_photon(&mut self, i: usize, x: Float, y: Float, flux: Float) {
        self.x[i] = x;
        self.y[i] = y;
        self.flux[i] = flux;
    }

    pub fn x(&self, i: usize) -> Float {
        self.x[i]
    }

    pub fn y(&self, i: usize) -> Float {
        self.y[i]
    }

    pub fn flux(&self, i: usize) -> Float {
        self.flux[i]
    }

    pub fn xs(&self) -> &[Float] {
        &self.x
    }

    pub fn ys(&self) -> &[Float] {
        &self.y
    }

    pub fn fluxes(&self) -> &[Float] {
        &self.flux
    }

    pub fn photon(&self, i: usize) -> Photon {
        Photon { x: self.x[i], y: self.y[i], flux: self.flux[i] }
    }

    pub fn iter(&self) -> impl Iterator<Item = Photon> + '_ {
        self.x.iter()
            .zip(self.y.iter())
            .zip(self.flux.iter())
            .map(|((&x, &y), &flux)| Photon { x, y, flux })
    }

    pub fn is_correlated(&self) -> bool {
        self.is_correlated
    }

    pub fn set_correlated(&mut self, is_correlated: bool) {
        self.is_correlated = is_correlated;
    }

    pub fn total_flux(&self) -> Float {
        self.flux.iter().sum()
    }

    /// Rescales so that the fluxes sum to `flux`. An array with zero total
    /// flux is left untouched.
    pub fn set_total_flux(&mut self, flux: Float) {
        let old_flux = self.total_flux();
        if old_flux == 0.0 {
            log::warn!("Ignoring flux rescale of a photon array with zero total flux.");
            return;
        }
        self.scale_flux(flux / old_flux);
    }

    pub fn scale_flux(&mut self, scale: Float) {
        for f in self.flux.iter_mut() {
            *f *= scale;
        }
    }

    pub fn scale_xy(&mut self, scale: Float) {
        for x in self.x.iter_mut() {
            *x *= scale;
        }
        for y in self.y.iter_mut() {
            *y *= scale;
        }
    }

    pub fn shift(&mut self, dx: Float, dy: Float) {
        for x in self.x.iter_mut() {
            *x += dx;
        }
        for y in self.y.iter_mut() {
            *y += dy;
        }
    }

    /// Appends the photons of `other` after the current ones. The
    /// correlation flag is left as it is.
    pub fn append(&mut self, other: &PhotonArray) {
        if other.is_empty() {
            return;
        }
        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
        self.flux.extend_from_slice(&other.flux);
    }

    /// Convolves this array with `other` in place.
    ///
    /// Positions are summed and fluxes multiplied, with an extra factor of N
    /// since both arrays carry their full flux spread over N photons. When
    /// both arrays are correlated the photons of `self` are paired through a
    /// random permutation drawn from `rng`; otherwise they are paired by index
    /// and no deviates are consumed.
    pub fn convolve<R: UniformDeviate + ?Sized>(&mut self, other: &PhotonArray, rng: &mut R) -> Result<(), PhotonError> {
        let n = self.len();
        if other.len() != n {
            return Err(PhotonError::SizeMismatch { operation: "convolve", expected: n, actual: other.len() });
        }

        if self.is_correlated && other.is_correlated {
            log::debug!("Convolving {} correlated photons with shuffle.", n);
            self.convolve_shuffle(other, rng);
            return Ok(());
        }

        log::debug!("Convolving {} photons in order.", n);
        let scale = n as Float;
        for (x, other_x) in self.x.iter_mut().zip(other.x.iter()) {
            *x += *other_x;
        }
        for (y, other_y) in self.y.iter_mut().zip(other.y.iter()) {
            *y += *other_y;
        }
        for (f, other_f) in self.flux.iter_mut().zip(other.flux.iter()) {
            *f *= *other_f * scale;
        }

        // Only the flag of `other` is looked at here: both correlated never
        // reaches this branch.
        if other.is_correlated {
            self.is_correlated = true;
        }
        Ok(())
    }

    // Backward Fisher-Yates pass. Slot i_out is consumed from a random slot
    // i_in <= i_out, and the photon that lived in i_out is moved into i_in so
    // that it stays available for the smaller output indices.
    fn convolve_shuffle<R: UniformDeviate + ?Sized>(&mut self, other: &PhotonArray, rng: &mut R) {
        let n = self.len();
        let scale = n as Float;

        for i_out in (0..n).rev() {
            let mut i_in = ((i_out + 1) as Float * rng.uniform()).floor() as usize;
            if i_in > i_out {
                i_in = i_out;
            }

            let saved = if i_in < i_out {
                Some((self.x[i_out], self.y[i_out], self.flux[i_out]))
            } else {
                None
            };

            self.x[i_out] = self.x[i_in] + other.x[i_out];
            self.y[i_out] = self.y[i_in] + other.y[i_out];
            self.flux[i_out] = self.flux[i_in] * other.flux[i_out] * scale;

            if let Some((x_save, y_save, flux_save)) = saved {
                self.x[i_in] = x_save;
                self.y[i_in] = y_save;
                self.flux[i_in] = flux_save;
            }
        }
    }

    /// Builds a 2D distribution from two 1D ones: the x coordinates of
    /// `other` become the y coordinates of `self`, fluxes combine as in
    /// `convolve`.
    ///
    /// Panics when the sizes differ.
    pub fn take_y_from(&mut self, other: &PhotonArray) {
        let n = self.len();
        assert_eq!(other.len(), n, "take_y_from requires photon arrays of equal size");
        let scale = n as Float;
        for i in 0..n {
            self.y[i] = other.x[i];
            self.flux[i] *= other.flux[i] * scale;
        }
    }

    /// Adds every photon to the pixel nearest to it and returns the flux
    /// that landed inside the target bounds.
    pub fn add_to<A: ImageAccumulator + ?Sized>(&self, target: &mut A) -> Result<Float, PhotonError> {
        let bounds = target.bounds();
        if !bounds.is_defined() {
            return Err(PhotonError::UndefinedBounds);
        }

        let mut added_flux = 0.0;
        let mut clipped = 0usize;
        for photon in self.iter() {
            match (nearest_pixel(photon.x), nearest_pixel(photon.y)) {
                (Some(ix), Some(iy)) if target.includes(ix, iy) => {
                    target.add_value(ix, iy, photon.flux);
                    added_flux += photon.flux;
                }
                _ => clipped += 1,
            }
        }

        if clipped > 0 {
            log::debug!("{} of {} photons fell outside {:?}.", clipped, self.len(), bounds);
        }
        Ok(added_flux)
    }
}

// Round half up. None for NaN or values no pixel index can hold.
fn nearest_pixel(v: Float) -> Option<Int> {
    let rounded = (v + 0.5).floor();
    if rounded.is_finite() && rounded >= Int::MIN as Float && rounded <= Int::MAX as Float {
        Some(rounded as Int)
    } else {
        None
    }
}
