// Copyright @yucwang 2026

use crate::math::constants::Float;

/// Source of uniform deviates in [0, 1).
pub trait UniformDeviate {
    fn uniform(&mut self) -> Float;
}

impl<F: FnMut() -> Float> UniformDeviate for F {
    fn uniform(&mut self) -> Float {
        self()
    }
}

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    pub fn next_float(&mut self) -> Float {
        // 2^32, so that u32::MAX still maps below one.
        (self.next_u32() as Float) / 4294967296.0
    }
}

impl UniformDeviate for LcgRng {
    fn uniform(&mut self) -> Float {
        self.next_float()
    }
}

#[cfg(test)]
mod tests {
    use super::{ LcgRng, UniformDeviate };

    #[test]
    fn test_lcg_uniform_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..10000 {
            let u = rng.uniform();
            assert!(u >= 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_lcg_same_seed_same_sequence() {
        let mut a = LcgRng::new(7);
        let mut b = LcgRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }

        let mut c = LcgRng::new(8);
        let first_a: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let first_c: Vec<u32> = (0..8).map(|_| c.next_u32()).collect();
        assert_ne!(first_a, first_c);
    }

    #[test]
    fn test_closure_as_deviate() {
        let values = [0.25, 0.5, 0.75];
        let mut idx = 0;
        let mut deviate = || {
            let v = values[idx];
            idx += 1;
            v
        };
        assert_eq!(deviate.uniform(), 0.25);
        assert_eq!(deviate.uniform(), 0.5);
        assert_eq!(deviate.uniform(), 0.75);
    }
}
