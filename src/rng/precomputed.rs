//! A deterministic, exhaustible RNG that replays a fixed sequence of `u64`
//! words. Used in tests where the exact draws consumed by an algorithm must
//! be pinned down (e.g. checking that `next_gaussians` applies `S` to
//! exactly the standard-normal draws the test expects), rather than merely
//! checked for statistical plausibility.

use super::RngCore;

/// Replays a fixed sequence of raw `u64` words, panicking once exhausted.
#[derive(Clone, Debug)]
pub struct PrecomputedRng {
    words: Vec<u64>,
    pos: usize,
}

impl PrecomputedRng {
    pub fn new(words: Vec<u64>) -> Self {
        Self { words, pos: 0 }
    }

    /// Build a generator that replays `uniforms` (each in `[0, 1)`) via
    /// `next_f64`, by inverting the 53-bit quantization `next_f64` uses.
    pub fn from_uniforms(uniforms: &[f64]) -> Self {
        let words = uniforms
            .iter()
            .map(|&u| {
                debug_assert!((0.0..1.0).contains(&u));
                let mantissa = (u * (1u64 << 53) as f64).round() as u64;
                mantissa << 11
            })
            .collect();
        Self::new(words)
    }

    pub fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }
}

impl RngCore for PrecomputedRng {
    fn next_u64(&mut self) -> u64 {
        let w = self.words.get(self.pos).copied().unwrap_or_else(|| {
            panic!("PrecomputedRng exhausted after {} draws", self.pos)
        });
        self.pos += 1;
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn replays_uniforms_in_order() {
        let mut rng = PrecomputedRng::from_uniforms(&[0.25, 0.5, 0.75]);
        assert!((rng.next_uniform() - 0.25).abs() < 1e-9);
        assert!((rng.next_uniform() - 0.5).abs() < 1e-9);
        assert!((rng.next_uniform() - 0.75).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn panics_once_exhausted() {
        let mut rng = PrecomputedRng::new(vec![1, 2]);
        rng.next_u64();
        rng.next_u64();
        rng.next_u64();
    }

    #[test]
    fn remaining_counts_down() {
        let mut rng = PrecomputedRng::new(vec![1, 2, 3]);
        assert_eq!(rng.remaining(), 3);
        rng.next_u64();
        assert_eq!(rng.remaining(), 2);
    }
}
