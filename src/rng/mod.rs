//! Pseudo-random number generation, without external dependencies.
//!
//! [`RngCore`] is the low-level bit source (kept from the teacher); [`Rng`]
//! is a blanket extension trait adding the statistical operations the
//! numeric core needs: uniform draws, standard normal draws, bounded
//! integers, alpha-stable draws, and `S * z` for a standard-normal vector
//! `z` (used by multivariate Gaussian sampling). Concrete generators:
//! [`SplitMix64`] (seeding), [`Xoshiro256StarStar`], [`Xoroshiro128PlusPlus`],
//! [`Pcg32`], and [`PrecomputedRng`] (a deterministic, exhaustible generator
//! used in tests).

pub mod pcg32;
pub mod precomputed;
pub mod splitmix64;
pub mod xoroshiro128;
pub mod xoshiro256;

pub use pcg32::Pcg32;
pub use precomputed::PrecomputedRng;
pub use splitmix64::SplitMix64;
pub use xoroshiro128::Xoroshiro128PlusPlus;
pub use xoshiro256::Xoshiro256StarStar;

use crate::error::CoreError;
use crate::num::matrix::Matrix;

/// Minimal trait for a 64-bit random bit source.
pub trait RngCore {
    fn next_u64(&mut self) -> u64;

    /// Uniform `f64` in `[0, 1)` using 53 bits of precision.
    #[inline]
    fn next_f64(&mut self) -> f64 {
        const DEN: f64 = (1u64 << 53) as f64;
        ((self.next_u64() >> 11) as f64) / DEN
    }
}

/// Statistical operations layered on top of [`RngCore`]. Blanket-implemented
/// for every `RngCore`, mirroring the "stateful RNG trait" of §4.1.
pub trait Rng: RngCore {
    /// Uniform draw in `[0, 1)`.
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.next_f64()
    }

    /// Standard normal draw via the polar (Marsaglia) Box-Muller method.
    fn next_gaussian(&mut self) -> f64 {
        loop {
            let u1 = 2.0 * self.next_uniform() - 1.0;
            let u2 = 2.0 * self.next_uniform() - 1.0;
            let s = u1 * u1 + u2 * u2;
            if s >= 1.0 || s == 0.0 {
                continue;
            }
            let factor = (-2.0 * s.ln() / s).sqrt();
            return u1 * factor;
        }
    }

    /// Uniform integer in `[0, n]` inclusive.
    fn next_uniform_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let range = n + 1;
        (self.next_uniform() * range as f64).min(n as f64) as u64
    }

    /// Draw from a standard alpha-stable distribution via the
    /// Chambers-Mallows-Stuck algorithm, scale normalized so that for
    /// `alpha == 2` the result has the scale of a `N(0, 1/2)` variable
    /// (matching the copula convention that `Y_i` has unit Gaussian scale
    /// once `S`'s rows are rescaled accordingly).
    fn next_alpha_stable(&mut self, alpha: f64) -> f64 {
        if alpha == 2.0 {
            return self.next_gaussian() * std::f64::consts::FRAC_1_SQRT_2;
        }
        if alpha == 1.0 {
            // Standard Cauchy via the tangent transform.
            let u = self.next_uniform() - 0.5;
            return (std::f64::consts::PI * u).tan();
        }
        let u = std::f64::consts::PI * (self.next_uniform() - 0.5);
        let w = {
            // Exponential(1) via inverse CDF.
            let e = self.next_uniform();
            -(1.0 - e).ln()
        };
        let part1 = (alpha * u).sin() / u.cos().powf(1.0 / alpha);
        let part2 = ((u * (1.0 - alpha)).cos() / w).powf((1.0 - alpha) / alpha);
        part1 * part2
    }

    /// Fill `out` with `S * z` where `z` is a vector of i.i.d. standard
    /// normal draws of length `s.cols`. Used by Gaussian sampling
    /// (`x = mu + S*z`) and alpha-stable multifactor draws.
    fn next_gaussians(&mut self, s: &Matrix, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != s.rows {
            return Err(CoreError::invalid_argument("next_gaussians: output size mismatch"));
        }
        let z: Vec<f64> = (0..s.cols).map(|_| self.next_gaussian()).collect();
        let y = s.mul_vec(&z);
        out.copy_from_slice(&y);
        Ok(())
    }

    /// Advance the generator by `n` draws without recording the values
    /// (used to keep parallel streams in lock-step after a skipped branch).
    fn discard(&mut self, n: u64) {
        for _ in 0..n {
            self.next_u64();
        }
    }
}

impl<T: RngCore + ?Sized> Rng for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_uniform_below_respects_inclusive_bound() {
        let mut rng = SplitMix64::seed_from_u64(7);
        for _ in 0..1000 {
            let x = rng.next_uniform_below(5);
            assert!(x <= 5);
        }
    }

    #[test]
    fn alpha_stable_variants_are_finite() {
        let mut rng = SplitMix64::seed_from_u64(11);
        assert!(rng.next_gaussian().is_finite());
        assert!(rng.next_alpha_stable(2.0).is_finite());
        assert!(rng.next_alpha_stable(1.0).is_finite());
        assert!(rng.next_alpha_stable(1.5).is_finite());
    }

    #[test]
    fn next_gaussians_applies_matrix() {
        let mut rng = SplitMix64::seed_from_u64(3);
        let s = Matrix::identity(2);
        let mut out = [0.0; 2];
        rng.next_gaussians(&s, &mut out).unwrap();
        assert!(out.iter().all(|x| x.is_finite()));
    }
}
