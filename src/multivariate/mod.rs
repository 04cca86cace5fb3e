//! Multivariate distributions: a dimension, a sampler, componentwise
//! marginal cdf/icdf, and an `adjust_distribution` operation that rank-maps
//! a sample matrix onto this distribution's marginals in place.
//!
//! Trait methods take `&mut dyn RngCore` rather than a generic `R: RngCore`
//! so the trait stays object-safe: [`Independent`] and the copula-backed
//! distribution hold heterogeneous members behind `Box<dyn
//! MultivariateDistribution>`.

pub mod copula_backed;
pub mod discrete;
pub mod gaussian;
pub mod gaussian_simple;
pub mod independent;
pub mod transformed;

pub use copula_backed::CopulaBacked;
pub use discrete::MultivariateDistributionDiscrete;
pub use gaussian::MultivariateDistributionGaussian;
pub use gaussian_simple::MultivariateDistributionGaussianSimple;
pub use independent::Independent;
pub use transformed::MultivariateDistributionTransformed;

use crate::error::CoreError;
use crate::num::matrix::Matrix;
use crate::rng::RngCore;

pub trait MultivariateDistribution {
    fn dim(&self) -> usize;

    /// Draws one vector into `out` (`out.len() == self.dim()`).
    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError>;

    /// CDF of the `i`-th marginal at `x`.
    fn marginal_cdf(&self, i: usize, x: f64) -> f64;

    /// Inverse CDF of the `i`-th marginal at `p`.
    fn marginal_icdf(&self, i: usize, p: f64) -> f64;

    /// Rank-adjusts `sample` (rows = observations, cols = `self.dim()`) in
    /// place so its empirical marginals match this distribution's, while
    /// preserving each column's rank order.
    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError>;
}

/// Replaces each value in column `j` of `m` with its rank-based percentile
/// `(rank + 0.5) / n`, `rank` being the zero-based position in ascending
/// order (average rank for ties). Shared by every `adjust_distribution`
/// that needs a percentile transform.
pub(crate) fn rank_transform_column(m: &mut Matrix, j: usize) {
    let n = m.rows;
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| m.get(a, j).partial_cmp(&m.get(b, j)).unwrap());
    let mut percentiles = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut k = i;
        while k + 1 < n && m.get(idx[k + 1], j) == m.get(idx[i], j) {
            k += 1;
        }
        let avg_rank = (i + k) as f64 / 2.0;
        let p = (avg_rank + 0.5) / n as f64;
        for r in idx.iter().take(k + 1).skip(i) {
            percentiles[*r] = p;
        }
        i = k + 1;
    }
    for r in 0..n {
        m.set(r, j, percentiles[r]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_transform_maps_to_uniform_percentiles() {
        let mut m = Matrix::from_rows(&[vec![30.0], vec![10.0], vec![20.0]]);
        rank_transform_column(&mut m, 0);
        assert!((m.get(1, 0) - 1.0 / 6.0).abs() < 1e-12);
        assert!((m.get(2, 0) - 0.5).abs() < 1e-12);
        assert!((m.get(0, 0) - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn rank_transform_handles_ties_with_average_rank() {
        let mut m = Matrix::from_rows(&[vec![1.0], vec![1.0], vec![2.0]]);
        rank_transform_column(&mut m, 0);
        assert!((m.get(0, 0) - m.get(1, 0)).abs() < 1e-12);
        assert!(m.get(2, 0) > m.get(0, 0));
    }
}
