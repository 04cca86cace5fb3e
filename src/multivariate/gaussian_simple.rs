use crate::dist::{Continuous, Distribution, Normal};
use crate::error::CoreError;
use crate::multivariate::{rank_transform_column, MultivariateDistribution};
use crate::num::matrix::{check_positive_semidefinite, pseudo_inverse, symmetric_eigen, Matrix};
use crate::rng::{Rng, RngCore};

/// Multivariate Gaussian given mean `mu` and covariance `sigma` (symmetric
/// PSD), stored through its thin eigendecomposition `S = U * diag(sqrt(s))`
/// rather than `sigma` directly: sampling is `x = mu + S*z` for standard
/// normal `z`, and `adjust_distribution` needs `S`'s pseudo-inverse to map a
/// sample back into the latent factor space and out again.
#[derive(Debug, Clone)]
pub struct MultivariateDistributionGaussianSimple {
    mean: Vec<f64>,
    s: Matrix,
    s_pinv: Matrix,
    sigmas: Vec<f64>,
}

impl MultivariateDistributionGaussianSimple {
    pub fn new(mean: Vec<f64>, sigma: &Matrix, eps: f64) -> Result<Self, CoreError> {
        let d = mean.len();
        if sigma.rows != d || sigma.cols != d {
            return Err(CoreError::invalid_argument(
                "covariance dimensions must match mean length",
            ));
        }
        check_positive_semidefinite(sigma, eps.max(1e-10))?;
        let (eigenvalues, u) = symmetric_eigen(sigma);
        let mut s = Matrix::zeros(d, d);
        for i in 0..d {
            let sqrt_ev = eigenvalues[i].max(0.0).sqrt();
            for r in 0..d {
                s.set(r, i, u.get(r, i) * sqrt_ev);
            }
        }
        let s_pinv = pseudo_inverse(&s, eps);
        let sigmas = (0..d).map(|i| sigma.get(i, i).max(0.0).sqrt()).collect();
        Ok(Self {
            mean,
            s,
            s_pinv,
            sigmas,
        })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }
}

impl MultivariateDistribution for MultivariateDistributionGaussianSimple {
    fn dim(&self) -> usize {
        self.mean.len()
    }

    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim() {
            return Err(CoreError::invalid_argument("draw: output size mismatch"));
        }
        rng.next_gaussians(&self.s, out)?;
        for (x, &mu) in out.iter_mut().zip(&self.mean) {
            *x += mu;
        }
        Ok(())
    }

    fn marginal_cdf(&self, i: usize, x: f64) -> f64 {
        Normal::new(self.mean[i], self.sigmas[i].max(0.0))
            .map(|n| n.cdf(x))
            .unwrap_or(f64::NAN)
    }

    fn marginal_icdf(&self, i: usize, p: f64) -> f64 {
        Normal::new(self.mean[i], self.sigmas[i].max(0.0))
            .map(|n| n.inv_cdf(p))
            .unwrap_or(f64::NAN)
    }

    /// Centers, maps through `S+`, rank-transforms each latent column to a
    /// uniform and back to a standard normal quantile, re-applies `S`, and
    /// restores the mean: the sample's empirical marginals end up matching
    /// this distribution's exactly while rank correlations are preserved.
    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        let d = self.dim();
        if sample.cols != d {
            return Err(CoreError::invalid_argument(
                "adjust_distribution: column count must equal dimension",
            ));
        }
        let n = sample.rows;
        let mut centered = sample.clone();
        for r in 0..n {
            for c in 0..d {
                centered.set(r, c, centered.get(r, c) - self.mean[c]);
            }
        }
        let mut z = Matrix::zeros(n, self.s_pinv.rows);
        for r in 0..n {
            let row: Vec<f64> = centered.row(r).to_vec();
            let zr = self.s_pinv.mul_vec(&row);
            for (c, v) in zr.into_iter().enumerate() {
                z.set(r, c, v);
            }
        }
        let standard_normal = Normal::new(0.0, 1.0).unwrap();
        for c in 0..z.cols {
            rank_transform_column(&mut z, c);
            for r in 0..n {
                let p = crate::dist::clamp_probability(z.get(r, c));
                z.set(r, c, standard_normal.inv_cdf(p));
            }
        }
        for r in 0..n {
            let zr: Vec<f64> = z.row(r).to_vec();
            let xr = self.s.mul_vec(&zr);
            for (c, v) in xr.into_iter().enumerate() {
                sample.set(r, c, v + self.mean[c]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;

    #[test]
    fn draw_has_correct_mean_and_variance_asymptotically() {
        let sigma = Matrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 2.0]]);
        let d = MultivariateDistributionGaussianSimple::new(vec![1.0, -1.0], &sigma, 1e-10).unwrap();
        let mut rng = SplitMix64::seed_from_u64(42);
        let mut sum = [0.0; 2];
        let n = 20_000;
        for _ in 0..n {
            let mut out = [0.0; 2];
            d.draw(&mut rng, &mut out).unwrap();
            sum[0] += out[0];
            sum[1] += out[1];
        }
        assert!((sum[0] / n as f64 - 1.0).abs() < 0.05);
        assert!((sum[1] / n as f64 + 1.0).abs() < 0.05);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let sigma = Matrix::identity(2);
        let d = MultivariateDistributionGaussianSimple::new(vec![0.0, 0.0], &sigma, 1e-10).unwrap();
        let mut sample = Matrix::zeros(5, 3);
        assert!(d.adjust_distribution(&mut sample).is_err());
    }

    #[test]
    fn adjust_distribution_preserves_rank_order() {
        let sigma = Matrix::identity(1);
        let d = MultivariateDistributionGaussianSimple::new(vec![0.0], &sigma, 1e-10).unwrap();
        let mut sample = Matrix::from_rows(&[vec![3.0], vec![1.0], vec![2.0]]);
        d.adjust_distribution(&mut sample).unwrap();
        assert!(sample.get(1, 0) < sample.get(2, 0));
        assert!(sample.get(2, 0) < sample.get(0, 0));
    }
}
