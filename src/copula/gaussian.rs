use crate::copula::{AlphaStableMultifactor, Copula};
use crate::dist::Continuous;
use crate::error::CoreError;
use crate::multivariate::gaussian::MultivariateDistributionGaussian;
use crate::multivariate::gaussian_simple::MultivariateDistributionGaussianSimple;
use crate::multivariate::transformed::MultivariateDistributionTransformed;
use crate::multivariate::{rank_transform_column, MultivariateDistribution};
use crate::num::matrix::Matrix;
use crate::num::{standard_normal_cdf, standard_normal_inv_cdf};
use crate::rng::RngCore;

/// Gaussian copula: the `alpha == 2` specialization of
/// [`AlphaStableMultifactor`] that additionally retains the underlying
/// correlation matrix so it can condition on a partially observed sample.
#[derive(Debug, Clone)]
pub struct GaussianCopula {
    rho: Matrix,
    factors: AlphaStableMultifactor,
}

impl GaussianCopula {
    pub fn new(rho: Matrix, min_variance_fraction: f64, max_nbr_factors: Option<usize>) -> Result<Self, CoreError> {
        let factors = AlphaStableMultifactor::from_correlation_matrix(&rho, min_variance_fraction, max_nbr_factors)?;
        Ok(Self { rho, factors })
    }

    /// Estimates `rho` from a sample by rank-transforming each column to a
    /// standard normal quantile, then estimating the correlation of the
    /// Gaussianized columns.
    pub fn from_sample(
        sample: &Matrix,
        min_variance_fraction: f64,
        max_nbr_factors: Option<usize>,
    ) -> Result<Self, CoreError> {
        if sample.rows < 2 {
            return Err(CoreError::invalid_argument("GaussianCopula::from_sample: need at least 2 rows"));
        }
        let d = sample.cols;
        let mut gaussianized = sample.clone();
        for c in 0..d {
            rank_transform_column(&mut gaussianized, c);
            for r in 0..sample.rows {
                let p = gaussianized.get(r, c);
                gaussianized.set(r, c, standard_normal_inv_cdf(p));
            }
        }
        let mut rho = Matrix::identity(d);
        for i in 0..d {
            for j in 0..i {
                let corr = sample_correlation(&gaussianized, i, j);
                rho.set(i, j, corr);
                rho.set(j, i, corr);
            }
        }
        Self::new(rho, min_variance_fraction, max_nbr_factors)
    }

    pub fn rho(&self) -> &Matrix {
        &self.rho
    }

    /// Conditions the latent Gaussian factors directly: `a[i]` finite pins
    /// factor `i`, `NaN` leaves it free.
    pub fn conditional_factors(&self, a: &[f64]) -> Result<MultivariateDistributionGaussianSimple, CoreError> {
        let gaussian = MultivariateDistributionGaussian::new(vec![0.0; self.dim()], self.rho.clone(), 1e-10)?;
        gaussian.conditional(a)
    }

    /// Conditions on an observed vector `x` (`NaN` for unobserved
    /// coordinates) expressed in the scale of the given per-variable
    /// marginals, returning a multivariate distribution over the free
    /// coordinates expressed back in those same marginals' scale.
    pub fn conditional<D: Continuous + Clone + 'static>(
        &self,
        marginals: &[D],
        x: &[f64],
    ) -> Result<Box<dyn MultivariateDistribution>, CoreError> {
        let d = self.dim();
        if marginals.len() != d || x.len() != d {
            return Err(CoreError::invalid_argument("GaussianCopula::conditional: size mismatch"));
        }
        let mut a = vec![0.0; d];
        let mut free_idx = Vec::new();
        for i in 0..d {
            if x[i].is_nan() {
                a[i] = f64::NAN;
                free_idx.push(i);
            } else {
                a[i] = standard_normal_inv_cdf(marginals[i].cdf(x[i]));
            }
        }
        if free_idx.is_empty() {
            return Err(CoreError::invalid_argument(
                "GaussianCopula::conditional: at least one coordinate must be unobserved",
            ));
        }
        let base = self.conditional_factors(&a)?;

        let g: Vec<Box<dyn Fn(f64) -> f64>> = free_idx
            .iter()
            .map(|&i| -> Box<dyn Fn(f64) -> f64> {
                let marginal = marginals[i].clone();
                Box::new(move |z: f64| marginal.inv_cdf(standard_normal_cdf(z)))
            })
            .collect();
        let g_inv: Vec<Box<dyn Fn(f64) -> f64>> = free_idx
            .iter()
            .map(|&i| -> Box<dyn Fn(f64) -> f64> {
                let marginal = marginals[i].clone();
                Box::new(move |y: f64| standard_normal_inv_cdf(marginal.cdf(y)))
            })
            .collect();

        let transformed = MultivariateDistributionTransformed::new(Box::new(base), g, g_inv)?;
        Ok(Box::new(transformed))
    }
}

fn sample_correlation(m: &Matrix, i: usize, j: usize) -> f64 {
    let (mean_i, mean_j) = (column_mean(m, i), column_mean(m, j));
    let mut cov = 0.0;
    let mut var_i = 0.0;
    let mut var_j = 0.0;
    for r in 0..m.rows {
        let di = m.get(r, i) - mean_i;
        let dj = m.get(r, j) - mean_j;
        cov += di * dj;
        var_i += di * di;
        var_j += dj * dj;
    }
    let denom = (var_i * var_j).sqrt();
    if denom > 1e-300 {
        (cov / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn column_mean(m: &Matrix, j: usize) -> f64 {
    let mut sum = 0.0;
    for r in 0..m.rows {
        sum += m.get(r, j);
    }
    sum / m.rows as f64
}

impl Copula for GaussianCopula {
    fn dim(&self) -> usize {
        self.rho.rows
    }

    fn draw_cdfs(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        self.factors.draw_cdfs(rng, out)
    }

    fn adjust_cdfs(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        self.factors.adjust_cdfs(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::Normal;

    #[test]
    fn conditional_factors_matches_plain_gaussian_conditioning() {
        let rho = Matrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 1.0]]);
        let copula = GaussianCopula::new(rho, 1.0, None).unwrap();
        let cond = copula.conditional_factors(&[0.5, f64::NAN]).unwrap();
        assert!((cond.mean()[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn conditional_with_marginals_wraps_to_original_scale() {
        let rho = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        let copula = GaussianCopula::new(rho, 1.0, None).unwrap();
        let marginals = vec![Normal::new(0.0, 1.0).unwrap(), Normal::new(0.0, 1.0).unwrap()];
        let cond = copula.conditional(&marginals, &[0.3, f64::NAN]).unwrap();
        assert_eq!(cond.dim(), 1);
        assert!((cond.marginal_icdf(0, 0.5) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn from_sample_estimates_positive_correlation() {
        let sample = Matrix::from_rows(&[
            vec![1.0, 1.1],
            vec![2.0, 2.2],
            vec![3.0, 2.9],
            vec![4.0, 4.1],
            vec![5.0, 5.2],
        ]);
        let copula = GaussianCopula::from_sample(&sample, 1.0, None).unwrap();
        assert!(copula.rho().get(0, 1) > 0.5);
    }
}
