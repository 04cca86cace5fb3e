use crate::error::CoreError;
use crate::multivariate::gaussian_simple::MultivariateDistributionGaussianSimple;
use crate::multivariate::MultivariateDistribution;
use crate::num::matrix::{pseudo_inverse, Matrix};
use crate::rng::RngCore;

/// Multivariate Gaussian that additionally retains the full covariance
/// matrix (rather than only its `S = U*diag(sqrt(s))` factor), so it can
/// condition on a partial observation: given `a` with some entries fixed
/// and the rest `NaN` (free), returns the Gaussian law of the free entries
/// given the fixed ones.
#[derive(Debug, Clone)]
pub struct MultivariateDistributionGaussian {
    simple: MultivariateDistributionGaussianSimple,
    cov: Matrix,
}

impl MultivariateDistributionGaussian {
    pub fn new(mean: Vec<f64>, cov: Matrix, eps: f64) -> Result<Self, CoreError> {
        let simple = MultivariateDistributionGaussianSimple::new(mean, &cov, eps)?;
        Ok(Self { simple, cov })
    }

    pub fn mean(&self) -> &[f64] {
        self.simple.mean()
    }

    pub fn covariance(&self) -> &Matrix {
        &self.cov
    }

    /// `a[i]` finite marks dimension `i` as observed (fixed); `a[i].is_nan()`
    /// marks it free. Returns the Gaussian law of the free dimensions given
    /// the fixed ones, in the order the free dimensions originally appeared.
    pub fn conditional(&self, a: &[f64]) -> Result<MultivariateDistributionGaussianSimple, CoreError> {
        let d = self.dim();
        if a.len() != d {
            return Err(CoreError::invalid_argument(
                "conditional: observation length must equal dimension",
            ));
        }
        let free: Vec<usize> = (0..d).filter(|&i| a[i].is_nan()).collect();
        let fixed: Vec<usize> = (0..d).filter(|&i| !a[i].is_nan()).collect();
        if free.is_empty() {
            return Err(CoreError::invalid_argument(
                "conditional: at least one dimension must be free (NaN)",
            ));
        }
        if fixed.is_empty() {
            return MultivariateDistributionGaussianSimple::new(
                free.iter().map(|&i| self.mean()[i]).collect(),
                &submatrix(&self.cov, &free, &free),
                1e-10,
            );
        }
        let mean = self.mean();
        let g11 = submatrix(&self.cov, &free, &free);
        let g12 = submatrix(&self.cov, &free, &fixed);
        let g22 = submatrix(&self.cov, &fixed, &fixed);
        let g22_pinv = pseudo_inverse(&g22, 1e-10);
        let b = g12.matmul(&g22_pinv);
        let a_dev: Vec<f64> = fixed.iter().map(|&i| a[i] - mean[i]).collect();
        let b_times_dev = b.mul_vec(&a_dev);
        let mu_cond: Vec<f64> = free
            .iter()
            .enumerate()
            .map(|(k, &i)| mean[i] + b_times_dev[k])
            .collect();
        let cov_cond = g11.sub(&b.matmul(&g12.transpose()));
        MultivariateDistributionGaussianSimple::new(mu_cond, &cov_cond, 1e-10)
    }
}

fn submatrix(m: &Matrix, rows: &[usize], cols: &[usize]) -> Matrix {
    let mut out = Matrix::zeros(rows.len(), cols.len());
    for (r, &i) in rows.iter().enumerate() {
        for (c, &j) in cols.iter().enumerate() {
            out.set(r, c, m.get(i, j));
        }
    }
    out
}

impl MultivariateDistribution for MultivariateDistributionGaussian {
    fn dim(&self) -> usize {
        self.simple.dim()
    }

    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        self.simple.draw(rng, out)
    }

    fn marginal_cdf(&self, i: usize, x: f64) -> f64 {
        self.simple.marginal_cdf(i, x)
    }

    fn marginal_icdf(&self, i: usize, p: f64) -> f64 {
        self.simple.marginal_icdf(i, p)
    }

    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        self.simple.adjust_distribution(sample)
    }
}
