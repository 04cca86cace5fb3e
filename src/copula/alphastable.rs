use crate::copula::Copula;
use crate::dist::{Cauchy, Continuous, Distribution};
use crate::error::CoreError;
use crate::multivariate::rank_transform_column;
use crate::num::matrix::{check_positive_semidefinite, is_correlation_matrix, pseudo_inverse, svd, Matrix};
use crate::num::{standard_normal_cdf, standard_normal_inv_cdf};
use crate::rng::{Rng, RngCore};

const ALPHA_STABLE_EPS: f64 = 1e-12;

/// Multi-factor copula correlating `d` variables via `Y = S * Z`, where `Z`
/// is a vector of i.i.d. alpha-stable variables (scale 1 for `alpha != 2`,
/// `1/sqrt(2)` for `alpha == 2` so `Y_i` ends up with unit Gaussian scale
/// once `S`'s rows are normalized). The Gaussian case (`alpha == 2`) is
/// specialized further by [`crate::copula::GaussianCopula`].
#[derive(Debug, Clone)]
pub struct AlphaStableMultifactor {
    alpha: f64,
    s: Matrix,
    s_pinv: Matrix,
}

impl AlphaStableMultifactor {
    /// Constructor 1: from an explicit `d x m` loadings matrix. Each row is
    /// rescaled so `sum_j |S_ij|^alpha == 1`, which together with the scale
    /// convention of the i.i.d. factors gives every `Y_i` unit scale.
    pub fn from_loadings_matrix(alpha: f64, s: Matrix) -> Result<Self, CoreError> {
        validate_alpha(alpha)?;
        let mut s = s;
        for i in 0..s.rows {
            let norm_alpha: f64 = (0..s.cols).map(|j| s.get(i, j).abs().powf(alpha)).sum::<f64>().powf(1.0 / alpha);
            if norm_alpha > 0.0 {
                for j in 0..s.cols {
                    s.set(i, j, s.get(i, j) / norm_alpha);
                }
            }
        }
        let s_pinv = pseudo_inverse(&s, ALPHA_STABLE_EPS);
        Ok(Self { alpha, s, s_pinv })
    }

    /// Constructor 2: single common factor plus one intrinsic factor per
    /// variable. `loadings[i]` (`|loadings[i]| <= 1`) is the weight on the
    /// common factor; the remaining weight `(1 - |loadings[i]|^alpha)^(1/alpha)`
    /// goes to variable `i`'s own intrinsic factor.
    pub fn from_common_factor_loadings(alpha: f64, loadings: &[f64]) -> Result<Self, CoreError> {
        validate_alpha(alpha)?;
        let d = loadings.len();
        if d == 0 {
            return Err(CoreError::invalid_argument(
                "AlphaStableMultifactor: at least one loading required",
            ));
        }
        let mut s = Matrix::zeros(d, d + 1);
        for (i, &beta) in loadings.iter().enumerate() {
            if beta.abs() > 1.0 {
                return Err(CoreError::out_of_range("AlphaStableMultifactor: loading outside [-1, 1]"));
            }
            s.set(i, i, beta);
            let intrinsic = (1.0 - beta.abs().powf(alpha)).max(0.0).powf(1.0 / alpha);
            s.set(i, d, intrinsic);
        }
        let s_pinv = pseudo_inverse(&s, ALPHA_STABLE_EPS);
        Ok(Self { alpha, s, s_pinv })
    }

    /// Constructor 3: Gaussian-only (`alpha == 2`), derived from a
    /// correlation matrix `rho` by keeping the smallest number of principal
    /// factors `M` whose cumulative captured variance reaches
    /// `min_variance_fraction * d`, subject to `M <= max_nbr_factors` (`None`
    /// meaning no cap). Fails `ImpossibleConstraints` if both cannot be
    /// satisfied at once.
    pub fn from_correlation_matrix(
        rho: &Matrix,
        min_variance_fraction: f64,
        max_nbr_factors: Option<usize>,
    ) -> Result<Self, CoreError> {
        if rho.rows != rho.cols {
            return Err(CoreError::invalid_argument("AlphaStableMultifactor: rho must be square"));
        }
        if !is_correlation_matrix(rho, 1e-8) {
            return Err(CoreError::invalid_argument(
                "AlphaStableMultifactor: rho is not a valid correlation matrix",
            ));
        }
        if min_variance_fraction > 1.0 {
            return Err(CoreError::invalid_argument(
                "AlphaStableMultifactor: minimum variance fraction above 1",
            ));
        }
        check_positive_semidefinite(rho, 1e-8)?;

        let n = rho.rows;
        let decomposition = svd(rho);
        let max_m = max_nbr_factors.unwrap_or(n).min(n);
        let target_var = min_variance_fraction * n as f64;

        let mut m = 0;
        let mut sum_var = 0.0;
        for i in 0..n {
            let lambda = decomposition.s[i].max(0.0);
            if sum_var < target_var && m < max_m {
                sum_var += lambda;
                m += 1;
            }
        }
        if sum_var < target_var * (1.0 - 1e-8) || m > max_m {
            return Err(CoreError::ImpossibleConstraints(
                "AlphaStableMultifactor: variance capture conditions cannot be satisfied".into(),
            ));
        }

        let mut s = Matrix::zeros(n, m);
        for i in 0..n {
            for j in 0..m {
                let scale = (decomposition.s[j].max(0.0) * n as f64 / sum_var).max(0.0).sqrt();
                s.set(i, j, decomposition.u.get(i, j) * scale);
            }
        }
        let s_pinv = pseudo_inverse(&s, ALPHA_STABLE_EPS);
        Ok(Self { alpha: 2.0, s, s_pinv })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn nbr_independent_factors(&self) -> usize {
        self.s.cols
    }

    pub fn loadings(&self) -> &Matrix {
        &self.s
    }

    fn marginal_factor_cdf(&self, x: f64) -> Result<f64, CoreError> {
        if self.alpha == 2.0 {
            Ok(standard_normal_cdf(x))
        } else if self.alpha == 1.0 {
            Ok(Cauchy::new(0.0, 1.0).unwrap().cdf(x))
        } else {
            Err(CoreError::NotImplemented(
                "AlphaStableMultifactor: marginal CDF only implemented for alpha in {1, 2}".into(),
            ))
        }
    }

    fn marginal_factor_icdf(&self, p: f64) -> Result<f64, CoreError> {
        if self.alpha == 2.0 {
            Ok(standard_normal_inv_cdf(p))
        } else if self.alpha == 1.0 {
            Ok(Cauchy::new(0.0, 1.0).unwrap().inv_cdf(p))
        } else {
            Err(CoreError::NotImplemented(
                "AlphaStableMultifactor: inverse CDF only implemented for alpha in {1, 2}".into(),
            ))
        }
    }
}

fn validate_alpha(alpha: f64) -> Result<(), CoreError> {
    if !(alpha > 0.0 && alpha <= 2.0) {
        return Err(CoreError::out_of_range("AlphaStableMultifactor: alpha must lie in (0, 2]"));
    }
    Ok(())
}

impl Copula for AlphaStableMultifactor {
    fn dim(&self) -> usize {
        self.s.rows
    }

    fn draw_cdfs(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim() {
            return Err(CoreError::invalid_argument("draw_cdfs: output size mismatch"));
        }
        let z: Vec<f64> = (0..self.s.cols).map(|_| rng.next_alpha_stable(self.alpha)).collect();
        let y = self.s.mul_vec(&z);
        for (o, v) in out.iter_mut().zip(y) {
            *o = self.marginal_factor_cdf(v)?;
        }
        Ok(())
    }

    fn adjust_cdfs(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        if sample.cols != self.dim() {
            return Err(CoreError::invalid_argument("adjust_cdfs: column count must equal dimension"));
        }
        for r in 0..sample.rows {
            for c in 0..sample.cols {
                let p = sample.get(r, c);
                sample.set(r, c, self.marginal_factor_icdf(p)?);
            }
        }

        let m = self.s.cols;
        let mut iid = Matrix::zeros(sample.rows, m);
        for r in 0..sample.rows {
            let row: Vec<f64> = sample.row(r).to_vec();
            let z = self.s_pinv.mul_vec(&row);
            for (c, v) in z.into_iter().enumerate() {
                iid.set(r, c, v);
            }
        }
        for c in 0..m {
            rank_transform_column(&mut iid, c);
            for r in 0..iid.rows {
                let p = iid.get(r, c);
                iid.set(r, c, self.marginal_factor_icdf(p)?);
            }
        }

        for r in 0..sample.rows {
            let zr: Vec<f64> = iid.row(r).to_vec();
            let y = self.s.mul_vec(&zr);
            for (c, v) in y.into_iter().enumerate() {
                sample.set(r, c, self.marginal_factor_cdf(v)?);
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
    fn rejects_alpha_out_of_range() {
        assert!(AlphaStableMultifactor::from_loadings_matrix(0.0, Matrix::identity(2)).is_err());
        assert!(AlphaStableMultifactor::from_loadings_matrix(2.5, Matrix::identity(2)).is_err());
    }

    #[test]
    fn common_factor_loadings_normalize_each_row() {
        let c = AlphaStableMultifactor::from_common_factor_loadings(2.0, &[0.5, -0.5]).unwrap();
        assert_eq!(c.dim(), 2);
        assert_eq!(c.nbr_independent_factors(), 3);
    }

    #[test]
    fn rejects_common_factor_loading_outside_bounds() {
        assert!(AlphaStableMultifactor::from_common_factor_loadings(2.0, &[1.5]).is_err());
    }

    #[test]
    fn correlation_matrix_constructor_rejects_unreachable_variance_capture() {
        let rho = Matrix::identity(4);
        let result = AlphaStableMultifactor::from_correlation_matrix(&rho, 0.99, Some(1));
        assert!(result.is_err());
    }

    #[test]
    fn correlation_matrix_constructor_recovers_full_rank_identity() {
        let rho = Matrix::identity(2);
        let c = AlphaStableMultifactor::from_correlation_matrix(&rho, 1.0, None).unwrap();
        assert_eq!(c.dim(), 2);
    }

    #[test]
    fn draw_cdfs_produces_values_in_unit_interval() {
        let c = AlphaStableMultifactor::from_loadings_matrix(2.0, Matrix::identity(2)).unwrap();
        let mut rng = SplitMix64::seed_from_u64(3);
        let mut out = [0.0; 2];
        c.draw_cdfs(&mut rng, &mut out).unwrap();
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn non_gaussian_non_cauchy_alpha_is_not_implemented() {
        let c = AlphaStableMultifactor::from_loadings_matrix(1.5, Matrix::identity(1)).unwrap();
        let mut rng = SplitMix64::seed_from_u64(1);
        let mut out = [0.0];
        assert!(c.draw_cdfs(&mut rng, &mut out).is_err());
    }
}
