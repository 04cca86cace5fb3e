use crate::error::CoreError;
use crate::num::matrix::{pseudo_inverse, Matrix};

/// Sum-of-squares divergence weights derived from a Gaussian approximation
/// of a Dirichlet posterior over an observed multinomial distribution. Used
/// to score how well a fitted probability vector `Q` matches a surveyed
/// probability vector `P`, penalizing deviations by the inverse of the
/// posterior's covariance so that categories backed by more survey evidence
/// are weighted more heavily.
///
/// One weight matrix is produced per time index, built from the observed
/// distribution and survey count at that index.
#[derive(Debug, Clone)]
pub struct SsqDivergence {
    weights: Vec<Matrix>,
}

impl SsqDivergence {
    /// `observed` has one column per time index and `dim` rows (a
    /// probability distribution per column); `nbr_surveys[t]` is the
    /// number of surveys backing column `t`.
    pub fn new(observed: &Matrix, nbr_surveys: &[f64]) -> Result<Self, CoreError> {
        if observed.cols != nbr_surveys.len() {
            return Err(CoreError::invalid_argument(
                "SsqDivergence: one survey count required per observed column",
            ));
        }
        let dim = observed.rows;
        if dim == 0 {
            return Err(CoreError::invalid_argument("SsqDivergence: dimension must be positive"));
        }
        let mut weights = Vec::with_capacity(observed.cols);
        for t in 0..observed.cols {
            let n = nbr_surveys[t];
            let mut alpha = vec![1.0; dim]; // flat Dirichlet prior
            for r in 0..dim {
                alpha[r] += n * observed.get(r, t);
            }
            let a0: f64 = alpha.iter().sum();
            let denom = a0 * a0 * (a0 + 1.0);
            let mut covariance = Matrix::zeros(dim, dim);
            for r in 0..dim {
                let a_r = alpha[r];
                covariance.set(r, r, a_r * (a0 - a_r) / denom);
                for c in 0..r {
                    let v = -a_r * alpha[c] / denom;
                    covariance.set(r, c, v);
                    covariance.set(c, r, v);
                }
            }
            // The simplex constraint sum_i p_i = 1 makes this matrix rank
            // dim - 1, so its proper inverse doesn't exist.
            weights.push(pseudo_inverse(&covariance, 1e-14));
        }
        Ok(Self { weights })
    }

    pub fn dim(&self) -> usize {
        self.weights.first().map_or(0, |w| w.rows)
    }

    pub fn weight(&self, year_idx: usize) -> &Matrix {
        &self.weights[year_idx]
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    /// Weighted squared distance between `p` and `q` under the posterior
    /// covariance at `year_idx`: `(q - p)^T W (q - p)`.
    pub fn error(&self, year_idx: usize, p: &[f64], q: &[f64]) -> Result<f64, CoreError> {
        let w = &self.weights[year_idx];
        if p.len() != w.rows || q.len() != w.rows {
            return Err(CoreError::invalid_argument("SsqDivergence::error: dimension mismatch"));
        }
        let mut dist = 0.0;
        for r in 0..w.rows {
            let diff_r = q[r] - p[r];
            dist += diff_r * diff_r * w.get(r, r);
            for c in 0..r {
                let diff_c = q[c] - p[c];
                dist += 2.0 * diff_r * diff_c * w.get(r, c);
            }
        }
        Ok(dist)
    }
}
