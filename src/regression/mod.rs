//! Ordinary least squares via thin SVD, with optional-output switches and
//! model-selection metrics, plus a generic bottom-up factor selector built
//! on top of it.

pub mod factor_selection;

pub use factor_selection::{FactorSelectionBottomUp, FittableModel};

use crate::error::CoreError;
use crate::num::matrix::{pseudo_inverse, svd, Matrix, Svd};

/// Everything computed by a call to [`Ols::fit`], gated by which optional
/// outputs were switched on beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsResult {
    pub a: Vec<f64>,
    pub b: f64,
    pub prediction: Option<Vec<f64>>,
    pub residuals: Option<Vec<f64>>,
    pub ssr: Option<f64>,
    pub sst: Option<f64>,
    pub r2: Option<f64>,
    pub adj_r2: Option<f64>,
    pub bic: Option<f64>,
    pub empty_bic: Option<f64>,
    pub aic: Option<f64>,
    pub coefficient_covariance: Option<Matrix>,
}

/// Ordinary least squares: `fit(X, y)` solves `min ||X*a + b - y||^2` via
/// the pseudo-inverse of the (possibly intercept-augmented) design matrix.
/// Optional outputs cascade: turning on a later one turns on everything it
/// depends on, mirroring the setters below.
pub struct Ols {
    fit_intercept: bool,
    calculate_prediction: bool,
    calculate_residuals: bool,
    calculate_metrics: bool,
    calculate_coefficient_covariance: bool,
    result: Option<OlsResult>,
}

impl Default for Ols {
    fn default() -> Self {
        Self::new()
    }
}

impl Ols {
    pub fn new() -> Self {
        Ols {
            fit_intercept: true,
            calculate_prediction: false,
            calculate_residuals: false,
            calculate_metrics: false,
            calculate_coefficient_covariance: false,
            result: None,
        }
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn set_fit_intercept(&mut self, value: bool) {
        self.fit_intercept = value;
    }

    pub fn set_calculate_prediction(&mut self, value: bool) {
        self.calculate_prediction = value;
    }

    pub fn set_calculate_residuals(&mut self, value: bool) {
        self.calculate_residuals = value;
        if value {
            self.set_calculate_prediction(true);
        }
    }

    pub fn set_calculate_metrics(&mut self, value: bool) {
        self.calculate_metrics = value;
        if value {
            self.set_calculate_residuals(true);
        }
    }

    pub fn set_calculate_coefficient_covariance(&mut self, value: bool) {
        self.calculate_coefficient_covariance = value;
        if value {
            self.set_calculate_metrics(true);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }

    pub fn result(&self) -> Option<&OlsResult> {
        self.result.as_ref()
    }

    /// `X` has one row per sample point, one column per factor; `y` has one
    /// entry per sample point.
    pub fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), CoreError> {
        let n = y.len();
        if x.rows != n {
            return Err(CoreError::invalid_argument("Ols::fit: X.rows() must equal y.len()"));
        }
        if x.rows == 0 || x.cols == 0 {
            return Err(CoreError::invalid_argument("Ols::fit: X must not be empty"));
        }
        let p = x.cols;

        let design = if self.fit_intercept {
            let mut d = Matrix::zeros(n, p + 1);
            for i in 0..n {
                for j in 0..p {
                    d.set(i, j, x.get(i, j));
                }
                d.set(i, p, 1.0);
            }
            d
        } else {
            x.clone()
        };

        let coeffs = pseudo_inverse(&design, 1e-12).mul_vec(y);
        let (a, b) = if self.fit_intercept {
            (coeffs[..p].to_vec(), coeffs[p])
        } else {
            (coeffs.clone(), 0.0)
        };

        let mut prediction = None;
        let mut residuals = None;
        if self.calculate_prediction {
            let pred = design.mul_vec(&coeffs);
            if self.calculate_residuals {
                residuals = Some(y.iter().zip(&pred).map(|(yi, pi)| yi - pi).collect::<Vec<f64>>());
            }
            prediction = Some(pred);
        }

        let mut ssr = None;
        let mut sst = None;
        let mut r2 = None;
        let mut adj_r2 = None;
        let mut bic = None;
        let mut empty_bic = None;
        let mut aic = None;
        if self.calculate_metrics {
            let res = residuals.as_ref().expect("calculate_metrics implies calculate_residuals");
            let ssr_v: f64 = res.iter().map(|r| r * r).sum();
            let (sst_v, k, empty_k) = if self.fit_intercept {
                let mean_y = y.iter().sum::<f64>() / n as f64;
                (y.iter().map(|v| (v - mean_y).powi(2)).sum::<f64>(), p as f64 + 1.0, 1.0)
            } else {
                (y.iter().map(|v| v * v).sum::<f64>(), p as f64, 0.0)
            };
            let df_e = n as f64 - k;
            let df_t = (n - 1) as f64;
            let r2_v = 1.0 - ssr_v / sst_v;
            let adj_r2_v = 1.0 - (ssr_v / df_e) / (sst_v / df_t);
            let ll = n as f64 * (ssr_v / n as f64).ln();
            let empty_ll = n as f64 * (sst_v / n as f64).ln();
            let log_n = (n as f64).ln();
            ssr = Some(ssr_v);
            sst = Some(sst_v);
            r2 = Some(r2_v);
            adj_r2 = Some(adj_r2_v);
            aic = Some(2.0 * k + ll);
            bic = Some(k * log_n + ll);
            empty_bic = Some(empty_k * log_n + empty_ll);
        }

        let mut coefficient_covariance = None;
        if self.calculate_coefficient_covariance {
            let xtx = design.transpose().matmul(&design);
            let Svd { u, s, .. } = svd(&xtx);
            let dim = s.len();
            let mut diag_inv = Matrix::zeros(dim, dim);
            for i in 0..dim {
                if s[i].abs() > 1e-300 {
                    diag_inv.set(i, i, 1.0 / s[i]);
                }
            }
            let sigma2 = ssr.expect("calculate_coefficient_covariance implies calculate_metrics") / (design.rows as f64 - design.cols as f64);
            coefficient_covariance = Some(u.matmul(&diag_inv).matmul(&u.transpose()).scale(sigma2));
        }

        self.result = Some(OlsResult { a, b, prediction, residuals, ssr, sst, r2, adj_r2, bic, empty_bic, aic, coefficient_covariance });
        Ok(())
    }

    /// A factory suitable for [`FactorSelectionBottomUp`]: a fresh model
    /// with `fit_intercept` and metrics (hence residuals) switched on.
    pub fn model_factory(fit_intercept: bool) -> impl Fn() -> Ols {
        move || {
            let mut ols = Ols::new();
            ols.set_fit_intercept(fit_intercept);
            ols.set_calculate_metrics(true);
            ols
        }
    }

    /// Ranks candidate factor `candidate` by the adjusted R² of a
    /// single-factor regression of `model`'s residuals (or `y`, if `model`
    /// hasn't been fit yet) on that factor's column.
    pub fn factor_rank_residual_adj_r2(x: &Matrix, y: &[f64], model: &Ols, _accepted: &[usize], candidate: usize) -> f64 {
        let target: Vec<f64> = match model.result() {
            Some(r) => r.residuals.clone().unwrap_or_else(|| y.to_vec()),
            None => y.to_vec(),
        };
        let column = Matrix::from_flat(x.rows, 1, x.col(candidate));
        let mut ranking_model = Ols::new();
        ranking_model.set_fit_intercept(model.fit_intercept);
        ranking_model.set_calculate_metrics(true);
        match ranking_model.fit(&column, &target) {
            Ok(()) => ranking_model.result().and_then(|r| r.adj_r2).unwrap_or(f64::NEG_INFINITY),
            Err(_) => f64::NEG_INFINITY,
        }
    }

    /// A comparator accepting a candidate model iff its BIC beats the
    /// incumbent's (or, for an empty incumbent, the candidate's own
    /// empty-model BIC) by at least `delta`.
    pub fn bic_comparator(delta: f64) -> impl Fn(&Ols, &Ols) -> bool {
        move |incumbent: &Ols, candidate: &Ols| {
            let candidate_bic = candidate.result().and_then(|r| r.bic).expect("candidate must have metrics calculated");
            match incumbent.result() {
                Some(r) => candidate_bic + delta < r.bic.expect("incumbent must have metrics calculated"),
                None => {
                    let empty_bic = candidate.result().and_then(|r| r.empty_bic).expect("candidate must have metrics calculated");
                    candidate_bic + delta < empty_bic
                }
            }
        }
    }
}

impl FittableModel for Ols {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), CoreError> {
        Ols::fit(self, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design_and_target() -> (Matrix, Vec<f64>) {
        // y = 2*x0 - 1*x1 + 3, noiseless.
        let x = Matrix::from_rows(&[
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![2.0, 1.0],
            vec![3.0, 2.0],
            vec![1.0, 3.0],
        ]);
        let y: Vec<f64> = x.as_slice().chunks(2).map(|row| 2.0 * row[0] - row[1] + 3.0).collect();
        (x, y)
    }

    #[test]
    fn recovers_exact_coefficients_for_a_noiseless_linear_model() {
        let (x, y) = design_and_target();
        let mut ols = Ols::new();
        ols.set_calculate_metrics(true);
        ols.fit(&x, &y).unwrap();
        let result = ols.result().unwrap();
        assert!((result.a[0] - 2.0).abs() < 1e-6);
        assert!((result.a[1] + 1.0).abs() < 1e-6);
        assert!((result.b - 3.0).abs() < 1e-6);
        assert!(result.r2.unwrap() > 0.999);
    }

    #[test]
    fn without_intercept_b_is_zero() {
        let (x, y) = design_and_target();
        let mut ols = Ols::new();
        ols.set_fit_intercept(false);
        ols.fit(&x, &y).unwrap();
        assert_eq!(ols.result().unwrap().b, 0.0);
    }

    #[test]
    fn optional_outputs_stay_none_unless_requested() {
        let (x, y) = design_and_target();
        let mut ols = Ols::new();
        ols.fit(&x, &y).unwrap();
        let result = ols.result().unwrap();
        assert!(result.prediction.is_none());
        assert!(result.residuals.is_none());
        assert!(result.ssr.is_none());
    }

    #[test]
    fn cascading_switches_turn_on_their_dependencies() {
        let (x, y) = design_and_target();
        let mut ols = Ols::new();
        ols.set_calculate_coefficient_covariance(true);
        ols.fit(&x, &y).unwrap();
        let result = ols.result().unwrap();
        assert!(result.coefficient_covariance.is_some());
        assert!(result.residuals.is_some());
        assert!(result.prediction.is_some());
    }

    #[test]
    fn rejects_mismatched_row_counts() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]);
        let mut ols = Ols::new();
        assert!(ols.fit(&x, &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn bic_comparator_accepts_a_sufficiently_better_candidate() {
        let (x, y) = design_and_target();
        let col0 = Matrix::from_flat(x.rows, 1, x.col(0));
        let mut candidate = Ols::new();
        candidate.set_calculate_metrics(true);
        candidate.fit(&col0, &y).unwrap();

        let accept = Ols::bic_comparator(6.0);
        assert!(accept(&Ols::new(), &candidate));
    }
}
