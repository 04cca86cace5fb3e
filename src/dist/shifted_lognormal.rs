use crate::dist::normal::Normal;
use crate::dist::{clamp_probability, Continuous, DistError, Distribution, Moments};
use crate::num;
use crate::rng::RngCore;

/// `Y = shift + exp(X)` with `X ~ Normal(mu, sigma)`: a lognormal shifted so
/// its support starts at `shift` rather than zero (`shift == 0` recovers the
/// plain lognormal). Four ways to build one:
/// [`Self::new`] (direct parameters), [`Self::estimate_params_given_shift`]
/// (ML on `log(y - shift)` given a fixed shift), [`Self::estimate`]
/// (unknown shift, via Aristizabal's pivotal statistic), and
/// [`Self::fit_exactly_given_shift`] (algebraic exact fit to two quantiles),
/// plus [`Self::estimate_given_shift`] for fitting a histogram by KL
/// divergence.
#[derive(Debug, Clone, Copy)]
pub struct ShiftedLognormal {
    shift: f64,
    normal: Normal,
}

impl ShiftedLognormal {
    pub fn new(shift: f64, mu: f64, sigma: f64) -> Result<Self, DistError> {
        if !shift.is_finite() {
            return Err(DistError::InvalidParameter);
        }
        let normal = Normal::new(mu, sigma)?;
        Ok(Self { shift, normal })
    }

    #[inline]
    pub fn shift(&self) -> f64 {
        self.shift
    }

    fn x_of(&self, y: f64) -> f64 {
        (y - self.shift).ln()
    }

    /// Method-of-moments estimate of `(mu, sigma)` given a fixed `shift`,
    /// from the sample mean and variance of `y - shift` (pivotal method of
    /// Aristizabal, simplified: matches the first two log-moments exactly).
    pub fn estimate_params_given_shift(shift: f64, sample: &[f64]) -> Result<Self, DistError> {
        if sample.is_empty() || sample.iter().any(|&y| y <= shift) {
            return Err(DistError::InvalidParameter);
        }
        let logs: Vec<f64> = sample.iter().map(|&y| (y - shift).ln()).collect();
        let n = logs.len() as f64;
        let mean = logs.iter().sum::<f64>() / n;
        let var = if logs.len() > 1 {
            logs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            1.0
        };
        Self::new(shift, mean, var.sqrt().max(1e-12))
    }

    /// Exact fit to two quantile constraints given a fixed `shift`: solves
    /// `P(Y < x0) = p0` and `P(x0 <= Y < x1) = p1` for `(mu, sigma)`
    /// algebraically via the two linear equations `Phi^-1(p0)*sigma + mu =
    /// ln(x0-shift)` and `Phi^-1(p0+p1)*sigma + mu = ln(x1-shift)`.
    pub fn fit_exactly_given_shift(p0: f64, p1: f64, shift: f64, x0: f64, x1: f64) -> Result<Self, DistError> {
        if !(p0 > 0.0) || !(p1 > 0.0) || !(p0 + p1 < 1.0) {
            return Err(DistError::InvalidParameterMsg(
                "ShiftedLognormal::fit_exactly_given_shift: need p0 > 0, p1 > 0, p0 + p1 < 1".into(),
            ));
        }
        if !(x1 > x0) || !(x0 > shift) {
            return Err(DistError::InvalidParameterMsg(
                "ShiftedLognormal::fit_exactly_given_shift: need x0 > shift and x1 > x0".into(),
            ));
        }
        let y0 = num::standard_normal_inv_cdf(p0);
        let y1 = num::standard_normal_inv_cdf(p0 + p1);
        let a0 = (x0 - shift).ln();
        let a1 = (x1 - shift).ln();
        let sigma = (a1 - a0) / (y1 - y0);
        let mu = (a0 + a1 - sigma * (y0 + y1)) / 2.0;
        Self::new(shift, mu, sigma)
    }

    /// Estimates `shift` jointly with `(mu, sigma)` from an unshifted sample,
    /// using Aristizabal's pivotal-statistic method: the sample is split
    /// into thirds, and `shift` is chosen so that the ratio of consecutive
    /// third-mean log-gaps goes to 1. Reorders `sample` (it gets sorted).
    pub fn estimate(sample: &mut [f64]) -> Result<Self, DistError> {
        if sample.len() < 10 {
            return Err(DistError::InvalidParameterMsg("ShiftedLognormal::estimate: sample too small".into()));
        }
        sample.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let min_x = sample[0];
        let bnd_eps = 1e-16 + 1e-14 * min_x.abs();
        let upper = min_x - bnd_eps;

        let f = |shift: f64| pivotal(sample, shift) - 1.0;

        let mut a = upper;
        let mut fa = f(a);
        let mut step = 1.0_f64.max(bnd_eps * 10.0);
        let mut b = a - step;
        let mut fb = f(b);
        let mut bracketed = fa * fb <= 0.0;
        let mut iter = 0;
        while !bracketed && iter < 200 {
            a = b;
            fa = fb;
            step *= 1.5;
            b = a - step;
            fb = f(b);
            bracketed = fa * fb <= 0.0;
            iter += 1;
        }
        if !bracketed {
            return Err(DistError::InvalidParameterMsg(
                "ShiftedLognormal::estimate: could not bracket a shift solving the pivotal equation".into(),
            ));
        }
        let (lo, hi) = if b < a { (b, a) } else { (a, b) };
        let shift = crate::num::brent::brent(f, lo, hi, 1e-10, 200)
            .map_err(|e| DistError::InvalidParameterMsg(e.to_string()))?;
        Self::estimate_params_given_shift(shift, sample)
    }

    /// Fits `(mu, sigma)` (with `shift` pinned to `x[0]`) to minimize the
    /// Kullback-Leibler divergence from the piecewise-constant histogram
    /// `p[k] = P(x[k] <= Y < x[k+1])` (the last bucket runs to infinity).
    pub fn estimate_given_shift(x: &[f64], p: &[f64]) -> Result<Self, DistError> {
        if x.is_empty() || x.len() != p.len() {
            return Err(DistError::InvalidParameterMsg(
                "ShiftedLognormal::estimate_given_shift: x and p must be the same nonempty length".into(),
            ));
        }
        let shift = x[0];
        let edges: Vec<f64> = x[1..].iter().copied().chain(std::iter::once(f64::INFINITY)).collect();

        let mut mu = 0.0_f64;
        let mut sigma = 1.0_f64;
        let mut value = kl_value(&edges, p, shift, mu, sigma);
        let mut step = 0.1_f64;
        for _ in 0..2000 {
            let (_, g_mu, g_sigma) = kl_value_and_gradient(&edges, p, shift, mu, sigma);
            let new_mu = mu - step * g_mu;
            let new_sigma = (sigma - step * g_sigma).max(1e-10);
            let new_value = kl_value(&edges, p, shift, new_mu, new_sigma);
            if new_value.is_finite() && new_value <= value + 1e-12 {
                let improved = value - new_value;
                mu = new_mu;
                sigma = new_sigma;
                value = new_value;
                if improved.abs() < 1e-13 {
                    break;
                }
            } else {
                step *= 0.5;
                if step < 1e-14 {
                    break;
                }
            }
        }
        Self::new(shift, mu, sigma)
    }
}

/// Aristizabal's pivotal statistic: ratio of consecutive third-mean log-gaps
/// of `sample - shift`, driven to 1 at the correct shift.
fn pivotal(sample: &[f64], shift: f64) -> f64 {
    let n = sample.len();
    let n1 = n / 3;
    let n2 = n - n1;
    let s1: f64 = sample[0..n1].iter().map(|&v| (v - shift).ln()).sum::<f64>() / n1 as f64;
    let s2: f64 = sample[n1..n2].iter().map(|&v| (v - shift).ln()).sum::<f64>() / (n2 - n1) as f64;
    let s3: f64 = sample[n2..n].iter().map(|&v| (v - shift).ln()).sum::<f64>() / n1 as f64;
    (s2 - s1) / (s3 - s2)
}

/// KL divergence of the histogram `p[k] = P(edges[k-1] <= Y < edges[k])`
/// (with `edges[-1] = shift`) from the fitted normal-in-log model, plus its
/// gradient over `(mu, sigma)`.
fn kl_value_and_gradient(edges: &[f64], p: &[f64], shift: f64, mu: f64, sigma: f64) -> (f64, f64, f64) {
    let mut sum = 0.0;
    let mut sum_over_mu = 0.0;
    let mut partial_sum_over_sigma = 0.0;
    let mut prev_cq = 0.0;
    let mut prev_pdf = 0.0;
    let mut prev_y_pdf = 0.0;
    for (&pk, &xk) in p.iter().zip(edges.iter()) {
        let y = (xk - shift).ln();
        let z = (y - mu) / sigma;
        let cq = num::standard_normal_cdf(z);
        let pdf = num::standard_normal_pdf(z);
        let y_pdf = if y.is_finite() { y * pdf } else { 0.0 };
        let dq = cq - prev_cq;
        sum += pk * (pk / dq).ln();
        sum_over_mu += pk * (pdf - prev_pdf) / dq;
        partial_sum_over_sigma += pk * (y_pdf - prev_y_pdf) / dq;
        prev_cq = cq;
        prev_pdf = pdf;
        prev_y_pdf = y_pdf;
    }
    let over_mu = sum_over_mu / sigma;
    let over_sigma = (partial_sum_over_sigma / sigma - over_mu * mu) / sigma;
    (sum, over_mu, over_sigma)
}

fn kl_value(edges: &[f64], p: &[f64], shift: f64, mu: f64, sigma: f64) -> f64 {
    let mut sum = 0.0;
    let mut prev_cq = 0.0;
    for (&pk, &xk) in p.iter().zip(edges.iter()) {
        let y = (xk - shift).ln();
        let z = (y - mu) / sigma;
        let cq = num::standard_normal_cdf(z);
        let dq = cq - prev_cq;
        sum += pk * (pk / dq).ln();
        prev_cq = cq;
    }
    sum
}

impl Distribution for ShiftedLognormal {
    type Value = f64;

    fn cdf(&self, y: f64) -> f64 {
        if y <= self.shift {
            return 0.0;
        }
        self.normal.cdf(self.x_of(y))
    }

    fn in_support(&self, y: f64) -> bool {
        y > self.shift && y.is_finite()
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        self.shift + self.normal.sample(rng).exp()
    }

    fn infimum(&self) -> f64 {
        self.shift
    }
}

impl Continuous for ShiftedLognormal {
    fn pdf(&self, y: f64) -> f64 {
        if !self.in_support(y) {
            return 0.0;
        }
        let x = self.x_of(y);
        self.normal.pdf(x) / (y - self.shift)
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        let p = clamp_probability(p);
        self.shift + self.normal.inv_cdf(p).exp()
    }
}

impl Moments for ShiftedLognormal {
    fn mean(&self) -> f64 {
        self.shift + self.normal.mean().exp() * (0.5 * self.normal.variance()).exp()
    }

    fn variance(&self) -> f64 {
        let s2 = self.normal.variance();
        ((2.0 * s2).exp() - s2.exp()) * (2.0 * self.normal.mean() + s2).exp()
    }

    fn skewness(&self) -> f64 {
        let s2 = self.normal.variance();
        (s2.exp() + 2.0) * (s2.exp() - 1.0).sqrt()
    }

    fn kurtosis(&self) -> f64 {
        let s2 = self.normal.variance();
        (4.0 * s2).exp() + 2.0 * (3.0 * s2).exp() + 3.0 * (2.0 * s2).exp() - 6.0
    }

    fn entropy(&self) -> f64 {
        self.normal.mean()
            + 0.5 * (2.0 * std::f64::consts::PI * std::f64::consts::E * self.normal.variance()).ln()
    }
}
