use crate::dist::{Continuous, DistError, Distribution, Moments};
use crate::rng::RngCore;

/// Two-sided (asymmetric Laplace-shaped) exponential with independent rates
/// on either side of zero: `f(x) = w * exp(lambda_minus * x)` for `x < 0` and
/// `f(x) = w * exp(-lambda_plus * x)` for `x >= 0`, where
/// `w = lambda_minus * lambda_plus / (lambda_minus + lambda_plus)` makes the
/// density continuous at zero and integrate to one.
///
/// Both rates must be finite and strictly positive; there is no one-sided
/// degenerate form.
#[derive(Debug, Clone, Copy)]
pub struct TwoSidedExponential {
    lambda_minus: f64,
    lambda_plus: f64,
    weight: f64,
}

impl TwoSidedExponential {
    pub fn new(lambda_minus: f64, lambda_plus: f64) -> Result<Self, DistError> {
        if !(lambda_minus > 0.0 && lambda_plus > 0.0)
            || !lambda_minus.is_finite()
            || !lambda_plus.is_finite()
        {
            return Err(DistError::InvalidParameterMsg(
                "TwoSidedExponential::new: lambda_minus and lambda_plus must both be finite and positive".into(),
            ));
        }
        let weight = lambda_minus * lambda_plus / (lambda_minus + lambda_plus);
        Ok(Self {
            lambda_minus,
            lambda_plus,
            weight,
        })
    }

    #[inline]
    pub fn lambda_minus(&self) -> f64 {
        self.lambda_minus
    }
    #[inline]
    pub fn lambda_plus(&self) -> f64 {
        self.lambda_plus
    }

    fn left_mass(&self) -> f64 {
        self.weight / self.lambda_minus
    }
}

impl Distribution for TwoSidedExponential {
    type Value = f64;

    fn cdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            (self.weight / self.lambda_minus) * (self.lambda_minus * x).exp()
        } else {
            1.0 - (self.weight / self.lambda_plus) * (-self.lambda_plus * x).exp()
        }
    }

    fn in_support(&self, x: f64) -> bool {
        x.is_finite()
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        let p = rng.next_f64();
        self.inv_cdf(p)
    }

    fn infimum(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn supremum(&self) -> f64 {
        f64::INFINITY
    }
}

impl Continuous for TwoSidedExponential {
    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            self.weight * (self.lambda_minus * x).exp()
        } else {
            self.weight * (-self.lambda_plus * x).exp()
        }
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        let p = crate::dist::clamp_probability(p);
        let left_mass = self.left_mass();
        if p < left_mass {
            (p * self.lambda_minus / self.weight).ln() / self.lambda_minus
        } else {
            -((1.0 - p) * self.lambda_plus / self.weight).ln() / self.lambda_plus
        }
    }
}

impl Moments for TwoSidedExponential {
    fn mean(&self) -> f64 {
        self.weight / self.lambda_plus.powi(2) - self.weight / self.lambda_minus.powi(2)
    }

    fn variance(&self) -> f64 {
        let m = self.mean();
        self.second_moment() - m * m
    }

    fn skewness(&self) -> f64 {
        f64::NAN
    }

    fn kurtosis(&self) -> f64 {
        f64::NAN
    }

    fn entropy(&self) -> f64 {
        f64::NAN
    }
}

impl TwoSidedExponential {
    fn second_moment(&self) -> f64 {
        2.0 * self.weight / self.lambda_plus.powi(3) + 2.0 * self.weight / self.lambda_minus.powi(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_case_matches_laplace() {
        let d = TwoSidedExponential::new(1.0, 1.0).unwrap();
        assert!((d.cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((d.pdf(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn support_is_the_whole_real_line() {
        let d = TwoSidedExponential::new(1.0, 2.0).unwrap();
        assert_eq!(d.infimum(), f64::NEG_INFINITY);
        assert_eq!(d.supremum(), f64::INFINITY);
    }

    #[test]
    fn rejects_a_non_positive_rate_on_either_side() {
        assert!(TwoSidedExponential::new(0.0, 2.0).is_err());
        assert!(TwoSidedExponential::new(2.0, 0.0).is_err());
        assert!(TwoSidedExponential::new(-1.0, 2.0).is_err());
        assert!(TwoSidedExponential::new(2.0, f64::NAN).is_err());
    }

    #[test]
    fn quantile_round_trip() {
        let d = TwoSidedExponential::new(2.0, 0.5).unwrap();
        for &p in &[0.05, 0.3, 0.5, 0.7, 0.95] {
            let x = d.inv_cdf(p);
            assert!((d.cdf(x) - p).abs() < 1e-9);
        }
    }
}
