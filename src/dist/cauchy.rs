use crate::dist::{Continuous, DistError, Distribution, Moments};
use crate::rng::RngCore;

/// Standard Cauchy family `Cauchy(x0, gamma)`: undefined mean and variance,
/// used as the `alpha = 1` member of the alpha-stable family backing
/// [`crate::copula::multifactor`].
#[derive(Debug, Clone, Copy)]
pub struct Cauchy {
    x0: f64,
    gamma: f64,
}

impl Cauchy {
    pub fn new(x0: f64, gamma: f64) -> Result<Self, DistError> {
        if !(gamma > 0.0 && gamma.is_finite() && x0.is_finite()) {
            return Err(DistError::InvalidParameter);
        }
        Ok(Self { x0, gamma })
    }

    #[inline]
    pub fn location(&self) -> f64 {
        self.x0
    }
    #[inline]
    pub fn scale(&self) -> f64 {
        self.gamma
    }
}

impl Distribution for Cauchy {
    type Value = f64;
    fn cdf(&self, x: f64) -> f64 {
        0.5 + ((x - self.x0) / self.gamma).atan() / std::f64::consts::PI
    }
    fn in_support(&self, x: f64) -> bool {
        x.is_finite()
    }
    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        let u = rng.next_f64() - 0.5;
        self.x0 + self.gamma * (std::f64::consts::PI * u).tan()
    }
}

impl Continuous for Cauchy {
    fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.x0) / self.gamma;
        1.0 / (std::f64::consts::PI * self.gamma * (1.0 + z * z))
    }
    fn inv_cdf(&self, p: f64) -> f64 {
        debug_assert!((0.0..=1.0).contains(&p));
        self.x0 + self.gamma * (std::f64::consts::PI * (p - 0.5)).tan()
    }
}

impl Moments for Cauchy {
    fn mean(&self) -> f64 {
        f64::NAN
    }
    fn variance(&self) -> f64 {
        f64::NAN
    }
    fn skewness(&self) -> f64 {
        f64::NAN
    }
    fn kurtosis(&self) -> f64 {
        f64::NAN
    }
    fn entropy(&self) -> f64 {
        (4.0 * std::f64::consts::PI * self.gamma).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_equals_location() {
        let c = Cauchy::new(2.0, 1.5).unwrap();
        assert!((c.inv_cdf(0.5) - 2.0).abs() < 1e-12);
        assert!((c.cdf(2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pdf_peaks_at_location() {
        let c = Cauchy::new(0.0, 1.0).unwrap();
        assert!(c.pdf(0.0) > c.pdf(1.0));
        assert!((c.pdf(0.0) - 1.0 / std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn round_trip_quantile() {
        let c = Cauchy::new(-1.0, 2.0).unwrap();
        for &p in &[0.1, 0.3, 0.7, 0.9] {
            let x = c.inv_cdf(p);
            assert!((c.cdf(x) - p).abs() < 1e-10);
        }
    }
}
