use crate::dist::{Continuous, DistError, Distribution, Moments};
use crate::{num, rng::RngCore};

#[derive(Debug, Clone, Copy)]
pub struct Normal {
    mu: f64,
    sigma: f64,
    inv_sigma: f64,
    norm: f64, // 1/(sigma*sqrt(2*pi))
}

impl Normal {
    /// `sigma == 0` is accepted and gives a point mass at `mu`.
    pub fn new(mu: f64, sigma: f64) -> Result<Self, DistError> {
        if !(sigma >= 0.0 && sigma.is_finite() && mu.is_finite()) {
            return Err(DistError::InvalidParameter);
        }
        let inv_sigma = if sigma > 0.0 { 1.0 / sigma } else { f64::INFINITY };
        let norm = if sigma > 0.0 { num::INV_SQRT_2PI * inv_sigma } else { f64::INFINITY };
        Ok(Self {
            mu,
            sigma,
            inv_sigma,
            norm,
        })
    }
    #[inline]
    pub fn mean_param(&self) -> f64 {
        self.mu
    }
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Distribution for Normal {
    type Value = f64;
    fn cdf(&self, x: f64) -> f64 {
        if self.sigma == 0.0 {
            return if x < self.mu { 0.0 } else { 1.0 };
        }
        let z = (x - self.mu) * self.inv_sigma;
        num::standard_normal_cdf(z)
    }
    fn in_support(&self, x: f64) -> bool {
        x.is_finite() && (self.sigma > 0.0 || x == self.mu)
    }
    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.sigma == 0.0 {
            return self.mu;
        }
        // Box-Muller polar (Marsaglia) without external dependencies.
        loop {
            let u1 = 2.0 * rng.next_f64() - 1.0; // (-1,1)
            let u2 = 2.0 * rng.next_f64() - 1.0;
            let s = u1 * u1 + u2 * u2;
            if s >= 1.0 || s == 0.0 {
                continue;
            }
            let factor = (-2.0 * s.ln() / s).sqrt();
            return self.mu + self.sigma * u1 * factor;
        }
    }
}

impl Continuous for Normal {
    fn pdf(&self, x: f64) -> f64 {
        if self.sigma == 0.0 {
            return if x == self.mu { f64::INFINITY } else { 0.0 };
        }
        if !self.in_support(x) {
            return 0.0;
        }
        let z = (x - self.mu) * self.inv_sigma;
        self.norm * (-0.5 * z * z).exp()
    }
    fn inv_cdf(&self, p: f64) -> f64 {
        if self.sigma == 0.0 {
            return self.mu;
        }
        self.mu + self.sigma * num::standard_normal_inv_cdf(p)
    }
}

impl Moments for Normal {
    fn mean(&self) -> f64 {
        self.mu
    }
    fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }
    fn skewness(&self) -> f64 {
        0.0
    }
    fn kurtosis(&self) -> f64 {
        0.0
    }
    fn entropy(&self) -> f64 {
        if self.sigma == 0.0 {
            return f64::NEG_INFINITY;
        }
        0.5 * (2.0 * std::f64::consts::PI * std::f64::consts::E * self.sigma * self.sigma).ln()
    }
}
