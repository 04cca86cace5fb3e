use crate::dist::{calculate_cumulative_proba, clamp_probability, Continuous, DistError, Distribution, Moments};
use crate::rng::RngCore;

/// A purely discrete (point-mass) empirical distribution backed by a sorted
/// sample: `cdf` jumps at each sample value, `sample` resamples uniformly
/// with replacement (the bootstrap distribution of the data).
#[derive(Debug, Clone)]
pub struct Empirical {
    sorted: Vec<f64>,
}

impl Empirical {
    pub fn new(mut values: Vec<f64>) -> Result<Self, DistError> {
        if values.is_empty() || values.iter().any(|x| !x.is_finite()) {
            return Err(DistError::InvalidParameter);
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Ok(Self { sorted: values })
    }

    pub fn sample_values(&self) -> &[f64] {
        &self.sorted
    }

    pub fn size(&self) -> usize {
        self.sorted.len()
    }
}

impl Distribution for Empirical {
    type Value = f64;

    fn cdf(&self, x: f64) -> f64 {
        calculate_cumulative_proba(&self.sorted, x)
    }

    fn in_support(&self, x: f64) -> bool {
        self.sorted.binary_search_by(|v| v.partial_cmp(&x).unwrap()).is_ok()
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        let idx = (rng.next_f64() * self.sorted.len() as f64) as usize;
        self.sorted[idx.min(self.sorted.len() - 1)]
    }

    fn infimum(&self) -> f64 {
        self.sorted[0]
    }

    fn supremum(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }
}

impl Continuous for Empirical {
    /// Treated as a smoothed density via a linear interpolation of the
    /// empirical CDF, matching the "continuous relaxation" the simulator
    /// applies when an empirical distribution must be used as a smooth
    /// `Continuous` (e.g. to feed a copula transform).
    fn pdf(&self, x: f64) -> f64 {
        let n = self.sorted.len();
        if n < 2 {
            return 0.0;
        }
        let lo = self.sorted[0];
        let hi = self.sorted[n - 1];
        if x < lo || x > hi || hi == lo {
            return 0.0;
        }
        let h = (hi - lo) / (n as f64 - 1.0);
        1.0 / (n as f64 * h.max(1e-12))
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        let p = clamp_probability(p);
        let n = self.sorted.len();
        if p <= 0.0 {
            return self.sorted[0];
        }
        if p >= 1.0 {
            return self.sorted[n - 1];
        }
        let rank = p * n as f64;
        let idx = (rank.ceil() as usize).saturating_sub(1).min(n - 1);
        self.sorted[idx]
    }
}

impl Moments for Empirical {
    fn mean(&self) -> f64 {
        self.sorted.iter().sum::<f64>() / self.sorted.len() as f64
    }

    fn variance(&self) -> f64 {
        let m = self.mean();
        let n = self.sorted.len() as f64;
        if n < 2.0 {
            return 0.0;
        }
        self.sorted.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0)
    }

    fn skewness(&self) -> f64 {
        let m = self.mean();
        let sd = self.std_dev();
        if sd == 0.0 {
            return 0.0;
        }
        let n = self.sorted.len() as f64;
        self.sorted.iter().map(|x| ((x - m) / sd).powi(3)).sum::<f64>() / n
    }

    fn kurtosis(&self) -> f64 {
        let m = self.mean();
        let sd = self.std_dev();
        if sd == 0.0 {
            return 0.0;
        }
        let n = self.sorted.len() as f64;
        self.sorted.iter().map(|x| ((x - m) / sd).powi(4)).sum::<f64>() / n - 3.0
    }

    fn entropy(&self) -> f64 {
        let n = self.sorted.len() as f64;
        n.ln()
    }
}
