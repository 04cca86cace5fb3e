use crate::dist::{calculate_cumulative_proba, clamp_probability, Continuous, DistError, Distribution, Moments};
use crate::rng::RngCore;

/// A continuous distribution whose CDF is linear between a fixed set of
/// knots `(x_i, p_i)`, `p_0 = 0`, `p_n = 1`, strictly increasing in both
/// coordinates. The density is therefore piecewise-constant. Used when a
/// distribution is specified by a small table rather than a closed form
/// (e.g. a fitted histogram).
#[derive(Debug, Clone)]
pub struct LinearInterpolated {
    xs: Vec<f64>,
    cdfs: Vec<f64>,
}

impl LinearInterpolated {
    pub fn new(xs: Vec<f64>, cdfs: Vec<f64>) -> Result<Self, DistError> {
        if xs.len() != cdfs.len() || xs.len() < 2 {
            return Err(DistError::InvalidParameter);
        }
        if cdfs[0] != 0.0 || (cdfs[cdfs.len() - 1] - 1.0).abs() > 1e-12 {
            return Err(DistError::InvalidParameter);
        }
        if !xs.windows(2).all(|w| w[0] < w[1]) || !cdfs.windows(2).all(|w| w[0] < w[1]) {
            return Err(DistError::InvalidParameter);
        }
        Ok(Self { xs, cdfs })
    }

    /// Build from a sorted empirical sample using the empirical CDF at each
    /// distinct value as a knot, with an extra knot just below the minimum
    /// so the first knot's CDF is exactly zero.
    pub fn from_sorted_sample(sorted: &[f64]) -> Result<Self, DistError> {
        if sorted.len() < 2 {
            return Err(DistError::InvalidParameter);
        }
        let span = (sorted[sorted.len() - 1] - sorted[0]).max(1.0);
        let mut xs = vec![sorted[0] - 1e-9 * span];
        let mut cdfs = vec![0.0];
        for &x in sorted {
            let p = calculate_cumulative_proba(sorted, x);
            if *xs.last().unwrap() == x {
                *cdfs.last_mut().unwrap() = p;
            } else {
                xs.push(x);
                cdfs.push(p);
            }
        }
        Self::new(xs, cdfs)
    }
}

impl Distribution for LinearInterpolated {
    type Value = f64;
    fn cdf(&self, x: f64) -> f64 {
        crate::dist::interpolate_continuous_cdf(&self.xs, &self.cdfs, x)
    }
    fn in_support(&self, x: f64) -> bool {
        x >= self.xs[0] && x <= self.xs[self.xs.len() - 1]
    }
    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inv_cdf(rng.next_f64())
    }
    fn infimum(&self) -> f64 {
        self.xs[0]
    }
    fn supremum(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

impl Continuous for LinearInterpolated {
    fn pdf(&self, x: f64) -> f64 {
        if !self.in_support(x) {
            return 0.0;
        }
        let i = match self.xs.binary_search_by(|v| v.partial_cmp(&x).unwrap()) {
            Ok(i) => i.min(self.xs.len() - 2),
            Err(i) => (i.max(1)) - 1,
        };
        (self.cdfs[i + 1] - self.cdfs[i]) / (self.xs[i + 1] - self.xs[i])
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        let p = clamp_probability(p);
        if p <= 0.0 {
            return self.xs[0];
        }
        if p >= 1.0 {
            return self.xs[self.xs.len() - 1];
        }
        let i = match self.cdfs.binary_search_by(|v| v.partial_cmp(&p).unwrap()) {
            Ok(i) => return self.xs[i],
            Err(i) => i,
        };
        let (p0, p1) = (self.cdfs[i - 1], self.cdfs[i]);
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let t = (p - p0) / (p1 - p0);
        x0 + t * (x1 - x0)
    }
}

impl Moments for LinearInterpolated {
    fn mean(&self) -> f64 {
        let mut acc = 0.0;
        for w in self.xs.windows(2) {
            let i = self.xs.iter().position(|&v| v == w[0]).unwrap();
            let mid = 0.5 * (w[0] + w[1]);
            acc += mid * (self.cdfs[i + 1] - self.cdfs[i]);
        }
        acc
    }
    fn variance(&self) -> f64 {
        let m = self.mean();
        let mut acc = 0.0;
        for w in self.xs.windows(2) {
            let i = self.xs.iter().position(|&v| v == w[0]).unwrap();
            let mid = 0.5 * (w[0] + w[1]);
            acc += (mid - m).powi(2) * (self.cdfs[i + 1] - self.cdfs[i]);
        }
        acc
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_normalized_cdf() {
        assert!(LinearInterpolated::new(vec![0.0, 1.0], vec![0.1, 1.0]).is_err());
    }

    #[test]
    fn interpolates_between_knots() {
        let d = LinearInterpolated::new(vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 1.0]).unwrap();
        assert!((d.cdf(0.5) - 0.25).abs() < 1e-12);
        assert!((d.inv_cdf(0.25) - 0.5).abs() < 1e-9);
        assert!((d.pdf(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn built_from_sample_covers_its_range() {
        let sample = [1.0, 2.0, 2.0, 3.0, 5.0];
        let d = LinearInterpolated::from_sorted_sample(&sample).unwrap();
        assert!((d.infimum() - 1.0).abs() < 1e-6);
        assert_eq!(d.supremum(), 5.0);
    }
}
