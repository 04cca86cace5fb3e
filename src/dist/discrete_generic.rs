use crate::dist::{DistError, Discrete, Distribution, Moments};
use crate::rng::RngCore;

/// A discrete distribution over an arbitrary, explicitly enumerated set of
/// values with associated probabilities (rather than over a fixed integer
/// range). Values are kept sorted so `cdf`/`inv_cdf` can binary-search.
#[derive(Debug, Clone)]
pub struct DiscreteGeneric {
    values: Vec<f64>,
    cum: Vec<f64>,
}

impl DiscreteGeneric {
    pub fn new(mut pairs: Vec<(f64, f64)>) -> Result<Self, DistError> {
        if pairs.is_empty() {
            return Err(DistError::InvalidParameter);
        }
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let total: f64 = pairs.iter().map(|&(_, p)| p).sum();
        if !(0.99999..=1.00001).contains(&total) || pairs.iter().any(|&(_, p)| p < 0.0) {
            return Err(DistError::InvalidParameter);
        }
        let mut cum = Vec::with_capacity(pairs.len());
        let mut acc = 0.0;
        for &(_, p) in &pairs {
            acc += p / total;
            cum.push(acc);
        }
        *cum.last_mut().unwrap() = 1.0;
        Ok(Self {
            values: pairs.into_iter().map(|(v, _)| v).collect(),
            cum,
        })
    }

    fn index_of(&self, x: f64) -> Option<usize> {
        self.values
            .binary_search_by(|v| v.partial_cmp(&x).unwrap())
            .ok()
    }
}

impl Distribution for DiscreteGeneric {
    type Value = f64;

    fn cdf(&self, x: f64) -> f64 {
        match self.values.binary_search_by(|v| v.partial_cmp(&x).unwrap()) {
            Ok(i) => self.cum[i],
            Err(i) => {
                if i == 0 {
                    0.0
                } else {
                    self.cum[i - 1]
                }
            }
        }
    }

    fn in_support(&self, x: f64) -> bool {
        self.index_of(x).is_some()
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        let u = rng.next_f64();
        let i = self.cum.partition_point(|&c| c < u);
        self.values[i.min(self.values.len() - 1)]
    }

    fn infimum(&self) -> f64 {
        self.values[0]
    }

    fn supremum(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

impl Discrete for DiscreteGeneric {
    fn pmf(&self, x: f64) -> f64 {
        match self.index_of(x) {
            Some(0) => self.cum[0],
            Some(i) => self.cum[i] - self.cum[i - 1],
            None => 0.0,
        }
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        let p = crate::dist::clamp_probability(p);
        let i = self.cum.partition_point(|&c| c < p);
        self.values[i.min(self.values.len() - 1)]
    }
}

impl Moments for DiscreteGeneric {
    fn mean(&self) -> f64 {
        self.values
            .iter()
            .zip(self.pmfs())
            .map(|(&v, p)| v * p)
            .sum()
    }

    fn variance(&self) -> f64 {
        let m = self.mean();
        self.values
            .iter()
            .zip(self.pmfs())
            .map(|(&v, p)| (v - m).powi(2) * p)
            .sum()
    }

    fn skewness(&self) -> f64 {
        let m = self.mean();
        let sd = self.std_dev();
        if sd == 0.0 {
            return 0.0;
        }
        self.values
            .iter()
            .zip(self.pmfs())
            .map(|(&v, p)| ((v - m) / sd).powi(3) * p)
            .sum()
    }

    fn kurtosis(&self) -> f64 {
        let m = self.mean();
        let sd = self.std_dev();
        if sd == 0.0 {
            return 0.0;
        }
        self.values
            .iter()
            .zip(self.pmfs())
            .map(|(&v, p)| ((v - m) / sd).powi(4) * p)
            .sum::<f64>()
            - 3.0
    }

    fn entropy(&self) -> f64 {
        self.pmfs().filter(|&p| p > 0.0).map(|p| -p * p.ln()).sum()
    }
}

impl DiscreteGeneric {
    fn pmfs(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.cum.len()).map(move |i| if i == 0 { self.cum[0] } else { self.cum[i] - self.cum[i - 1] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_probabilities_not_summing_to_one() {
        assert!(DiscreteGeneric::new(vec![(1.0, 0.5), (2.0, 0.6)]).is_err());
    }

    #[test]
    fn pmf_and_cdf_consistent() {
        let d = DiscreteGeneric::new(vec![(1.0, 0.2), (2.0, 0.3), (3.0, 0.5)]).unwrap();
        assert!((d.pmf(2.0) - 0.3).abs() < 1e-12);
        assert!((d.cdf(2.0) - 0.5).abs() < 1e-12);
        assert!((d.cdf(0.0) - 0.0).abs() < 1e-12);
        assert_eq!(d.cdf(3.0), 1.0);
    }

    #[test]
    fn mean_matches_weighted_sum() {
        let d = DiscreteGeneric::new(vec![(0.0, 0.5), (10.0, 0.5)]).unwrap();
        assert!((d.mean() - 5.0).abs() < 1e-12);
    }
}
