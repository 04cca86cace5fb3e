use super::{RunningCovariance, RunningStatistics};

/// Running mean, variance, and pairwise covariances of a multivariate
/// stream. Stores one [`RunningStatistics`] per dimension and one
/// [`RunningCovariance`] per unordered pair, flattened into a triangular
/// array indexed by `(i, j)` with `i > j`.
#[derive(Debug, Clone)]
pub struct RunningStatisticsMulti {
    dim: usize,
    marginals: Vec<RunningStatistics>,
    covariances: Vec<RunningCovariance>,
}

impl RunningStatisticsMulti {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            marginals: vec![RunningStatistics::new(); dim],
            covariances: vec![RunningCovariance::new(); Self::flat_dim(dim)],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn marginal(&self, i: usize) -> &RunningStatistics {
        &self.marginals[i]
    }

    /// Covariance accumulator for the pair `(i, j)`; order doesn't matter.
    pub fn covariance(&self, i: usize, j: usize) -> &RunningCovariance {
        let (i, j) = if i < j { (j, i) } else { (i, j) };
        &self.covariances[Self::flat_idx(i, j)]
    }

    pub fn add(&mut self, vec: &[f64]) {
        assert_eq!(vec.len(), self.dim);
        for i in 0..self.dim {
            self.marginals[i].add(vec[i]);
            for j in 0..i {
                let k = Self::flat_idx(i, j);
                self.covariances[k].add(vec[i], vec[j]);
            }
        }
    }

    /// Adds `vec` only if none of its components is `NaN`; accumulators for
    /// other dimensions are left untouched if this one is skipped.
    pub fn add_if_all_not_nan(&mut self, vec: &[f64]) {
        if vec.iter().any(|x| x.is_nan()) {
            return;
        }
        self.add(vec);
    }

    /// Adds `vec` only if every component is finite (no `NaN`/`+-inf`).
    pub fn add_if_all_finite(&mut self, vec: &[f64]) {
        if vec.iter().any(|x| !x.is_finite()) {
            return;
        }
        self.add(vec);
    }

    fn flat_idx(i: usize, j: usize) -> usize {
        debug_assert!(i > j);
        (i * (i - 1)) / 2 + j
    }

    fn flat_dim(dim: usize) -> usize {
        if dim > 1 {
            Self::flat_idx(dim - 1, dim - 2) + 1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_marginals_and_covariance() {
        let mut s = RunningStatisticsMulti::new(2);
        s.add(&[1.0, 2.0]);
        s.add(&[2.0, 4.0]);
        s.add(&[3.0, 5.0]);
        assert!((s.marginal(0).mean() - 2.0).abs() < 1e-12);
        assert!((s.marginal(1).mean() - 11.0 / 3.0).abs() < 1e-12);
        assert!(s.covariance(1, 0).covariance() > 0.0);
        assert_eq!(
            s.covariance(0, 1).covariance(),
            s.covariance(1, 0).covariance()
        );
    }

    #[test]
    fn skips_rows_with_nan_or_non_finite() {
        let mut s = RunningStatisticsMulti::new(2);
        s.add_if_all_not_nan(&[1.0, f64::NAN]);
        s.add_if_all_finite(&[1.0, f64::INFINITY]);
        assert_eq!(s.marginal(0).count(), 0);
        s.add_if_all_finite(&[1.0, 2.0]);
        assert_eq!(s.marginal(0).count(), 1);
    }

    #[test]
    fn dim_zero_and_one_have_no_covariance_slots() {
        let s0 = RunningStatisticsMulti::new(0);
        assert_eq!(s0.covariances.len(), 0);
        let s1 = RunningStatisticsMulti::new(1);
        assert_eq!(s1.covariances.len(), 0);
    }
}
