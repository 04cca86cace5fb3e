use crate::error::CoreError;
use crate::multivariate::MultivariateDistribution;
use crate::num::matrix::Matrix;
use crate::rng::RngCore;

/// Concatenation of `k` independent multivariate distributions into one of
/// dimension `sum(member.dim())`; sampling, marginals, and adjustment
/// dispatch to the member owning the contiguous index range `i` falls in.
pub struct Independent {
    members: Vec<Box<dyn MultivariateDistribution>>,
    offsets: Vec<usize>,
}

impl Independent {
    pub fn new(members: Vec<Box<dyn MultivariateDistribution>>) -> Result<Self, CoreError> {
        if members.is_empty() {
            return Err(CoreError::invalid_argument("independent: no members"));
        }
        let mut offsets = Vec::with_capacity(members.len() + 1);
        let mut acc = 0;
        offsets.push(0);
        for m in &members {
            acc += m.dim();
            offsets.push(acc);
        }
        Ok(Self { members, offsets })
    }

    fn locate(&self, i: usize) -> (usize, usize) {
        let k = self
            .offsets
            .partition_point(|&off| off <= i)
            .saturating_sub(1);
        (k, i - self.offsets[k])
    }
}

impl MultivariateDistribution for Independent {
    fn dim(&self) -> usize {
        *self.offsets.last().unwrap()
    }

    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim() {
            return Err(CoreError::invalid_argument("draw: output size mismatch"));
        }
        for (k, m) in self.members.iter().enumerate() {
            let lo = self.offsets[k];
            let hi = self.offsets[k + 1];
            m.draw(rng, &mut out[lo..hi])?;
        }
        Ok(())
    }

    fn marginal_cdf(&self, i: usize, x: f64) -> f64 {
        let (k, local) = self.locate(i);
        self.members[k].marginal_cdf(local, x)
    }

    fn marginal_icdf(&self, i: usize, p: f64) -> f64 {
        let (k, local) = self.locate(i);
        self.members[k].marginal_icdf(local, p)
    }

    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        if sample.cols != self.dim() {
            return Err(CoreError::invalid_argument(
                "adjust_distribution: column count must equal dimension",
            ));
        }
        for (k, m) in self.members.iter().enumerate() {
            let lo = self.offsets[k];
            let hi = self.offsets[k + 1];
            let mut block = Matrix::zeros(sample.rows, hi - lo);
            for r in 0..sample.rows {
                for (c, j) in (lo..hi).enumerate() {
                    block.set(r, c, sample.get(r, j));
                }
            }
            m.adjust_distribution(&mut block)?;
            for r in 0..sample.rows {
                for (c, j) in (lo..hi).enumerate() {
                    sample.set(r, j, block.get(r, c));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multivariate::gaussian_simple::MultivariateDistributionGaussianSimple;
    use crate::rng::SplitMix64;

    fn gaussian1d(mean: f64) -> Box<dyn MultivariateDistribution> {
        Box::new(
            MultivariateDistributionGaussianSimple::new(vec![mean], &Matrix::identity(1), 1e-10)
                .unwrap(),
        )
    }

    #[test]
    fn dim_is_sum_of_members() {
        let ind = Independent::new(vec![gaussian1d(0.0), gaussian1d(1.0)]).unwrap();
        assert_eq!(ind.dim(), 2);
    }

    #[test]
    fn draw_fills_each_members_slice() {
        let ind = Independent::new(vec![gaussian1d(0.0), gaussian1d(100.0)]).unwrap();
        let mut rng = SplitMix64::seed_from_u64(5);
        let mut out = [0.0; 2];
        ind.draw(&mut rng, &mut out).unwrap();
        assert!(out[0].abs() < 20.0);
        assert!((out[1] - 100.0).abs() < 20.0);
    }

    #[test]
    fn marginal_dispatches_to_owning_member() {
        let ind = Independent::new(vec![gaussian1d(0.0), gaussian1d(5.0)]).unwrap();
        assert!((ind.marginal_cdf(0, 0.0) - 0.5).abs() < 1e-9);
        assert!((ind.marginal_cdf(1, 5.0) - 0.5).abs() < 1e-9);
    }
}
