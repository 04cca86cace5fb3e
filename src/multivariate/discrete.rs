use crate::dist::{Discrete, DiscreteGeneric, Distribution};
use crate::error::CoreError;
use crate::misc::FlatIndex;
use crate::multivariate::MultivariateDistribution;
use crate::num::matrix::Matrix;
use crate::rng::RngCore;

/// Multivariate discrete distribution over a d-dimensional box of integers,
/// given as a row-major flat probability tensor. Internally keeps the flat
/// tensor as a 1-D [`DiscreteGeneric`] over the linearized index (so sampling
/// is a single draw plus a [`FlatIndex::decompose`]), alongside the
/// per-dimension marginal distributions obtained by summing the tensor over
/// every other axis.
pub struct MultivariateDistributionDiscrete {
    lower: Vec<i64>,
    index: FlatIndex,
    joint: DiscreteGeneric,
    marginals: Vec<DiscreteGeneric>,
}

impl MultivariateDistributionDiscrete {
    /// `lower[k]` is the smallest integer in dimension `k`'s support;
    /// `sizes[k]` is the number of integers in that dimension's support.
    /// `probabilities` is the row-major flattened tensor, dimension 0
    /// varying fastest, summing to 1.
    pub fn new(lower: Vec<i64>, sizes: Vec<usize>, probabilities: Vec<f64>) -> Result<Self, CoreError> {
        let index = FlatIndex::new(sizes.clone())?;
        if probabilities.len() != index.flat_size() {
            return Err(CoreError::invalid_argument(
                "MultivariateDistributionDiscrete: probability tensor size mismatch",
            ));
        }
        if lower.len() != sizes.len() {
            return Err(CoreError::invalid_argument(
                "MultivariateDistributionDiscrete: lower bound count must match dimension count",
            ));
        }

        let joint_pairs: Vec<(f64, f64)> = probabilities
            .iter()
            .enumerate()
            .map(|(flat, &p)| (flat as f64, p))
            .collect();
        let joint = DiscreteGeneric::new(joint_pairs)?;

        let dim = sizes.len();
        let mut marginals = Vec::with_capacity(dim);
        for k in 0..dim {
            let mut mass = vec![0.0; sizes[k]];
            for flat in 0..index.flat_size() {
                let multi = index.decompose(flat);
                mass[multi[k]] += probabilities[flat];
            }
            let pairs: Vec<(f64, f64)> = mass
                .into_iter()
                .enumerate()
                .map(|(i, p)| ((lower[k] + i as i64) as f64, p))
                .collect();
            marginals.push(DiscreteGeneric::new(pairs)?);
        }

        Ok(Self { lower, index, joint, marginals })
    }
}

impl MultivariateDistribution for MultivariateDistributionDiscrete {
    fn dim(&self) -> usize {
        self.index.dim()
    }

    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim() {
            return Err(CoreError::invalid_argument("draw: output size mismatch"));
        }
        let flat = self.joint.sample(rng) as usize;
        let multi = self.index.decompose(flat);
        for k in 0..self.dim() {
            out[k] = (self.lower[k] + multi[k] as i64) as f64;
        }
        Ok(())
    }

    fn marginal_cdf(&self, i: usize, x: f64) -> f64 {
        self.marginals[i].cdf(x)
    }

    fn marginal_icdf(&self, i: usize, p: f64) -> f64 {
        self.marginals[i].inv_cdf(p)
    }

    /// No-op: the joint tensor already fixes the dependence structure
    /// exactly, so there is no rank correlation left to enforce.
    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        if sample.cols != self.dim() {
            return Err(CoreError::invalid_argument(
                "adjust_distribution: column count must equal dimension",
            ));
        }
        Ok(())
    }
}
