//! Statistical copulas: joint dependence structures over uniform marginals,
//! used to correlate sampled variables independently of their individual
//! distributions.

pub mod alphastable;
pub mod gaussian;
pub mod independent;

pub use alphastable::AlphaStableMultifactor;
pub use gaussian::GaussianCopula;
pub use independent::IndependentCopula;

use crate::error::CoreError;
use crate::num::matrix::Matrix;
use crate::rng::RngCore;

pub trait Copula {
    fn dim(&self) -> usize;

    /// Draws one vector of correlated CDF values (each in `[0, 1]`) into `out`.
    fn draw_cdfs(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError>;

    /// Adjusts `sample`'s columns (each already a per-variable CDF value) in
    /// place so the joint distribution matches this copula's.
    fn adjust_cdfs(&self, sample: &mut Matrix) -> Result<(), CoreError>;
}
