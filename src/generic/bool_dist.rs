use crate::error::CoreError;
use crate::generic::GenericDistribution;
use crate::rng::RngCore;

/// The most basic distribution of a boolean random variable, ordered
/// `false < true`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenericDistributionBool {
    /// `P(true)`.
    p: f64,
}

impl GenericDistributionBool {
    pub fn new(p: f64) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CoreError::out_of_range("p must be in [0, 1]"));
        }
        Ok(Self { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Restricts to `[left, right)`; the only nonempty sub-range of `bool`
    /// strictly smaller than the whole support is `[false, true)`, whose
    /// conditional law is the point mass at `false`.
    pub fn conditional(&self, left: bool, right: bool) -> Result<Self, CoreError> {
        if !left && right && self.p < 1.0 {
            Self::new(0.0)
        } else {
            Err(CoreError::ImpossibleCondition(
                "conditioning on zero-probability region".into(),
            ))
        }
    }
}

impl GenericDistribution<bool> for GenericDistributionBool {
    fn random<R: RngCore>(&self, rng: &mut R) -> bool {
        rng.next_f64() > self.p
    }

    fn range_prob2(&self, x1: bool, x2: bool) -> f64 {
        if !x1 && x2 {
            1.0 - self.p
        } else {
            0.0
        }
    }

    fn icdf_generic(&self, p: f64) -> bool {
        p > 1.0 - self.p
    }

    fn lower_bound(&self) -> bool {
        false
    }

    fn upper_bound(&self) -> bool {
        self.p > 0.0
    }
}
