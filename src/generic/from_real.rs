use crate::dist::{clamp_probability, Continuous, DistributionConditional};
use crate::error::CoreError;
use crate::generic::GenericDistribution;
use crate::rng::RngCore;

/// A [`GenericDistribution<T>`] built from a real-valued [`Continuous`]
/// distribution plus a pair of conversions `T -> f64 -> T`, so ordinal
/// types (dates stored as day counts, integer categories) reuse the real
/// distribution machinery instead of re-deriving cdf/icdf/sampling per type.
#[derive(Clone)]
pub struct GenericDistributionFromReal<D, ToF, FromF> {
    real: D,
    to_double: ToF,
    from_double: FromF,
}

impl<D, ToF, FromF, T> GenericDistributionFromReal<D, ToF, FromF>
where
    D: Continuous,
    ToF: Fn(T) -> f64,
    FromF: Fn(f64) -> T,
    T: Copy + PartialOrd,
{
    pub fn new(real: D, to_double: ToF, from_double: FromF) -> Self {
        Self {
            real,
            to_double,
            from_double,
        }
    }

    /// Restricts to `[left, right)`, returning the real-valued conditional
    /// wrapped back into a `GenericDistributionFromReal` over the same `T`.
    pub fn conditional(
        &self,
        left: T,
        right: T,
    ) -> Result<GenericDistributionFromReal<DistributionConditional<D>, &ToF, &FromF>, CoreError>
    where
        D: Clone,
    {
        let a = (self.to_double)(left);
        let b = (self.to_double)(right);
        if !(a < b) {
            return Err(CoreError::ImpossibleCondition(
                "conditioning on an empty or zero-probability range".into(),
            ));
        }
        let cond = DistributionConditional::new(self.real.clone(), a, b);
        Ok(GenericDistributionFromReal::new(
            cond,
            &self.to_double,
            &self.from_double,
        ))
    }
}

impl<D, ToF, FromF, T> GenericDistribution<T> for GenericDistributionFromReal<D, ToF, FromF>
where
    D: Continuous,
    ToF: Fn(T) -> f64,
    FromF: Fn(f64) -> T,
    T: Copy + PartialOrd,
{
    fn random<R: RngCore>(&self, rng: &mut R) -> T {
        (self.from_double)(self.real.sample(rng))
    }

    fn range_prob2(&self, x1: T, x2: T) -> f64 {
        if x2 < x1 {
            return 0.0;
        }
        self.real.range_prob((self.to_double)(x1), (self.to_double)(x2))
    }

    fn icdf_generic(&self, p: f64) -> T {
        (self.from_double)(self.real.inv_cdf(clamp_probability(p)))
    }

    fn lower_bound(&self) -> T {
        (self.from_double)(self.real.inv_cdf(0.0))
    }

    fn upper_bound(&self) -> T {
        (self.from_double)(self.real.inv_cdf(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::Normal;

    fn round_to_int(x: f64) -> i64 {
        x.round() as i64
    }

    #[test]
    fn bridges_integer_category_through_normal() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let g = GenericDistributionFromReal::new(normal, |i: i64| i as f64, round_to_int);
        assert_eq!(g.icdf_generic(0.5), 0);
        assert!(g.range_prob2(-1, 1) > 0.0);
        assert_eq!(g.range_prob2(1, -1), 0.0);
    }

    #[test]
    fn conditional_restricts_support() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let g = GenericDistributionFromReal::new(normal, |i: i64| i as f64, round_to_int);
        let c = g.conditional(0, 10).unwrap();
        assert!(c.lower_bound() >= 0);
    }
}
