use crate::dist::{clamp_probability, Continuous, Distribution};
use crate::rng::RngCore;

/// A continuous distribution restricted to `(lo, hi]` and renormalized,
/// i.e. the law of `X | lo < X <= hi` for an underlying continuous `base`.
/// Used to draw conditional paths (e.g. a migration model conditioned on a
/// bucket of a clustering result).
#[derive(Debug, Clone)]
pub struct DistributionConditional<D: Continuous> {
    base: D,
    lo: f64,
    hi: f64,
    cdf_lo: f64,
    cdf_hi: f64,
}

impl<D: Continuous> DistributionConditional<D> {
    pub fn new(base: D, lo: f64, hi: f64) -> Self {
        debug_assert!(lo < hi);
        let cdf_lo = base.cdf(lo);
        let cdf_hi = base.cdf(hi);
        Self {
            base,
            lo,
            hi,
            cdf_lo,
            cdf_hi,
        }
    }

    fn mass(&self) -> f64 {
        (self.cdf_hi - self.cdf_lo).max(1e-300)
    }
}

impl<D: Continuous> Distribution for DistributionConditional<D> {
    type Value = f64;

    fn cdf(&self, x: f64) -> f64 {
        if x <= self.lo {
            return 0.0;
        }
        if x >= self.hi {
            return 1.0;
        }
        (self.base.cdf(x) - self.cdf_lo) / self.mass()
    }

    fn in_support(&self, x: f64) -> bool {
        x > self.lo && x <= self.hi
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inv_cdf(rng.next_f64())
    }

    fn infimum(&self) -> f64 {
        self.lo
    }

    fn supremum(&self) -> f64 {
        self.hi
    }
}

impl<D: Continuous> Continuous for DistributionConditional<D> {
    fn pdf(&self, x: f64) -> f64 {
        if !self.in_support(x) {
            return 0.0;
        }
        self.base.pdf(x) / self.mass()
    }

    /// Inverts the conditional CDF by mapping `p` back into the base
    /// distribution's probability scale. `p` is clamped to `[0, 1]`
    /// defensively (the resolved open question: a caller-supplied `p` that
    /// drifts a few ULPs outside `[0, 1]` from upstream floating-point error
    /// should not propagate into the base `inv_cdf`, which may assert).
    fn inv_cdf(&self, p: f64) -> f64 {
        let p = clamp_probability(p);
        let target = self.cdf_lo + p * self.mass();
        self.base.inv_cdf(clamp_probability(target))
    }
}
