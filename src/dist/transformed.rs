use crate::dist::{Continuous, Distribution};
use crate::rng::RngCore;

/// A continuous distribution composed with a strictly monotonic,
/// differentiable transform `y = g(x)`. Increasing transforms preserve the
/// probability ordering; decreasing transforms flip it. Used to express
/// e.g. `ShiftedLognormal` as `Normal` transformed by `x -> shift + exp(x)`,
/// or a copula's marginal substitution.
#[derive(Clone)]
pub struct DistributionTransformed<D: Continuous, G, GInv, GPrime> {
    base: D,
    g: G,
    g_inv: GInv,
    g_prime: GPrime,
    increasing: bool,
}

impl<D, G, GInv, GPrime> DistributionTransformed<D, G, GInv, GPrime>
where
    D: Continuous,
    G: Fn(f64) -> f64,
    GInv: Fn(f64) -> f64,
    GPrime: Fn(f64) -> f64,
{
    pub fn new(base: D, g: G, g_inv: GInv, g_prime: GPrime, increasing: bool) -> Self {
        Self {
            base,
            g,
            g_inv,
            g_prime,
            increasing,
        }
    }
}

impl<D, G, GInv, GPrime> Distribution for DistributionTransformed<D, G, GInv, GPrime>
where
    D: Continuous,
    G: Fn(f64) -> f64,
    GInv: Fn(f64) -> f64,
    GPrime: Fn(f64) -> f64,
{
    type Value = f64;

    fn cdf(&self, y: f64) -> f64 {
        let x = (self.g_inv)(y);
        if self.increasing {
            self.base.cdf(x)
        } else {
            1.0 - self.base.cdf(x)
        }
    }

    fn in_support(&self, y: f64) -> bool {
        y.is_finite()
    }

    fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        (self.g)(self.base.sample(rng))
    }

    fn infimum(&self) -> f64 {
        if self.increasing {
            (self.g)(self.base.infimum())
        } else {
            (self.g)(self.base.supremum())
        }
    }

    fn supremum(&self) -> f64 {
        if self.increasing {
            (self.g)(self.base.supremum())
        } else {
            (self.g)(self.base.infimum())
        }
    }
}

impl<D, G, GInv, GPrime> Continuous for DistributionTransformed<D, G, GInv, GPrime>
where
    D: Continuous,
    G: Fn(f64) -> f64,
    GInv: Fn(f64) -> f64,
    GPrime: Fn(f64) -> f64,
{
    fn pdf(&self, y: f64) -> f64 {
        let x = (self.g_inv)(y);
        let dgdx = (self.g_prime)(x);
        if dgdx == 0.0 {
            return 0.0;
        }
        self.base.pdf(x) / dgdx.abs()
    }

    fn inv_cdf(&self, p: f64) -> f64 {
        if self.increasing {
            (self.g)(self.base.inv_cdf(p))
        } else {
            (self.g)(self.base.inv_cdf(1.0 - p))
        }
    }
}
