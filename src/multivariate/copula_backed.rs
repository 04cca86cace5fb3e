use crate::copula::Copula;
use crate::dist::Continuous;
use crate::error::CoreError;
use crate::multivariate::MultivariateDistribution;
use crate::num::matrix::Matrix;
use crate::rng::RngCore;

/// A multivariate distribution built by joining `d` marginal distributions
/// through a [`Copula`]: draws a vector of uniforms from the copula and
/// maps each coordinate through its own marginal's inverse CDF;
/// `adjust_distribution` goes the other way (cdf, adjust, icdf). Marginals
/// are stored as boxed cdf/icdf closures rather than trait objects so the
/// `d` marginals may be of different concrete distribution types.
pub struct CopulaBacked {
    copula: Box<dyn Copula>,
    cdf: Vec<Box<dyn Fn(f64) -> f64>>,
    icdf: Vec<Box<dyn Fn(f64) -> f64>>,
}

impl CopulaBacked {
    /// Builds from per-dimension cdf/icdf closure pairs, one per copula
    /// dimension, for heterogeneous marginals.
    pub fn from_boxed(
        copula: Box<dyn Copula>,
        cdf: Vec<Box<dyn Fn(f64) -> f64>>,
        icdf: Vec<Box<dyn Fn(f64) -> f64>>,
    ) -> Result<Self, CoreError> {
        let d = copula.dim();
        if cdf.len() != d || icdf.len() != d {
            return Err(CoreError::invalid_argument(
                "CopulaBacked: one cdf/icdf pair required per copula dimension",
            ));
        }
        Ok(Self { copula, cdf, icdf })
    }

    /// Builds from a homogeneous slice of marginals sharing one concrete
    /// `Continuous` type.
    pub fn new<D: Continuous + Clone + 'static>(copula: Box<dyn Copula>, marginals: Vec<D>) -> Result<Self, CoreError> {
        let d = copula.dim();
        if marginals.len() != d {
            return Err(CoreError::invalid_argument(
                "CopulaBacked: one marginal required per copula dimension",
            ));
        }
        let mut cdf: Vec<Box<dyn Fn(f64) -> f64>> = Vec::with_capacity(d);
        let mut icdf: Vec<Box<dyn Fn(f64) -> f64>> = Vec::with_capacity(d);
        for m in &marginals {
            let m1 = m.clone();
            cdf.push(Box::new(move |x: f64| m1.cdf(x)));
            let m2 = m.clone();
            icdf.push(Box::new(move |p: f64| m2.inv_cdf(p)));
        }
        Self::from_boxed(copula, cdf, icdf)
    }
}

impl MultivariateDistribution for CopulaBacked {
    fn dim(&self) -> usize {
        self.copula.dim()
    }

    fn draw(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim() {
            return Err(CoreError::invalid_argument("draw: output size mismatch"));
        }
        self.copula.draw_cdfs(rng, out)?;
        for (i, x) in out.iter_mut().enumerate() {
            *x = (self.icdf[i])(*x);
        }
        Ok(())
    }

    fn marginal_cdf(&self, i: usize, x: f64) -> f64 {
        (self.cdf[i])(x)
    }

    fn marginal_icdf(&self, i: usize, p: f64) -> f64 {
        (self.icdf[i])(p)
    }

    fn adjust_distribution(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        let d = self.dim();
        if sample.cols != d {
            return Err(CoreError::invalid_argument("adjust_distribution: column count must equal dimension"));
        }
        for c in 0..d {
            for r in 0..sample.rows {
                let v = sample.get(r, c);
                sample.set(r, c, (self.cdf[c])(v));
            }
        }
        self.copula.adjust_cdfs(sample)?;
        for c in 0..d {
            for r in 0..sample.rows {
                let p = sample.get(r, c);
                sample.set(r, c, (self.icdf[c])(p));
            }
        }
        Ok(())
    }
}
