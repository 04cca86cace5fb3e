//! Contracts for collaborators this crate consumes but does not implement:
//! an adaptive multidimensional integrator and a general nonlinear
//! optimizer. No bundled adapter is shipped (no `nlopt` binding); the
//! handful of places that need a genuine nonlinear solve (the tanh-spline
//! node calibration, the population mover's per-row QP) are instead solved
//! with a small built-in closed-form or iterative method, so these traits
//! exist purely as the extension point a host application would wire an
//! external solver through.

use crate::error::CoreError;

/// Status codes an external nonlinear optimizer may report. Everything
/// except `RoundoffLimited` and the explicit successes is treated by
/// callers as a hard failure; `RoundoffLimited` is a benign warning (the
/// result is usually still usable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerStatus {
    Success,
    StopValReached,
    FToleranceReached,
    XToleranceReached,
    MaxEvalReached,
    MaxTimeReached,
    RoundoffLimited,
    Failure,
    InvalidArgs,
    OutOfMemory,
    ForcedStop,
}

impl OptimizerStatus {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            OptimizerStatus::Success
                | OptimizerStatus::StopValReached
                | OptimizerStatus::FToleranceReached
                | OptimizerStatus::XToleranceReached
                | OptimizerStatus::RoundoffLimited
        )
    }
}

/// Objective/constraint callback: `f(x, grad)`, writing the gradient into
/// `grad` when non-empty (an empty slice means the optimizer didn't ask
/// for one), returning the function value.
pub type ObjectiveFn<'a> = dyn FnMut(&[f64], &mut [f64]) -> f64 + 'a;

/// A general nonlinear optimizer: choose an algorithm, set an objective,
/// add equality/inequality constraints, bound the variables, and run.
pub trait NonlinearOptimizer {
    fn set_objective(&mut self, f: Box<ObjectiveFn<'static>>);
    fn add_equality_constraint(&mut self, f: Box<ObjectiveFn<'static>>, tolerance: f64);
    fn add_inequality_constraint(&mut self, f: Box<ObjectiveFn<'static>>, tolerance: f64);
    fn set_lower_bounds(&mut self, lower: &[f64]);
    fn set_upper_bounds(&mut self, upper: &[f64]);
    fn set_ftol_rel(&mut self, tol: f64);
    fn set_xtol_rel(&mut self, tol: f64);
    fn set_max_evals(&mut self, max_evals: usize);

    /// Runs the optimizer starting from `x` (mutated in place to the best
    /// point found), returning the objective value there and a status code.
    fn optimize(&mut self, x: &mut [f64]) -> Result<(f64, OptimizerStatus), CoreError>;
}

/// An integrand `f(x, params) -> f64` over `params[0..nparams]` auxiliary
/// parameters, evaluated at a point `x` of dimension `dim`.
pub type Integrand<'a> = dyn Fn(usize, &[f64], usize, &[f64]) -> f64 + 'a;

/// An adaptive multidimensional numerical integrator.
pub trait Integrator {
    /// Integrates `integrand` over the box `[lower, upper]`, stopping once
    /// the relative error estimate falls under `eps` or `max_evals`
    /// function evaluations have been spent. Returns `(value, rel_err)`.
    fn integrate(
        &self,
        dim: usize,
        lower: &[f64],
        upper: &[f64],
        integrand: &Integrand,
        params: &[f64],
        eps: f64,
        max_evals: usize,
    ) -> Result<(f64, f64), CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundoff_limited_counts_as_success() {
        assert!(OptimizerStatus::RoundoffLimited.is_success());
        assert!(!OptimizerStatus::Failure.is_success());
    }
}
