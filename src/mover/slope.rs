use crate::error::CoreError;

/// Given a destination distribution `distr` over categories and the origin
/// category `from_idx`, finds coefficients `a[i]`, `b[i]` such that
///
/// `distr[i] = int_0^1 (a[i] + b[i] * u) du`
///
/// with `b[i] < 0` for `i < from_idx`, `b[i] > 0` for `i > from_idx` and
/// `b[i] == 0` for `i == from_idx`. Read with `i` as a destination category
/// and `u` as an individual's percentile rank within the origin category,
/// `a[i] + b[i] * u` is the density (in `u`) of ending up in category `i`:
/// individuals near the top of the origin category are more likely to move
/// up, individuals near the bottom more likely to move down or stay.
pub struct PopulationMoverSlopeCalculator {
    tolerance: f64,
}

impl PopulationMoverSlopeCalculator {
    pub fn new(tolerance: f64) -> Result<Self, CoreError> {
        if !(tolerance > 0.0) {
            return Err(CoreError::invalid_argument("PopulationMoverSlopeCalculator: tolerance must be positive"));
        }
        Ok(Self { tolerance })
    }

    /// Returns `(a, b)`, both of length `distr.len()`.
    pub fn calculate(&self, distr: &[f64], from_idx: usize) -> Result<(Vec<f64>, Vec<f64>), CoreError> {
        let n = distr.len();
        if from_idx >= n {
            return Err(CoreError::invalid_argument("PopulationMoverSlopeCalculator::calculate: from_idx out of range"));
        }
        if n == 0 {
            return Err(CoreError::invalid_argument("PopulationMoverSlopeCalculator::calculate: distr must not be empty"));
        }

        let (lb, ub) = Self::bounds(distr, from_idx);
        let mut a: Vec<f64> = lb.iter().zip(&ub).map(|(&l, &u)| l + 0.5 * (u - l)).collect();

        // Maximize sum 0.5*(a_i - p_i)^2 over the box [lb, ub] subject to
        // sum(a) == 1, by projected gradient ascent: the unconstrained
        // gradient is (a_i - p_i), and each step re-projects onto the box
        // intersected with the equality plane.
        let step = 0.5;
        let max_iter = 500;
        let mut prev_obj = f64::NEG_INFINITY;
        for _ in 0..max_iter {
            let obj: f64 = a.iter().zip(distr).map(|(&ai, &pi)| 0.5 * (ai - pi) * (ai - pi)).sum();
            if (obj - prev_obj).abs() < self.tolerance * obj.abs().max(1.0) {
                break;
            }
            prev_obj = obj;
            let mut next: Vec<f64> = a
                .iter()
                .zip(distr)
                .map(|(&ai, &pi)| ai + step * (ai - pi))
                .collect();
            project_box_equality(&mut next, &lb, &ub, 1.0);
            a = next;
        }

        let b: Vec<f64> = distr.iter().zip(&a).map(|(&p, &ai)| 2.0 * (p - ai)).collect();
        Ok((a, b))
    }

    fn bounds(distr: &[f64], from_idx: usize) -> (Vec<f64>, Vec<f64>) {
        let n = distr.len();
        let mut lb = vec![0.0; n];
        let mut ub = vec![0.0; n];
        for i in 0..n {
            if i == from_idx {
                lb[i] = distr[i];
                ub[i] = distr[i];
                continue;
            }
            let p = distr[i];
            let mut l = (2.0 * p - 1.0).max(0.0);
            let mut u = (2.0 * p).min(1.0);
            if i < from_idx {
                // probability of jumping down in rank should decrease with
                // distance from from_idx, so b < 0 and a >= p.
                l = l.max(p);
            } else {
                // probability of jumping up in rank should increase with
                // distance from from_idx, so b > 0 and a <= p.
                u = u.min(p);
            }
            if l > u {
                l = p;
                u = p;
            }
            lb[i] = l;
            ub[i] = u;
        }
        (lb, ub)
    }
}

/// Projects `v` onto `{x : lower[i] <= x[i] <= upper[i], sum(x) == target_sum}`
/// by bisecting on the Lagrange multiplier `lambda` of the equality
/// constraint: `x_i(lambda) = clamp(v_i - lambda, lower_i, upper_i)` is
/// non-increasing in `lambda`, so `sum(x(lambda))` is too, and a single
/// bisection finds the root.
fn project_box_equality(v: &mut [f64], lower: &[f64], upper: &[f64], target_sum: f64) {
    let eval = |lambda: f64| -> f64 {
        v.iter().zip(lower).zip(upper).map(|((&vi, &l), &u)| (vi - lambda).clamp(l, u)).sum()
    };

    let mut span: f64 = 1.0;
    for (&vi, (&l, &u)) in v.iter().zip(lower.iter().zip(upper)) {
        span = span.max((vi - l).abs()).max((vi - u).abs());
    }
    let mut lo = -2.0 * span - 1.0;
    let mut hi = 2.0 * span + 1.0;

    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        let sum_mid = eval(mid);
        // eval is non-increasing in lambda.
        if sum_mid > target_sum {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let lambda = 0.5 * (lo + hi);
    for ((vi, &l), &u) in v.iter_mut().zip(lower).zip(upper) {
        *vi = (*vi - lambda).clamp(l, u);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_trivial_bounds_at_the_origin_category() {
        let calc = PopulationMoverSlopeCalculator::new(1e-10).unwrap();
        let distr = vec![0.2, 0.5, 0.3];
        let (a, b) = calc.calculate(&distr, 1).unwrap();
        assert!((a[1] - distr[1]).abs() < 1e-8);
        assert!(b[1].abs() < 1e-6);
    }

    #[test]
    fn slopes_have_the_required_sign_pattern() {
        let calc = PopulationMoverSlopeCalculator::new(1e-10).unwrap();
        let distr = vec![0.1, 0.2, 0.3, 0.25, 0.15];
        let (_, b) = calc.calculate(&distr, 2).unwrap();
        assert!(b[0] <= 1e-9);
        assert!(b[1] <= 1e-9);
        assert!(b[2].abs() < 1e-6);
        assert!(b[3] >= -1e-9);
        assert!(b[4] >= -1e-9);
    }

    #[test]
    fn coefficients_reproduce_the_distribution_mass() {
        let calc = PopulationMoverSlopeCalculator::new(1e-10).unwrap();
        let distr = vec![0.3, 0.4, 0.3];
        let (a, b) = calc.calculate(&distr, 0).unwrap();
        for i in 0..3 {
            let mass = a[i] + 0.5 * b[i];
            assert!((mass - distr[i]).abs() < 1e-6, "category {i}: {mass} vs {}", distr[i]);
        }
    }

    #[test]
    fn rejects_out_of_range_from_idx() {
        let calc = PopulationMoverSlopeCalculator::new(1e-10).unwrap();
        assert!(calc.calculate(&[0.5, 0.5], 2).is_err());
    }

    #[test]
    fn project_box_equality_respects_bounds_and_sum() {
        let mut v = vec![0.9, 0.9, 0.9];
        let lower = vec![0.0, 0.0, 0.0];
        let upper = vec![0.5, 0.6, 0.7];
        project_box_equality(&mut v, &lower, &upper, 1.0);
        let sum: f64 = v.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for (&vi, (&l, &u)) in v.iter().zip(lower.iter().zip(&upper)) {
            assert!(vi >= l - 1e-9 && vi <= u + 1e-9);
        }
    }
}
