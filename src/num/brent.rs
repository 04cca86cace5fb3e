//! Brent's method: combined bisection / secant / inverse-quadratic
//! interpolation over a bracketed sign-changing interval. Used wherever this
//! crate needs a root without a closed-form inverse (e.g. `Gamma::inv_cdf`
//! falls back to safeguarded Newton, but distributions with a cheap `cdf`
//! and no derivative use this instead).

use crate::error::CoreError;

/// Find `x` in `[a, b]` with `f(a)` and `f(b)` of opposite sign such that
/// `f(x) = 0`, terminating when either the bracket width or `|f(x)|` falls
/// below `tol`.
pub fn brent<F: Fn(f64) -> f64>(
    f: F,
    mut a: f64,
    mut b: f64,
    tol: f64,
    max_iter: usize,
) -> Result<f64, CoreError> {
    let mut fa = f(a);
    let mut fb = f(b);
    if fa * fb > 0.0 {
        return Err(CoreError::invalid_argument(
            "brent: function must have opposite signs at the bracket endpoints",
        ));
    }
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut c = a;
    let mut fc = fa;
    let mut mflag = true;
    let mut d = a;

    for _ in 0..max_iter {
        if fb == 0.0 || (b - a).abs() < tol {
            return Ok(b);
        }
        let s = if fa != fc && fb != fc {
            // Inverse quadratic interpolation.
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            // Secant.
            b - fb * (b - a) / (fb - fa)
        };

        let cond1 = !((3.0 * a + b) / 4.0..=b).contains(&s)
            && !((b..=(3.0 * a + b) / 4.0)).contains(&s);
        let within_order = s < a.min(b) || s > a.max(b);
        let cond2 = mflag && (s - b).abs() >= (b - c).abs() / 2.0;
        let cond3 = !mflag && (s - b).abs() >= (c - d).abs() / 2.0;
        let cond4 = mflag && (b - c).abs() < tol;
        let cond5 = !mflag && (c - d).abs() < tol;

        let s = if within_order || cond1 || cond2 || cond3 || cond4 || cond5 {
            mflag = true;
            0.5 * (a + b)
        } else {
            mflag = false;
            s
        };

        let fs = f(s);
        d = c;
        c = b;
        fc = fb;
        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
        if fb.abs() < tol {
            return Ok(b);
        }
    }
    let _ = d;
    Ok(b)
}
