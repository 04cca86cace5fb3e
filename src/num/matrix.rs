//! A small dense row-major matrix type with just enough linear algebra for
//! this crate: transpose, matrix products, a one-sided Jacobi SVD, and a
//! Moore-Penrose pseudo-inverse built on top of it. No `nalgebra`/`ndarray`
//! dependency — this mirrors the teacher's own zero-dependency numerics,
//! scaled up from scalars to the small (d <= a few dozen) matrices that
//! covariance/correlation/design matrices in this crate actually need.

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);
        for r in rows {
            assert_eq!(r.len(), ncols, "ragged matrix rows");
            data.extend_from_slice(r);
        }
        Matrix { rows: nrows, cols: ncols, data }
    }

    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols);
        Matrix { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.cols + j] = v;
    }

    pub fn col(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    pub fn matmul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "matmul dimension mismatch");
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.get(i, k);
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i * out.cols + j] += a_ik * other.get(k, j);
                }
            }
        }
        out
    }

    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.cols, v.len(), "mul_vec dimension mismatch");
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| self.get(i, j) * v[j]).sum())
            .collect()
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Matrix { rows: self.rows, cols: self.cols, data: self.data.iter().map(|x| x * factor).collect() }
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect(),
        }
    }

    pub fn sub(&self, other: &Matrix) -> Matrix {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
        }
    }
}

/// Thin singular value decomposition `A = U * diag(s) * V^T`, `U` is `m x k`,
/// `s` has length `k`, `V` is `n x k`, `k = min(m, n)`. Computed via
/// one-sided Jacobi rotation on the columns of `A` (Hestenes' method): simple
/// to implement without a dependency and numerically robust for the small
/// matrices (covariance/correlation/design matrices) this crate handles.
pub struct Svd {
    pub u: Matrix,
    pub s: Vec<f64>,
    pub v: Matrix,
}

pub fn svd(a: &Matrix) -> Svd {
    if a.rows < a.cols {
        let t = svd(&a.transpose());
        return Svd { u: t.v, s: t.s, v: t.u };
    }
    let m = a.rows;
    let n = a.cols;
    let mut work = a.clone();
    let mut v = Matrix::identity(n);

    if n == 0 {
        return Svd { u: Matrix::zeros(m, 0), s: Vec::new(), v: Matrix::zeros(0, 0) };
    }

    const MAX_SWEEPS: usize = 60;
    for _ in 0..MAX_SWEEPS {
        let mut off_diag = 0.0_f64;
        for p in 0..n {
            for q in (p + 1)..n {
                let mut alpha = 0.0;
                let mut beta = 0.0;
                let mut gamma = 0.0;
                for i in 0..m {
                    let wp = work.get(i, p);
                    let wq = work.get(i, q);
                    alpha += wp * wp;
                    beta += wq * wq;
                    gamma += wp * wq;
                }
                if gamma.abs() < 1e-300 {
                    continue;
                }
                off_diag = off_diag.max(gamma.abs() / (alpha * beta).sqrt().max(1e-300));
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let t = if zeta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                for i in 0..m {
                    let wp = work.get(i, p);
                    let wq = work.get(i, q);
                    work.set(i, p, c * wp - s * wq);
                    work.set(i, q, s * wp + c * wq);
                }
                for i in 0..n {
                    let vp = v.get(i, p);
                    let vq = v.get(i, q);
                    v.set(i, p, c * vp - s * vq);
                    v.set(i, q, s * vp + c * vq);
                }
            }
        }
        if off_diag < 1e-14 {
            break;
        }
    }

    let mut sv: Vec<(f64, usize)> = (0..n)
        .map(|j| {
            let norm = (0..m).map(|i| work.get(i, j).powi(2)).sum::<f64>().sqrt();
            (norm, j)
        })
        .collect();
    sv.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let mut u = Matrix::zeros(m, n);
    let mut v_sorted = Matrix::zeros(n, n);
    let mut s = vec![0.0; n];
    for (new_j, &(norm, old_j)) in sv.iter().enumerate() {
        s[new_j] = norm;
        for i in 0..n {
            v_sorted.set(i, new_j, v.get(i, old_j));
        }
        if norm > 1e-300 {
            for i in 0..m {
                u.set(i, new_j, work.get(i, old_j) / norm);
            }
        }
    }
    Svd { u, s, v: v_sorted }
}

/// Moore-Penrose pseudo-inverse: thin SVD, singular values with `|sigma| <= eps`
/// replaced by zero on inversion.
pub fn pseudo_inverse(a: &Matrix, eps: f64) -> Matrix {
    let Svd { u, s, v } = svd(a);
    let k = s.len();
    let mut s_inv = Matrix::zeros(k, k);
    for i in 0..k {
        if s[i].abs() > eps {
            s_inv.set(i, i, 1.0 / s[i]);
        }
    }
    v.matmul(&s_inv).matmul(&u.transpose())
}

/// Symmetric eigendecomposition via the SVD: for a symmetric PSD matrix the
/// singular values equal the eigenvalues, so this reuses [`svd`] rather than
/// implementing a separate symmetric eigensolver.
pub fn symmetric_eigen(a: &Matrix) -> (Vec<f64>, Matrix) {
    let Svd { u, s, .. } = svd(a);
    (s, u)
}

/// Checks that `m` is square, symmetric within `tol`, and has unit diagonal
/// within `tol` (the shape `correlation` matrices must take).
pub fn is_correlation_matrix(m: &Matrix, tol: f64) -> bool {
    if m.rows != m.cols {
        return false;
    }
    for i in 0..m.rows {
        if (m.get(i, i) - 1.0).abs() > tol {
            return false;
        }
        for j in (i + 1)..m.cols {
            if (m.get(i, j) - m.get(j, i)).abs() > tol {
                return false;
            }
            if m.get(i, j) < -1.0 - tol || m.get(i, j) > 1.0 + tol {
                return false;
            }
        }
    }
    true
}

/// Returns `Ok(())` if `m` (assumed symmetric) is positive semidefinite
/// within `tol`, i.e. all eigenvalues are `>= -tol`.
pub fn check_positive_semidefinite(m: &Matrix, tol: f64) -> Result<(), CoreError> {
    if m.rows != m.cols {
        return Err(CoreError::invalid_argument("matrix must be square"));
    }
    let (eigenvalues, _) = symmetric_eigen(m);
    // svd() always returns non-negative singular values, so instead verify
    // directly against the Rayleigh quotient sign using the diagonal trick:
    // reconstruct via eigen basis isn't meaningful for indefinite matrices,
    // so fall back to checking x^T M x >= -tol for the computed eigenvectors.
    let (_, vectors) = symmetric_eigen(m);
    for j in 0..vectors.cols {
        let v: Vec<f64> = (0..vectors.rows).map(|i| vectors.get(i, j)).collect();
        let mv = m.mul_vec(&v);
        let quad: f64 = v.iter().zip(&mv).map(|(a, b)| a * b).sum();
        if quad < -tol {
            return Err(CoreError::NotPositiveSemidefinite(format!(
                "quadratic form {quad} < -{tol}"
            )));
        }
    }
    let _ = eigenvalues;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_pseudo_inverse_is_identity() {
        let id = Matrix::identity(3);
        let inv = pseudo_inverse(&id, 1e-12);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((inv.get(i, j) - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn pseudo_inverse_of_diagonal() {
        let m = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 4.0]]);
        let inv = pseudo_inverse(&m, 1e-12);
        assert!((inv.get(0, 0) - 0.5).abs() < 1e-10);
        assert!((inv.get(1, 1) - 0.25).abs() < 1e-10);
    }

    #[test]
    fn svd_reconstructs_matrix() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let Svd { u, s, v } = svd(&a);
        let mut s_mat = Matrix::zeros(s.len(), s.len());
        for (i, &sv) in s.iter().enumerate() {
            s_mat.set(i, i, sv);
        }
        let recon = u.matmul(&s_mat).matmul(&v.transpose());
        for i in 0..a.rows {
            for j in 0..a.cols {
                assert!((recon.get(i, j) - a.get(i, j)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn singular_matrix_has_zero_singular_value() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        let Svd { s, .. } = svd(&m);
        assert!(s[1].abs() < 1e-9);
    }

    #[test]
    fn positive_semidefinite_check_accepts_correlation_matrix() {
        let rho = Matrix::from_rows(&[
            vec![1.0, 0.1, -0.2],
            vec![0.1, 1.0, -0.04],
            vec![-0.2, -0.04, 1.0],
        ]);
        assert!(check_positive_semidefinite(&rho, 1e-8).is_ok());
    }
}
