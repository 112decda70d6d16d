//! Generic (unconstrained) Procrustes.
//!
//! The least-squares solution of `A T = B` through the normal equations,
//! `T = (A^T A)^+ A^T B`.

use faer::{Mat, MatRef};
use procrustes_linalg::ops;

use crate::{evaluate, ProcrustesError};

/// Solve the generic Procrustes problem.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed, shape `m x n`.
/// * `b` - The reference matrix, shape `m x n`.
///
/// # Returns
///
/// The `n x n` least-squares transformation and the error `|A T - B|_F^2`.
pub fn solve_generic(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
) -> Result<(Mat<f64>, f64), ProcrustesError> {
    if (a.nrows(), a.ncols()) != (b.nrows(), b.ncols()) {
        return Err(ProcrustesError::shape(
            "generic Procrustes requires matrices of the same shape",
            a,
            b,
        ));
    }

    let ata = ops::matmul(a.transpose(), a);
    let atb = ops::matmul(a.transpose(), b);
    let t = ops::matmul(pseudo_inverse(ata.as_ref()).as_ref(), atb.as_ref());

    let error = evaluate::one_sided_error(a, b, t.as_ref());
    Ok((t, error))
}

/// Moore-Penrose pseudo-inverse of a square matrix from its SVD.
fn pseudo_inverse(m: MatRef<'_, f64>) -> Mat<f64> {
    let n = m.nrows();
    let svd = m.svd();
    let s = svd.s_diagonal();
    let u = svd.u();
    let v = svd.v();

    let sigma_max = (0..s.nrows()).map(|i| s.read(i)).fold(0.0, f64::max);
    let cutoff = sigma_max * n as f64 * f64::EPSILON;

    // V S^+ (dropping singular values at or below the cutoff)
    let v_scaled = Mat::<f64>::from_fn(n, n, |i, k| {
        let sigma = s.read(k);
        if sigma > cutoff {
            v.read(i, k) / sigma
        } else {
            0.0
        }
    });
    ops::matmul(v_scaled.as_ref(), u.transpose())
}
