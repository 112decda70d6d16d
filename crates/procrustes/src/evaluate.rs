use faer::{Mat, MatRef};
use procrustes_linalg::ops;

use crate::ProcrustesError;

/// One-sided objective `|A T - B|_F^2`.
pub fn one_sided_error(a: MatRef<'_, f64>, b: MatRef<'_, f64>, t: MatRef<'_, f64>) -> f64 {
    let at = ops::matmul(a, t);
    ops::squared_frobenius_distance(at.as_ref(), b)
}

/// Two-sided objective `|L^T A R - B|_F^2`.
pub fn two_sided_error(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    left: MatRef<'_, f64>,
    right: MatRef<'_, f64>,
) -> f64 {
    let la = ops::matmul(left.transpose(), a);
    let lar = ops::matmul(la.as_ref(), right);
    ops::squared_frobenius_distance(lar.as_ref(), b)
}

/// Check that `t^T t` is the identity within `eps` in Frobenius norm.
pub fn check_orthogonal(t: MatRef<'_, f64>, eps: f64) -> Result<(), ProcrustesError> {
    let family = "orthogonal";
    check_square(family, t)?;
    check_finite(family, t)?;

    let n = t.ncols();
    let tt = ops::matmul(t.transpose(), t);
    let identity = Mat::<f64>::identity(n, n);
    let deviation = ops::squared_frobenius_distance(tt.as_ref(), identity.as_ref()).sqrt();
    if deviation >= eps {
        return Err(ProcrustesError::InvariantViolation {
            family,
            detail: format!("|T^T T - I| = {deviation:e} exceeds {eps:e}"),
        });
    }
    Ok(())
}

/// Check that `t` is a proper rotation: orthogonal with determinant `+1`.
pub fn check_rotation(t: MatRef<'_, f64>, eps: f64) -> Result<(), ProcrustesError> {
    check_orthogonal(t, eps).map_err(|e| match e {
        ProcrustesError::InvariantViolation { detail, .. } => ProcrustesError::InvariantViolation {
            family: "rotational",
            detail,
        },
        other => other,
    })?;

    let det = t.determinant();
    if (det - 1.0).abs() >= eps.max(1e-6) {
        return Err(ProcrustesError::InvariantViolation {
            family: "rotational",
            detail: format!("det(T) = {det} is not +1"),
        });
    }
    Ok(())
}

/// Check that `t` is an exact 0/1 permutation matrix.
///
/// No tolerance is applied: permutation matrices are built from assignment
/// vectors and must hold exact zeros and ones.
pub fn check_permutation(t: MatRef<'_, f64>) -> Result<(), ProcrustesError> {
    let family = "permutation";
    check_square(family, t)?;
    if ops::permutation_to_assignment(t).is_none() {
        return Err(ProcrustesError::InvariantViolation {
            family,
            detail: "matrix is not an exact 0/1 matrix with unit row and column sums".to_string(),
        });
    }
    Ok(())
}

/// Check that every entry of `t` is finite.
pub fn check_finite(family: &'static str, t: MatRef<'_, f64>) -> Result<(), ProcrustesError> {
    if let Some((i, j)) = ops::find_non_finite(t) {
        return Err(ProcrustesError::InvariantViolation {
            family,
            detail: format!("non-finite entry at ({i}, {j})"),
        });
    }
    Ok(())
}

/// Check that an input of a single-transformation two-sided problem is symmetric.
///
/// The tolerance is relative to the Frobenius norm of `m`.
pub fn check_symmetric(name: &'static str, m: MatRef<'_, f64>) -> Result<(), ProcrustesError> {
    let tol = 1e-10 * ops::frobenius_norm(m).max(1.0);
    if !ops::is_symmetric(m, tol) {
        return Err(ProcrustesError::NotSymmetric(name));
    }
    Ok(())
}

fn check_square(family: &'static str, t: MatRef<'_, f64>) -> Result<(), ProcrustesError> {
    if t.nrows() != t.ncols() {
        return Err(ProcrustesError::InvariantViolation {
            family,
            detail: format!("matrix is {}x{}, expected square", t.nrows(), t.ncols()),
        });
    }
    Ok(())
}
