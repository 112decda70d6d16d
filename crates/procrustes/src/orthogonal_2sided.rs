//! Two-sided orthogonal Procrustes.
//!
//! **Single transformation** (`SingleUndirected`, `SingleDirected`): for
//! symmetric `A` and `B` of shape `n x n`, find the orthogonal `U` minimizing
//! `|U^T A U - B|_F`. With the eigendecompositions `A = U_A L_A U_A^T` and
//! `B = U_B L_B U_B^T` (eigenvalues in the same order) the optimum is
//! `U = U_A U_B^T` and the residual is `|L_A - L_B|_F`. The Umeyama guess
//! `|U_A| |U_B|^T` (entrywise absolute values) is rounded to its closest
//! orthogonal matrix and kept instead when its error is strictly lower.
//!
//! **Double transformation**: for `A` and `B` of shape `m x n`, find
//! orthogonal `S` (`m x m`) and `T` (`n x n`) minimizing `|S^T A T - B|_F`.
//! With the SVDs `A = U_A E_A V_A^T` and `B = U_B E_B V_B^T` the optimum is
//! `S = U_A U_B^T`, `T = V_A V_B^T`.

use faer::{Mat, MatRef};
use procrustes_linalg::ops;

use crate::{evaluate, orthogonal, ProcrustesError, TransformMode, Transformation};

/// Solve the two-sided orthogonal Procrustes problem.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed.
/// * `b` - The reference matrix, same shape as `a`.
/// * `mode` - Both single modes need square symmetric inputs; `Double` accepts
///   any shape.
///
/// # Returns
///
/// The transformation(s) and the error `|U^T A U - B|_F^2` or `|S^T A T - B|_F^2`.
pub fn solve_orthogonal_2sided(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    mode: TransformMode,
) -> Result<(Transformation, f64), ProcrustesError> {
    if (a.nrows(), a.ncols()) != (b.nrows(), b.ncols()) {
        return Err(ProcrustesError::shape(
            "two-sided orthogonal Procrustes requires matrices of the same shape",
            a,
            b,
        ));
    }

    match mode {
        TransformMode::SingleUndirected | TransformMode::SingleDirected => {
            if a.nrows() != a.ncols() {
                return Err(ProcrustesError::shape(
                    "single-transformation two-sided Procrustes requires square matrices",
                    a,
                    b,
                ));
            }
            evaluate::check_symmetric("a", a)?;
            evaluate::check_symmetric("b", b)?;
            let (u, error) = solve_single(a, b)?;
            Ok((Transformation::Single(u), error))
        }
        TransformMode::Double => {
            let (left, right, error) = solve_double(a, b);
            Ok((Transformation::Double { left, right }, error))
        }
    }
}

fn solve_single(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
) -> Result<(Mat<f64>, f64), ProcrustesError> {
    let (_, u_a) = ops::symmetric_eigen(a);
    let (_, u_b) = ops::symmetric_eigen(b);

    let exact = ops::matmul(u_a.as_ref(), u_b.transpose());
    let exact_error = evaluate::two_sided_error(a, b, exact.as_ref(), exact.as_ref());

    let approx = umeyama_approx(u_a.as_ref(), u_b.as_ref())?;
    let approx_error = evaluate::two_sided_error(a, b, approx.as_ref(), approx.as_ref());

    log::debug!(
        "two-sided orthogonal: eigenvector error {:.6e}, umeyama error {:.6e}",
        exact_error,
        approx_error
    );

    if approx_error < exact_error {
        Ok((approx, approx_error))
    } else {
        Ok((exact, exact_error))
    }
}

/// Closest orthogonal matrix to the Umeyama guess `|U_A| |U_B|^T`.
fn umeyama_approx(
    u_a: MatRef<'_, f64>,
    u_b: MatRef<'_, f64>,
) -> Result<Mat<f64>, ProcrustesError> {
    let n = u_a.nrows();
    let abs_a = Mat::<f64>::from_fn(n, n, |i, j| u_a.read(i, j).abs());
    let abs_b = Mat::<f64>::from_fn(n, n, |i, j| u_b.read(i, j).abs());
    let guess = ops::matmul(abs_a.as_ref(), abs_b.transpose());

    // min |I W - guess| over orthogonal W
    let identity = Mat::<f64>::identity(n, n);
    let (w, _) = orthogonal::solve_orthogonal(identity.as_ref(), guess.as_ref(), false)?;
    Ok(w)
}

fn solve_double(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> (Mat<f64>, Mat<f64>, f64) {
    let svd_a = a.svd();
    let svd_b = b.svd();

    let left = ops::matmul(svd_a.u(), svd_b.u().transpose());
    let right = ops::matmul(svd_a.v(), svd_b.v().transpose());
    let error = evaluate::two_sided_error(a, b, left.as_ref(), right.as_ref());
    (left, right, error)
}
