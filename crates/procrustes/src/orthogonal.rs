//! Orthogonal and rotational Procrustes.
//!
//! For `A` and `B` of shape `m x n`, find the `n x n` matrix `T` minimizing
//! `|A T - B|_F` subject to `T^T T = I` (and `det(T) = +1` for rotations).
//!
//! With the cross-covariance `C = A^T B = U S V^T`, the optimum is `T = U V^T`.
//! A proper rotation is obtained by flipping the column of `U` paired with the
//! smallest singular value whenever `det(U V^T) < 0`, as in the Kabsch/Umeyama
//! algorithm. When the smallest singular value is repeated the flipped column
//! is not unique: the returned rotation is one of several optimal solutions.

use faer::{Mat, MatRef};
use procrustes_linalg::ops;

use crate::{evaluate, ProcrustesError};

/// Solve the orthogonal (or, with `proper`, rotational) Procrustes problem.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed, shape `m x n`.
/// * `b` - The reference matrix, shape `m x n`.
/// * `proper` - Restrict the solution to rotations (`det(T) = +1`).
///
/// # Returns
///
/// The `n x n` transformation and the error `|A T - B|_F^2`.
pub fn solve_orthogonal(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    proper: bool,
) -> Result<(Mat<f64>, f64), ProcrustesError> {
    if (a.nrows(), a.ncols()) != (b.nrows(), b.ncols()) {
        return Err(ProcrustesError::shape(
            "orthogonal Procrustes requires matrices of the same shape",
            a,
            b,
        ));
    }

    // cross-covariance C = A^T B, n x n
    let c = ops::matmul(a.transpose(), b);
    let svd = c.svd();
    let u = svd.u();
    let v = svd.v();

    let mut t = ops::matmul(u, v.transpose());

    if proper && t.determinant() < 0.0 {
        let s = svd.s_diagonal();
        let k = (0..s.nrows())
            .min_by(|&i, &j| s.read(i).total_cmp(&s.read(j)))
            .unwrap_or(0);
        log::debug!(
            "reflection found, flipping singular vector {} (sigma = {})",
            k,
            s.read(k)
        );

        let mut u_corrected = u.to_owned();
        for i in 0..u_corrected.nrows() {
            u_corrected.write(i, k, -u_corrected.read(i, k));
        }
        t = ops::matmul(u_corrected.as_ref(), v.transpose());
    }

    let error = evaluate::one_sided_error(a, b, t.as_ref());
    Ok((t, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Mat<f64> {
        Mat::from_fn(rows, cols, |_, _| rng.random_range(-10.0..10.0))
    }

    // Gram-Schmidt on a random square matrix
    fn random_orthogonal(rng: &mut StdRng, n: usize) -> Mat<f64> {
        let mut q = random_matrix(rng, n, n);
        for j in 0..n {
            for k in 0..j {
                let dot = (0..n).map(|i| q.read(i, j) * q.read(i, k)).sum::<f64>();
                for i in 0..n {
                    q.write(i, j, q.read(i, j) - dot * q.read(i, k));
                }
            }
            let norm = (0..n).map(|i| q.read(i, j).powi(2)).sum::<f64>().sqrt();
            for i in 0..n {
                q.write(i, j, q.read(i, j) / norm);
            }
        }
        q
    }

    fn assert_mat_eq(a: MatRef<'_, f64>, b: MatRef<'_, f64>, eps: f64) {
        assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert_relative_eq!(a.read(i, j), b.read(i, j), epsilon = eps);
            }
        }
    }

    #[test]
    fn test_orthogonal_identical() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(0);
        let a = random_matrix(&mut rng, 8, 5);
        let (t, error) = solve_orthogonal(a.as_ref(), a.as_ref(), false)?;
        assert_mat_eq(t.as_ref(), Mat::<f64>::identity(5, 5).as_ref(), 1e-8);
        assert_relative_eq!(error, 0.0, epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn test_orthogonal_recovers_transform() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(1);
        for n in [2, 3, 6] {
            let a = random_matrix(&mut rng, n + 4, n);
            let q = random_orthogonal(&mut rng, n);
            let b = ops::matmul(a.as_ref(), q.as_ref());

            let (t, error) = solve_orthogonal(a.as_ref(), b.as_ref(), false)?;
            assert_mat_eq(t.as_ref(), q.as_ref(), 1e-8);
            assert_relative_eq!(error, 0.0, epsilon = 1e-8);
            assert!(evaluate::check_orthogonal(t.as_ref(), 1e-8).is_ok());
        }
        Ok(())
    }

    #[test]
    fn test_orthogonal_reflection() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(2);
        let a = random_matrix(&mut rng, 6, 4);
        let b = Mat::from_fn(6, 4, |i, j| -a.read(i, j));
        let (t, error) = solve_orthogonal(a.as_ref(), b.as_ref(), false)?;
        let minus_identity = Mat::from_fn(4, 4, |i, j| if i == j { -1.0 } else { 0.0 });
        assert_mat_eq(t.as_ref(), minus_identity.as_ref(), 1e-8);
        assert_relative_eq!(error, 0.0, epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn test_rotational_is_proper() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            let a = random_matrix(&mut rng, 10, 3);
            let b = random_matrix(&mut rng, 10, 3);
            let (t, rot_error) = solve_orthogonal(a.as_ref(), b.as_ref(), true)?;
            assert!(evaluate::check_rotation(t.as_ref(), 1e-8).is_ok());

            // the rotational optimum can never beat the orthogonal one
            let (_, ortho_error) = solve_orthogonal(a.as_ref(), b.as_ref(), false)?;
            assert!(rot_error >= ortho_error - 1e-8);
        }
        Ok(())
    }

    #[test]
    fn test_rotational_mirror_image() -> Result<(), ProcrustesError> {
        // a point set and its mirror image are not related by a rotation
        let a = faer::mat![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 3.0]
        ];
        let mirrored = Mat::from_fn(4, 3, |i, j| if j == 0 { -a.read(i, j) } else { a.read(i, j) });

        let (t, error) = solve_orthogonal(a.as_ref(), mirrored.as_ref(), false)?;
        assert_relative_eq!(error, 0.0, epsilon = 1e-8);
        assert_relative_eq!(t.determinant(), -1.0, epsilon = 1e-8);

        let (t, error) = solve_orthogonal(a.as_ref(), mirrored.as_ref(), true)?;
        assert_relative_eq!(t.determinant(), 1.0, epsilon = 1e-8);
        assert!(error > 1.0);
        Ok(())
    }

    #[test]
    fn test_orthogonal_one_by_one() -> Result<(), ProcrustesError> {
        let a = faer::mat![[2.0]];
        let b = faer::mat![[-3.0]];
        let (t, error) = solve_orthogonal(a.as_ref(), b.as_ref(), false)?;
        assert_relative_eq!(t.read(0, 0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(error, 1.0, epsilon = 1e-12);

        let (t, error) = solve_orthogonal(a.as_ref(), b.as_ref(), true)?;
        assert_relative_eq!(t.read(0, 0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(error, 25.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_orthogonal_shape_mismatch() {
        let a = Mat::<f64>::zeros(3, 2);
        let b = Mat::<f64>::zeros(2, 3);
        assert!(matches!(
            solve_orthogonal(a.as_ref(), b.as_ref(), false),
            Err(ProcrustesError::Shape { .. })
        ));
    }
}
