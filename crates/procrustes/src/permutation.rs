//! One-sided permutation Procrustes.
//!
//! Since `|A P|_F = |A|_F` for any permutation `P`, minimizing `|A P - B|_F`
//! is the same as maximizing `tr(P^T A^T B)`: a linear assignment problem on
//! the profit matrix `A^T B`, solved exactly once.

use faer::{Mat, MatRef};
use procrustes_linalg::{assignment, ops};

use crate::{evaluate, ProcrustesError};

/// Solve the one-sided permutation Procrustes problem.
///
/// Ties between equally good permutations are resolved by the assignment
/// solver's rule (lowest column index first), so identical inputs always
/// produce the same permutation.
///
/// # Arguments
///
/// * `a` - The matrix whose columns are permuted, shape `m x n`.
/// * `b` - The reference matrix, shape `m x n`.
///
/// # Returns
///
/// The `n x n` permutation matrix and the error `|A P - B|_F^2`.
pub fn solve_permutation(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
) -> Result<(Mat<f64>, f64), ProcrustesError> {
    if (a.nrows(), a.ncols()) != (b.nrows(), b.ncols()) {
        return Err(ProcrustesError::shape(
            "permutation Procrustes requires matrices of the same shape",
            a,
            b,
        ));
    }

    let profit = ops::matmul(a.transpose(), b);
    let perm = assignment::linear_sum_assignment_max(profit.as_ref())?;
    let p = ops::permutation_matrix(&perm)?;
    let error = evaluate::one_sided_error(a, b, p.as_ref());

    Ok((p, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    #[test]
    fn test_permutation_identical() -> Result<(), ProcrustesError> {
        let a = faer::mat![[6.0, 3.0], [3.0, 6.0]];
        let (p, error) = solve_permutation(a.as_ref(), a.as_ref())?;
        assert_eq!(p, Mat::<f64>::identity(2, 2));
        assert_eq!(error, 0.0);
        Ok(())
    }

    #[test]
    fn test_permutation_columns() -> Result<(), ProcrustesError> {
        let a = faer::mat![
            [1.0, 5.0, 8.0, 4.0],
            [1.0, 5.0, 7.0, 2.0],
            [1.0, 6.0, 9.0, 3.0],
            [2.0, 7.0, 9.0, 4.0]
        ];
        let b = faer::mat![
            [8.0, 4.0, 5.0, 1.0],
            [7.0, 2.0, 5.0, 1.0],
            [9.0, 3.0, 6.0, 1.0],
            [9.0, 4.0, 7.0, 2.0]
        ];
        let expected = faer::mat![
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0]
        ];
        let (p, error) = solve_permutation(a.as_ref(), b.as_ref())?;
        assert_eq!(p, expected);
        assert_relative_eq!(error, 0.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_permutation_random_roundtrip() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [3, 5, 8] {
            let a = Mat::<f64>::from_fn(n + 2, n, |_, _| rng.random_range(-10.0..10.0));
            let mut perm = (0..n).collect::<Vec<_>>();
            perm.shuffle(&mut rng);
            let expected = ops::permutation_matrix(&perm)?;
            let b = ops::matmul(a.as_ref(), expected.as_ref());

            let (p, error) = solve_permutation(a.as_ref(), b.as_ref())?;
            assert_eq!(p, expected);
            assert_relative_eq!(error, 0.0, epsilon = 1e-8);
        }
        Ok(())
    }

    #[test]
    fn test_permutation_always_exact() -> Result<(), ProcrustesError> {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let a = Mat::<f64>::from_fn(4, 5, |_, _| rng.random_range(-1.0..1.0));
            let b = Mat::<f64>::from_fn(4, 5, |_, _| rng.random_range(-1.0..1.0));
            let (p, _) = solve_permutation(a.as_ref(), b.as_ref())?;
            assert!(evaluate::check_permutation(p.as_ref()).is_ok());
        }
        Ok(())
    }
}
