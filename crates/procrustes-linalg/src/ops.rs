use faer::{Mat, MatRef};

use crate::LinalgError;

/// Magnitude below which an entry is treated as zero when trimming rows and columns.
pub const ZERO_TOLERANCE: f64 = 1e-8;

/// Matrix product `a * b`.
pub fn matmul(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> Mat<f64> {
    a * b
}

/// Frobenius inner product `sum_ij a_ij * b_ij`.
///
/// PRECONDITION: `a` and `b` have the same shape.
pub fn inner_product(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    let mut acc = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            acc += a.read(i, j) * b.read(i, j);
        }
    }
    acc
}

/// Frobenius norm of a matrix.
pub fn frobenius_norm(m: MatRef<'_, f64>) -> f64 {
    m.norm_l2()
}

/// Squared Frobenius norm of `a - b`.
///
/// PRECONDITION: `a` and `b` have the same shape.
pub fn squared_frobenius_distance(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    let mut acc = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            let d = a.read(i, j) - b.read(i, j);
            acc += d * d;
        }
    }
    acc
}

/// Mean over the rows of a matrix, i.e. the centroid of the row vectors.
pub fn column_means(m: MatRef<'_, f64>) -> Vec<f64> {
    let n = m.nrows();
    (0..m.ncols())
        .map(|j| {
            if n == 0 {
                return 0.0;
            }
            (0..n).map(|i| m.read(i, j)).sum::<f64>() / n as f64
        })
        .collect()
}

/// Position of the first NaN or infinite entry, scanning column by column.
pub fn find_non_finite(m: MatRef<'_, f64>) -> Option<(usize, usize)> {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            if !m.read(i, j).is_finite() {
                return Some((i, j));
            }
        }
    }
    None
}

/// Indices of the rows with at least one entry of magnitude `>= tol`.
pub fn nonzero_rows(m: MatRef<'_, f64>, tol: f64) -> Vec<usize> {
    (0..m.nrows())
        .filter(|&i| (0..m.ncols()).any(|j| m.read(i, j).abs() >= tol))
        .collect()
}

/// Indices of the columns with at least one entry of magnitude `>= tol`.
pub fn nonzero_cols(m: MatRef<'_, f64>, tol: f64) -> Vec<usize> {
    (0..m.ncols())
        .filter(|&j| (0..m.nrows()).any(|i| m.read(i, j).abs() >= tol))
        .collect()
}

/// Copy the given rows, in the given order, into a new matrix.
pub fn select_rows(m: MatRef<'_, f64>, rows: &[usize]) -> Mat<f64> {
    Mat::from_fn(rows.len(), m.ncols(), |i, j| m.read(rows[i], j))
}

/// Copy the given columns, in the given order, into a new matrix.
pub fn select_cols(m: MatRef<'_, f64>, cols: &[usize]) -> Mat<f64> {
    Mat::from_fn(m.nrows(), cols.len(), |i, j| m.read(i, cols[j]))
}

/// Append zero rows at the bottom and zero columns on the right.
///
/// PRECONDITION: `rows >= m.nrows()` and `cols >= m.ncols()`.
pub fn pad_zeros(m: MatRef<'_, f64>, rows: usize, cols: usize) -> Mat<f64> {
    assert!(rows >= m.nrows() && cols >= m.ncols());
    Mat::from_fn(rows, cols, |i, j| {
        if i < m.nrows() && j < m.ncols() {
            m.read(i, j)
        } else {
            0.0
        }
    })
}

/// Check whether a square matrix equals its transpose within `tol`.
pub fn is_symmetric(m: MatRef<'_, f64>, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    for j in 0..m.ncols() {
        for i in (j + 1)..m.nrows() {
            if (m.read(i, j) - m.read(j, i)).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// Eigendecomposition of a symmetric matrix, eigenvalues in non-increasing order.
///
/// Only the lower triangle of `m` is read. Column `k` of the returned matrix is
/// the unit eigenvector of the `k`-th eigenvalue.
pub fn symmetric_eigen(m: MatRef<'_, f64>) -> (Vec<f64>, Mat<f64>) {
    let evd = m.selfadjoint_eigendecomposition(faer::Side::Lower);
    let values = evd.s().column_vector();
    let vectors = evd.u();

    let mut order = (0..values.nrows()).collect::<Vec<_>>();
    order.sort_by(|&i, &j| values.read(j).total_cmp(&values.read(i)));

    let sorted_values = order.iter().map(|&k| values.read(k)).collect();
    let sorted_vectors = select_cols(vectors, &order);
    (sorted_values, sorted_vectors)
}

/// Build the permutation matrix `P` with `P[(i, assignment[i])] = 1`.
///
/// With this convention `A * P` moves column `i` of `A` to column `assignment[i]`.
pub fn permutation_matrix(assignment: &[usize]) -> Result<Mat<f64>, LinalgError> {
    let n = assignment.len();
    let mut seen = vec![false; n];
    for &j in assignment {
        if j >= n {
            return Err(LinalgError::InvalidPermutation(format!(
                "index {j} out of range for size {n}"
            )));
        }
        if seen[j] {
            return Err(LinalgError::InvalidPermutation(format!(
                "index {j} appears more than once"
            )));
        }
        seen[j] = true;
    }

    let mut p = Mat::<f64>::zeros(n, n);
    for (i, &j) in assignment.iter().enumerate() {
        p.write(i, j, 1.0);
    }
    Ok(p)
}

/// Recover the assignment vector from an exact permutation matrix.
///
/// Returns `None` if `p` is not square or not an exact 0/1 permutation matrix.
pub fn permutation_to_assignment(p: MatRef<'_, f64>) -> Option<Vec<usize>> {
    let n = p.nrows();
    if n != p.ncols() {
        return None;
    }

    let mut assignment = Vec::with_capacity(n);
    let mut col_taken = vec![false; n];
    for i in 0..n {
        let mut found = None;
        for j in 0..n {
            let x = p.read(i, j);
            if x == 1.0 {
                if found.is_some() {
                    return None;
                }
                found = Some(j);
            } else if x != 0.0 {
                return None;
            }
        }
        let j = found?;
        if col_taken[j] {
            return None;
        }
        col_taken[j] = true;
        assignment.push(j);
    }
    Some(assignment)
}
