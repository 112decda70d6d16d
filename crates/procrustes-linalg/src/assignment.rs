use faer::{Mat, MatRef};

use crate::LinalgError;

/// Solve the linear assignment problem minimizing the total cost.
///
/// Implements the shortest augmenting path variant of the Hungarian algorithm
/// with row and column potentials, `O(n^3)` for an `n x n` cost matrix.
///
/// Ties are broken deterministically: rows are inserted in increasing order
/// and, among columns with equal reduced cost, the lowest column index wins.
///
/// # Arguments
///
/// * `cost` - The square cost matrix, `cost[(i, j)]` is the cost of assigning row `i` to column `j`.
///
/// # Returns
///
/// The assignment vector where `assignment[i]` is the column assigned to row `i`.
///
/// Example:
///
/// ```
/// use procrustes_linalg::assignment::linear_sum_assignment;
///
/// let cost = faer::mat![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
/// let assignment = linear_sum_assignment(cost.as_ref()).unwrap();
/// assert_eq!(assignment, vec![1, 0, 2]);
/// ```
pub fn linear_sum_assignment(cost: MatRef<'_, f64>) -> Result<Vec<usize>, LinalgError> {
    let n = cost.nrows();
    if n != cost.ncols() {
        return Err(LinalgError::NonSquareCost {
            rows: n,
            cols: cost.ncols(),
        });
    }

    for j in 0..n {
        for i in 0..n {
            if !cost.read(i, j).is_finite() {
                return Err(LinalgError::NonFiniteCost { row: i, col: j });
            }
        }
    }

    if n == 0 {
        return Ok(Vec::new());
    }

    // potentials and matching use 1-based indices; index 0 is the virtual column
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut row_of_col = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        row_of_col[0] = i;
        let mut j0 = 0;
        let mut min_v = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = row_of_col[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost.read(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }

            // all costs are finite, so some free column is always reachable
            debug_assert!(j1 != 0);

            for j in 0..=n {
                if used[j] {
                    u[row_of_col[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }

            j0 = j1;
            if row_of_col[j0] == 0 {
                break;
            }
        }

        // augment along the alternating path
        loop {
            let j1 = way[j0];
            row_of_col[j0] = row_of_col[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        assignment[row_of_col[j] - 1] = j - 1;
    }

    Ok(assignment)
}

/// Solve the linear assignment problem maximizing the total profit.
///
/// Equivalent to [`linear_sum_assignment`] on the negated matrix.
pub fn linear_sum_assignment_max(profit: MatRef<'_, f64>) -> Result<Vec<usize>, LinalgError> {
    let cost = Mat::<f64>::from_fn(profit.nrows(), profit.ncols(), |i, j| -profit.read(i, j));
    linear_sum_assignment(cost.as_ref())
}

/// Total cost of an assignment.
pub fn assignment_cost(cost: MatRef<'_, f64>, assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .map(|(i, &j)| cost.read(i, j))
        .sum()
}
