//! Two-sided permutation Procrustes.
//!
//! Finding `P` minimizing `|P^T A P - B|_F` is a quadratic assignment problem
//! and NP-hard, so this module computes a deterministic approximation.
//!
//! **Single transformation** (`SingleDirected`, `SingleUndirected`): for a
//! permutation `P` the error equals `|A|^2 + |B|^2 - 2 <A, P B P^T>`, so we
//! maximize `g(P) = <A, P B P^T>` over the doubly-stochastic matrices (the
//! convex hull of the permutations) with the Frank-Wolfe method:
//!
//! 1. `G = A P B^T + A^T P B` (`2 A P B` for symmetric inputs),
//! 2. `Q` = the permutation maximizing `<G, Q>` (a linear assignment),
//! 3. exact line search of the quadratic `g(P + t (Q - P))` for `t` in `[0, 1]`,
//!
//! until the relative change of `g` drops below the tolerance. The relaxed
//! solution is projected on the closest permutation with a final assignment and
//! the error of that exact permutation is reported.
//!
//! Runs start from a row-profile matching guess and from the barycenter `J/n`;
//! the best projected permutation wins, ties going to the earlier start.
//!
//! **Double transformation**: `|P1^T A P2 - B|_F` is minimized by alternating
//! exact assignments for `P2` (fixed `P1`) and `P1` (fixed `P2`), which never
//! increases the error.

use faer::{Mat, MatRef};
use procrustes_linalg::{assignment, ops};

use crate::{
    evaluate, kopt, AlignmentConfig, Convergence, ProcrustesError, TransformMode, Transformation,
};

/// Explicit state of the relaxed single-transformation iteration.
#[derive(Debug, Clone)]
pub struct RelaxedState {
    /// Current doubly-stochastic matrix.
    pub p: Mat<f64>,
    /// Number of Frank-Wolfe steps taken.
    pub iteration: usize,
    /// Relaxed objective `<A, P B P^T>` at `p`.
    pub objective: f64,
}

/// Output of the two-sided permutation solver.
#[derive(Debug, Clone)]
pub struct TwoSidedSolution {
    /// One permutation for the single modes, two for the double mode.
    pub transformation: Transformation,
    /// Error `|P^T A P - B|_F^2` or `|P1^T A P2 - B|_F^2` of the exact permutations.
    pub error: f64,
    /// Whether the iterations reached the tolerance.
    pub convergence: Convergence,
}

/// Solve the two-sided permutation Procrustes problem.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed.
/// * `b` - The reference matrix, same shape as `a`.
/// * `config` - Uses `transform_mode`, `tolerance`, `max_iterations` and `kopt`.
///
/// # Returns
///
/// The permutation(s), the error of the exact permutation(s) and the
/// convergence record. Exhausting `max_iterations` is not an error.
pub fn solve_permutation_2sided(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<TwoSidedSolution, ProcrustesError> {
    if (a.nrows(), a.ncols()) != (b.nrows(), b.ncols()) {
        return Err(ProcrustesError::shape(
            "two-sided permutation Procrustes requires matrices of the same shape",
            a,
            b,
        ));
    }

    match config.transform_mode {
        TransformMode::SingleUndirected => {
            evaluate::check_symmetric("a", a)?;
            evaluate::check_symmetric("b", b)?;
            solve_single(a, b, config, true)
        }
        TransformMode::SingleDirected => solve_single(a, b, config, false),
        TransformMode::Double => solve_double(a, b, config),
    }
}

/// Error `|P^T A P - B|_F^2` of the permutation `P[(i, perm[i])] = 1`.
pub fn single_error(a: MatRef<'_, f64>, b: MatRef<'_, f64>, perm: &[usize]) -> f64 {
    let mut acc = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            let d = a.read(i, j) - b.read(perm[i], perm[j]);
            acc += d * d;
        }
    }
    acc
}

/// Error `|P1^T A P2 - B|_F^2` of the permutations given by `left` and `right`.
pub fn double_error(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    left: &[usize],
    right: &[usize],
) -> f64 {
    let mut acc = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            let d = a.read(i, j) - b.read(left[i], right[j]);
            acc += d * d;
        }
    }
    acc
}

/// Relaxed objective `<A, P B P^T>`.
pub fn relaxed_objective(a: MatRef<'_, f64>, b: MatRef<'_, f64>, p: MatRef<'_, f64>) -> f64 {
    let pb = ops::matmul(p, b);
    let pbpt = ops::matmul(pb.as_ref(), p.transpose());
    ops::inner_product(a, pbpt.as_ref())
}

fn gradient(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    p: MatRef<'_, f64>,
    symmetric: bool,
) -> Mat<f64> {
    let ap = ops::matmul(a, p);
    if symmetric {
        let apb = ops::matmul(ap.as_ref(), b);
        return Mat::from_fn(apb.nrows(), apb.ncols(), |i, j| 2.0 * apb.read(i, j));
    }
    let apbt = ops::matmul(ap.as_ref(), b.transpose());
    let atp = ops::matmul(a.transpose(), p);
    let atpb = ops::matmul(atp.as_ref(), b);
    Mat::from_fn(apbt.nrows(), apbt.ncols(), |i, j| apbt.read(i, j) + atpb.read(i, j))
}

/// Maximizer of `slope * t + curvature * t^2` over `t` in `[0, 1]`.
fn line_search(slope: f64, curvature: f64) -> f64 {
    if curvature < 0.0 {
        (-slope / (2.0 * curvature)).clamp(0.0, 1.0)
    } else if slope + curvature > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// One Frank-Wolfe step from `state`.
///
/// Returns the next state and whether the stopping criterion is met.
pub fn frank_wolfe_step(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    state: &RelaxedState,
    symmetric: bool,
    tolerance: f64,
) -> Result<(RelaxedState, bool), ProcrustesError> {
    let p = state.p.as_ref();
    let n = p.nrows();

    let grad = gradient(a, b, p, symmetric);
    let vertex = assignment::linear_sum_assignment_max(grad.as_ref())?;
    let q = ops::permutation_matrix(&vertex)?;
    let direction = Mat::from_fn(n, n, |i, j| q.read(i, j) - p.read(i, j));

    let slope = ops::inner_product(grad.as_ref(), direction.as_ref());
    let curvature = relaxed_objective(a, b, direction.as_ref());
    let step = line_search(slope, curvature);

    let next_p = Mat::from_fn(n, n, |i, j| p.read(i, j) + step * direction.read(i, j));
    let objective = relaxed_objective(a, b, next_p.as_ref());
    let change = (objective - state.objective).abs();
    let converged = step == 0.0 || change <= tolerance * state.objective.abs().max(1.0);

    log::debug!(
        "frank-wolfe iteration {}: step {:.3e}, objective {:.6e}, change {:.3e}",
        state.iteration + 1,
        step,
        objective,
        change
    );

    Ok((
        RelaxedState {
            p: next_p,
            iteration: state.iteration + 1,
            objective,
        },
        converged,
    ))
}

/// Run Frank-Wolfe from `p0` until convergence or `max_iterations`.
pub fn frank_wolfe(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    p0: Mat<f64>,
    symmetric: bool,
    config: &AlignmentConfig,
) -> Result<(RelaxedState, bool), ProcrustesError> {
    let mut state = RelaxedState {
        objective: relaxed_objective(a, b, p0.as_ref()),
        p: p0,
        iteration: 0,
    };

    while state.iteration < config.max_iterations {
        let (next, converged) = frank_wolfe_step(a, b, &state, symmetric, config.tolerance)?;
        state = next;
        if converged {
            return Ok((state, true));
        }
    }

    Ok((state, false))
}

/// Match each row/column of `a` to one of `b` by comparing sorted entry profiles.
///
/// The profile of index `i` is the diagonal entry followed by the sorted
/// off-diagonal entries of row `i` and of column `i`; it is invariant under a
/// simultaneous relabelling of rows and columns.
fn single_profile_guess(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
) -> Result<Vec<usize>, ProcrustesError> {
    let profile = |m: MatRef<'_, f64>, i: usize| {
        let n = m.nrows();
        let mut row = (0..n).filter(|&j| j != i).map(|j| m.read(i, j)).collect::<Vec<_>>();
        let mut col = (0..n).filter(|&j| j != i).map(|j| m.read(j, i)).collect::<Vec<_>>();
        row.sort_by(|x, y| y.total_cmp(x));
        col.sort_by(|x, y| y.total_cmp(x));
        let mut out = vec![m.read(i, i)];
        out.extend(row);
        out.extend(col);
        out
    };

    let n = a.nrows();
    let pa = (0..n).map(|i| profile(a, i)).collect::<Vec<_>>();
    let pb = (0..n).map(|i| profile(b, i)).collect::<Vec<_>>();
    profile_assignment(&pa, &pb)
}

fn sorted_desc(mut v: Vec<f64>) -> Vec<f64> {
    v.sort_by(|x, y| y.total_cmp(x));
    v
}

fn profile_assignment(pa: &[Vec<f64>], pb: &[Vec<f64>]) -> Result<Vec<usize>, ProcrustesError> {
    let cost = Mat::<f64>::from_fn(pa.len(), pb.len(), |i, k| {
        pa[i]
            .iter()
            .zip(pb[k].iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
    });
    Ok(assignment::linear_sum_assignment(cost.as_ref())?)
}

fn solve_single(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
    symmetric: bool,
) -> Result<TwoSidedSolution, ProcrustesError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(ProcrustesError::shape(
            "single-transformation two-sided Procrustes requires square matrices",
            a,
            b,
        ));
    }

    let guess = single_profile_guess(a, b)?;
    let guess_error = single_error(a, b, &guess);
    let barycenter = Mat::<f64>::from_fn(n, n, |_, _| 1.0 / n as f64);
    let starts = [ops::permutation_matrix(&guess)?, barycenter];

    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut total_iterations = 0;
    let mut all_converged = true;

    for (run, p0) in starts.into_iter().enumerate() {
        let (state, converged) = frank_wolfe(a, b, p0, symmetric, config)?;
        total_iterations += state.iteration;
        all_converged &= converged;

        let perm = assignment::linear_sum_assignment_max(state.p.as_ref())?;
        let error = single_error(a, b, &perm);
        log::debug!(
            "two-sided run {}: {} iterations, converged {}, projected error {:.6e}",
            run,
            state.iteration,
            converged,
            error
        );

        if best.as_ref().map_or(true, |(_, e)| error < *e) {
            best = Some((perm, error));
        }
    }

    let (mut perm, mut error) = match best {
        Some((perm, error)) if error <= guess_error => (perm, error),
        _ => (guess, guess_error),
    };

    if let Some(k) = config.kopt {
        let (refined, refined_error) =
            kopt::kopt_heuristic(|p: &[usize]| single_error(a, b, p), perm, k);
        perm = refined;
        error = refined_error;
    }

    let convergence = Convergence {
        converged: all_converged,
        num_iterations: total_iterations,
        tolerance: config.tolerance,
    };
    if !convergence.converged {
        log::warn!(
            "two-sided permutation did not converge in {} iterations per run",
            config.max_iterations
        );
    }

    Ok(TwoSidedSolution {
        transformation: Transformation::Single(ops::permutation_matrix(&perm)?),
        error,
        convergence,
    })
}

fn flip_flop(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    mut left: Vec<usize>,
    mut right: Vec<usize>,
    config: &AlignmentConfig,
) -> Result<(Vec<usize>, Vec<usize>, f64, usize, bool), ProcrustesError> {
    let mut error = double_error(a, b, &left, &right);

    for iteration in 1..=config.max_iterations {
        // right permutation with the left one fixed: maximize <(L^T A)^T B, R>
        let l = ops::permutation_matrix(&left)?;
        let la = ops::matmul(l.transpose(), a);
        let profit = ops::matmul(la.transpose(), b);
        right = assignment::linear_sum_assignment_max(profit.as_ref())?;

        // left permutation with the right one fixed: maximize <(A R) B^T, L>
        let r = ops::permutation_matrix(&right)?;
        let ar = ops::matmul(a, r.as_ref());
        let profit = ops::matmul(ar.as_ref(), b.transpose());
        left = assignment::linear_sum_assignment_max(profit.as_ref())?;

        let next_error = double_error(a, b, &left, &right);
        log::debug!("flip-flop iteration {}: error {:.6e}", iteration, next_error);

        let change = (error - next_error).abs();
        error = next_error;
        if change <= config.tolerance * error.max(1.0) {
            return Ok((left, right, error, iteration, true));
        }
    }

    Ok((left, right, error, config.max_iterations, false))
}

fn solve_double(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<TwoSidedSolution, ProcrustesError> {
    let (rows, cols) = (a.nrows(), a.ncols());

    // sorted rows are invariant under column permutations and vice versa
    let row_profiles = |m: MatRef<'_, f64>| {
        (0..rows)
            .map(|i| sorted_desc((0..cols).map(|j| m.read(i, j)).collect()))
            .collect::<Vec<_>>()
    };
    let col_profiles = |m: MatRef<'_, f64>| {
        (0..cols)
            .map(|j| sorted_desc((0..rows).map(|i| m.read(i, j)).collect()))
            .collect::<Vec<_>>()
    };
    let left_guess = profile_assignment(&row_profiles(a), &row_profiles(b))?;
    let right_guess = profile_assignment(&col_profiles(a), &col_profiles(b))?;

    let identity = ((0..rows).collect::<Vec<_>>(), (0..cols).collect::<Vec<_>>());
    let starts = [(left_guess, right_guess), identity];

    let mut best: Option<(Vec<usize>, Vec<usize>, f64)> = None;
    let mut total_iterations = 0;
    let mut all_converged = true;
    for (run, (left0, right0)) in starts.into_iter().enumerate() {
        let start_error = double_error(a, b, &left0, &right0);
        let (left, right, error, iterations, converged) =
            flip_flop(a, b, left0.clone(), right0.clone(), config)?;
        total_iterations += iterations;
        all_converged &= converged;
        log::debug!(
            "flip-flop run {}: {} iterations, converged {}, error {:.6e}",
            run,
            iterations,
            converged,
            error
        );

        let candidate = if start_error < error {
            (left0, right0, start_error)
        } else {
            (left, right, error)
        };
        if best.as_ref().map_or(true, |(_, _, e)| candidate.2 < *e) {
            best = Some(candidate);
        }
    }

    let Some((mut left, mut right, mut error)) = best else {
        return Err(ProcrustesError::DegenerateInput(
            "no starting point for the double transformation".to_string(),
        ));
    };

    if let Some(k) = config.kopt {
        for _ in 0..config.max_iterations {
            let fixed_right = right.clone();
            let (new_left, _) =
                kopt::kopt_heuristic(|l: &[usize]| double_error(a, b, l, &fixed_right), left, k);
            let fixed_left = new_left.clone();
            let (new_right, new_error) =
                kopt::kopt_heuristic(|r: &[usize]| double_error(a, b, &fixed_left, r), right, k);
            left = new_left;
            right = new_right;
            if new_error >= error {
                error = new_error;
                break;
            }
            error = new_error;
        }
    }

    let convergence = Convergence {
        converged: all_converged,
        num_iterations: total_iterations,
        tolerance: config.tolerance,
    };
    if !convergence.converged {
        log::warn!(
            "two-sided permutation did not converge in {} iterations per run",
            config.max_iterations
        );
    }

    Ok(TwoSidedSolution {
        transformation: Transformation::Double {
            left: ops::permutation_matrix(&left)?,
            right: ops::permutation_matrix(&right)?,
        },
        error,
        convergence,
    })
}
