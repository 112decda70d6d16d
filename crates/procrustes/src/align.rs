use faer::{Mat, MatRef};

use crate::{
    evaluate, generic, orthogonal, orthogonal_2sided, permutation, preprocess, two_sided,
    AlignmentConfig, ProcrustesError,
};

/// Transformation(s) produced by an alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    /// A single matrix `T`, applied as `A T` (one-sided) or `T^T A T` (two-sided).
    Single(Mat<f64>),
    /// Independent matrices applied as `left^T A right`.
    Double {
        /// Permutation of the rows of `A`.
        left: Mat<f64>,
        /// Permutation of the columns of `A`.
        right: Mat<f64>,
    },
}

/// Convergence record of an iterative solver.
///
/// `converged == false` means `max_iterations` was exhausted before the
/// tolerance was reached; the result is still the best one found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Whether the stopping tolerance was reached.
    pub converged: bool,
    /// Number of iterations performed.
    pub num_iterations: usize,
    /// Tolerance the iterations were run with.
    pub tolerance: f64,
}

/// Output of a single [`Aligner`].
#[derive(Debug, Clone)]
pub struct Solution {
    /// The optimal transformation(s).
    pub transformation: Transformation,
    /// Squared Frobenius norm of the residual.
    pub error: f64,
    /// Only set by iterative solvers.
    pub convergence: Option<Convergence>,
}

/// Result of an alignment.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// The preprocessed `A`.
    pub new_a: Mat<f64>,
    /// The preprocessed `B`.
    pub new_b: Mat<f64>,
    /// The optimal transformation(s).
    pub transformation: Transformation,
    /// Squared Frobenius norm of the residual on the preprocessed pair.
    pub error: f64,
    /// Only set by iterative solvers.
    pub convergence: Option<Convergence>,
}

/// Trait for Procrustes solvers.
pub trait Aligner {
    /// Name of the transformation family, used in error messages.
    const FAMILY: &'static str;

    /// Find the transformation aligning the preprocessed `a` to `b`.
    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError>;

    /// Check that `transformation` belongs to the family.
    fn check(transformation: &Transformation, eps: f64) -> Result<(), ProcrustesError>;
}

/// The transformation families available through [`align`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationFamily {
    /// Orthogonal matrix, `T^T T = I`.
    Orthogonal,
    /// Proper rotation, orthogonal with `det(T) = +1`.
    Rotational,
    /// Orthogonal matrices on both sides of `A`, see [`crate::TransformMode`].
    OrthogonalTwoSided,
    /// Permutation of the columns of `A`.
    Permutation,
    /// Permutation of rows and columns of `A`, see [`crate::TransformMode`].
    PermutationTwoSided,
    /// Unconstrained least-squares matrix.
    Generic,
}

/// Orthogonal Procrustes solver.
pub struct Orthogonal;

/// Rotational Procrustes solver.
pub struct Rotational;

/// Two-sided orthogonal Procrustes solver.
pub struct OrthogonalTwoSided;

/// One-sided permutation Procrustes solver.
pub struct Permutation;

/// Two-sided permutation Procrustes solver.
pub struct PermutationTwoSided;

/// Generic Procrustes solver.
pub struct Generic;

fn single<'a>(
    family: &'static str,
    transformation: &'a Transformation,
) -> Result<&'a Mat<f64>, ProcrustesError> {
    match transformation {
        Transformation::Single(t) => Ok(t),
        Transformation::Double { .. } => Err(ProcrustesError::InvariantViolation {
            family,
            detail: "expected a single transformation".to_string(),
        }),
    }
}

fn closed_form((t, error): (Mat<f64>, f64)) -> Solution {
    Solution {
        transformation: Transformation::Single(t),
        error,
        convergence: None,
    }
}

impl Aligner for Orthogonal {
    const FAMILY: &'static str = "orthogonal";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        _config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        orthogonal::solve_orthogonal(a, b, false).map(closed_form)
    }

    fn check(transformation: &Transformation, eps: f64) -> Result<(), ProcrustesError> {
        evaluate::check_orthogonal(single(Self::FAMILY, transformation)?.as_ref(), eps)
    }
}

impl Aligner for Rotational {
    const FAMILY: &'static str = "rotational";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        _config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        orthogonal::solve_orthogonal(a, b, true).map(closed_form)
    }

    fn check(transformation: &Transformation, eps: f64) -> Result<(), ProcrustesError> {
        evaluate::check_rotation(single(Self::FAMILY, transformation)?.as_ref(), eps)
    }
}

impl Aligner for OrthogonalTwoSided {
    const FAMILY: &'static str = "two-sided orthogonal";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        let (transformation, error) =
            orthogonal_2sided::solve_orthogonal_2sided(a, b, config.transform_mode)?;
        Ok(Solution {
            transformation,
            error,
            convergence: None,
        })
    }

    fn check(transformation: &Transformation, eps: f64) -> Result<(), ProcrustesError> {
        match transformation {
            Transformation::Single(u) => evaluate::check_orthogonal(u.as_ref(), eps),
            Transformation::Double { left, right } => {
                evaluate::check_orthogonal(left.as_ref(), eps)?;
                evaluate::check_orthogonal(right.as_ref(), eps)
            }
        }
    }
}

impl Aligner for Permutation {
    const FAMILY: &'static str = "permutation";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        _config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        permutation::solve_permutation(a, b).map(closed_form)
    }

    fn check(transformation: &Transformation, _eps: f64) -> Result<(), ProcrustesError> {
        evaluate::check_permutation(single(Self::FAMILY, transformation)?.as_ref())
    }
}

impl Aligner for PermutationTwoSided {
    const FAMILY: &'static str = "two-sided permutation";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        let solution = two_sided::solve_permutation_2sided(a, b, config)?;
        Ok(Solution {
            transformation: solution.transformation,
            error: solution.error,
            convergence: Some(solution.convergence),
        })
    }

    fn check(transformation: &Transformation, _eps: f64) -> Result<(), ProcrustesError> {
        match transformation {
            Transformation::Single(p) => evaluate::check_permutation(p.as_ref()),
            Transformation::Double { left, right } => {
                evaluate::check_permutation(left.as_ref())?;
                evaluate::check_permutation(right.as_ref())
            }
        }
    }
}

impl Aligner for Generic {
    const FAMILY: &'static str = "generic";

    fn solve(
        a: MatRef<'_, f64>,
        b: MatRef<'_, f64>,
        _config: &AlignmentConfig,
    ) -> Result<Solution, ProcrustesError> {
        generic::solve_generic(a, b).map(closed_form)
    }

    fn check(transformation: &Transformation, _eps: f64) -> Result<(), ProcrustesError> {
        evaluate::check_finite(Self::FAMILY, single(Self::FAMILY, transformation)?.as_ref())
    }
}

fn run<S: Aligner>(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    config.validate()?;
    let (new_a, new_b) = preprocess(a, b, config)?;

    let solution = S::solve(new_a.as_ref(), new_b.as_ref(), config)?;
    S::check(&solution.transformation, config.invariant_tolerance)?;

    log::debug!(
        "{} alignment of {}x{} matrices, error {:.6e}",
        S::FAMILY,
        new_a.nrows(),
        new_a.ncols(),
        solution.error
    );

    Ok(AlignmentResult {
        new_a,
        new_b,
        transformation: solution.transformation,
        error: solution.error,
        convergence: solution.convergence,
    })
}

/// Align `a` to `b` with the chosen transformation family.
///
/// The pair is preprocessed once according to `config`, solved, and the
/// transformation is checked against the family before being returned.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed.
/// * `b` - The reference matrix.
/// * `family` - The kind of transformation to look for.
/// * `config` - Preprocessing options and solver controls.
///
/// Example:
///
/// ```
/// use procrustes::{align, AlignmentConfig, Transformation, TransformationFamily};
///
/// let a = faer::mat![[1.0, 5.0, 8.0], [1.0, 5.0, 7.0], [2.0, 7.0, 9.0]];
/// let b = faer::mat![[8.0, 5.0, 1.0], [7.0, 5.0, 1.0], [9.0, 7.0, 2.0]];
/// let res = align(
///     a.as_ref(),
///     b.as_ref(),
///     TransformationFamily::Permutation,
///     &AlignmentConfig::default(),
/// )
/// .unwrap();
/// assert!(res.error < 1e-12);
/// assert_eq!(
///     res.transformation,
///     Transformation::Single(faer::mat![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]])
/// );
/// ```
pub fn align(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    family: TransformationFamily,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    match family {
        TransformationFamily::Orthogonal => run::<Orthogonal>(a, b, config),
        TransformationFamily::Rotational => run::<Rotational>(a, b, config),
        TransformationFamily::OrthogonalTwoSided => run::<OrthogonalTwoSided>(a, b, config),
        TransformationFamily::Permutation => run::<Permutation>(a, b, config),
        TransformationFamily::PermutationTwoSided => run::<PermutationTwoSided>(a, b, config),
        TransformationFamily::Generic => run::<Generic>(a, b, config),
    }
}

/// Orthogonal Procrustes: `min |A T - B|` over `T^T T = I`.
pub fn align_orthogonal(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<Orthogonal>(a, b, config)
}

/// Rotational Procrustes: `min |A T - B|` over rotations.
pub fn align_rotational(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<Rotational>(a, b, config)
}

/// Two-sided orthogonal Procrustes, in the mode set by `config.transform_mode`.
///
/// Both single modes look for one `U` minimizing `|U^T A U - B|` and need
/// symmetric inputs; `Double` looks for `S`, `T` minimizing `|S^T A T - B|`.
pub fn align_orthogonal_2sided(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<OrthogonalTwoSided>(a, b, config)
}

/// One-sided permutation Procrustes: `min |A P - B|` over permutations.
pub fn align_permutation(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<Permutation>(a, b, config)
}

/// Two-sided permutation Procrustes, in the mode set by `config.transform_mode`.
pub fn align_permutation_2sided(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<PermutationTwoSided>(a, b, config)
}

/// Generic Procrustes: unconstrained `min |A T - B|`.
pub fn align_generic(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<AlignmentResult, ProcrustesError> {
    run::<Generic>(a, b, config)
}
