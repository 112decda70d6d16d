//! Chirality check for 3-D point sets.
//!
//! Two conformers are enantiomers when `B` is matched much better by a
//! rotation of the mirror image of `A` than by a rotation of `A` itself.

use faer::{Mat, MatRef};
use serde::{Deserialize, Serialize};

use crate::{align_rotational, AlignmentConfig, ProcrustesError};

/// Parameters of [`check_chirality`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChiralityParams {
    /// Minimum ratio `rotation_error / reflection_error` reported as enantiomers.
    pub threshold: f64,
}

impl Default for ChiralityParams {
    fn default() -> Self {
        Self { threshold: 10.0 }
    }
}

/// Outcome of a chirality check.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiralityReport {
    /// Error of the best rotation of `A` onto `B`.
    pub rotation_error: f64,
    /// Error of the best rotation of the mirrored `A` onto `B`.
    pub reflection_error: f64,
    /// `rotation_error / reflection_error`.
    pub ratio: f64,
    /// Whether the ratio exceeds the threshold.
    pub enantiomers: bool,
}

/// Compare `a` and its mirror image against `b` with rotational Procrustes.
///
/// Both point sets are centered, not scaled, and no zero row or column is
/// dropped. The mirror image negates the first coordinate.
///
/// # Arguments
///
/// * `a` - Coordinates of the first conformer, shape `n x 3`.
/// * `b` - Coordinates of the second conformer, shape `n x 3`.
/// * `params` - The decision threshold.
pub fn check_chirality(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    params: &ChiralityParams,
) -> Result<ChiralityReport, ProcrustesError> {
    if a.ncols() != 3 || b.ncols() != 3 {
        return Err(ProcrustesError::shape(
            "chirality check requires 3-D coordinates",
            a,
            b,
        ));
    }
    if !(params.threshold.is_finite() && params.threshold > 0.0) {
        return Err(ProcrustesError::Config(format!(
            "chirality threshold must be positive and finite, got {}",
            params.threshold
        )));
    }

    let config = AlignmentConfig::new()
        .with_translate(true)
        .with_scale(false)
        .with_remove_zero_row(false)
        .with_remove_zero_col(false);

    let mirrored = Mat::<f64>::from_fn(a.nrows(), 3, |i, j| {
        if j == 0 {
            -a.read(i, j)
        } else {
            a.read(i, j)
        }
    });

    let rotation_error = align_rotational(a, b, &config)?.error;
    let reflection_error = align_rotational(mirrored.as_ref(), b, &config)?.error;

    let ratio = rotation_error / reflection_error.max(f64::EPSILON);
    let enantiomers = ratio > params.threshold;
    log::debug!(
        "chirality: rotation error {:.6e}, reflection error {:.6e}, ratio {:.3e}",
        rotation_error,
        reflection_error,
        ratio
    );

    Ok(ChiralityReport {
        rotation_error,
        reflection_error,
        ratio,
        enantiomers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use procrustes_linalg::ops;

    fn s_conformer() -> Mat<f64> {
        faer::mat![
            [0.3979, -0.5423, -0.4377],
            [0.0726, 0.2672, 0.2157],
            [1.1494, 0.1898, 1.8873],
            [-1.2253, 0.096, 0.4617],
            [0.3097, 1.8081, -0.6451]
        ]
    }

    fn r_conformer() -> Mat<f64> {
        faer::mat![
            [-0.6703, 1.1981, 1.0828],
            [-0.1215, 0.5187, 0.4306],
            [1.3718, -0.2786, 1.4765],
            [-0.9723, -0.4134, 0.0043],
            [0.4794, 1.4486, -0.9643]
        ]
    }

    #[test]
    fn test_enantiomers() -> Result<(), ProcrustesError> {
        let report = check_chirality(
            s_conformer().as_ref(),
            r_conformer().as_ref(),
            &ChiralityParams::default(),
        )?;
        assert!(report.enantiomers);
        assert!(report.rotation_error > 1.0);
        assert!(report.reflection_error < 1e-3);
        Ok(())
    }

    #[test]
    fn test_rotated_copy_is_not_enantiomer() -> Result<(), ProcrustesError> {
        let s = s_conformer();
        let (sn, cs) = (0.7f64.sin(), 0.7f64.cos());
        let rot = faer::mat![[cs, -sn, 0.0], [sn, cs, 0.0], [0.0, 0.0, 1.0]];
        let rotated = ops::matmul(s.as_ref(), rot.as_ref());

        let report = check_chirality(s.as_ref(), rotated.as_ref(), &ChiralityParams::default())?;
        assert!(!report.enantiomers);
        assert!(report.rotation_error < 1e-8);
        Ok(())
    }

    #[test]
    fn test_requires_three_columns() {
        let a = Mat::<f64>::zeros(4, 2);
        assert!(matches!(
            check_chirality(a.as_ref(), a.as_ref(), &ChiralityParams::default()),
            Err(ProcrustesError::Shape { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let s = s_conformer();
        let params = ChiralityParams { threshold: -1.0 };
        assert!(matches!(
            check_chirality(s.as_ref(), s.as_ref(), &params),
            Err(ProcrustesError::Config(_))
        ));
    }
}
