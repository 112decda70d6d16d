//! Preprocessing pipeline making a raw matrix pair comparable.
//!
//! The steps always run in the same order:
//!
//! 1. drop all-zero rows and/or columns of each matrix,
//! 2. translate each matrix so the centroid of its rows is at the origin,
//! 3. scale each matrix to unit Frobenius norm,
//! 4. pad the matrices with zero rows/columns according to [`PadMode`].

use faer::{Mat, MatRef};
use procrustes_linalg::ops;

use crate::{AlignmentConfig, PadMode, ProcrustesError};

/// Run the full preprocessing pipeline on a matrix pair.
///
/// # Arguments
///
/// * `a` - The matrix to be transformed.
/// * `b` - The reference matrix.
/// * `config` - Which steps to apply.
///
/// # Returns
///
/// The preprocessed pair `(A', B')`, guaranteed to have the same shape.
///
/// Running the pipeline again on its own output returns the same pair, with
/// one exception: when `translate` and `remove_zero_row` are both set and a
/// row equals its matrix's centroid, that row becomes zero after the first
/// pass. The second pass removes it and may pad a zero row back at the bottom,
/// so rows can move. A constant column behaves the same way with
/// `remove_zero_col`. The second pass output is a fixed point.
///
/// Example:
///
/// ```
/// use procrustes::{preprocess, AlignmentConfig};
///
/// let a = faer::mat![[1.0, 2.0], [3.0, 4.0], [0.0, 0.0]];
/// let b = faer::mat![[1.0, 2.0, 5.0]];
/// let (new_a, new_b) = preprocess(a.as_ref(), b.as_ref(), &AlignmentConfig::default()).unwrap();
/// assert_eq!(new_a, faer::mat![[1.0, 2.0, 0.0], [3.0, 4.0, 0.0]]);
/// assert_eq!(new_b, faer::mat![[1.0, 2.0, 5.0], [0.0, 0.0, 0.0]]);
/// ```
pub fn preprocess(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    config: &AlignmentConfig,
) -> Result<(Mat<f64>, Mat<f64>), ProcrustesError> {
    check_input("a", a)?;
    check_input("b", b)?;

    let mut new_a = a.to_owned();
    let mut new_b = b.to_owned();

    if config.remove_zero_row {
        new_a = remove_zero_rows(new_a.as_ref());
        new_b = remove_zero_rows(new_b.as_ref());
    }
    if config.remove_zero_col {
        new_a = remove_zero_cols(new_a.as_ref());
        new_b = remove_zero_cols(new_b.as_ref());
    }
    if is_empty(new_a.as_ref()) || is_empty(new_b.as_ref()) {
        return Err(ProcrustesError::DegenerateInput(
            "matrix has no non-zero rows or columns left".to_string(),
        ));
    }

    if config.translate {
        new_a = translate(new_a.as_ref());
        new_b = translate(new_b.as_ref());
    }

    if config.scale {
        new_a = scale(new_a.as_ref())?;
        new_b = scale(new_b.as_ref())?;
    }

    let (new_a, new_b) = zero_padding(new_a.as_ref(), new_b.as_ref(), config.pad_mode);
    if (new_a.nrows(), new_a.ncols()) != (new_b.nrows(), new_b.ncols()) {
        return Err(ProcrustesError::shape(
            "matrices have different shapes after padding",
            new_a.as_ref(),
            new_b.as_ref(),
        ));
    }

    log::debug!(
        "preprocessed pair {}x{} -> {}x{} / {}x{} -> {}x{}",
        a.nrows(),
        a.ncols(),
        new_a.nrows(),
        new_a.ncols(),
        b.nrows(),
        b.ncols(),
        new_b.nrows(),
        new_b.ncols()
    );

    Ok((new_a, new_b))
}

/// Pad a matrix pair with zero rows (bottom) and/or zero columns (right).
///
/// Shapes that are already equal are returned unchanged regardless of `mode`.
pub fn zero_padding(a: MatRef<'_, f64>, b: MatRef<'_, f64>, mode: PadMode) -> (Mat<f64>, Mat<f64>) {
    let (n1, m1) = (a.nrows(), a.ncols());
    let (n2, m2) = (b.nrows(), b.ncols());
    if (n1, m1) == (n2, m2) {
        return (a.to_owned(), b.to_owned());
    }

    let ((ra, ca), (rb, cb)) = match mode {
        PadMode::None => ((n1, m1), (n2, m2)),
        PadMode::Row => ((n1.max(n2), m1), (n1.max(n2), m2)),
        PadMode::Col => ((n1, m1.max(m2)), (n2, m1.max(m2))),
        PadMode::RowCol => {
            let (rows, cols) = (n1.max(n2), m1.max(m2));
            ((rows, cols), (rows, cols))
        }
        PadMode::Square => {
            let dim = n1.max(n2).max(m1).max(m2);
            ((dim, dim), (dim, dim))
        }
    };

    (ops::pad_zeros(a, ra, ca), ops::pad_zeros(b, rb, cb))
}

/// Remove the rows whose entries are all below [`ops::ZERO_TOLERANCE`] in magnitude.
pub fn remove_zero_rows(m: MatRef<'_, f64>) -> Mat<f64> {
    let rows = ops::nonzero_rows(m, ops::ZERO_TOLERANCE);
    ops::select_rows(m, &rows)
}

/// Remove the columns whose entries are all below [`ops::ZERO_TOLERANCE`] in magnitude.
pub fn remove_zero_cols(m: MatRef<'_, f64>) -> Mat<f64> {
    let cols = ops::nonzero_cols(m, ops::ZERO_TOLERANCE);
    ops::select_cols(m, &cols)
}

/// Subtract the centroid of the rows from every row.
pub fn translate(m: MatRef<'_, f64>) -> Mat<f64> {
    let centroid = ops::column_means(m);
    Mat::from_fn(m.nrows(), m.ncols(), |i, j| m.read(i, j) - centroid[j])
}

/// Divide a matrix by its Frobenius norm.
///
/// Fails with [`ProcrustesError::DegenerateInput`] on a zero matrix.
pub fn scale(m: MatRef<'_, f64>) -> Result<Mat<f64>, ProcrustesError> {
    let norm = ops::frobenius_norm(m);
    if norm < f64::EPSILON {
        return Err(ProcrustesError::DegenerateInput(
            "cannot scale a matrix with zero Frobenius norm".to_string(),
        ));
    }
    Ok(Mat::from_fn(m.nrows(), m.ncols(), |i, j| m.read(i, j) / norm))
}

fn is_empty(m: MatRef<'_, f64>) -> bool {
    m.nrows() == 0 || m.ncols() == 0
}

fn check_input(name: &'static str, m: MatRef<'_, f64>) -> Result<(), ProcrustesError> {
    if is_empty(m) {
        return Err(ProcrustesError::DegenerateInput(format!(
            "matrix `{name}` is empty ({}x{})",
            m.nrows(),
            m.ncols()
        )));
    }
    if let Some((row, col)) = ops::find_non_finite(m) {
        return Err(ProcrustesError::NonFiniteInput { name, row, col });
    }
    Ok(())
}
