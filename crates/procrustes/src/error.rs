use procrustes_linalg::LinalgError;

/// Error types for the Procrustes alignment pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ProcrustesError {
    /// The matrices have shapes that cannot be reconciled.
    #[error("Shape error: {reason} (a is {a_shape:?}, b is {b_shape:?})")]
    Shape {
        /// What went wrong.
        reason: &'static str,
        /// Shape `(rows, cols)` of the first matrix.
        a_shape: (usize, usize),
        /// Shape `(rows, cols)` of the second matrix.
        b_shape: (usize, usize),
    },

    /// The input is empty or cannot be normalized.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// The input holds a NaN or an infinite value.
    #[error("Matrix `{name}` has a non-finite entry at ({row}, {col})")]
    NonFiniteInput {
        /// Which input matrix.
        name: &'static str,
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// The undirected two-sided problem was given a non-symmetric matrix.
    #[error("Matrix `{0}` must be symmetric for the undirected two-sided problem")]
    NotSymmetric(&'static str),

    /// Invalid or unknown configuration option.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A solver returned a transformation outside its family.
    ///
    /// This signals a bug and is never recovered from.
    #[error("Invariant violation for {family} transformation: {detail}")]
    InvariantViolation {
        /// Name of the transformation family.
        family: &'static str,
        /// Description of the failed check.
        detail: String,
    },

    /// Error raised by the linear algebra primitives.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl ProcrustesError {
    pub(crate) fn shape(
        reason: &'static str,
        a: faer::MatRef<'_, f64>,
        b: faer::MatRef<'_, f64>,
    ) -> Self {
        ProcrustesError::Shape {
            reason,
            a_shape: (a.nrows(), a.ncols()),
            b_shape: (b.nrows(), b.ncols()),
        }
    }
}
