/// An error type for the linear algebra primitives.
#[derive(thiserror::Error, Debug)]
pub enum LinalgError {
    /// The cost matrix of an assignment problem is not square.
    #[error("Cost matrix must be square, got {rows}x{cols}")]
    NonSquareCost {
        /// Number of rows of the cost matrix.
        rows: usize,
        /// Number of columns of the cost matrix.
        cols: usize,
    },

    /// The cost matrix contains a NaN or an infinite entry.
    #[error("Cost matrix has a non-finite entry at ({row}, {col})")]
    NonFiniteCost {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// The given indices do not describe a permutation.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
}
