#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear assignment solver used by the permutation Procrustes problems.
pub mod assignment;

/// Dense matrix utilities over `faer` matrices.
pub mod ops;

mod error;
pub use error::LinalgError;
