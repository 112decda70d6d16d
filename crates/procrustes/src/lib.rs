#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Alignment entry points and the solver trait.
pub mod align;

/// Chirality check of 3-D conformers.
pub mod chirality;

/// Alignment options.
pub mod config;

/// Structural checks and error functions.
pub mod evaluate;

/// Unconstrained least-squares Procrustes.
pub mod generic;

/// Greedy k-opt refinement of permutations.
pub mod kopt;

/// Orthogonal and rotational Procrustes.
pub mod orthogonal;

/// Two-sided orthogonal Procrustes.
pub mod orthogonal_2sided;

/// One-sided permutation Procrustes.
pub mod permutation;

/// Matrix pair preprocessing.
pub mod preprocess;

/// Two-sided permutation Procrustes.
pub mod two_sided;

mod error;

pub use align::{
    align, align_generic, align_orthogonal, align_orthogonal_2sided, align_permutation,
    align_permutation_2sided, align_rotational, Aligner, AlignmentResult, Convergence, Solution,
    Transformation, TransformationFamily,
};
pub use chirality::{check_chirality, ChiralityParams, ChiralityReport};
pub use config::{AlignmentConfig, PadMode, TransformMode};
pub use error::ProcrustesError;
pub use preprocess::preprocess;
