use serde::{Deserialize, Serialize};

use crate::ProcrustesError;

/// How a shape mismatch between the two matrices is resolved.
///
/// Zero rows are always appended at the bottom and zero columns on the right,
/// so a permutation solver can move them freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PadMode {
    /// No padding, a shape mismatch is an error.
    None,
    /// Pad the matrix with fewer rows with zero rows.
    Row,
    /// Pad the matrix with fewer columns with zero columns.
    Col,
    /// Pad rows and columns so both matrices share `max(rows) x max(cols)`.
    #[default]
    RowCol,
    /// Pad both matrices to a square of side `max(n1, m1, n2, m2)`.
    Square,
}

/// Structural variant of the two-sided permutation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformMode {
    /// One shared permutation `P`, minimizing `|P^T A P - B|`; both inputs must be symmetric.
    SingleUndirected,
    /// One shared permutation `P`, minimizing `|P^T A P - B|` for general square inputs.
    #[default]
    SingleDirected,
    /// Independent permutations, minimizing `|P1^T A P2 - B|`.
    Double,
}

/// Configuration shared by all alignment entry points.
///
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentConfig {
    /// Subtract the centroid of the rows from every row.
    pub translate: bool,
    /// Normalize each matrix to unit Frobenius norm.
    pub scale: bool,
    /// Drop rows whose entries are all (numerically) zero.
    pub remove_zero_row: bool,
    /// Drop columns whose entries are all (numerically) zero.
    pub remove_zero_col: bool,
    /// How shape mismatches are resolved.
    pub pad_mode: PadMode,
    /// Variant of the two-sided permutation problem.
    pub transform_mode: TransformMode,
    /// Relative objective change below which iterative solvers stop.
    pub tolerance: f64,
    /// Maximum number of iterations of the iterative solvers.
    pub max_iterations: usize,
    /// Order of the optional k-opt refinement of two-sided permutations.
    pub kopt: Option<usize>,
    /// Tolerance used when validating the structure of a transformation.
    pub invariant_tolerance: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            translate: false,
            scale: false,
            remove_zero_row: true,
            remove_zero_col: true,
            pad_mode: PadMode::RowCol,
            transform_mode: TransformMode::SingleDirected,
            tolerance: 1e-8,
            max_iterations: 500,
            kopt: None,
            invariant_tolerance: 1e-8,
        }
    }
}

impl AlignmentConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON, rejecting unknown options.
    ///
    /// Example:
    ///
    /// ```
    /// use procrustes::{AlignmentConfig, PadMode};
    ///
    /// let config = AlignmentConfig::from_json(r#"{"translate": true, "pad_mode": "square"}"#).unwrap();
    /// assert!(config.translate);
    /// assert_eq!(config.pad_mode, PadMode::Square);
    /// assert!(AlignmentConfig::from_json(r#"{"translat": true}"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ProcrustesError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ProcrustesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the numeric options are usable.
    pub fn validate(&self) -> Result<(), ProcrustesError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ProcrustesError::Config(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(ProcrustesError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if let Some(k) = self.kopt {
            if k < 2 {
                return Err(ProcrustesError::Config(format!(
                    "kopt must be at least 2, got {k}"
                )));
            }
        }
        if !(self.invariant_tolerance.is_finite() && self.invariant_tolerance > 0.0) {
            return Err(ProcrustesError::Config(format!(
                "invariant_tolerance must be positive and finite, got {}",
                self.invariant_tolerance
            )));
        }
        Ok(())
    }

    /// Set whether to translate the inputs to the origin.
    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    /// Set whether to scale the inputs to unit norm.
    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    /// Set whether to drop all-zero rows.
    pub fn with_remove_zero_row(mut self, remove: bool) -> Self {
        self.remove_zero_row = remove;
        self
    }

    /// Set whether to drop all-zero columns.
    pub fn with_remove_zero_col(mut self, remove: bool) -> Self {
        self.remove_zero_col = remove;
        self
    }

    /// Set the padding mode.
    pub fn with_pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.pad_mode = pad_mode;
        self
    }

    /// Set the two-sided transform mode.
    pub fn with_transform_mode(mut self, transform_mode: TransformMode) -> Self {
        self.transform_mode = transform_mode;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the order of the k-opt refinement, `None` disables it.
    pub fn with_kopt(mut self, kopt: Option<usize>) -> Self {
        self.kopt = kopt;
        self
    }

    /// Set the tolerance of the structural checks.
    pub fn with_invariant_tolerance(mut self, tol: f64) -> Self {
        self.invariant_tolerance = tol;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AlignmentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json() -> Result<(), ProcrustesError> {
        let config = AlignmentConfig::from_json(
            r#"{"scale": true, "transform_mode": "double", "kopt": 3, "max_iterations": 10}"#,
        )?;
        assert!(config.scale);
        assert!(!config.translate);
        assert_eq!(config.transform_mode, TransformMode::Double);
        assert_eq!(config.kopt, Some(3));
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.pad_mode, PadMode::RowCol);
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_unknown_option() {
        let res = AlignmentConfig::from_json(r#"{"weight": [1.0, 2.0]}"#);
        assert!(matches!(res, Err(ProcrustesError::Config(_))));

        let res = AlignmentConfig::from_json(r#"{"pad_mode": "diagonal"}"#);
        assert!(matches!(res, Err(ProcrustesError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            AlignmentConfig::new().with_tolerance(0.0),
            AlignmentConfig::new().with_tolerance(f64::NAN),
            AlignmentConfig::new().with_max_iterations(0),
            AlignmentConfig::new().with_kopt(Some(1)),
            AlignmentConfig::new().with_invariant_tolerance(-1.0),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ProcrustesError::Config(_))));
        }
    }

    #[test]
    fn test_json_roundtrip_keeps_modes() -> Result<(), Box<dyn std::error::Error>> {
        let config = AlignmentConfig::new()
            .with_pad_mode(PadMode::Square)
            .with_transform_mode(TransformMode::SingleUndirected);
        let json = serde_json::to_string(&config)?;
        assert!(json.contains("\"square\""));
        assert!(json.contains("\"single-undirected\""));
        assert_eq!(AlignmentConfig::from_json(&json)?, config);
        Ok(())
    }
}
