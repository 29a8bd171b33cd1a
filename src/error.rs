use thiserror::Error;

/// Error types for the spatialopt-rs library.
#[derive(Error, Debug)]
pub enum OptError {
    /// The options contain no parameters to optimize.
    #[error("Configuration error: at least one optimization parameter is required")]
    EmptyParameters,

    /// The options contain no cost terms.
    #[error("Configuration error: at least one optimization cost is required")]
    EmptyCosts,

    /// A parameter's bounds do not form a valid closed interval.
    #[error("Configuration error: parameter '{name}' has lower bound {lower} which must be less than upper bound {upper}")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// A cost term has a negative (or non-finite) weight.
    #[error("Configuration error: cost '{name}' has invalid weight {weight}")]
    NegativeWeight { name: String, weight: f64 },

    /// A cost term samples the simulation at a negative (or non-finite) time.
    #[error("Configuration error: cost '{name}' has invalid simulation time {time}")]
    NegativeSimulationTime { name: String, time: f64 },

    /// A relative cost term has no usable epsilon.
    #[error(
        "Configuration error: cost '{name}' uses a relative difference but epsilon is {epsilon}"
    )]
    InvalidEpsilon { name: String, epsilon: f64 },

    /// Target values contain non-finite entries or cannot be compared against.
    #[error("Configuration error: cost '{name}' has invalid target values: {reason}")]
    InvalidTargetValues { name: String, reason: String },

    /// Target values do not line up with the simulator's output array.
    #[error("Configuration error: cost '{name}' has {actual} target values but the simulator produces {expected}")]
    TargetLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The model has no parameter matching an OptParam.
    #[error("Configuration error: parameter not found in model: {0}")]
    UnknownParameter(String),

    /// The simulator does not produce the quantity an OptCost addresses.
    #[error("Configuration error: quantity not produced by simulator: {0}")]
    UnknownQuantity(String),

    /// Island count, population size or a hyperparameter is out of range.
    #[error("Configuration error: invalid algorithm settings: {0}")]
    InvalidAlgorithmConfig(String),

    /// The simulator failed for a candidate.
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    /// Error indicating a mismatch in vector lengths.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Results were requested before any generation completed.
    #[error("No optimization iterations have completed yet")]
    NoCompletedIterations,

    /// `evolve` was called while another `evolve` is in progress.
    #[error("Optimization is already running")]
    AlreadyRunning,

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OptError {
    /// Whether this error was caused by invalid optimization settings.
    ///
    /// Configuration errors are only ever produced while constructing an
    /// [`Optimization`](crate::optimization::Optimization), never during a run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OptError::EmptyParameters
                | OptError::EmptyCosts
                | OptError::InvalidBounds { .. }
                | OptError::NegativeWeight { .. }
                | OptError::NegativeSimulationTime { .. }
                | OptError::InvalidEpsilon { .. }
                | OptError::InvalidTargetValues { .. }
                | OptError::TargetLengthMismatch { .. }
                | OptError::UnknownParameter(_)
                | OptError::UnknownQuantity(_)
                | OptError::InvalidAlgorithmConfig(_)
        )
    }
}

/// Result type alias for spatialopt-rs operations.
pub type Result<T> = std::result::Result<T, OptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OptError::InvalidBounds {
            name: "k1".to_string(),
            lower: 2.0,
            upper: 1.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("'k1'"));
        assert!(msg.contains("lower bound 2"));

        let err = OptError::TargetLengthMismatch {
            name: "A".to_string(),
            expected: 100,
            actual: 3,
        };
        assert!(format!("{}", err).contains("3 target values"));
    }

    #[test]
    fn test_error_classification() {
        assert!(OptError::EmptyCosts.is_configuration());
        assert!(OptError::UnknownQuantity("X".into()).is_configuration());
        assert!(OptError::InvalidTargetValues {
            name: "A".into(),
            reason: "NaN at location 0".into(),
        }
        .is_configuration());
        assert!(!OptError::SimulationFailed("diverged".into()).is_configuration());
        assert!(!OptError::NoCompletedIterations.is_configuration());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OptError = io_err.into();

        match err {
            OptError::IoError(_) => (),
            _ => panic!("Expected IoError variant"),
        }
    }
}
