use std::{path::PathBuf, time::Duration};

use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

use fitloop_solvers::optimization::nelder_mead;

/// A parameter vector whose length does not match the model's input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} parameters, got {actual}")]
pub struct InvalidParameterError {
    pub expected: usize,
    pub actual: usize,
}

/// A simulation run that did not produce usable output.
///
/// These failures are expected under extreme parameter values. Models score
/// them as [`Fitness::Failed`](crate::Fitness::Failed) so the search can
/// route away from the offending region.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationFailure {
    #[error("simulation diverged")]
    Diverged { step: Option<usize> },

    #[error("simulation exceeded its time limit of {limit:?}")]
    BudgetExceeded { limit: Duration },

    #[error("simulation produced no history for probe `{probe}`")]
    MissingProbe { probe: String },

    #[error("history `{probe}` has {len} samples, at least {min} are required")]
    TooFewSamples {
        probe: String,
        len: usize,
        min: usize,
    },

    #[error("simulator backend failed: {0}")]
    Backend(String),
}

/// Missing or malformed reference data, session config, or problem setup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse reference data")]
    Csv(#[from] csv::Error),

    #[error("reference data line {line}: {message}")]
    InvalidReference { line: u64, message: String },

    #[error("reference data has no rows")]
    EmptyReference,

    #[error("invalid session config")]
    Toml(#[from] toml::de::Error),

    #[error("simulator program not found: {}", program.display())]
    SimulatorNotFound { program: PathBuf },

    #[error("invalid solver settings")]
    Solver(#[from] nelder_mead::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

/// Errors from aligning a simulated curve onto a reference grid.
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("reference curve is empty")]
    EmptyReference,

    #[error("simulated curve has no samples with increasing x")]
    EmptySimulated,

    #[error("curve has {x} x values but {y} y values")]
    LengthMismatch { x: usize, y: usize },

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}

/// The error type of a simulator used as a [`Model`](fitloop_core::Model).
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Failure(#[from] SimulationFailure),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Errors surfaced by calibration models and the driver.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    #[error(transparent)]
    Simulation(#[from] SimulationFailure),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to align simulated and reference curves")]
    Align(#[from] AlignError),

    #[error("model `{model}` does not support `{operation}`")]
    Unsupported {
        model: String,
        operation: &'static str,
    },

    #[error("search failed")]
    Search(#[from] nelder_mead::Error),
}

impl CalibrationError {
    /// Returns true if the error must terminate a calibration.
    ///
    /// Simulation and alignment failures are absorbed as failed fitness;
    /// everything else is caller misuse or broken configuration.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Simulation(_) | Self::Align(_))
    }
}

impl From<SimulatorError> for CalibrationError {
    fn from(err: SimulatorError) -> Self {
        match err {
            SimulatorError::Failure(e) => Self::Simulation(e),
            SimulatorError::Configuration(e) => Self::Configuration(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_simulation_and_alignment_are_absorbed() {
        let diverged: CalibrationError = SimulationFailure::Diverged { step: Some(3) }.into();
        assert!(!diverged.is_fatal());

        let empty: CalibrationError = AlignError::EmptySimulated.into();
        assert!(!empty.is_fatal());

        let arity: CalibrationError = InvalidParameterError {
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(arity.is_fatal());
        assert_eq!(arity.to_string(), "expected 2 parameters, got 3");

        let missing: CalibrationError = ConfigurationError::EmptyReference.into();
        assert!(missing.is_fatal());
    }

    #[test]
    fn simulator_errors_keep_their_kind() {
        let failure = SimulatorError::from(SimulationFailure::Backend("exit 1".into()));
        assert!(matches!(
            CalibrationError::from(failure),
            CalibrationError::Simulation(SimulationFailure::Backend(_))
        ));

        let config = SimulatorError::from(ConfigurationError::SimulatorNotFound {
            program: "pd-beam".into(),
        });
        assert!(matches!(
            CalibrationError::from(config),
            CalibrationError::Configuration(ConfigurationError::SimulatorNotFound { .. })
        ));
    }
}
