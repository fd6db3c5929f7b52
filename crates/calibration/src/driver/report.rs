use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::{CalibrationError, Fitness};

/// Lifecycle of a [`CalibrationDriver`](super::CalibrationDriver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    Initialized,
    Searching,
    Converged,
    Exhausted,
    Failed,
}

impl DriverState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::Failed)
    }
}

/// Why a calibration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    IterationBudget,
    EvaluationBudget,
    WallClock,
    Cancelled,
    ModelError,
}

/// Summary of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub state: DriverState,
    pub stop_reason: Option<StopReason>,
    /// Best parameters found, in the model's parameter order.
    pub best_parameters: Option<Vec<f64>>,
    pub best_fitness: Option<Fitness>,
    pub iterations: usize,
    /// Model evaluations that ran, including failed ones.
    pub evaluations: usize,
    /// Evaluations whose simulation failed and were scored as failed.
    pub failed_evaluations: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl CalibrationReport {
    pub(crate) fn empty(state: DriverState) -> Self {
        Self {
            state,
            stop_reason: None,
            best_parameters: None,
            best_fitness: None,
            iterations: 0,
            evaluations: 0,
            failed_evaluations: 0,
            elapsed: Duration::ZERO,
        }
    }
}

fn as_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// A calibration run that ended on a fatal error.
///
/// The report still carries the best point found before the failure.
#[derive(Debug, Error)]
#[error("calibration failed after {} evaluations: {error}", report.evaluations)]
pub struct DriverFailure {
    #[source]
    pub error: CalibrationError,
    pub report: CalibrationReport,
}
