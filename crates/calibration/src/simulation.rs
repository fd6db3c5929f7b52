//! Simulation outputs and the external simulator boundary.
//!
//! A simulator is any [`Model`](fitloop_core::Model) whose output is a
//! [`SimulationResult`] and whose error is a
//! [`SimulatorError`](crate::SimulatorError). Each call builds its own
//! simulation from the input setup, so calls never share state.
//!
//! [`ProcessSimulator`] runs an external program per call.

mod process;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SimulationFailure;

pub use process::ProcessSimulator;

/// Samples recorded at one named probe during a simulation run.
///
/// Each sample is an `(independent, dependent)` pair, typically
/// `(step, value)`, in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationHistory {
    probe: String,
    samples: Vec<(f64, f64)>,
}

impl ObservationHistory {
    /// Creates an empty history for `probe`.
    pub fn new(probe: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            samples: Vec::new(),
        }
    }

    /// Appends a sample.
    pub fn push(&mut self, independent: f64, dependent: f64) {
        self.samples.push((independent, dependent));
    }

    #[must_use]
    pub fn probe(&self) -> &str {
        &self.probe
    }

    #[must_use]
    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Returns the dependent values in sample order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|&(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The histories produced by one simulation run.
///
/// Histories are read-only once the run has completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    histories: Vec<ObservationHistory>,
}

impl SimulationResult {
    #[must_use]
    pub fn new(histories: Vec<ObservationHistory>) -> Self {
        Self { histories }
    }

    #[must_use]
    pub fn histories(&self) -> &[ObservationHistory] {
        &self.histories
    }

    /// Looks up the history recorded at `probe`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationFailure::MissingProbe`] if no history has that name.
    pub fn history(&self, probe: &str) -> Result<&ObservationHistory, SimulationFailure> {
        self.histories
            .iter()
            .find(|h| h.probe == probe)
            .ok_or_else(|| SimulationFailure::MissingProbe {
                probe: probe.to_owned(),
            })
    }
}

/// Bounds on a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunBudget {
    /// Number of time steps the simulation executes.
    pub max_steps: usize,
    /// Wall-clock limit, after which the run is abandoned.
    pub time_limit: Option<Duration>,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            time_limit: None,
        }
    }
}
