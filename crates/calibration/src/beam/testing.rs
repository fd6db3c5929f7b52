//! A stand-in beam simulator and measured band for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use fitloop_core::Model;

use crate::{
    ObservationHistory, ReferenceCurve, SimulationFailure, SimulationResult, SimulatorError,
    reference::ReferenceFormat,
};

use super::{BeamSetup, CMOD_LEFT, CMOD_RIGHT, PENETRATOR};

/// A measured force band around `F = 0.8 kN/mm × CMOD`.
pub const BAND: &str = "\
# cmod [mm], lower [kN], upper [kN]
cmod,lower,upper
0,0,0
0.025,0.015,0.025
0.05,0.03,0.05
0.075,0.05,0.07
";

/// Parses [`BAND`].
///
/// # Panics
///
/// Never in practice; the fixture is known to parse.
#[must_use]
pub fn band_reference() -> ReferenceCurve {
    ReferenceCurve::from_reader(BAND.as_bytes(), ReferenceFormat::default())
        .expect("band fixture parses")
}

/// A beam simulator with a linear load–CMOD response.
///
/// The crack opens 0.01 mm per step and the force is `k` kN/mm times the
/// opening. Runs with a negative `k`, or with `alpha` above the divergence
/// threshold, diverge.
#[derive(Debug)]
pub struct LinearCrack {
    runs: AtomicUsize,
    divergent_alpha: f64,
}

impl LinearCrack {
    #[must_use]
    pub fn new() -> Self {
        Self::diverging_above(f64::INFINITY)
    }

    #[must_use]
    pub fn diverging_above(alpha: f64) -> Self {
        Self {
            runs: AtomicUsize::new(0),
            divergent_alpha: alpha,
        }
    }

    /// Number of simulations started so far.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Default for LinearCrack {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for LinearCrack {
    type Input = BeamSetup;
    type Output = SimulationResult;
    type Error = SimulatorError;

    fn call(&self, setup: &BeamSetup) -> Result<SimulationResult, SimulatorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let law = setup.bond_law;
        if law.k < 0.0 {
            return Err(SimulationFailure::Diverged { step: Some(1) }.into());
        }
        if law.alpha > self.divergent_alpha {
            return Err(SimulationFailure::Diverged { step: Some(3) }.into());
        }

        let mut left = ObservationHistory::new(CMOD_LEFT);
        let mut right = ObservationHistory::new(CMOD_RIGHT);
        let mut penetrator = ObservationHistory::new(PENETRATOR);
        for step in 0..=10 {
            let t = f64::from(step);
            let opening = t * 1e-5; // m
            left.push(t, -0.5 * opening);
            right.push(t, 0.5 * opening);
            penetrator.push(t, -law.k * opening * 1e6); // N
        }
        Ok(SimulationResult::new(vec![left, right, penetrator]))
    }
}
