//! Three-point bending of a notched concrete beam.
//!
//! A 175 × 50 mm beam with a central notch rests on two supports and is
//! loaded at mid-span by a penetrator moving down at a fixed rate per step.
//! The calibrated parameters are the nonlinear bond law's `k` and `alpha`,
//! in that order. The simulated load–CMOD curve is compared with a measured
//! band of forces.
//!
//! The simulation itself is external: [`BeamModel`] builds a [`BeamSetup`]
//! and hands it to any simulator [`Model`].

use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{Force, Length, MassDensity, Pressure},
    force::{kilonewton, newton},
    length::{meter, millimeter},
    mass_density::kilogram_per_cubic_meter,
    pressure::{gigapascal, megapascal},
};

use fitloop_core::Model;

use crate::{
    CalibrationError, ConfigurationError, Curve, Fitness, InvalidParameterError, ParameterVector,
    ReferenceCurve, SimulationFailure, SimulationResult, SimulatorError, align,
    model::{CalibrationModel, run_and_score},
    objective::score,
    simulation::RunBudget,
};

/// Parameter names in vector order.
pub const PARAMETERS: [&str; 2] = ["k", "alpha"];

/// Initial guess used when none is configured.
pub const DEFAULT_INITIAL_GUESS: [f64; 2] = [0.8, 200.0];

pub const PENETRATOR: &str = "Penetrator";
pub const SUPPORT_LEFT: &str = "Support - left";
pub const SUPPORT_RIGHT: &str = "Support - right";
pub const CMOD_LEFT: &str = "CMOD - left";
pub const CMOD_RIGHT: &str = "CMOD - right";

/// Fewest paired samples a run must produce to be compared.
const MIN_SAMPLES: usize = 2;

fn mm(value: f64) -> Length {
    Length::new::<millimeter>(value)
}

/// Beam dimensions and particle spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub particle_spacing: Length,
    pub length: Length,
    pub depth: Length,
}

impl Geometry {
    /// Number of particles along the length and the depth.
    #[must_use]
    pub fn divisions(&self) -> [usize; 2] {
        // Extents are positive multiples of the spacing.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = |extent: Length| (extent / self.particle_spacing).value.round() as usize;
        [count(self.length), count(self.depth)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub elastic_modulus: Pressure,
    /// Fracture energy in J/m².
    pub fracture_energy: f64,
    pub density: MassDensity,
    pub tensile_strength: Pressure,
}

/// A rigid circular body that either loads the beam or supports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penetrator {
    pub name: String,
    pub centre: [Length; 2],
    pub direction: [f64; 2],
    /// Displacement per time step.
    pub velocity: [Length; 2],
    pub radius: Length,
}

/// A point whose displacement is recorded every `period` steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub name: String,
    pub position: [Length; 2],
    pub period: usize,
}

/// The nonlinear bond law being calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondLaw {
    pub k: f64,
    pub alpha: f64,
    pub surface_correction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub time_steps: usize,
    pub damping: f64,
}

/// Everything a simulator needs to run one beam simulation.
///
/// Quantities serialize in SI base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSetup {
    pub geometry: Geometry,
    pub divisions: [usize; 2],
    pub notch: [[Length; 2]; 2],
    pub material: Material,
    pub penetrators: Vec<Penetrator>,
    pub probes: Vec<Probe>,
    pub bond_law: BondLaw,
    pub run: RunSettings,
}

impl BeamSetup {
    /// Builds the setup for bond law parameters `k` and `alpha`.
    #[must_use]
    pub fn new(k: f64, alpha: f64, time_steps: usize, damping: f64) -> Self {
        let geometry = Geometry {
            particle_spacing: mm(2.5),
            length: mm(175.0),
            depth: mm(50.0),
        };
        let Geometry {
            particle_spacing: dx,
            length,
            depth,
        } = geometry;

        let notch_x = length * 0.5 + dx * 0.5;
        let radius = mm(25.0);
        let zero = mm(0.0);

        let support = |name: &str, x: Length| Penetrator {
            name: name.to_owned(),
            centre: [x, -radius],
            direction: [0.0, 0.0],
            velocity: [zero, zero],
            radius,
        };
        let probe = |name: &str, x: Length| Probe {
            name: name.to_owned(),
            position: [x, zero],
            period: 1,
        };

        Self {
            geometry,
            divisions: geometry.divisions(),
            notch: [[notch_x, zero], [notch_x, depth * 0.5]],
            material: Material {
                name: "quasi-brittle".to_owned(),
                elastic_modulus: Pressure::new::<gigapascal>(37.0),
                fracture_energy: 143.2,
                density: MassDensity::new::<kilogram_per_cubic_meter>(2346.0),
                tensile_strength: Pressure::new::<megapascal>(3.9),
            },
            penetrators: vec![
                Penetrator {
                    name: PENETRATOR.to_owned(),
                    centre: [length * 0.5, depth + radius - dx],
                    direction: [0.0, 1.0],
                    velocity: [zero, mm(-0.4)],
                    radius,
                },
                support(SUPPORT_LEFT, depth * 0.5),
                support(SUPPORT_RIGHT, depth * 3.0),
            ],
            probes: vec![probe(CMOD_LEFT, mm(77.5)), probe(CMOD_RIGHT, mm(97.5))],
            bond_law: BondLaw {
                k,
                alpha,
                surface_correction: true,
            },
            run: RunSettings {
                time_steps,
                damping,
            },
        }
    }
}

/// Which part of the measured force band the simulation is compared with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandTarget {
    #[default]
    Midpoint,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    pub target: BandTarget,
    pub damping: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            target: BandTarget::Midpoint,
            damping: 0.0,
        }
    }
}

/// Extracts the load–CMOD curve from a beam simulation.
///
/// `CMOD [mm] = (u_right − u_left) × 10³` from the two CMOD probes, and
/// `F [kN] = −F_penetrator [N] / 10³` since the penetrator reaction is
/// negative under downward loading. Histories are paired by sample index up
/// to the shortest one.
///
/// # Errors
///
/// Returns a [`SimulationFailure`] if a history is missing or too short.
pub fn extract(result: &SimulationResult) -> Result<Curve, SimulationFailure> {
    let left = result.history(CMOD_LEFT)?;
    let right = result.history(CMOD_RIGHT)?;
    let penetrator = result.history(PENETRATOR)?;

    let shortest = [left, right, penetrator]
        .into_iter()
        .min_by_key(|h| h.len())
        .unwrap_or(left);
    if shortest.len() < MIN_SAMPLES {
        return Err(SimulationFailure::TooFewSamples {
            probe: shortest.probe().to_owned(),
            len: shortest.len(),
            min: MIN_SAMPLES,
        });
    }

    Ok(left
        .values()
        .zip(right.values())
        .zip(penetrator.values())
        .map(|((u_left, u_right), reaction)| {
            let cmod = Length::new::<meter>(u_right - u_left).get::<millimeter>();
            let force = -Force::new::<newton>(reaction).get::<kilonewton>();
            (cmod, force)
        })
        .collect())
}

/// Calibrates the bond law of a notched beam in three-point bending.
pub struct BeamModel<S> {
    simulator: S,
    target: Curve,
    budget: RunBudget,
    damping: f64,
}

impl<S> BeamModel<S>
where
    S: Model<Input = BeamSetup, Output = SimulationResult, Error = SimulatorError> + Send + Sync,
{
    /// Creates a beam model comparing against `reference`.
    ///
    /// The reference must hold CMOD [mm] followed by the lower and upper
    /// force bounds [kN].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the reference lacks the columns
    /// the configured target needs.
    pub fn new(
        simulator: S,
        reference: &ReferenceCurve,
        config: BeamConfig,
        budget: RunBudget,
    ) -> Result<Self, ConfigurationError> {
        let target = match config.target {
            BandTarget::Midpoint => reference.band_midpoint(),
            BandTarget::Lower => reference.column(0),
            BandTarget::Upper => reference.column(1),
        }
        .ok_or_else(|| {
            ConfigurationError::Invalid(format!(
                "beam reference needs CMOD, lower and upper force columns, found {}",
                reference.names().join(", ")
            ))
        })?;

        Ok(Self {
            simulator,
            target,
            budget,
            damping: config.damping,
        })
    }

    #[must_use]
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// The reference curve simulations are compared with.
    #[must_use]
    pub fn target(&self) -> &Curve {
        &self.target
    }

    /// Builds the simulation setup for `parameters`.
    #[must_use]
    pub fn setup(&self, parameters: &ParameterVector) -> BeamSetup {
        BeamSetup::new(
            parameters[0],
            parameters[1],
            self.budget.max_steps,
            self.damping,
        )
    }

    /// Runs one simulation with a freshly built setup.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameters` does not hold `[k, alpha]` or the
    /// simulator fails.
    pub fn run(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
        if parameters.len() != PARAMETERS.len() {
            return Err(InvalidParameterError {
                expected: PARAMETERS.len(),
                actual: parameters.len(),
            }
            .into());
        }
        let setup = self.setup(parameters);
        Ok(self.simulator.call(&setup)?)
    }
}

impl<S> CalibrationModel for BeamModel<S>
where
    S: Model<Input = BeamSetup, Output = SimulationResult, Error = SimulatorError> + Send + Sync,
{
    fn name(&self) -> &str {
        "beam"
    }

    fn input_size(&self) -> usize {
        PARAMETERS.len()
    }

    fn output_size(&self) -> Result<usize, CalibrationError> {
        Ok(1)
    }

    fn forward(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
        self.run(parameters)
    }

    fn fitness(&self, result: &SimulationResult) -> Result<Fitness, CalibrationError> {
        let simulated = extract(result)?;
        let pair = align(&self.target, &simulated)?;
        Ok(score(&pair))
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError> {
        run_and_score(self, parameters)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing;
