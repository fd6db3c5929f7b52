//! Parameter calibration of black-box simulations against reference data.
//!
//! A calibration proposes a parameter vector, runs the simulation, aligns the
//! simulated curve with a measured reference curve, reduces the comparison to
//! a scalar [`Fitness`], and lets a Nelder–Mead search propose the next vector.
//!
//! # Modules
//!
//! - [`simulation`]: observation histories and the external simulator boundary
//! - [`curve`]: curves, monotone envelopes and alignment onto a reference grid
//! - [`objective`]: mean squared error with an explicit non-finite policy
//! - [`model`]: the [`CalibrationModel`] contract and its analytic variant
//! - [`beam`]: three-point bending of a notched beam
//! - [`driver`]: the search state machine and its report
//! - [`config`]: the TOML session config
//! - [`session`]: an explicitly owned calibration session built from config

pub mod beam;
pub mod config;
pub mod curve;
pub mod driver;
mod error;
mod fitness;
pub mod model;
pub mod objective;
mod parameters;
pub mod reference;
pub mod session;
pub mod simulation;

pub use config::SessionConfig;
pub use curve::{AlignedCurvePair, Curve, align};
pub use driver::{
    CalibrationDriver, CalibrationReport, DriverConfig, DriverFailure, DriverState, StopReason,
};
pub use error::{
    AlignError, CalibrationError, ConfigurationError, InvalidParameterError, SimulationFailure,
    SimulatorError,
};
pub use fitness::{Fitness, Goal};
pub use model::{AnalyticModel, CalibrationModel};
pub use parameters::ParameterVector;
pub use reference::ReferenceCurve;
pub use session::CalibrationSession;
pub use simulation::{ObservationHistory, SimulationResult};
