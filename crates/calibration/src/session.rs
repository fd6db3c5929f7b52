//! An explicitly owned calibration session.
//!
//! A session ties one reference curve, one simulator and one beam model to
//! the driver settings that search over them. Everything that can fail to
//! load is loaded when the session is built, so a session that exists is
//! ready to run.

use std::{path::Path, sync::Arc};

use tracing::info;

use fitloop_core::Model;

use crate::{
    CalibrationDriver, CalibrationError, CalibrationReport, ConfigurationError, DriverConfig,
    DriverFailure, DriverState, ReferenceCurve, SessionConfig, SimulationResult, SimulatorError,
    beam::{BeamModel, BeamSetup},
    simulation::ProcessSimulator,
};

pub struct CalibrationSession<S> {
    config: SessionConfig,
    driver_config: DriverConfig,
    reference: Arc<ReferenceCurve>,
    model: BeamModel<S>,
}

impl CalibrationSession<ProcessSimulator<BeamSetup>> {
    /// Loads a session from a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the config, the reference data or
    /// the simulator program cannot be loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        Self::from_config(SessionConfig::load(path)?)
    }

    /// Builds a session that runs the configured simulator program.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the reference data cannot be
    /// loaded, a time limit is invalid, or an explicit simulator path does
    /// not exist.
    pub fn from_config(config: SessionConfig) -> Result<Self, ConfigurationError> {
        let settings = &config.simulator;
        let program = settings.program.as_path();
        // Bare names are looked up on PATH at spawn time.
        if program.components().count() > 1 && !program.exists() {
            return Err(ConfigurationError::SimulatorNotFound {
                program: program.to_path_buf(),
            });
        }

        let simulator = ProcessSimulator::new(program)
            .with_args(settings.args.iter().cloned())
            .with_time_limit(settings.budget()?.time_limit);
        Self::with_simulator(config, simulator)
    }
}

impl<S> CalibrationSession<S>
where
    S: Model<Input = BeamSetup, Output = SimulationResult, Error = SimulatorError> + Send + Sync,
{
    /// Builds a session around any beam simulator.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the reference data cannot be
    /// loaded or the settings are invalid.
    pub fn with_simulator(config: SessionConfig, simulator: S) -> Result<Self, ConfigurationError> {
        let reference = Arc::new(ReferenceCurve::load(
            &config.reference.path,
            config.reference.format,
        )?);
        let driver_config = config.driver.to_driver_config()?;
        let budget = config.simulator.budget()?;
        let model = BeamModel::new(simulator, &reference, config.beam, budget)?;

        info!(
            reference = %config.reference.path.display(),
            samples = reference.len(),
            target = ?config.beam.target,
            "calibration session ready"
        );
        Ok(Self {
            config,
            driver_config,
            reference,
            model,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceCurve {
        &self.reference
    }

    #[must_use]
    pub fn model(&self) -> &BeamModel<S> {
        &self.model
    }

    /// Overrides the driver settings taken from the config.
    #[must_use]
    pub fn with_driver_config(mut self, driver_config: DriverConfig) -> Self {
        self.driver_config = driver_config;
        self
    }

    #[must_use]
    pub fn driver_config(&self) -> &DriverConfig {
        &self.driver_config
    }

    /// Creates a driver over this session's model.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] if the driver settings do not fit the
    /// model.
    pub fn driver(&self) -> Result<CalibrationDriver<&BeamModel<S>>, CalibrationError> {
        CalibrationDriver::new(&self.model, self.driver_config.clone())
    }

    /// Runs one calibration to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverFailure`] if the driver cannot be created or the
    /// model fails fatally.
    pub fn run(&self) -> Result<CalibrationReport, DriverFailure> {
        let mut driver = self.driver().map_err(|error| DriverFailure {
            error,
            report: CalibrationReport::empty(DriverState::Failed),
        })?;
        driver.run()
    }
}
