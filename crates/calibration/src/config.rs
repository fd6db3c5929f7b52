//! Session configuration loaded from TOML.
//!
//! ```toml
//! [reference]
//! path = "beam.csv"
//!
//! [driver]
//! initial_guess = [0.8, 200.0]
//! max_iters = 10
//!
//! [simulator]
//! program = "beam-sim"
//! time_limit_secs = 600
//!
//! [beam]
//! target = "midpoint"
//! ```
//!
//! Relative reference paths are resolved against the config file's directory.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use fitloop_solvers::optimization::Parallelism;

use crate::{
    ConfigurationError, Goal,
    beam::{BeamConfig, DEFAULT_INITIAL_GUESS},
    driver::DriverConfig,
    reference::ReferenceFormat,
    simulation::RunBudget,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub driver: DriverSettings,
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub beam: BeamConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub format: ReferenceFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub initial_guess: Vec<f64>,
    pub goal: Goal,
    pub max_iters: usize,
    pub max_evals: Option<usize>,
    pub time_limit_secs: Option<f64>,
    pub x_abs_tol: f64,
    pub f_abs_tol: f64,
    /// Evaluate independent simplex points concurrently.
    pub parallel: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS.to_vec(),
            goal: Goal::Minimize,
            max_iters: DriverConfig::DEFAULT_MAX_ITERS,
            max_evals: None,
            time_limit_secs: None,
            x_abs_tol: DriverConfig::DEFAULT_TOL,
            f_abs_tol: DriverConfig::DEFAULT_TOL,
            parallel: false,
        }
    }
}

impl DriverSettings {
    /// Converts these settings into a driver config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] for a negative or non-finite
    /// time limit.
    pub fn to_driver_config(&self) -> Result<DriverConfig, ConfigurationError> {
        Ok(DriverConfig {
            initial_guess: self.initial_guess.clone(),
            goal: self.goal,
            max_iters: self.max_iters,
            max_evals: self.max_evals,
            time_limit: seconds("driver.time_limit_secs", self.time_limit_secs)?,
            x_abs_tol: self.x_abs_tol,
            f_abs_tol: self.f_abs_tol,
            parallelism: if self.parallel {
                Parallelism::Rayon
            } else {
                Parallelism::Sequential
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulatorConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
}

fn default_max_steps() -> usize {
    RunBudget::default().max_steps
}

impl SimulatorConfig {
    /// Bounds applied to every simulation run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] for a negative or non-finite
    /// time limit.
    pub fn budget(&self) -> Result<RunBudget, ConfigurationError> {
        Ok(RunBudget {
            max_steps: self.max_steps,
            time_limit: seconds("simulator.time_limit_secs", self.time_limit_secs)?,
        })
    }
}

fn seconds(key: &str, secs: Option<f64>) -> Result<Option<Duration>, ConfigurationError> {
    secs.map(|secs| {
        Duration::try_from_secs_f64(secs)
            .map_err(|_| ConfigurationError::Invalid(format!("{key} must be a non-negative number, got {secs}")))
    })
    .transpose()
}

impl SessionConfig {
    /// Loads a session config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the file is missing, unreadable,
    /// or not a valid session config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;

        if let Some(dir) = path.parent() {
            if config.reference.path.is_relative() {
                config.reference.path = dir.join(&config.reference.path);
            }
        }
        Ok(config)
    }

    /// Parses a session config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Toml`] if the text is not a valid
    /// session config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(content)?)
    }
}
