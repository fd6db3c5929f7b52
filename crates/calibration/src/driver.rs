//! Drives a derivative-free search over a [`CalibrationModel`].
//!
//! The driver wraps the model as a solver model, runs Nelder–Mead in the
//! direction of the configured [`Goal`], and turns the outcome into a
//! [`CalibrationReport`]. Failed simulations are ranked worst so the simplex
//! moves away from them; fatal model errors end the run with a
//! [`DriverFailure`] that still carries the best point found.
//!
//! Budgets (iterations, evaluations, wall clock) and cancellation are checked
//! between evaluations, never in the middle of one. With
//! [`Parallelism::Rayon`] a batch of simplex points runs to completion first.

mod report;
mod supervisor;


use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use fitloop_core::{Model, OptimizationProblem};
use fitloop_observers::{CancelToken, EvaluationBudget, ProgressObserver};
use fitloop_solvers::optimization::{
    Parallelism,
    nelder_mead::{self, Solution, Status},
};
use tracing::{info, warn};

use crate::{
    CalibrationError, CalibrationModel, ConfigurationError, Fitness, Goal, InvalidParameterError,
};

pub use report::{CalibrationReport, DriverFailure, DriverState, StopReason};

use supervisor::{SearchStats, Supervisor};

/// Settings for one calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub initial_guess: Vec<f64>,
    pub goal: Goal,
    pub max_iters: usize,
    pub max_evals: Option<usize>,
    pub time_limit: Option<Duration>,
    pub x_abs_tol: f64,
    pub f_abs_tol: f64,
    pub parallelism: Parallelism,
}

impl DriverConfig {
    pub const DEFAULT_MAX_ITERS: usize = 10;
    pub const DEFAULT_TOL: f64 = 1e-4;

    /// Creates a config that minimizes from `initial_guess` with default budgets.
    #[must_use]
    pub fn new(initial_guess: Vec<f64>) -> Self {
        Self {
            initial_guess,
            goal: Goal::Minimize,
            max_iters: Self::DEFAULT_MAX_ITERS,
            max_evals: None,
            time_limit: None,
            x_abs_tol: Self::DEFAULT_TOL,
            f_abs_tol: Self::DEFAULT_TOL,
            parallelism: Parallelism::Sequential,
        }
    }
}

/// Reported after each evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Evaluations so far, counting from 1.
    pub evaluation: usize,
    /// Search iteration, 0 while the initial simplex is evaluated.
    pub iteration: usize,
    pub best_fitness: Option<Fitness>,
}

type ProgressCallback = Box<dyn FnMut(&Progress) + Send>;

/// Runs a calibration of one model.
pub struct CalibrationDriver<M> {
    model: M,
    config: DriverConfig,
    solver: nelder_mead::Config,
    state: DriverState,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
    report: Option<CalibrationReport>,
}

impl<M: CalibrationModel> CalibrationDriver<M> {
    /// Creates a driver in the [`DriverState::Initialized`] state.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidParameter`] if the initial guess does
    /// not match the model's input size, or
    /// [`CalibrationError::Configuration`] for a non-finite guess or invalid
    /// solver settings.
    pub fn new(model: M, config: DriverConfig) -> Result<Self, CalibrationError> {
        let expected = model.input_size();
        if config.initial_guess.len() != expected {
            return Err(InvalidParameterError {
                expected,
                actual: config.initial_guess.len(),
            }
            .into());
        }
        if config.initial_guess.iter().any(|v| !v.is_finite()) {
            return Err(ConfigurationError::Invalid(format!(
                "initial guess must be finite, got {:?}",
                config.initial_guess
            ))
            .into());
        }

        let solver = nelder_mead::Config::new(config.max_iters, config.x_abs_tol, config.f_abs_tol)
            .map_err(ConfigurationError::from)?
            .with_parallelism(config.parallelism);

        Ok(Self {
            model,
            config,
            solver,
            state: DriverState::Initialized,
            progress: None,
            cancel: CancelToken::new(),
            report: None,
        })
    }

    /// Calls `callback` after every evaluation.
    #[must_use]
    pub fn with_progress(mut self, callback: impl FnMut(&Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// A token that stops the run at the next evaluation boundary.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The report of the finished run, if any.
    #[must_use]
    pub fn report(&self) -> Option<&CalibrationReport> {
        self.report.as_ref()
    }

    /// Runs the search to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverFailure`] if the model reports a fatal error, or if
    /// the driver has already run.
    pub fn run(&mut self) -> Result<CalibrationReport, DriverFailure> {
        if self.state != DriverState::Initialized {
            return Err(DriverFailure {
                error: ConfigurationError::Invalid(format!(
                    "driver already ran and is {:?}",
                    self.state
                ))
                .into(),
                report: self
                    .report
                    .clone()
                    .unwrap_or_else(|| CalibrationReport::empty(self.state)),
            });
        }

        self.state = DriverState::Searching;
        let started = Instant::now();
        info!(
            model = self.model.name(),
            guess = ?self.config.initial_guess,
            goal = ?self.config.goal,
            max_iters = self.config.max_iters,
            "calibration started"
        );

        let evaluator = Evaluator {
            model: &self.model,
            calls: AtomicUsize::new(0),
        };
        let objective = Objective {
            dimension: self.model.input_size(),
            goal: self.config.goal,
        };

        let mut budget = EvaluationBudget::unlimited();
        if let Some(max_evals) = self.config.max_evals {
            budget = budget.with_max_evals(max_evals);
        }
        if let Some(time_limit) = self.config.time_limit {
            budget = budget.with_time_limit(time_limit);
        }

        let callback = &mut self.progress;
        let progress = ProgressObserver::new(self.config.goal.into(), |p: &fitloop_observers::Progress| {
            if let Some(callback) = callback.as_mut() {
                callback(&Progress {
                    evaluation: p.evaluation,
                    iteration: p.iteration,
                    best_fitness: p.best.map(Fitness::from_raw),
                });
            }
        });

        let mut stats = SearchStats::default();
        let supervisor = Supervisor {
            stats: &mut stats,
            budget,
            cancel: self.cancel.clone(),
            progress,
        };

        let initial = &self.config.initial_guess;
        let outcome = match self.config.goal {
            Goal::Minimize => {
                nelder_mead::minimize(&evaluator, &objective, initial, &self.solver, supervisor)
            }
            Goal::Maximize => {
                nelder_mead::maximize(&evaluator, &objective, initial, &self.solver, supervisor)
            }
        };

        let elapsed = started.elapsed();
        let evaluations = evaluator.calls.load(Ordering::Relaxed);
        let result = conclude(outcome, stats, evaluations, elapsed);
        let report = match &result {
            Ok(report) => {
                info!(
                    state = ?report.state,
                    reason = ?report.stop_reason,
                    best = ?report.best_parameters,
                    fitness = ?report.best_fitness,
                    evaluations = report.evaluations,
                    elapsed = ?elapsed,
                    "calibration finished"
                );
                report
            }
            Err(failure) => {
                warn!(error = %failure.error, evaluations = failure.report.evaluations, "calibration failed");
                &failure.report
            }
        };
        self.state = report.state;
        self.report = Some(report.clone());
        result
    }
}

/// Maps the solver outcome onto a report.
fn conclude(
    outcome: Result<Solution<Vec<f64>, Fitness>, nelder_mead::Error>,
    stats: SearchStats,
    evaluations: usize,
    elapsed: Duration,
) -> Result<CalibrationReport, DriverFailure> {
    match outcome {
        Ok(solution) => {
            let (state, reason) = match solution.status {
                Status::Converged => (DriverState::Converged, StopReason::Converged),
                Status::MaxIters => (DriverState::Exhausted, StopReason::IterationBudget),
                Status::StoppedByObserver => (
                    DriverState::Exhausted,
                    stats.stop.unwrap_or(StopReason::Cancelled),
                ),
            };
            Ok(CalibrationReport {
                state,
                stop_reason: Some(reason),
                best_parameters: Some(solution.x),
                best_fitness: Some(solution.snapshot.output),
                iterations: solution.iters,
                evaluations,
                failed_evaluations: stats.failed,
                elapsed,
            })
        }
        Err(err) => {
            let error = match err {
                nelder_mead::Error::Model(source) => match source.downcast::<CalibrationError>() {
                    Ok(error) => *error,
                    Err(other) => CalibrationError::Search(nelder_mead::Error::Model(other)),
                },
                other => CalibrationError::Search(other),
            };
            let best = stats.best_before_failure;
            let report = CalibrationReport {
                state: DriverState::Failed,
                stop_reason: Some(StopReason::ModelError),
                best_fitness: best.as_ref().map(|v| Fitness::from_raw(v.objective)),
                best_parameters: best.map(|v| v.x),
                iterations: stats.iteration,
                evaluations,
                failed_evaluations: stats.failed,
                elapsed,
            };
            Err(DriverFailure { error, report })
        }
    }
}

/// Presents a calibration model to the solver and counts every call, including
/// calls in a parallel batch that the search never got to observe.
struct Evaluator<'m, M> {
    model: &'m M,
    calls: AtomicUsize,
}

impl<M: CalibrationModel> Model for Evaluator<'_, M> {
    type Input = Vec<f64>;
    type Output = Fitness;
    type Error = CalibrationError;

    fn call(&self, parameters: &Vec<f64>) -> Result<Fitness, CalibrationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.model.evaluate(parameters)
    }
}

/// Solver variables are the model parameters; failures rank worst.
struct Objective {
    dimension: usize,
    goal: Goal,
}

impl OptimizationProblem for Objective {
    type Input = Vec<f64>;
    type Output = Fitness;
    type Error = Infallible;

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn input(&self, x: &[f64]) -> Result<Vec<f64>, Infallible> {
        Ok(x.to_vec())
    }

    fn objective(&self, _parameters: &Vec<f64>, fitness: &Fitness) -> Result<f64, Infallible> {
        Ok(fitness.penalized(self.goal))
    }
}
