//! The model contract shared by every calibration problem.
//!
//! A [`CalibrationModel`] turns a parameter vector into a [`Fitness`]. Each
//! problem variant implements the operations it supports; the optional ones
//! report [`CalibrationError::Unsupported`] unless overridden.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{CalibrationError, Fitness, ParameterVector, SimulationResult};

/// A calibration problem exposed as a callable objective.
///
/// Implementations must be safe to evaluate from several threads at once.
pub trait CalibrationModel: Send + Sync {
    /// A short name used in logs and reports.
    fn name(&self) -> &str;

    /// Number of parameters this model expects.
    fn input_size(&self) -> usize;

    /// Number of fitness dimensions this model reports.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Unsupported`] unless the model reports one.
    fn output_size(&self) -> Result<usize, CalibrationError> {
        Err(unsupported(self.name(), "output_size"))
    }

    /// Runs the simulation without scoring it.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Unsupported`] unless the model runs a
    /// simulation, or the error from running it.
    fn forward(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
        let _ = parameters;
        Err(unsupported(self.name(), "forward"))
    }

    /// Scores a completed simulation.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Unsupported`] unless the model scores
    /// simulations, or the error from scoring it.
    fn fitness(&self, result: &SimulationResult) -> Result<Fitness, CalibrationError> {
        let _ = result;
        Err(unsupported(self.name(), "fitness"))
    }

    /// Evaluates `parameters` end to end.
    ///
    /// Failures of the simulation itself are scored as [`Fitness::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidParameter`] without running
    /// anything if `parameters` has the wrong length, or any other fatal error.
    fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError>;
}

impl<M: CalibrationModel + ?Sized> CalibrationModel for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn output_size(&self) -> Result<usize, CalibrationError> {
        (**self).output_size()
    }

    fn forward(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
        (**self).forward(parameters)
    }

    fn fitness(&self, result: &SimulationResult) -> Result<Fitness, CalibrationError> {
        (**self).fitness(result)
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError> {
        (**self).evaluate(parameters)
    }
}

impl<M: CalibrationModel + ?Sized> CalibrationModel for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn output_size(&self) -> Result<usize, CalibrationError> {
        (**self).output_size()
    }

    fn forward(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
        (**self).forward(parameters)
    }

    fn fitness(&self, result: &SimulationResult) -> Result<Fitness, CalibrationError> {
        (**self).fitness(result)
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError> {
        (**self).evaluate(parameters)
    }
}

/// Evaluates a model by running [`forward`](CalibrationModel::forward) and
/// then [`fitness`](CalibrationModel::fitness).
///
/// Non-fatal errors from either step become [`Fitness::Failed`].
///
/// # Errors
///
/// Returns [`CalibrationError::InvalidParameter`] before any simulation if
/// `parameters` has the wrong length, and passes fatal errors through.
pub fn run_and_score<M>(model: &M, parameters: &[f64]) -> Result<Fitness, CalibrationError>
where
    M: CalibrationModel + ?Sized,
{
    let parameters = ParameterVector::new(parameters, model.input_size())?;
    let outcome = model
        .forward(&parameters)
        .and_then(|result| model.fitness(&result));
    absorb(model.name(), &parameters, outcome)
}

/// Turns non-fatal errors into [`Fitness::Failed`].
pub(crate) fn absorb(
    model: &str,
    parameters: &[f64],
    outcome: Result<Fitness, CalibrationError>,
) -> Result<Fitness, CalibrationError> {
    match outcome {
        Ok(fitness) => {
            debug!(model, ?parameters, ?fitness, "evaluated");
            Ok(fitness)
        }
        Err(err) if !err.is_fatal() => {
            warn!(model, ?parameters, error = %err, "evaluation failed, scoring as failed");
            Ok(Fitness::Failed)
        }
        Err(err) => Err(err),
    }
}

fn unsupported(model: &str, operation: &'static str) -> CalibrationError {
    CalibrationError::Unsupported {
        model: model.to_owned(),
        operation,
    }
}

/// A closed-form objective with no simulation behind it.
///
/// Useful for exercising the driver and for problems whose discrepancy has
/// an analytic expression. Supports `evaluate` and `output_size` only.
pub struct AnalyticModel<F> {
    name: String,
    input_size: usize,
    objective: F,
}

impl<F> AnalyticModel<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, input_size: usize, objective: F) -> Self {
        Self {
            name: name.into(),
            input_size,
            objective,
        }
    }
}

impl<F> CalibrationModel for AnalyticModel<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> Result<usize, CalibrationError> {
        Ok(1)
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError> {
        let parameters = ParameterVector::new(parameters, self.input_size)?;
        let fitness = Fitness::from_raw((self.objective)(parameters.as_slice()));
        absorb(&self.name, &parameters, Ok(fitness))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{InvalidParameterError, ObservationHistory, SimulationFailure};

    fn paraboloid() -> AnalyticModel<impl Fn(&[f64]) -> f64 + Send + Sync> {
        AnalyticModel::new("paraboloid", 2, |x: &[f64]| {
            (x[0] - 1.0).powi(2) + (x[1] - 2.0).powi(2)
        })
    }

    #[test]
    fn analytic_model_evaluates() {
        let model = paraboloid();
        assert_eq!(model.input_size(), 2);
        assert_eq!(model.output_size().unwrap(), 1);
        assert_eq!(model.evaluate(&[1.0, 2.0]).unwrap(), Fitness::Value(0.0));
        assert_eq!(model.evaluate(&[2.0, 2.0]).unwrap(), Fitness::Value(1.0));
    }

    #[test]
    fn analytic_model_rejects_wrong_arity() {
        let err = paraboloid().evaluate(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidParameter(InvalidParameterError {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn analytic_model_sanitizes_non_finite_values() {
        let model = AnalyticModel::new("log", 1, |x: &[f64]| x[0].ln());
        assert_eq!(model.evaluate(&[-1.0]).unwrap(), Fitness::Failed);
    }

    #[test]
    fn analytic_model_has_no_simulation() {
        let model = paraboloid();
        let params = ParameterVector::new(&[0.0, 0.0], 2).unwrap();

        assert!(matches!(
            model.forward(&params),
            Err(CalibrationError::Unsupported {
                operation: "forward",
                ..
            })
        ));
        assert!(matches!(
            model.fitness(&SimulationResult::default()),
            Err(CalibrationError::Unsupported {
                operation: "fitness",
                ..
            })
        ));
    }

    /// Counts simulations; diverges when the first parameter is negative.
    struct Counting {
        runs: AtomicUsize,
    }

    impl CalibrationModel for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn input_size(&self) -> usize {
            1
        }

        fn forward(&self, parameters: &ParameterVector) -> Result<SimulationResult, CalibrationError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if parameters[0] < 0.0 {
                return Err(SimulationFailure::Diverged { step: None }.into());
            }
            let mut history = ObservationHistory::new("x");
            history.push(0.0, parameters[0]);
            Ok(SimulationResult::new(vec![history]))
        }

        fn fitness(&self, result: &SimulationResult) -> Result<Fitness, CalibrationError> {
            let value = result.history("x")?.samples()[0].1;
            Ok(Fitness::from_raw(value * value))
        }

        fn evaluate(&self, parameters: &[f64]) -> Result<Fitness, CalibrationError> {
            run_and_score(self, parameters)
        }
    }

    fn counting() -> Counting {
        Counting {
            runs: AtomicUsize::new(0),
        }
    }

    #[test]
    fn run_and_score_composes_forward_and_fitness() {
        let model = counting();
        assert_eq!(model.evaluate(&[3.0]).unwrap(), Fitness::Value(9.0));
        assert_eq!(model.runs.load(Ordering::SeqCst), 1);
        assert!(model.output_size().is_err());
    }

    #[test]
    fn simulation_failure_becomes_failed_fitness() {
        let model = counting();
        assert_eq!(model.evaluate(&[-1.0]).unwrap(), Fitness::Failed);
    }

    #[test]
    fn wrong_arity_runs_nothing() {
        let model = counting();
        assert!(model.evaluate(&[1.0, 2.0]).is_err());
        assert_eq!(model.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn references_and_arcs_are_models() {
        fn evaluate_dyn(model: &dyn CalibrationModel) -> Fitness {
            model.evaluate(&[2.0]).unwrap()
        }

        let model = Arc::new(counting());
        assert_eq!((&model).evaluate(&[2.0]).unwrap(), Fitness::Value(4.0));
        assert_eq!(evaluate_dyn(&model), Fitness::Value(4.0));
        assert_eq!(model.runs.load(Ordering::SeqCst), 2);
    }
}
