use rayon::prelude::*;
use thiserror::Error;

use fitloop_core::{Model, OptimizationProblem, Snapshot};

/// The result of evaluating an optimization problem at a given `x`.
#[derive(Debug, Clone)]
pub struct Evaluation<I, O> {
    pub x: Vec<f64>,
    pub objective: f64,
    pub snapshot: Snapshot<I, O>,
}

/// Errors that can occur when evaluating an optimization problem.
#[derive(Debug, Error)]
pub enum EvalError<ME, PE> {
    /// The model call failed.
    #[error("model call failed")]
    Model(#[source] ME),
    /// Failed to construct input or compute the objective.
    #[error("problem error")]
    Problem(#[source] PE),
}

/// Type alias for the result of [`evaluate`].
pub type EvaluateResult<M, P> = Result<
    Evaluation<<M as Model>::Input, <M as Model>::Output>,
    EvalError<<M as Model>::Error, <P as OptimizationProblem>::Error>,
>;

/// How a batch of independent evaluations is dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// Evaluate one point after another on the calling thread.
    #[default]
    Sequential,
    /// Evaluate points concurrently on the rayon global thread pool.
    Rayon,
}

/// Evaluates the model in the context of an optimization problem.
///
/// This function maps `x` to model input, calls the model, then computes
/// the objective from the input and output.
///
/// # Errors
///
/// Returns an error if input mapping, model call, or objective computation fails.
pub fn evaluate<M, P>(model: &M, problem: &P, x: &[f64]) -> EvaluateResult<M, P>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    let input = problem.input(x).map_err(EvalError::Problem)?;
    let output = model.call(&input).map_err(EvalError::Model)?;
    let objective = problem
        .objective(&input, &output)
        .map_err(EvalError::Problem)?;

    Ok(Evaluation {
        x: x.to_vec(),
        objective,
        snapshot: Snapshot::new(input, output),
    })
}

/// Evaluates a batch of independent points.
///
/// The returned results are in the same order as `points`, whatever order
/// the evaluations actually completed in.
pub fn evaluate_batch<M, P>(
    model: &M,
    problem: &P,
    points: &[Vec<f64>],
    parallelism: Parallelism,
) -> Vec<EvaluateResult<M, P>>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
{
    match parallelism {
        Parallelism::Sequential => points
            .iter()
            .map(|x| evaluate(model, problem, x))
            .collect(),
        Parallelism::Rayon => points
            .par_iter()
            .map(|x| evaluate(model, problem, x))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use approx::assert_relative_eq;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("negative input")]
    struct Negative;

    /// Squares the first variable, failing for negative input.
    struct Square {
        calls: AtomicUsize,
    }

    impl Model for Square {
        type Input = f64;
        type Output = f64;
        type Error = Negative;

        fn call(&self, x: &f64) -> Result<f64, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *x < 0.0 { Err(Negative) } else { Ok(x * x) }
        }
    }

    struct FirstVariable;

    impl OptimizationProblem for FirstVariable {
        type Input = f64;
        type Output = f64;
        type Error = Negative;

        fn dimension(&self) -> usize {
            1
        }

        fn input(&self, x: &[f64]) -> Result<f64, Self::Error> {
            Ok(x[0])
        }

        fn objective(&self, _input: &f64, output: &f64) -> Result<f64, Self::Error> {
            Ok(*output)
        }
    }

    fn square() -> Square {
        Square {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn evaluate_captures_snapshot() {
        let eval = evaluate(&square(), &FirstVariable, &[3.0]).unwrap();
        assert_eq!(eval.x, vec![3.0]);
        assert_relative_eq!(eval.objective, 9.0);
        assert_relative_eq!(eval.snapshot.input, 3.0);
        assert_relative_eq!(eval.snapshot.output, 9.0);
    }

    #[test]
    fn evaluate_reports_model_failure() {
        let result = evaluate(&square(), &FirstVariable, &[-1.0]);
        assert!(matches!(result, Err(EvalError::Model(Negative))));
    }

    #[test]
    fn batch_results_keep_point_order() {
        let points: Vec<Vec<f64>> = (0..32).map(|i| vec![f64::from(i)]).collect();

        for parallelism in [Parallelism::Sequential, Parallelism::Rayon] {
            let model = square();
            let results = evaluate_batch(&model, &FirstVariable, &points, parallelism);

            assert_eq!(results.len(), points.len());
            assert_eq!(model.calls.load(Ordering::SeqCst), points.len());
            for (point, result) in points.iter().zip(&results) {
                let eval = result.as_ref().unwrap();
                assert_eq!(&eval.x, point);
                assert_relative_eq!(eval.objective, point[0] * point[0]);
            }
        }
    }

    #[test]
    fn batch_keeps_failures_in_place() {
        let points = vec![vec![1.0], vec![-2.0], vec![3.0]];
        let results = evaluate_batch(&square(), &FirstVariable, &points, Parallelism::Rayon);

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EvalError::Model(Negative))));
        assert!(results[2].is_ok());
    }
}
