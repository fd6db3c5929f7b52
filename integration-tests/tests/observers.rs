use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
};

use fitloop_core::{Model, OptimizationProblem};
use fitloop_observers::{
    CancelToken, EvaluationBudget, Progress, ProgressObserver, Sense, TracingObserver,
};
use fitloop_solvers::optimization::{
    Parallelism,
    nelder_mead::{Config, Status, minimize},
};

/// The Rosenbrock function, counting how often it runs.
#[derive(Default)]
struct Rosenbrock {
    calls: AtomicUsize,
}

impl Rosenbrock {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Model for Rosenbrock {
    type Input = Vec<f64>;
    type Output = f64;
    type Error = Infallible;

    fn call(&self, x: &Vec<f64>) -> Result<f64, Infallible> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2))
    }
}

struct Plain;

impl OptimizationProblem for Plain {
    type Input = Vec<f64>;
    type Output = f64;
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn input(&self, x: &[f64]) -> Result<Vec<f64>, Infallible> {
        Ok(x.to_vec())
    }

    fn objective(&self, _: &Vec<f64>, output: &f64) -> Result<f64, Infallible> {
        Ok(*output)
    }
}

#[test]
fn composed_observers_share_one_search() {
    let mut reports = Vec::new();
    let progress = ProgressObserver::new(Sense::Minimize, |p: &Progress| reports.push(*p));
    let budget = EvaluationBudget::unlimited().with_max_evals(40);
    let model = Rosenbrock::default();

    let solution = minimize(
        &model,
        &Plain,
        &[-1.2, 1.0],
        &Config::default(),
        (TracingObserver, (budget, progress)),
    )
    .unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.evals, 40);
    assert_eq!(model.calls(), 40);
    assert_eq!(reports.len(), 40);
    assert_eq!(reports[0].iteration, 0);
    assert_eq!(reports.last().unwrap().iteration, solution.iters);
    assert!(reports.windows(2).all(|w| w[1].best <= w[0].best));
    assert_eq!(reports.last().unwrap().best, Some(solution.objective));
}

#[test]
fn cancelled_token_stops_at_the_first_evaluation() {
    let token = CancelToken::new();
    token.cancel();

    let model = Rosenbrock::default();
    let solution = minimize(&model, &Plain, &[-1.2, 1.0], &Config::default(), token).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.x, vec![-1.2, 1.0]);
    assert_eq!(solution.evals, 1);
    assert_eq!(model.calls(), 1);
}

#[test]
fn evaluation_budget_of_one_runs_the_model_once() {
    let budget = EvaluationBudget::unlimited().with_max_evals(1);
    let model = Rosenbrock::default();

    let solution = minimize(&model, &Plain, &[-1.2, 1.0], &Config::default(), budget).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.evals, 1);
    assert_eq!(model.calls(), 1);
}

#[test]
fn parallel_initial_simplex_counts_every_run() {
    let token = CancelToken::new();
    token.cancel();
    let config = Config::default().with_parallelism(Parallelism::Rayon);
    let model = Rosenbrock::default();

    let solution = minimize(&model, &Plain, &[-1.2, 1.0], &config, token).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(model.calls(), 3);
    assert_eq!(solution.evals, model.calls());
}
