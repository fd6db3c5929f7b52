use fitloop_core::{Model, Observer, OptimizationProblem};

use super::{
    Action, Config, Error, Event, Solution, Step,
    search::{Batch, evaluate_points},
    simplex::Simplex,
    solution::Status,
    state::{State, Tracker},
};

pub(super) enum InitResult<I, O> {
    Continue(State<I, O>),
    StopEarly(Solution<I, O>),
}

/// Builds and evaluates the initial simplex around `initial`.
///
/// The `N + 1` points are observed in vertex order. At least one evaluation
/// must succeed for the search to continue.
pub(super) fn init<M, P, Obs, F>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
    observer: &mut Obs,
    transform: &F,
) -> Result<InitResult<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
    F: Fn(f64) -> f64,
{
    let expected = problem.dimension();
    if expected == 0 {
        return Err(Error::EmptyProblem);
    }
    if initial.len() != expected {
        return Err(Error::Dimension {
            expected,
            actual: initial.len(),
        });
    }

    let points = Simplex::initial_points(initial, config.initial_step());
    let mut tracker = Tracker::new();

    let Batch::Complete(vertices) = evaluate_points(
        model,
        problem,
        0,
        Step::Initial,
        &points,
        config.parallelism(),
        &mut tracker,
        observer,
        transform,
    )?
    else {
        let solution = tracker.into_solution(Status::StoppedByObserver, 0)?;
        return Ok(InitResult::StopEarly(solution));
    };

    if tracker.best_vertex().is_none() {
        return Err(Error::NoSuccessfulEvaluation);
    }

    Ok(InitResult::Continue(State {
        simplex: Simplex::new(vertices, transform),
        tracker,
    }))
}
