use fitloop_core::{Model, Observer, OptimizationProblem};

use crate::optimization::{EvaluateResult, Parallelism, evaluate, evaluate_batch};

use super::{
    Action, Config, Error, Event, Solution, Step, Vertex,
    init::{InitResult, init},
    simplex::{Simplex, score},
    solution::Status,
    state::{State, Tracker},
};

/// Core Nelder–Mead implementation.
///
/// The `transform` function is applied to objective values before comparison,
/// allowing the same algorithm to handle both minimization (identity) and
/// maximization (negation).
pub(super) fn search<M, P, Obs, F>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
    mut observer: Obs,
    transform: F,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
    F: Fn(f64) -> f64,
{
    let State {
        mut simplex,
        mut tracker,
    } = match init(model, problem, initial, config, &mut observer, &transform)? {
        InitResult::Continue(state) => state,
        InitResult::StopEarly(solution) => return Ok(solution),
    };

    let coefficients = config.coefficients();

    for iter in 1..=config.max_iters() {
        if simplex.is_converged(config, &transform) {
            return tracker.into_solution(Status::Converged, iter - 1);
        }

        let centroid = simplex.centroid();
        let best = score(&transform, simplex.best().objective);
        let second_worst = score(&transform, simplex.second_worst().objective);
        let worst = score(&transform, simplex.worst().objective);

        let mut eval_at = |step: Step, x: Vec<f64>, tracker: &mut Tracker<M::Input, M::Output>| {
            let result = evaluate(model, problem, &x);
            tracker.record_evals(1);
            observe::<M, P, _, _>(iter, step, &x, result, tracker, &mut observer, &transform)
        };

        let reflected_x = simplex.reflect(&centroid, coefficients.reflection);
        let Observed::Continue(reflected) = eval_at(Step::Reflection, reflected_x, &mut tracker)?
        else {
            return tracker.into_solution(Status::StoppedByObserver, iter);
        };
        let reflected_score = score(&transform, reflected.objective);

        if reflected_score < best {
            let expanded_x = Simplex::expand(&centroid, &reflected.x, coefficients.expansion);
            let Observed::Continue(expanded) = eval_at(Step::Expansion, expanded_x, &mut tracker)?
            else {
                return tracker.into_solution(Status::StoppedByObserver, iter);
            };
            if score(&transform, expanded.objective) < reflected_score {
                simplex.replace_worst(expanded, &transform);
            } else {
                simplex.replace_worst(reflected, &transform);
            }
            continue;
        }

        if reflected_score < second_worst {
            simplex.replace_worst(reflected, &transform);
            continue;
        }

        let contracted = if reflected_score < worst {
            let x = Simplex::contract_outside(&centroid, &reflected.x, coefficients.contraction);
            let Observed::Continue(vertex) = eval_at(Step::OutsideContraction, x, &mut tracker)?
            else {
                return tracker.into_solution(Status::StoppedByObserver, iter);
            };
            (score(&transform, vertex.objective) <= reflected_score).then_some(vertex)
        } else {
            let x = simplex.contract_inside(&centroid, coefficients.contraction);
            let Observed::Continue(vertex) = eval_at(Step::InsideContraction, x, &mut tracker)?
            else {
                return tracker.into_solution(Status::StoppedByObserver, iter);
            };
            (score(&transform, vertex.objective) < worst).then_some(vertex)
        };

        if let Some(vertex) = contracted {
            simplex.replace_worst(vertex, &transform);
            continue;
        }

        let points = simplex.shrink_points(coefficients.shrink);
        let Batch::Complete(shrunk) = evaluate_points(
            model,
            problem,
            iter,
            Step::Shrink,
            &points,
            config.parallelism(),
            &mut tracker,
            &mut observer,
            &transform,
        )?
        else {
            return tracker.into_solution(Status::StoppedByObserver, iter);
        };
        simplex.replace_all_but_best(shrunk, &transform);
    }

    tracker.into_solution(Status::MaxIters, config.max_iters())
}

// ============================================================================
// Observe helpers
// ============================================================================

/// Outcome of evaluating a set of independent points.
pub(super) enum Batch {
    /// Every point was observed; vertices are in point order.
    Complete(Vec<Vertex>),
    /// The observer stopped the search part way through.
    Stop,
}

/// Evaluates and observes independent points such as the initial simplex or
/// a shrink step.
///
/// Sequentially, each point is observed before the next one is evaluated, so
/// a stop request or a fatal error leaves the remaining points unevaluated.
/// A rayon batch is indivisible: every point is evaluated and counted before
/// the first one is observed.
#[allow(clippy::too_many_arguments)]
pub(super) fn evaluate_points<M, P, Obs, F>(
    model: &M,
    problem: &P,
    iter: usize,
    step: Step,
    points: &[Vec<f64>],
    parallelism: Parallelism,
    tracker: &mut Tracker<M::Input, M::Output>,
    observer: &mut Obs,
    transform: &F,
) -> Result<Batch, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
    F: Fn(f64) -> f64,
{
    let mut vertices = Vec::with_capacity(points.len());
    let mut accept = |x: &[f64],
                      result: EvaluateResult<M, P>,
                      tracker: &mut Tracker<M::Input, M::Output>|
     -> Result<bool, Error> {
        match observe::<M, P, _, _>(iter, step, x, result, tracker, &mut *observer, transform)? {
            Observed::Continue(vertex) => {
                vertices.push(vertex);
                Ok(true)
            }
            Observed::Stop => Ok(false),
        }
    };

    match parallelism {
        Parallelism::Sequential => {
            for x in points {
                let result = evaluate(model, problem, x);
                tracker.record_evals(1);
                if !accept(x.as_slice(), result, &mut *tracker)? {
                    return Ok(Batch::Stop);
                }
            }
        }
        Parallelism::Rayon => {
            let results = evaluate_batch(model, problem, points, Parallelism::Rayon);
            tracker.record_evals(results.len());
            for (x, result) in points.iter().zip(results) {
                if !accept(x.as_slice(), result, &mut *tracker)? {
                    return Ok(Batch::Stop);
                }
            }
        }
    }

    Ok(Batch::Complete(vertices))
}

/// What the search should do with an observed evaluation.
pub(super) enum Observed {
    /// Place this vertex in the simplex.
    Continue(Vertex),
    /// Stop and report the best solution so far.
    Stop,
}

/// Emits the event for an evaluation result and applies the observer's action.
///
/// Successful evaluations update the best solution unless the observer
/// requests [`Action::AssumeWorse`]. Failures are only recoverable through an
/// observer action. The caller counts the evaluation.
pub(super) fn observe<M, P, Obs, F>(
    iter: usize,
    step: Step,
    x: &[f64],
    result: EvaluateResult<M, P>,
    tracker: &mut Tracker<M::Input, M::Output>,
    observer: &mut Obs,
    transform: &F,
) -> Result<Observed, Error>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
    F: Fn(f64) -> f64,
{
    let worse = || Vertex::new(x.to_vec(), transform(f64::INFINITY));

    match result {
        Ok(eval) => {
            let vertex = Vertex::from(&eval);
            let action = {
                let event = Event::Evaluated {
                    iter,
                    step,
                    vertex: &vertex,
                    input: &eval.snapshot.input,
                    output: &eval.snapshot.output,
                    best: tracker.best_vertex(),
                };
                observer.observe(&event)
            };
            match action {
                Some(Action::StopEarly) => {
                    tracker.maybe_update_best(vertex, eval.snapshot, transform);
                    Ok(Observed::Stop)
                }
                Some(Action::AssumeWorse) => Ok(Observed::Continue(worse())),
                None => {
                    tracker.maybe_update_best(vertex.clone(), eval.snapshot, transform);
                    Ok(Observed::Continue(vertex))
                }
            }
        }
        Err(e) => {
            let action = Event::<M, P>::emit_failure(iter, step, x, tracker.best_vertex(), &e, observer);
            match action {
                Some(Action::StopEarly) => Ok(Observed::Stop),
                Some(Action::AssumeWorse) => Ok(Observed::Continue(worse())),
                None => Err(e.into()),
            }
        }
    }
}
