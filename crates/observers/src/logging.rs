use fitloop_core::{Model, Observer, OptimizationProblem};
use fitloop_solvers::optimization::nelder_mead::{Action, Event};
use tracing::{debug, warn};

/// Logs every Nelder–Mead event through `tracing`.
///
/// Successful evaluations are logged at `debug`, failures at `warn`.
/// Never requests a solver action.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<M, P> Observer<Event<'_, M, P>, Action> for TracingObserver
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    fn observe(&mut self, event: &Event<'_, M, P>) -> Option<Action> {
        let best = event.best().map(|v| v.objective);
        match event {
            Event::Evaluated {
                iter, step, vertex, ..
            } => debug!(
                iter = *iter,
                ?step,
                x = ?vertex.x,
                objective = vertex.objective,
                ?best,
                "evaluated"
            ),
            Event::ModelFailed {
                iter,
                step,
                x,
                error,
                ..
            } => warn!(iter = *iter, ?step, ?x, %error, "model failed"),
            Event::ProblemFailed {
                iter,
                step,
                x,
                error,
                ..
            } => warn!(iter = *iter, ?step, ?x, %error, "problem failed"),
        }
        None
    }
}
