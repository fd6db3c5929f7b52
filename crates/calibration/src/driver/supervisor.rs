use fitloop_core::Observer;
use fitloop_observers::{
    CancelToken, EvaluationBudget, Exhausted, ProgressObserver, TracingObserver,
    Progress as SearchProgress,
};
use fitloop_solvers::optimization::nelder_mead::{Action, Event, Vertex};

use crate::CalibrationModel;

use super::{Evaluator, Objective, StopReason};

/// Counters gathered while the search runs.
#[derive(Debug, Default)]
pub(super) struct SearchStats {
    pub(super) iteration: usize,
    pub(super) failed: usize,
    pub(super) stop: Option<StopReason>,
    /// Best vertex at the moment a fatal model error occurred.
    pub(super) best_before_failure: Option<Vertex>,
}

/// Watches every evaluation of a calibration search.
///
/// Logs events, counts failed simulations, reports progress, and stops the
/// search when a budget runs out or the run is cancelled.
pub(super) struct Supervisor<'s, F> {
    pub(super) stats: &'s mut SearchStats,
    pub(super) budget: EvaluationBudget,
    pub(super) cancel: CancelToken,
    pub(super) progress: ProgressObserver<F>,
}

impl<M, F> Observer<Event<'_, Evaluator<'_, M>, Objective>, Action> for Supervisor<'_, F>
where
    M: CalibrationModel,
    F: FnMut(&SearchProgress),
{
    fn observe(&mut self, event: &Event<'_, Evaluator<'_, M>, Objective>) -> Option<Action> {
        Observer::<_, Action>::observe(&mut TracingObserver, event);
        self.stats.iteration = event.iter();

        match event {
            Event::Evaluated { output, .. } => {
                if output.is_failed() {
                    self.stats.failed += 1;
                }
            }
            Event::ModelFailed { best, .. } => {
                // Fatal: let the error end the search.
                self.stats.best_before_failure = best.cloned();
                self.stats.stop = Some(StopReason::ModelError);
                return None;
            }
            Event::ProblemFailed { .. } => {}
        }

        Observer::<_, Action>::observe(&mut self.progress, event);

        if let Some(action) = Observer::<_, Action>::observe(&mut self.budget, event) {
            self.stats.stop = Some(match self.budget.exhausted() {
                Some(Exhausted::WallClock) => StopReason::WallClock,
                _ => StopReason::EvaluationBudget,
            });
            return Some(action);
        }
        let cancelled: Option<Action> = self.cancel.observe(event);
        if cancelled.is_some() {
            self.stats.stop = Some(StopReason::Cancelled);
        }
        cancelled
    }
}
