use fitloop_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// Whether smaller or larger objectives are better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    /// Returns true if `candidate` is strictly better than `current`.
    #[must_use]
    pub fn is_better(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::Minimize => candidate < current,
            Self::Maximize => candidate > current,
        }
    }
}

/// A progress report delivered after each evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// One-based index of the evaluation.
    pub evaluation: usize,
    /// Solver iteration the evaluation belongs to, 0 during initialization.
    pub iteration: usize,
    /// Objective of this evaluation, `NaN` if it failed.
    pub objective: f64,
    /// Best objective so far, `None` until an evaluation succeeds.
    pub best: Option<f64>,
}

/// Calls a closure with a [`Progress`] report after every evaluation.
///
/// Never requests a solver action.
pub struct ProgressObserver<F> {
    sense: Sense,
    callback: F,
    evals: usize,
    best: Option<f64>,
}

impl<F: FnMut(&Progress)> ProgressObserver<F> {
    pub fn new(sense: Sense, callback: F) -> Self {
        Self {
            sense,
            callback,
            evals: 0,
            best: None,
        }
    }
}

impl<E, A, F> Observer<E, A> for ProgressObserver<F>
where
    E: HasObjective + HasIteration,
    F: FnMut(&Progress),
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.evals += 1;
        let objective = event.objective();

        if !objective.is_nan() {
            self.best = match self.best {
                Some(best) if !self.sense.is_better(objective, best) => Some(best),
                _ => Some(objective),
            };
        }

        (self.callback)(&Progress {
            evaluation: self.evals,
            iteration: event.iteration(),
            objective,
            best: self.best,
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An objective observed during the given iteration.
    struct Scored(f64, usize);

    impl HasObjective for Scored {
        fn objective(&self) -> f64 {
            self.0
        }
    }

    impl HasIteration for Scored {
        fn iteration(&self) -> usize {
            self.1
        }
    }

    fn run(sense: Sense, objectives: &[f64]) -> Vec<Progress> {
        let mut reports = Vec::new();
        let mut observer = ProgressObserver::new(sense, |p: &Progress| reports.push(*p));
        for (iteration, &objective) in objectives.iter().enumerate() {
            let action: Option<()> = observer.observe(&Scored(objective, iteration));
            assert!(action.is_none());
        }
        drop(observer);
        reports
    }

    #[test]
    fn tracks_best_when_minimizing() {
        let reports = run(Sense::Minimize, &[3.0, f64::NAN, 1.0, 2.0]);
        let bests: Vec<_> = reports.iter().map(|p| p.best).collect();
        assert_eq!(bests, vec![Some(3.0), Some(3.0), Some(1.0), Some(1.0)]);
        assert_eq!(reports[3].evaluation, 4);
        assert_eq!(reports[3].iteration, 3);
        assert!(reports[1].objective.is_nan());
    }

    #[test]
    fn tracks_best_when_maximizing() {
        let reports = run(Sense::Maximize, &[1.0, 3.0, 2.0]);
        assert_eq!(reports[2].best, Some(3.0));
    }

    #[test]
    fn failures_before_success_have_no_best() {
        let reports = run(Sense::Minimize, &[f64::NAN]);
        assert_eq!(reports[0].best, None);
    }
}
