use std::time::{Duration, Instant};

use fitloop_core::Observer;

use crate::traits::CanStopEarly;

/// The budget that stopped a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// The evaluation count reached its limit.
    Evaluations,
    /// The wall-clock limit elapsed.
    WallClock,
}

/// Stops a solver once it has used its evaluation or wall-clock budget.
///
/// The budget is checked each time the solver reports an evaluation, so an
/// evaluation already in progress always completes. The wall clock starts
/// when the budget is created.
#[derive(Debug, Clone)]
pub struct EvaluationBudget {
    max_evals: Option<usize>,
    time_limit: Option<Duration>,
    started: Instant,
    evals: usize,
    exhausted: Option<Exhausted>,
}

impl EvaluationBudget {
    /// Creates a budget with no limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_evals: None,
            time_limit: None,
            started: Instant::now(),
            evals: 0,
            exhausted: None,
        }
    }

    /// Limits the number of evaluations.
    #[must_use]
    pub fn with_max_evals(mut self, max_evals: usize) -> Self {
        self.max_evals = Some(max_evals);
        self
    }

    /// Limits the wall-clock time.
    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Returns the number of evaluations observed so far.
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evals
    }

    /// Returns the budget that fired, if any.
    #[must_use]
    pub fn exhausted(&self) -> Option<Exhausted> {
        self.exhausted
    }

    fn check(&self) -> Option<Exhausted> {
        if self.max_evals.is_some_and(|max| self.evals >= max) {
            return Some(Exhausted::Evaluations);
        }
        if self
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            return Some(Exhausted::WallClock);
        }
        None
    }
}

impl Default for EvaluationBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl<E, A: CanStopEarly> Observer<E, A> for EvaluationBudget {
    fn observe(&mut self, _event: &E) -> Option<A> {
        self.evals += 1;
        if self.exhausted.is_none() {
            self.exhausted = self.check();
        }
        self.exhausted.map(|_| A::stop_early())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Stop;

    impl CanStopEarly for Stop {
        fn stop_early() -> Self {
            Stop
        }
    }

    fn step(budget: &mut EvaluationBudget) -> Option<Stop> {
        budget.observe(&())
    }

    #[test]
    fn unlimited_never_stops() {
        let mut budget = EvaluationBudget::unlimited();
        for _ in 0..1_000 {
            assert_eq!(step(&mut budget), None);
        }
        assert_eq!(budget.evaluations(), 1_000);
        assert_eq!(budget.exhausted(), None);
    }

    #[test]
    fn stops_on_evaluation_limit() {
        let mut budget = EvaluationBudget::unlimited().with_max_evals(3);
        assert_eq!(step(&mut budget), None);
        assert_eq!(step(&mut budget), None);
        assert_eq!(step(&mut budget), Some(Stop));
        assert_eq!(budget.exhausted(), Some(Exhausted::Evaluations));
    }

    #[test]
    fn stops_on_wall_clock() {
        let mut budget = EvaluationBudget::unlimited().with_time_limit(Duration::ZERO);
        assert_eq!(step(&mut budget), Some(Stop));
        assert_eq!(budget.exhausted(), Some(Exhausted::WallClock));
    }

    #[test]
    fn first_exhausted_budget_is_kept() {
        let mut budget = EvaluationBudget::unlimited()
            .with_max_evals(1)
            .with_time_limit(Duration::ZERO);
        step(&mut budget);
        step(&mut budget);
        assert_eq!(budget.exhausted(), Some(Exhausted::Evaluations));
    }
}
