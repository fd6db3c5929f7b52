use fitloop_core::Snapshot;

use super::simplex::{Simplex, score};
use super::solution::Status;
use super::{Error, Solution, Vertex};

/// Tracks the best successful evaluation and the evaluation count.
pub(super) struct Tracker<I, O> {
    best: Option<(Vertex, Snapshot<I, O>)>,
    evals: usize,
}

impl<I, O> Tracker<I, O> {
    pub(super) fn new() -> Self {
        Self {
            best: None,
            evals: 0,
        }
    }

    pub(super) fn best_vertex(&self) -> Option<&Vertex> {
        self.best.as_ref().map(|(vertex, _)| vertex)
    }

    /// Counts evaluations that ran, observed or not.
    pub(super) fn record_evals(&mut self, count: usize) {
        self.evals += count;
    }

    /// Replaces the best evaluation if `vertex` scores strictly better.
    pub(super) fn maybe_update_best<F: Fn(f64) -> f64>(
        &mut self,
        vertex: Vertex,
        snapshot: Snapshot<I, O>,
        transform: &F,
    ) {
        let improves = match &self.best {
            None => true,
            Some((best, _)) => {
                score(transform, vertex.objective) < score(transform, best.objective)
            }
        };
        if improves {
            self.best = Some((vertex, snapshot));
        }
    }

    /// Consumes the tracker, producing the solution for the best evaluation.
    pub(super) fn into_solution(
        self,
        status: Status,
        iters: usize,
    ) -> Result<Solution<I, O>, Error> {
        let (vertex, snapshot) = self.best.ok_or(Error::NoSuccessfulEvaluation)?;
        Ok(Solution {
            status,
            x: vertex.x,
            objective: vertex.objective,
            snapshot,
            iters,
            evals: self.evals,
        })
    }
}

/// Search state between iterations.
pub(super) struct State<I, O> {
    pub(super) simplex: Simplex,
    pub(super) tracker: Tracker<I, O>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(v: f64) -> f64 {
        v
    }

    #[test]
    fn best_requires_strict_improvement() {
        let mut tracker = Tracker::new();
        tracker.maybe_update_best(Vertex::new(vec![1.0], 2.0), Snapshot::new(1, "a"), &identity);
        tracker.maybe_update_best(Vertex::new(vec![2.0], 2.0), Snapshot::new(2, "b"), &identity);
        tracker.maybe_update_best(Vertex::new(vec![3.0], 5.0), Snapshot::new(3, "c"), &identity);

        let best = tracker.best_vertex().unwrap();
        assert_eq!(best.x, vec![1.0]);

        tracker.maybe_update_best(Vertex::new(vec![4.0], 1.0), Snapshot::new(4, "d"), &identity);
        tracker.record_evals(1);

        let solution = tracker.into_solution(Status::MaxIters, 3).unwrap();
        assert_eq!(solution.x, vec![4.0]);
        assert_eq!(solution.snapshot.output, "d");
        assert_eq!(solution.iters, 3);
        assert_eq!(solution.evals, 1);
    }

    #[test]
    fn empty_tracker_has_no_solution() {
        let tracker = Tracker::<f64, f64>::new();
        assert!(matches!(
            tracker.into_solution(Status::Converged, 0),
            Err(Error::NoSuccessfulEvaluation)
        ));
    }
}
