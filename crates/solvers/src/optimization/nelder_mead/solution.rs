use fitloop_core::Snapshot;

/// Indicates whether the solver converged or hit the iteration limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a Nelder–Mead search.
#[derive(Debug, Clone)]
pub struct Solution<I, O> {
    /// Final solver status.
    pub status: Status,

    /// Best estimate of the optimum.
    pub x: Vec<f64>,

    /// Objective value at the reported x.
    pub objective: f64,

    /// Snapshot at the reported x.
    pub snapshot: Snapshot<I, O>,

    /// Iteration count when the solver finished.
    pub iters: usize,

    /// Number of evaluations that ran, including failed ones.
    ///
    /// With [`Parallelism::Rayon`] this counts the whole batch in which the
    /// search stopped, even points the observer never saw.
    ///
    /// [`Parallelism::Rayon`]: crate::optimization::Parallelism::Rayon
    pub evals: usize,
}
