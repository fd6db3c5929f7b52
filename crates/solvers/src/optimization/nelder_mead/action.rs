/// Actions an observer can take during Nelder–Mead search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver early and return the best solution found so far.
    ///
    /// A successful evaluation that triggered the stop still counts toward
    /// the best solution.
    StopEarly,

    /// Treat this point as worse than every evaluated point.
    ///
    /// The vertex stays in the simplex with the worst possible objective, so
    /// the next step moves away from it. The evaluation (if successful) is not
    /// considered for the best solution.
    ///
    /// Use this for:
    /// - Recovering from model or problem errors when the failed region is
    ///   known to be unphysical but the search should continue.
    /// - Steering the search away from a region even when evaluation succeeded.
    AssumeWorse,
}
