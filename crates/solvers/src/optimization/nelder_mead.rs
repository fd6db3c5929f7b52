//! Nelder–Mead simplex search for multi-variable optimization.
//!
//! # Algorithm
//!
//! The solver keeps a simplex of `N + 1` vertices in `N`-dimensional space,
//! ordered from best to worst objective. Each iteration replaces the worst
//! vertex by reflecting it through the centroid of the others, expanding or
//! contracting along that line depending on how the reflected point compares,
//! and shrinks the whole simplex toward the best vertex when nothing helps.
//!
//! The search converges when both the vertex spread in `x` and the spread in
//! objective values fall to or below the configured tolerances.
//!
//! # When to Use
//!
//! Nelder–Mead is appropriate when:
//! - Derivative information is unavailable, as with an opaque simulation
//! - Each evaluation is expensive and few evaluations per step are desired
//! - The objective may be noisy or occasionally fail to evaluate
//!
//! # Limitations
//!
//! - **Local search**: converges to a local optimum near the initial guess
//! - **No convergence guarantee**: the simplex can stall on some objectives
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per evaluation, including the `N + 1`
//! evaluations of the initial simplex:
//!
//! - [`Event::Evaluated`]: evaluation succeeded
//! - [`Event::ModelFailed`]: model returned an error
//! - [`Event::ProblemFailed`]: problem returned an error (input or objective)
//!
//! Observers can return [`Action::StopEarly`] to halt after the current
//! evaluation, or [`Action::AssumeWorse`] to treat the point as worse than any
//! evaluated point (useful for error recovery or steering the search away
//! from a region).
//!
//! # Batches
//!
//! The initial simplex and shrink steps evaluate independent points. By
//! default each point is observed before the next one runs, so a stop or an
//! unhandled failure leaves the rest unevaluated. With
//! [`Parallelism::Rayon`](crate::optimization::Parallelism::Rayon) a batch is
//! indivisible: every point is evaluated concurrently before events are
//! emitted one at a time, in vertex order, on the calling thread.

mod action;
mod config;
mod error;
mod event;
mod init;
mod search;
mod simplex;
mod solution;
mod state;
mod vertex;


pub use action::Action;
pub use config::{Coefficients, Config, ConfigError, InitialStep};
pub use error::Error;
pub use event::{Event, Step};
pub use solution::{Solution, Status};
pub use vertex::Vertex;

use fitloop_core::{Model, Observer, OptimizationProblem};

use search::search;

/// Finds a minimum of the objective using Nelder–Mead simplex search.
///
/// The observer receives an [`Event`] for every evaluation.
/// See the [module docs](self) for details on event timing and observer actions.
///
/// # Errors
///
/// Returns an error if `initial` does not match the problem dimension, or if
/// the model or problem fails during evaluation and the observer does not
/// return [`Action::AssumeWorse`] to recover.
pub fn minimize<M, P, Obs>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
    observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
{
    search(model, problem, initial, config, observer, |v| v)
}

/// Finds a minimum of the objective without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error if `initial` has the wrong dimension or an evaluation fails.
pub fn minimize_unobserved<M, P>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
{
    minimize(model, problem, initial, config, ())
}

/// Finds a maximum of the objective using Nelder–Mead simplex search.
///
/// The observer receives an [`Event`] for every evaluation.
/// See the [module docs](self) for details on event timing and observer actions.
///
/// # Errors
///
/// Returns an error if `initial` does not match the problem dimension, or if
/// the model or problem fails during evaluation and the observer does not
/// return [`Action::AssumeWorse`] to recover.
pub fn maximize<M, P, Obs>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
    observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
    Obs: for<'a> Observer<Event<'a, M, P>, Action>,
{
    search(model, problem, initial, config, observer, |v| -v)
}

/// Finds a maximum of the objective without observer support.
///
/// This is a convenience wrapper around [`maximize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error if `initial` has the wrong dimension or an evaluation fails.
pub fn maximize_unobserved<M, P>(
    model: &M,
    problem: &P,
    initial: &[f64],
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model + Sync,
    M::Input: Send,
    M::Output: Send,
    P: OptimizationProblem<Input = M::Input, Output = M::Output> + Sync,
{
    maximize(model, problem, initial, config, ())
}
