//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, enabling
//! observers to work generically across different solvers.
//!
//! # Event traits
//!
//! - [`HasObjective`]: events that carry an objective value
//! - [`HasIteration`]: events that belong to a solver iteration
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//! - [`CanAssumeWorse`]: actions that can signal a worse-than-evaluated outcome
//!
//! # Example
//!
//! ```rust
//! use fitloop_core::Observer;
//! use fitloop_observers::traits::{CanStopEarly, HasObjective};
//!
//! struct GoodEnough {
//!     target: f64,
//! }
//!
//! impl<E: HasObjective, A: CanStopEarly> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.objective() <= self.target).then(A::stop_early)
//!     }
//! }
//! ```

use fitloop_core::{Model, OptimizationProblem};

use fitloop_solvers::optimization::nelder_mead;

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    ///
    /// Returns `f64::NAN` when the event represents an error and no objective
    /// is available.
    fn objective(&self) -> f64;
}

/// An event that belongs to a numbered solver iteration.
pub trait HasIteration {
    /// Returns the iteration, where 0 is solver initialization.
    fn iteration(&self) -> usize;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

/// An action type that can signal a worse-than-evaluated outcome.
pub trait CanAssumeWorse {
    /// Returns the action that treats this evaluation as worse than any other.
    fn assume_worse() -> Self;
}

// --- nelder_mead::Event ---

impl<M, P> HasObjective for nelder_mead::Event<'_, M, P>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    fn objective(&self) -> f64 {
        nelder_mead::Event::objective(self).unwrap_or(f64::NAN)
    }
}

impl<M, P> HasIteration for nelder_mead::Event<'_, M, P>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    fn iteration(&self) -> usize {
        self.iter()
    }
}

// --- nelder_mead::Action ---

impl CanStopEarly for nelder_mead::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

impl CanAssumeWorse for nelder_mead::Action {
    fn assume_worse() -> Self {
        Self::AssumeWorse
    }
}
