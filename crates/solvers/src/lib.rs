//! Derivative-free solvers for fitloop problems.
//!
//! Solvers take a [`Model`](fitloop_core::Model), a problem that adapts
//! solver variables to model inputs, and an [`Observer`](fitloop_core::Observer)
//! that can monitor or steer the search.

pub mod optimization;
