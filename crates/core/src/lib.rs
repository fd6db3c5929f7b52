//! Core traits and types shared by the fitloop crates.
//!
//! This crate defines the abstractions that solvers, observers, and
//! calibration models build on:
//!
//! - [`Model`]: a callable that maps a typed input to a typed output
//! - [`Snapshot`]: a captured input/output pair from a model call
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`OptimizationProblem`]: adapts solver variables to model inputs and
//!   extracts a scalar objective from model outputs

mod model;
mod observer;
mod problems;

pub use model::{Model, Snapshot};
pub use observer::Observer;
pub use problems::OptimizationProblem;
