//! Reusable observers for fitloop solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work across solvers.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits for cross-solver observers
//!   ([`HasObjective`], [`HasIteration`], [`CanStopEarly`], [`CanAssumeWorse`])
//!
//! # Observers
//!
//! - [`EvaluationBudget`]: stops after an evaluation count or wall-clock limit
//! - [`CancelToken`]: stops when cancelled from another thread
//! - [`ProgressObserver`]: reports the best objective after each evaluation
//! - [`TracingObserver`]: logs every Nelder–Mead event through `tracing`
//!
//! [`Observer`]: fitloop_core::Observer
//! [`HasObjective`]: traits::HasObjective
//! [`HasIteration`]: traits::HasIteration
//! [`CanStopEarly`]: traits::CanStopEarly
//! [`CanAssumeWorse`]: traits::CanAssumeWorse

mod budget;
mod cancel;
mod logging;
mod progress;
pub mod traits;

pub use budget::{EvaluationBudget, Exhausted};
pub use cancel::CancelToken;
pub use logging::TracingObserver;
pub use progress::{Progress, ProgressObserver, Sense};
