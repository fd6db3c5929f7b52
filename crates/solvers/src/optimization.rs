//! Solvers for optimization problems, minimizing or maximizing an objective.
//!
//! An [`OptimizationProblem`] maps solver variables `x: &[f64]` to model
//! inputs, calls the model, and extracts a scalar objective. Solvers in this
//! module search for the `x` that minimizes or maximizes that objective.
//!
//! # Solvers
//!
//! - [`nelder_mead`]: derivative-free simplex search over `N` variables
//!
//! [`OptimizationProblem`]: fitloop_core::OptimizationProblem

mod evaluate;

pub use evaluate::{EvalError, EvaluateResult, Evaluation, Parallelism, evaluate, evaluate_batch};

pub mod nelder_mead;
