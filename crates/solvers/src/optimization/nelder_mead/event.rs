use fitloop_core::{Model, Observer, OptimizationProblem};

use crate::optimization::EvalError;

use super::{Action, Vertex};

/// The simplex operation that proposed an evaluated point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A vertex of the initial simplex.
    Initial,
    /// The worst vertex reflected through the centroid.
    Reflection,
    /// The reflected point pushed further from the centroid.
    Expansion,
    /// A point between the centroid and the reflected point.
    OutsideContraction,
    /// A point between the centroid and the worst vertex.
    InsideContraction,
    /// A vertex moved toward the best vertex.
    Shrink,
}

/// Events emitted by the Nelder–Mead solver.
///
/// Each event carries the iteration it belongs to (0 for the initial
/// simplex), the [`Step`] that proposed the point, and `best`, the best
/// successful evaluation seen before this one (`None` until one exists).
pub enum Event<'a, M, P>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    /// Successful evaluation of a proposed point.
    Evaluated {
        iter: usize,
        step: Step,
        /// The evaluated point (x and objective).
        vertex: &'a Vertex,
        /// The model input at this point.
        input: &'a M::Input,
        /// The model output at this point.
        output: &'a M::Output,
        best: Option<&'a Vertex>,
    },
    /// Model evaluation failed.
    ModelFailed {
        iter: usize,
        step: Step,
        /// The point where evaluation failed.
        x: &'a [f64],
        best: Option<&'a Vertex>,
        /// The model error.
        error: &'a M::Error,
    },
    /// Problem method failed (input construction or objective computation).
    ProblemFailed {
        iter: usize,
        step: Step,
        /// The point where evaluation failed.
        x: &'a [f64],
        best: Option<&'a Vertex>,
        /// The problem error.
        error: &'a P::Error,
    },
}

impl<M, P> Event<'_, M, P>
where
    M: Model,
    P: OptimizationProblem<Input = M::Input, Output = M::Output>,
{
    /// Returns the point that was evaluated (or attempted).
    #[must_use]
    pub fn x(&self) -> &[f64] {
        match self {
            Self::Evaluated { vertex, .. } => &vertex.x,
            Self::ModelFailed { x, .. } | Self::ProblemFailed { x, .. } => x,
        }
    }

    /// Returns the objective value, or `None` if evaluation failed.
    #[must_use]
    pub fn objective(&self) -> Option<f64> {
        match self {
            Self::Evaluated { vertex, .. } => Some(vertex.objective),
            Self::ModelFailed { .. } | Self::ProblemFailed { .. } => None,
        }
    }

    /// Returns the iteration this evaluation belongs to.
    #[must_use]
    pub fn iter(&self) -> usize {
        match self {
            Self::Evaluated { iter, .. }
            | Self::ModelFailed { iter, .. }
            | Self::ProblemFailed { iter, .. } => *iter,
        }
    }

    /// Returns the simplex operation that proposed this point.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::Evaluated { step, .. }
            | Self::ModelFailed { step, .. }
            | Self::ProblemFailed { step, .. } => *step,
        }
    }

    /// Returns the best successful evaluation seen before this event.
    #[must_use]
    pub fn best(&self) -> Option<&Vertex> {
        match self {
            Self::Evaluated { best, .. }
            | Self::ModelFailed { best, .. }
            | Self::ProblemFailed { best, .. } => *best,
        }
    }

    /// Emits a failure event and returns the observer's action.
    pub(super) fn emit_failure<Obs>(
        iter: usize,
        step: Step,
        x: &[f64],
        best: Option<&Vertex>,
        error: &EvalError<M::Error, P::Error>,
        observer: &mut Obs,
    ) -> Option<Action>
    where
        Obs: for<'a> Observer<Event<'a, M, P>, Action>,
    {
        match error {
            EvalError::Model(e) => {
                let event = Event::ModelFailed {
                    iter,
                    step,
                    x,
                    best,
                    error: e,
                };
                observer.observe(&event)
            }
            EvalError::Problem(e) => {
                let event = Event::ProblemFailed {
                    iter,
                    step,
                    x,
                    best,
                    error: e,
                };
                observer.observe(&event)
            }
        }
    }
}
