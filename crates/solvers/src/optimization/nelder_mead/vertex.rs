use crate::optimization::evaluate::Evaluation;

/// A simplex vertex with its evaluated objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// The solver variables.
    pub x: Vec<f64>,
    /// The objective value at `x`.
    pub objective: f64,
}

impl Vertex {
    /// Creates a new vertex.
    #[must_use]
    pub fn new(x: Vec<f64>, objective: f64) -> Self {
        Self { x, objective }
    }
}

impl<I, O> From<&Evaluation<I, O>> for Vertex {
    fn from(eval: &Evaluation<I, O>) -> Self {
        Self::new(eval.x.clone(), eval.objective)
    }
}
