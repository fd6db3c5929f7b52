/// Defines an optimization problem to be solved.
///
/// An optimization problem maps solver variables to a model input, then
/// computes an objective value from the model input and output. Solvers
/// search for the input that minimizes (or maximizes) the objective.
///
/// The number of solver variables is reported at runtime by
/// [`OptimizationProblem::dimension`], since calibration problems declare
/// their arity when they are constructed rather than in their type.
pub trait OptimizationProblem {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the number of solver variables.
    fn dimension(&self) -> usize;

    /// Maps solver variables (`x`) into a model input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the input cannot be constructed from `x`.
    fn input(&self, x: &[f64]) -> Result<Self::Input, Self::Error>;

    /// Computes an objective value from model input/output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be computed.
    fn objective(&self, input: &Self::Input, output: &Self::Output) -> Result<f64, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    /// Sum of squares around a shifted origin.
    struct Shifted {
        origin: Vec<f64>,
    }

    impl OptimizationProblem for Shifted {
        type Input = Vec<f64>;
        type Output = ();
        type Error = Infallible;

        fn dimension(&self) -> usize {
            self.origin.len()
        }

        fn input(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
            Ok(x.iter().zip(&self.origin).map(|(x, o)| x - o).collect())
        }

        fn objective(&self, input: &Vec<f64>, _output: &()) -> Result<f64, Self::Error> {
            Ok(input.iter().map(|v| v * v).sum())
        }
    }

    #[test]
    fn objective_uses_mapped_input() {
        let problem = Shifted {
            origin: vec![1.0, -1.0],
        };
        assert_eq!(problem.dimension(), 2);

        let input = problem.input(&[2.0, 1.0]).unwrap();
        assert_eq!(problem.objective(&input, &()).unwrap(), 5.0);
    }
}
