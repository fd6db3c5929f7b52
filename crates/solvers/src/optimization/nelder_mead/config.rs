use thiserror::Error;

use crate::optimization::Parallelism;

/// Configuration for the Nelder–Mead solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_iters: usize,
    x_abs_tol: f64,
    f_abs_tol: f64,
    coefficients: Coefficients,
    initial_step: InitialStep,
    parallelism: Parallelism,
}

/// Reflection, expansion, contraction, and shrink coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Reflection coefficient, `> 0`.
    pub reflection: f64,
    /// Expansion coefficient, `> 1` and `> reflection`.
    pub expansion: f64,
    /// Contraction coefficient, in `(0, 1)`.
    pub contraction: f64,
    /// Shrink coefficient, in `(0, 1)`.
    pub shrink: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

/// How the initial simplex is built around the initial guess.
///
/// Vertex `i` perturbs coordinate `i` of the guess by `relative * x[i]`, or
/// sets it to `zero` when `x[i]` is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialStep {
    /// Relative perturbation for nonzero coordinates.
    pub relative: f64,
    /// Absolute value used for zero coordinates.
    pub zero: f64,
}

impl Default for InitialStep {
    fn default() -> Self {
        Self {
            relative: 0.05,
            zero: 0.000_25,
        }
    }
}

/// Errors that can occur when validating a Nelder–Mead solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("x_abs_tol must be finite and non-negative")]
    XAbs,
    #[error("f_abs_tol must be finite and non-negative")]
    FAbs,
    #[error("reflection must be positive")]
    Reflection,
    #[error("expansion must exceed both 1 and the reflection coefficient")]
    Expansion,
    #[error("contraction must be in (0, 1)")]
    Contraction,
    #[error("shrink must be in (0, 1)")]
    Shrink,
    #[error("initial step must be finite and nonzero")]
    InitialStep,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(200, 1e-4, 1e-4).unwrap()
    }
}

impl Config {
    /// Creates a new config with validated tolerances and default coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if any tolerance is negative or non-finite.
    pub fn new(max_iters: usize, x_abs_tol: f64, f_abs_tol: f64) -> Result<Self, ConfigError> {
        if !x_abs_tol.is_finite() || x_abs_tol < 0.0 {
            return Err(ConfigError::XAbs);
        }
        if !f_abs_tol.is_finite() || f_abs_tol < 0.0 {
            return Err(ConfigError::FAbs);
        }
        Ok(Self {
            max_iters,
            x_abs_tol,
            f_abs_tol,
            coefficients: Coefficients::default(),
            initial_step: InitialStep::default(),
            parallelism: Parallelism::default(),
        })
    }

    /// Replaces the simplex coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if any coefficient is outside its valid range.
    pub fn with_coefficients(mut self, coefficients: Coefficients) -> Result<Self, ConfigError> {
        let Coefficients {
            reflection,
            expansion,
            contraction,
            shrink,
        } = coefficients;

        if !(reflection.is_finite() && reflection > 0.0) {
            return Err(ConfigError::Reflection);
        }
        if !(expansion.is_finite() && expansion > 1.0 && expansion > reflection) {
            return Err(ConfigError::Expansion);
        }
        if !(contraction > 0.0 && contraction < 1.0) {
            return Err(ConfigError::Contraction);
        }
        if !(shrink > 0.0 && shrink < 1.0) {
            return Err(ConfigError::Shrink);
        }

        self.coefficients = coefficients;
        Ok(self)
    }

    /// Replaces the initial simplex step.
    ///
    /// # Errors
    ///
    /// Returns an error if either step is zero or non-finite.
    pub fn with_initial_step(mut self, step: InitialStep) -> Result<Self, ConfigError> {
        let valid = |v: f64| v.is_finite() && v != 0.0;
        if !valid(step.relative) || !valid(step.zero) {
            return Err(ConfigError::InitialStep);
        }
        self.initial_step = step;
        Ok(self)
    }

    /// Sets how batches of independent points are evaluated.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Returns the maximum number of simplex iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the absolute tolerance on vertex spread in `x`.
    #[must_use]
    pub fn x_abs_tol(&self) -> f64 {
        self.x_abs_tol
    }

    /// Returns the absolute tolerance on spread in objective values.
    #[must_use]
    pub fn f_abs_tol(&self) -> f64 {
        self.f_abs_tol
    }

    /// Returns the simplex coefficients.
    #[must_use]
    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    /// Returns the initial simplex step.
    #[must_use]
    pub fn initial_step(&self) -> InitialStep {
        self.initial_step
    }

    /// Returns how batches of independent points are evaluated.
    #[must_use]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_tolerances() {
        assert_eq!(Config::new(10, -1.0, 0.0), Err(ConfigError::XAbs));
        assert_eq!(Config::new(10, 0.0, f64::NAN), Err(ConfigError::FAbs));
    }

    #[test]
    fn validates_coefficients() {
        let config = Config::default();
        let bad_expansion = Coefficients {
            expansion: 0.9,
            ..Coefficients::default()
        };
        assert_eq!(
            config.with_coefficients(bad_expansion),
            Err(ConfigError::Expansion)
        );

        let bad_shrink = Coefficients {
            shrink: 1.0,
            ..Coefficients::default()
        };
        assert_eq!(config.with_coefficients(bad_shrink), Err(ConfigError::Shrink));

        let adaptive = Coefficients {
            reflection: 1.0,
            expansion: 1.5,
            contraction: 0.6,
            shrink: 0.7,
        };
        let config = config.with_coefficients(adaptive).unwrap();
        assert_eq!(config.coefficients(), adaptive);
    }

    #[test]
    fn rejects_zero_initial_step() {
        let step = InitialStep {
            relative: 0.0,
            zero: 0.1,
        };
        assert_eq!(
            Config::default().with_initial_step(step),
            Err(ConfigError::InitialStep)
        );
    }
}
