//! Curves and their alignment onto a common grid.
//!
//! Simulated and measured data rarely share sampling points. [`align`]
//! resamples the simulated curve onto the reference curve's `x` values with
//! piecewise-linear interpolation, clamping to the simulated end values
//! outside the simulated range.

use ndarray::Array1;
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};

use crate::AlignError;

/// An ordered series of `(x, y)` samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    /// Creates a curve from separate `x` and `y` columns.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::LengthMismatch`] if the columns differ in length.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, AlignError> {
        if x.len() != y.len() {
            return Err(AlignError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns the strictly increasing envelope of the curve in `x`.
    ///
    /// A sample is kept only if its `x` is finite and greater than every
    /// previously kept `x`. Simulated loading curves can turn back on
    /// themselves (e.g. an opening that briefly closes); the envelope keeps
    /// the first pass so interpolation always sees a monotone grid.
    #[must_use]
    pub fn monotone(&self) -> Self {
        let mut envelope = Self::default();
        for (&x, &y) in self.x.iter().zip(&self.y) {
            let increases = envelope.x.last().is_none_or(|&last| x > last);
            if x.is_finite() && increases {
                envelope.x.push(x);
                envelope.y.push(y);
            }
        }
        envelope
    }
}

impl FromIterator<(f64, f64)> for Curve {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        let (x, y) = iter.into_iter().unzip();
        Self { x, y }
    }
}

/// Reference and simulated values on a shared grid.
///
/// All three sequences have the same, non-zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCurvePair {
    grid: Vec<f64>,
    reference: Vec<f64>,
    simulated: Vec<f64>,
}

impl AlignedCurvePair {
    /// Creates a pair, checking that every sequence has the grid's length.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty or any length differs.
    pub fn new(
        grid: Vec<f64>,
        reference: Vec<f64>,
        simulated: Vec<f64>,
    ) -> Result<Self, AlignError> {
        if grid.is_empty() {
            return Err(AlignError::EmptyReference);
        }
        for values in [&reference, &simulated] {
            if values.len() != grid.len() {
                return Err(AlignError::LengthMismatch {
                    x: grid.len(),
                    y: values.len(),
                });
            }
        }
        Ok(Self {
            grid,
            reference,
            simulated,
        })
    }

    #[must_use]
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    #[must_use]
    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    #[must_use]
    pub fn simulated(&self) -> &[f64] {
        &self.simulated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

/// Resamples `simulated` onto the `x` values of `reference`.
///
/// The simulated curve is first reduced to its [monotone](Curve::monotone)
/// envelope. Reference points outside the simulated range take the nearest
/// simulated end value. An envelope with a single sample yields a constant.
///
/// # Errors
///
/// Returns an error if either curve is empty or interpolation fails.
pub fn align(reference: &Curve, simulated: &Curve) -> Result<AlignedCurvePair, AlignError> {
    if reference.is_empty() {
        return Err(AlignError::EmptyReference);
    }

    let envelope = simulated.monotone();
    let resampled = match envelope.len() {
        0 => return Err(AlignError::EmptySimulated),
        1 => vec![envelope.y[0]; reference.len()],
        _ => {
            let interp = Interp1DOwned::new(
                Array1::from(envelope.x).into(),
                Array1::from(envelope.y).into(),
                Linear,
                Extrapolate::Clamp,
            )?;
            reference
                .x
                .iter()
                .map(|&x| {
                    if x.is_finite() {
                        interp.interpolate(&[x]).map_err(AlignError::from)
                    } else {
                        Ok(f64::NAN)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    AlignedCurvePair::new(reference.x.clone(), reference.y.clone(), resampled)
}
