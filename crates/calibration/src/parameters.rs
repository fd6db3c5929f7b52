use std::{ops::Deref, sync::Arc};

use crate::InvalidParameterError;

/// An immutable parameter vector of a fixed, model-declared length.
///
/// Cloning shares the underlying values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVector(Arc<[f64]>);

impl ParameterVector {
    /// Creates a parameter vector, checking it has `expected` entries.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameterError`] if `values.len() != expected`.
    pub fn new(values: &[f64], expected: usize) -> Result<Self, InvalidParameterError> {
        if values.len() != expected {
            return Err(InvalidParameterError {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self(values.into()))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for ParameterVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_arity() {
        let params = ParameterVector::new(&[0.8, 200.0], 2).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], 200.0);

        let err = ParameterVector::new(&[0.8], 2).unwrap_err();
        assert_eq!(
            err,
            InvalidParameterError {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn clones_share_values() {
        let params = ParameterVector::new(&[1.0, 2.0], 2).unwrap();
        let copy = params.clone();
        assert!(std::ptr::eq(params.as_slice(), copy.as_slice()));
    }
}
