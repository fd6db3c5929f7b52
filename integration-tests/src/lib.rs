//! Fixtures shared by the end-to-end tests.

pub use fitloop_calibration::beam::testing::{BAND, LinearCrack, band_reference};
