//! Reduction of an aligned curve pair to a scalar fitness.

use crate::{AlignedCurvePair, Fitness};

/// How residuals that are NaN or infinite enter the mean squared error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonFinitePolicy {
    /// Count a non-finite residual as zero but keep it in the divisor.
    ///
    /// A single numerical artifact then cannot invalidate a whole
    /// evaluation, at the cost of pulling the mean toward zero by the
    /// fraction of masked samples.
    #[default]
    ZeroResidual,
    /// Drop non-finite residuals and average over the remaining ones.
    Exclude,
}

/// Mean squared error between the simulated and reference values.
///
/// Uses [`NonFinitePolicy::ZeroResidual`]: a sample whose residual is not
/// finite contributes zero, and the mean is still taken over every sample.
/// The result is zero only for a perfect match (or a fully masked pair).
#[must_use]
pub fn score(pair: &AlignedCurvePair) -> Fitness {
    score_with(pair, NonFinitePolicy::ZeroResidual)
}

/// Mean squared error with an explicit [`NonFinitePolicy`].
///
/// Returns [`Fitness::Failed`] if no residual survives [`NonFinitePolicy::Exclude`]
/// or the sum of squares overflows.
#[must_use]
pub fn score_with(pair: &AlignedCurvePair, policy: NonFinitePolicy) -> Fitness {
    let residuals = pair
        .simulated()
        .iter()
        .zip(pair.reference())
        .map(|(sim, reference)| sim - reference);

    let (sum, count) = match policy {
        NonFinitePolicy::ZeroResidual => {
            let sum: f64 = residuals
                .map(|r| if r.is_finite() { r * r } else { 0.0 })
                .sum();
            (sum, pair.len())
        }
        NonFinitePolicy::Exclude => residuals
            .filter(|r| r.is_finite())
            .fold((0.0, 0), |(sum, n), r| (sum + r * r, n + 1)),
    };

    if count == 0 {
        return Fitness::Failed;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / count as f64;
    Fitness::from_raw(mean)
}
