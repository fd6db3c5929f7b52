use serde::{Deserialize, Serialize};

use fitloop_observers::Sense;

/// The outcome of scoring one parameter vector.
///
/// A fitness is either a finite value or [`Fitness::Failed`]. Non-finite
/// values never escape: [`Fitness::from_raw`] turns them into `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fitness {
    Value(f64),
    Failed,
}

impl Fitness {
    /// Wraps a raw score, treating NaN and infinities as failures.
    #[must_use]
    pub fn from_raw(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Failed
        }
    }

    /// Returns the value, or `None` for a failed evaluation.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Failed => None,
        }
    }

    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns the value the search compares, with failures ranked worst.
    #[must_use]
    pub fn penalized(self, goal: Goal) -> f64 {
        self.value().unwrap_or_else(|| goal.worst())
    }
}

/// Whether the calibration looks for the smallest or the largest fitness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Minimize,
    Maximize,
}

impl Goal {
    /// The worst possible score for this goal.
    #[must_use]
    pub fn worst(self) -> f64 {
        match self {
            Self::Minimize => f64::INFINITY,
            Self::Maximize => f64::NEG_INFINITY,
        }
    }
}

impl From<Goal> for Sense {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Minimize => Sense::Minimize,
            Goal::Maximize => Sense::Maximize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_scores_are_failures() {
        assert_eq!(Fitness::from_raw(1.5), Fitness::Value(1.5));
        assert_eq!(Fitness::from_raw(f64::NAN), Fitness::Failed);
        assert_eq!(Fitness::from_raw(f64::INFINITY), Fitness::Failed);
        assert_eq!(Fitness::from_raw(f64::NEG_INFINITY), Fitness::Failed);
    }

    #[test]
    fn failures_rank_worst_for_either_goal() {
        assert_eq!(Fitness::Failed.penalized(Goal::Minimize), f64::INFINITY);
        assert_eq!(Fitness::Failed.penalized(Goal::Maximize), f64::NEG_INFINITY);
        assert_eq!(Fitness::Value(2.0).penalized(Goal::Maximize), 2.0);
    }

    #[test]
    fn serializes_as_tagged_value() {
        let json = serde_json::to_string(&Fitness::Value(0.25)).unwrap();
        assert_eq!(json, r#"{"value":0.25}"#);
        let json = serde_json::to_string(&Fitness::Failed).unwrap();
        assert_eq!(json, r#""failed""#);
    }
}
