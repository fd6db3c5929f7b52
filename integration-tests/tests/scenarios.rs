use approx::assert_relative_eq;

use fitloop_calibration::{
    AnalyticModel, CalibrationDriver, CalibrationError, CalibrationModel, Curve, DriverConfig,
    DriverState, Fitness, StopReason, align,
    beam::{BeamConfig, BeamModel},
    objective::score,
    simulation::RunBudget,
};
use integration_tests::{LinearCrack, band_reference};

#[test]
fn identical_curves_score_zero() {
    let reference: Curve = [(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)].into_iter().collect();
    let simulated = reference.clone();

    let pair = align(&reference, &simulated).unwrap();

    assert_eq!(pair.reference(), &[1.0, 2.0, 3.0]);
    assert_eq!(pair.simulated(), &[1.0, 2.0, 3.0]);
    assert_eq!(score(&pair), Fitness::Value(0.0));
}

#[test]
fn constant_against_quadratic_scores_three() {
    let reference: Curve = [(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)].into_iter().collect();
    let simulated: Curve = [(0.0, 2.0), (2.0, 2.0)].into_iter().collect();

    let pair = align(&reference, &simulated).unwrap();

    assert_eq!(pair.simulated(), &[2.0, 2.0, 2.0]);
    assert_relative_eq!(score(&pair).value().unwrap(), 3.0);
}

#[test]
fn ten_iterations_approach_a_known_minimum() {
    let minimum = [0.5, 180.0];
    let distance = |p: &[f64]| {
        ((p[0] - minimum[0]).powi(2) + ((p[1] - minimum[1]) / 100.0).powi(2)).sqrt()
    };
    let model = AnalyticModel::new("known-minimum", 2, move |p: &[f64]| distance(p).powi(2));

    let initial = vec![0.8, 200.0];
    let mut driver = CalibrationDriver::new(model, DriverConfig::new(initial.clone())).unwrap();
    let report = driver.run().unwrap();
    let best = report.best_parameters.unwrap();

    match report.state {
        DriverState::Converged => {
            assert_relative_eq!(best[0], minimum[0], epsilon = 1e-2);
            assert_relative_eq!(best[1], minimum[1], epsilon = 1.0);
        }
        DriverState::Exhausted => {
            assert_eq!(report.stop_reason, Some(StopReason::IterationBudget));
            assert!(distance(&best) < distance(&initial));
        }
        other => panic!("unexpected terminal state {other:?}"),
    }
}

#[test]
fn injected_divergence_does_not_abort_the_search() {
    // The initial simplex perturbs alpha to 210, which diverges.
    let simulator = LinearCrack::diverging_above(205.0);
    let model = BeamModel::new(
        simulator,
        &band_reference(),
        BeamConfig::default(),
        RunBudget::default(),
    )
    .unwrap();

    let mut driver = CalibrationDriver::new(&model, DriverConfig::new(vec![1.0, 200.0])).unwrap();
    let report = driver.run().unwrap();

    assert_ne!(report.state, DriverState::Failed);
    assert!(report.failed_evaluations >= 1);
    assert!(report.evaluations > 3);
    assert_eq!(model.simulator().runs(), report.evaluations);

    let best = report.best_parameters.unwrap();
    assert!(best[1] <= 205.0);
    assert!(matches!(report.best_fitness, Some(Fitness::Value(_))));
}

#[test]
fn wrong_arity_runs_no_simulation() {
    let model = BeamModel::new(
        LinearCrack::new(),
        &band_reference(),
        BeamConfig::default(),
        RunBudget::default(),
    )
    .unwrap();

    let err = model.evaluate(&[0.8]).unwrap_err();

    assert!(matches!(err, CalibrationError::InvalidParameter(e) if e.expected == 2 && e.actual == 1));
    assert_eq!(model.simulator().runs(), 0);
}

#[test]
fn beam_fitness_is_smallest_at_the_band_midpoint() {
    let model = BeamModel::new(
        LinearCrack::new(),
        &band_reference(),
        BeamConfig::default(),
        RunBudget::default(),
    )
    .unwrap();

    let at = |k: f64| model.evaluate(&[k, 200.0]).unwrap().value().unwrap();
    assert!(at(0.8) < 1e-20);
    assert!(at(0.7) > at(0.8));
    assert!(at(0.9) > at(0.8));
    assert!(at(1.2) > at(0.9));
}
