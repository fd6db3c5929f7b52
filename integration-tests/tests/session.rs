use std::{fs, path::Path};

use approx::assert_relative_eq;
use tempfile::TempDir;

use fitloop_calibration::{
    CalibrationSession, ConfigurationError, DriverState, Fitness, SessionConfig,
};
use integration_tests::{BAND, LinearCrack};

fn write_session(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("session.toml");
    fs::write(
        &path,
        format!(
            r#"
[reference]
path = "data/beam.csv"

[driver]
initial_guess = [1.0, 200.0]
max_iters = 30

[simulator]
program = "beam-sim"
{extra}
"#
        ),
    )
    .unwrap();
    path
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data").join("beam.csv"), BAND).unwrap();
    dir
}

#[test]
fn session_from_files_calibrates_stiffness() {
    let dir = workspace();
    let config = SessionConfig::load(write_session(dir.path(), "")).unwrap();
    let session = CalibrationSession::with_simulator(config, LinearCrack::new()).unwrap();

    let report = session.run().unwrap();

    assert_ne!(report.state, DriverState::Failed);
    let best = report.best_parameters.as_ref().unwrap();
    assert_relative_eq!(best[0], 0.8, epsilon = 0.05);
    assert!(matches!(report.best_fitness, Some(Fitness::Value(v)) if v < 1e-4));

    let out = dir.path().join("report.json");
    fs::write(&out, serde_json::to_string_pretty(&report).unwrap()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(json["evaluations"], report.evaluations);
}

#[test]
fn session_reports_missing_reference_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::load(write_session(dir.path(), "")).unwrap();

    let err = CalibrationSession::with_simulator(config, LinearCrack::new()).err().unwrap();
    assert!(matches!(err, ConfigurationError::FileNotFound { .. }));
}

#[test]
fn session_rejects_invalid_simulator_time_limit() {
    let dir = workspace();
    let config = SessionConfig::load(write_session(dir.path(), "time_limit_secs = -5")).unwrap();

    let err = CalibrationSession::with_simulator(config, LinearCrack::new()).err().unwrap();
    assert!(matches!(err, ConfigurationError::Invalid(_)));
}

#[cfg(unix)]
#[test]
fn session_drives_an_external_program() {
    let dir = workspace();
    let script = r#"cat > /dev/null; echo '{"histories": [
        {"probe": "CMOD - left", "samples": [[0, 0], [1, 0], [2, 0]]},
        {"probe": "CMOD - right", "samples": [[0, 0], [1, 0.0001], [2, 0.0002]]},
        {"probe": "Penetrator", "samples": [[0, 0], [1, -80], [2, -160]]}
    ]}'"#;
    let extra = format!("args = [\"-c\", '''{script}''']\ntime_limit_secs = 30");
    let path = write_session(dir.path(), &extra);

    let mut config = SessionConfig::load(path).unwrap();
    config.simulator.program = "sh".into();
    config.driver.max_iters = 2;

    let session = CalibrationSession::from_config(config).unwrap();
    let report = session.run().unwrap();

    assert_eq!(report.state, DriverState::Exhausted);
    assert_eq!(report.failed_evaluations, 0);
    assert!(matches!(report.best_fitness, Some(Fitness::Value(v)) if v < 1e-20));
}
