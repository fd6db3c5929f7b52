//! Runs a beam calibration described by a session config.
//!
//! ```text
//! fitloop session.toml --output report.json
//! ```
//!
//! Logging follows `RUST_LOG` and defaults to `info`.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fitloop_calibration::{
    CalibrationReport, CalibrationSession, Fitness, SessionConfig, beam::PARAMETERS,
};

#[derive(Debug, Parser)]
#[command(name = "fitloop", version, about = "Calibrate simulation parameters against reference data")]
struct Cli {
    /// Session config file (TOML).
    config: PathBuf,

    /// Write the report as pretty JSON to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the iteration budget.
    #[arg(long)]
    max_iters: Option<usize>,

    /// Override the evaluation budget.
    #[arg(long)]
    max_evals: Option<usize>,

    /// Evaluate independent simplex points concurrently.
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn apply(&self, config: &mut SessionConfig) {
        if let Some(max_iters) = self.max_iters {
            config.driver.max_iters = max_iters;
        }
        if let Some(max_evals) = self.max_evals {
            config.driver.max_evals = Some(max_evals);
        }
        if self.parallel {
            config.driver.parallel = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = SessionConfig::load(&cli.config)
        .with_context(|| format!("failed to load session config {}", cli.config.display()))?;
    cli.apply(&mut config);

    let session =
        CalibrationSession::from_config(config).context("failed to set up calibration session")?;

    match session.run() {
        Ok(report) => {
            print_report(&report);
            write_report(cli.output.as_ref(), &report)
        }
        Err(failure) => {
            print_report(&failure.report);
            write_report(cli.output.as_ref(), &failure.report)?;
            Err(failure.into())
        }
    }
}

fn print_report(report: &CalibrationReport) {
    println!("state:       {:?}", report.state);
    if let Some(reason) = report.stop_reason {
        println!("stopped:     {reason:?}");
    }
    if let Some(best) = &report.best_parameters {
        for (name, value) in PARAMETERS.iter().zip(best) {
            println!("{name:<12} {value:.6}");
        }
    }
    match report.best_fitness {
        Some(Fitness::Value(value)) => println!("fitness:     {value:.6e}"),
        Some(Fitness::Failed) => println!("fitness:     failed"),
        None => {}
    }
    println!(
        "evaluations: {} ({} failed) in {} iterations, {:.1?}",
        report.evaluations, report.failed_evaluations, report.iterations, report.elapsed
    );
}

fn write_report(path: Option<&PathBuf>, report: &CalibrationReport) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from(["fitloop", "session.toml", "--max-iters", "25", "--parallel"]);
        let mut config = SessionConfig::from_toml(
            "[reference]\npath = \"beam.csv\"\n[simulator]\nprogram = \"beam-sim\"\n",
        )
        .unwrap();

        cli.apply(&mut config);

        assert_eq!(config.driver.max_iters, 25);
        assert_eq!(config.driver.max_evals, None);
        assert!(config.driver.parallel);
    }
}
