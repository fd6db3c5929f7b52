#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::{
    io::{self, Read, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fitloop_core::Model;

use crate::{ConfigurationError, SimulationFailure, SimulatorError};

use super::{ObservationHistory, SimulationResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a simulator program writes to stdout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Response {
    Histories(Vec<ObservationHistory>),
    Diverged {
        #[serde(default)]
        step: Option<usize>,
    },
}

/// Runs an external simulator program once per call.
///
/// The setup is written to the program's stdin as JSON. The program must
/// exit successfully and print either `{"histories": [...]}` or
/// `{"diverged": {"step": n}}` to stdout. Stderr is passed through.
///
/// On unix the program runs in its own process group. A run that outlives the
/// time limit is killed along with everything it started, and reported as
/// [`SimulationFailure::BudgetExceeded`].
#[derive(Debug, Clone)]
pub struct ProcessSimulator<S> {
    program: PathBuf,
    args: Vec<String>,
    time_limit: Option<Duration>,
    setup: PhantomData<fn(&S)>,
}

impl<S> ProcessSimulator<S> {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            time_limit: None,
            setup: PhantomData,
        }
    }

    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_error(&self, err: io::Error) -> SimulatorError {
        match err.kind() {
            io::ErrorKind::NotFound => ConfigurationError::SimulatorNotFound {
                program: self.program.clone(),
            }
            .into(),
            io::ErrorKind::PermissionDenied => ConfigurationError::Invalid(format!(
                "simulator program is not executable: {}",
                self.program.display()
            ))
            .into(),
            _ => backend(format!("failed to start {}: {err}", self.program.display())),
        }
    }

    /// Waits for the child, killing it once the time limit has passed.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, SimulatorError> {
        let Some(limit) = self.time_limit else {
            return child.wait().map_err(|e| backend(e.to_string()));
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| backend(e.to_string()))? {
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(program = %self.program.display(), ?limit, "killing simulator");
                kill_process_group(child);
                return Err(SimulationFailure::BudgetExceeded { limit }.into());
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl<S: Serialize> Model for ProcessSimulator<S> {
    type Input = S;
    type Output = SimulationResult;
    type Error = SimulatorError;

    fn call(&self, setup: &S) -> Result<SimulationResult, SimulatorError> {
        let payload = serde_json::to_vec(setup)
            .map_err(|e| backend(format!("failed to encode setup: {e}")))?;

        let started = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(backend("simulator stdio was not captured".into()));
        };

        // Feed and drain the pipes on their own threads so neither side blocks.
        let writer = thread::spawn(move || stdin.write_all(&payload));
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let status = self.wait(&mut child)?;

        if let Ok(Err(e)) = writer.join() {
            debug!(error = %e, "simulator did not read its whole setup");
        }
        let output = match reader.join() {
            Ok(Ok(buf)) => buf,
            Ok(Err(e)) => return Err(backend(format!("failed to read simulator output: {e}"))),
            Err(_) => return Err(backend("simulator output reader panicked".into())),
        };

        debug!(
            program = %self.program.display(),
            elapsed = ?started.elapsed(),
            %status,
            "simulator finished"
        );

        if !status.success() {
            return Err(backend(format!(
                "{} exited with {status}",
                self.program.display()
            )));
        }

        match serde_json::from_slice(&output) {
            Ok(Response::Histories(histories)) => Ok(SimulationResult::new(histories)),
            Ok(Response::Diverged { step }) => Err(SimulationFailure::Diverged { step }.into()),
            Err(e) => Err(backend(format!("malformed simulator output: {e}"))),
        }
    }
}

/// Kills the child and, on unix, every process in its group, then reaps it.
///
/// The child is not reaped before the group is signalled, so its pid still
/// names this run's group.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::{
            sys::signal::{Signal, killpg},
            unistd::Pid,
        };

        if let Ok(pid) = i32::try_from(child.id()) {
            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                debug!(error = %e, "simulator process group already gone");
            }
        }
    }
    // The child may have exited since the last poll.
    let _ = child.kill();
    let _ = child.wait();
}

fn backend(message: String) -> SimulatorError {
    SimulationFailure::Backend(message).into()
}
