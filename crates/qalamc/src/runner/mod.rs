//! Running generated programs with a Python interpreter
//!
//! The interpreter is looked up on PATH unless a path is given. The child
//! inherits stdio and is killed once the timeout expires.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interpreter names to search for, in order of preference
const PYTHON_BINARIES: &[&str] = &["python3", "python"];

/// Default run time limit
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Errors that keep a program from being started
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Python interpreter not found. Install python3 or specify one with --python")]
    NotFound,

    #[error("failed to start {}: {source}", .interpreter.display())]
    Spawn {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for the program: {0}")]
    Wait(#[from] io::Error),
}

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Non-zero exit; `None` when killed by a signal
    Failed(Option<i32>),
    TimedOut,
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Explicit interpreter; searched on PATH when `None`
    pub python: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            python: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Find a Python interpreter on PATH
pub fn find_python() -> Option<PathBuf> {
    PYTHON_BINARIES
        .iter()
        .find_map(|binary| which::which(binary).ok())
}

/// Run `script` and wait for it to finish or time out
pub fn run_script(script: &Path, config: &RunConfig) -> Result<RunOutcome, RunnerError> {
    let interpreter = match &config.python {
        Some(path) => path.clone(),
        None => find_python().ok_or(RunnerError::NotFound)?,
    };
    log::info!("running {} with {}", script.display(), interpreter.display());

    let child = Command::new(&interpreter)
        .arg(script)
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            interpreter: interpreter.clone(),
            source,
        })?;

    wait_with_timeout(child, config.timeout)
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<RunOutcome, RunnerError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            log::debug!("program exited with {}", status);
            return Ok(if status.success() {
                RunOutcome::Success
            } else {
                RunOutcome::Failed(status.code())
            });
        }

        if Instant::now() >= deadline {
            log::warn!("program exceeded {:?}, killing it", timeout);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(RunOutcome::TimedOut);
        }

        thread::sleep(POLL_INTERVAL);
    }
}
