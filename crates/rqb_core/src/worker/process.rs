//! Spawn-and-wait wrapper around the worker executable.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::errors::{WorkerExecutionError, WorkerResult};

/// Lines of output quoted in a failure message.
const ERROR_CONTEXT_LINES: usize = 5;

/// Raw result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Space-joined command line, for logs and errors.
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    /// Turn the raw output into a checked result.
    pub fn into_result(self) -> WorkerResult<ProcessResult> {
        match self.exit_code {
            Some(0) => Ok(ProcessResult {
                exit_code: 0,
                duration: self.duration,
            }),
            Some(exit_code) => {
                // aerender reports most problems on stdout.
                let lines = if self.stderr.is_empty() {
                    &self.stdout
                } else {
                    &self.stderr
                };
                let start = lines.len().saturating_sub(ERROR_CONTEXT_LINES);
                Err(WorkerExecutionError::NonZeroExit {
                    command: self.command,
                    exit_code,
                    message: lines[start..].join(" | "),
                })
            }
            None => Err(WorkerExecutionError::Terminated {
                command: self.command,
            }),
        }
    }
}

/// Structured result of a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub duration: Duration,
}

/// Run `program` with `args` and block until it exits.
///
/// Only failures to start the process are errors here; the exit status is
/// checked by [`ProcessOutput::into_result`].
pub fn spawn_and_wait(program: &Path, args: &[String]) -> WorkerResult<ProcessOutput> {
    // Bare names are resolved through PATH by the OS.
    let has_dir = program
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());
    if has_dir && !program.exists() {
        return Err(WorkerExecutionError::ExecutableMissing {
            path: program.to_path_buf(),
        });
    }

    let command = std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!("Running: {}", command);

    let started = Instant::now();
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                WorkerExecutionError::ExecutableMissing {
                    path: program.to_path_buf(),
                }
            } else {
                WorkerExecutionError::SpawnFailed {
                    path: program.to_path_buf(),
                    source: e,
                }
            }
        })?;
    let duration = started.elapsed();

    Ok(ProcessOutput {
        command,
        exit_code: output.status.code(),
        duration,
        stdout: split_lines(&output.stdout),
        stderr: split_lines(&output.stderr),
    })
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
